// crates/core/src/lib.rs
//! Canonical contribution statistics model and the pure normalizer.
//!
//! This crate has no I/O: `yearbook-github` produces [`RawActivity`]
//! payloads from either upstream fetch path, and [`normalize`] turns them
//! into the [`ContributionRecord`] that `yearbook-db` persists and
//! `yearbook-server` serves.

pub mod normalize;
pub mod types;

pub use normalize::{
    current_streak, language_percentages, longest_streak, normalize, weekly_totals, year_range,
    WEEK_BUCKETS,
};
pub use types::{
    ContributionRecord, DailyContribution, LanguageStat, Organization, RawActivity,
    RepoContribution,
};
