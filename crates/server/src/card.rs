// crates/server/src/card.rs
//! SVG stats card rendering.
//!
//! Dark-theme card with a stats row, a 52 week activity strip and a
//! language bar. Pure string assembly; embeddable as an `<img>` so the
//! output must be valid standalone XML.

use std::fmt::Write;

use chrono::NaiveDate;
use yearbook_core::{weekly_totals, ContributionRecord, WEEK_BUCKETS};

const CARD_WIDTH: u32 = 495;
const CARD_HEIGHT: u32 = 320;
const LANG_BAR_WIDTH: f64 = 455.0;
const MAX_CARD_LANGUAGES: usize = 6;
const FALLBACK_COLOR: &str = "#8b949e";

/// Escape text interpolated into SVG element content or attributes.
fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn activity_bars(record: &ContributionRecord) -> String {
    let start = NaiveDate::from_ymd_opt(record.year, 1, 1)
        .unwrap_or(NaiveDate::MIN);
    let weeks = weekly_totals(&record.daily_contributions, start);
    let max = weeks.iter().copied().max().unwrap_or(0).max(1);

    let mut bars = String::new();
    for (i, w) in weeks.iter().enumerate() {
        let opacity = if *w > 0 {
            0.15 + (*w as f64 / max as f64) * 0.85
        } else {
            0.08
        };
        let _ = write!(
            bars,
            r#"<rect x="{}" y="0" width="8" height="16" fill="rgba(63,185,80,{:.2})" rx="1"/>"#,
            i * 9,
            opacity
        );
    }
    debug_assert_eq!(weeks.len(), WEEK_BUCKETS);
    bars
}

fn language_section(record: &ContributionRecord) -> (String, String) {
    let mut bars = String::new();
    let mut legend = String::new();
    let mut x_offset = 0.0;

    for (i, lang) in record
        .language_stats
        .iter()
        .take(MAX_CARD_LANGUAGES)
        .enumerate()
    {
        let width = lang.percentage / 100.0 * LANG_BAR_WIDTH;
        let color = if lang.color.is_empty() {
            FALLBACK_COLOR
        } else {
            &lang.color
        };
        let _ = write!(
            bars,
            r#"<rect x="{:.1}" y="0" width="{:.1}" height="8" fill="{}"/>"#,
            x_offset, width, color
        );
        x_offset += width;

        let _ = write!(
            legend,
            concat!(
                r##"<g transform="translate({}, {})">"##,
                r##"<circle cx="4" cy="5" r="4" fill="{}"/>"##,
                r##"<text x="14" y="9" fill="#8b949e" font-size="11">{}</text>"##,
                r##"<text x="200" y="9" fill="#58a6ff" font-size="11" text-anchor="end">{:.1}%</text>"##,
                r##"</g>"##
            ),
            (i % 2) * 220,
            (i / 2) * 18,
            color,
            xml_escape(&lang.name),
            lang.percentage
        );
    }

    (bars, legend)
}

/// Render the stats card for a contribution record.
pub fn render_card(record: &ContributionRecord) -> String {
    let (lang_bars, lang_legend) = language_section(record);
    let activity = activity_bars(record);
    let subject = xml_escape(&record.subject);

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" preserveAspectRatio="xMidYMid meet">
  <defs>
    <style>
      .header {{ font: 600 18px "Segoe UI", Ubuntu, Sans-Serif; fill: #ffffff; }}
      .stat-label {{ font: 400 10px "Segoe UI", Ubuntu, Sans-Serif; fill: #8b949e; }}
      .stat-value {{ font: 600 14px "Segoe UI", Ubuntu, Sans-Serif; }}
      .section-title {{ font: 600 10px "Segoe UI", Ubuntu, Sans-Serif; fill: #8b949e; letter-spacing: 0.5px; }}
    </style>
  </defs>
  <rect width="{width}" height="{height}" fill="#0d1117" rx="6"/>
  <rect x="0.5" y="0.5" width="{inner_w}" height="{inner_h}" fill="none" stroke="#30363d" rx="6"/>
  <g transform="translate(20, 28)">
    <text class="header">{subject}</text>
    <text x="{year_x}" y="0" fill="#8b949e" font-size="12">{year}</text>
  </g>
  <g transform="translate(20, 58)">
    <g>
      <text class="stat-value" fill="#3fb950">{contributions}</text>
      <text class="stat-label" y="15">Contributions</text>
    </g>
    <g transform="translate(85, 0)">
      <text class="stat-value" fill="#58a6ff">{commits}</text>
      <text class="stat-label" y="15">Commits</text>
    </g>
    <g transform="translate(155, 0)">
      <text class="stat-value" fill="#a371f7">{prs}</text>
      <text class="stat-label" y="15">PRs</text>
    </g>
    <g transform="translate(200, 0)">
      <text class="stat-value" fill="#f0883e">{reviews}</text>
      <text class="stat-label" y="15">Reviews</text>
    </g>
    <g transform="translate(260, 0)">
      <text class="stat-value" fill="#3fb950">{issues}</text>
      <text class="stat-label" y="15">Issues</text>
    </g>
    <g transform="translate(310, 0)">
      <text class="stat-value" fill="#f97316">{streak}d</text>
      <text class="stat-label" y="15">Streak</text>
    </g>
    <g transform="translate(365, 0)">
      <text class="stat-value" fill="#3fb950">{active}</text>
      <text class="stat-label" y="15">Active</text>
    </g>
    <g transform="translate(420, 0)">
      <text class="stat-value" fill="#58a6ff">{repos}</text>
      <text class="stat-label" y="15">Repos</text>
    </g>
  </g>
  <g transform="translate(20, 95)">
    <text class="section-title">ACTIVITY</text>
    <g transform="translate(0, 14)">{activity}</g>
  </g>
  <g transform="translate(20, 145)">
    <text class="section-title">LANGUAGES</text>
    <g transform="translate(0, 14)">
      <rect width="455" height="8" fill="#161b22" rx="4"/>
      <clipPath id="lang-clip"><rect width="455" height="8" rx="4"/></clipPath>
      <g clip-path="url(#lang-clip)">{lang_bars}</g>
    </g>
    <g transform="translate(0, 30)">{lang_legend}</g>
  </g>
  <g transform="translate(20, 250)">
    <text class="section-title">REPOSITORIES</text>
    <g transform="translate(0, 18)">
      <text fill="#c9d1d9" font-size="12">
        <tspan fill="#58a6ff" font-weight="600">{public}</tspan><tspan fill="#8b949e"> public</tspan>
        <tspan fill="#f0883e" font-weight="600">{private}</tspan><tspan fill="#8b949e"> private</tspan>
        <tspan fill="#a371f7" font-weight="600">{total_repos}</tspan><tspan fill="#8b949e"> total</tspan>
      </text>
    </g>
  </g>
  <g transform="translate(20, 305)">
    <text fill="#484f58" font-size="10">gh-yearbook · {updated}</text>
  </g>
</svg>"##,
        width = CARD_WIDTH,
        height = CARD_HEIGHT,
        inner_w = CARD_WIDTH - 1,
        inner_h = CARD_HEIGHT - 1,
        subject = subject,
        year_x = record.subject.len() * 11 + 14,
        year = record.year,
        contributions = record.total_contributions,
        commits = record.total_commits,
        prs = record.pull_requests,
        reviews = record.pull_request_reviews,
        issues = record.issues,
        streak = record.longest_streak,
        active = record.active_days,
        repos = record.repo_count,
        public = record.public_repo_count,
        private = record.private_repo_count,
        total_repos = record.total_repo_count,
        activity = activity,
        lang_bars = lang_bars,
        lang_legend = lang_legend,
        updated = record.updated_at.format("%Y-%m-%d"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use yearbook_core::{normalize, DailyContribution, LanguageStat, RawActivity};

    fn record() -> ContributionRecord {
        let raw = RawActivity {
            subject: "octocat".into(),
            total_contributions: 120,
            total_commits: 100,
            daily_contributions: vec![DailyContribution::new(
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                5,
            )],
            language_stats: vec![
                LanguageStat {
                    name: "Rust".into(),
                    color: "#dea584".into(),
                    size: 300,
                    repo_count: 2,
                    percentage: 0.0,
                },
                LanguageStat {
                    name: "TypeScript".into(),
                    color: "".into(),
                    size: 100,
                    repo_count: 1,
                    percentage: 0.0,
                },
            ],
            ..Default::default()
        };
        normalize(
            &raw,
            2024,
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_card_is_wellformed_and_shows_stats() {
        let svg = render_card(&record());
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("octocat"));
        assert!(svg.contains(">120<"));
        assert!(svg.contains("2024-06-01"));
        // 52 activity bars plus the language-bar background rect.
        assert_eq!(svg.matches("rgba(63,185,80,").count(), 52);
    }

    #[test]
    fn test_card_escapes_text() {
        let mut rec = record();
        rec.subject = "a<b>&\"c".into();
        let svg = render_card(&rec);
        assert!(svg.contains("a&lt;b&gt;&amp;&quot;c"));
        assert!(!svg.contains("a<b>"));
    }

    #[test]
    fn test_empty_language_color_falls_back() {
        let svg = render_card(&record());
        assert!(svg.contains(FALLBACK_COLOR));
    }

    #[test]
    fn test_legend_markup_is_complete() {
        let svg = render_card(&record());
        // One legend group per language, names and percentages styled.
        assert_eq!(svg.matches(r##"fill="#8b949e" font-size="11""##).count(), 2);
        assert_eq!(svg.matches(r##"fill="#58a6ff" font-size="11""##).count(), 2);
        assert!(svg.contains("75.0%"));
        assert!(svg.contains("25.0%"));
    }
}
