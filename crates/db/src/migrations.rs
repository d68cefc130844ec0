// crates/db/src/migrations.rs
//! Inline schema migrations, applied in order and tracked by version in
//! the `_migrations` table.

pub(crate) const MIGRATIONS: &[&str] = &[
    // v1: contribution record cache, one live row per (subject, year).
    // Sequence fields are JSON text columns; updated_at is unix seconds.
    r#"CREATE TABLE IF NOT EXISTS contribution_records (
        subject TEXT NOT NULL,
        year INTEGER NOT NULL,
        avatar_url TEXT,
        bio TEXT,
        company TEXT,
        location TEXT,
        followers INTEGER NOT NULL DEFAULT 0,
        following INTEGER NOT NULL DEFAULT 0,
        total_contributions INTEGER NOT NULL DEFAULT 0,
        total_commits INTEGER NOT NULL DEFAULT 0,
        pull_requests INTEGER NOT NULL DEFAULT 0,
        pull_request_reviews INTEGER NOT NULL DEFAULT 0,
        issues INTEGER NOT NULL DEFAULT 0,
        longest_streak INTEGER NOT NULL DEFAULT 0,
        current_streak INTEGER NOT NULL DEFAULT 0,
        active_days INTEGER NOT NULL DEFAULT 0,
        repo_count INTEGER NOT NULL DEFAULT 0,
        public_repo_count INTEGER NOT NULL DEFAULT 0,
        private_repo_count INTEGER NOT NULL DEFAULT 0,
        total_repo_count INTEGER NOT NULL DEFAULT 0,
        daily_contributions TEXT NOT NULL DEFAULT '[]',
        language_stats TEXT NOT NULL DEFAULT '[]',
        top_repos TEXT NOT NULL DEFAULT '[]',
        organizations TEXT NOT NULL DEFAULT '[]',
        updated_at INTEGER NOT NULL,
        PRIMARY KEY (subject, year)
    )"#,
    // v2: stored GitHub tokens (thin collaborator; the core service only
    // ever sees an explicit credential).
    r#"CREATE TABLE IF NOT EXISTS user_tokens (
        username TEXT PRIMARY KEY,
        github_token TEXT NOT NULL,
        token_type TEXT,
        scopes TEXT,
        is_valid INTEGER NOT NULL DEFAULT 1,
        updated_at INTEGER NOT NULL
    )"#,
    // v3: visit analytics.
    r#"CREATE TABLE IF NOT EXISTS visit_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        target_subject TEXT NOT NULL,
        target_year INTEGER NOT NULL,
        visitor_ip TEXT,
        visitor_fingerprint TEXT,
        visitor_country TEXT,
        visitor_city TEXT,
        visitor_lat REAL,
        visitor_lng REAL,
        visitor_user_agent TEXT,
        referer TEXT,
        visited_at INTEGER NOT NULL
    )"#,
    // v4: lookup indexes for visit queries and fingerprint dedup.
    r#"CREATE INDEX IF NOT EXISTS idx_visits_target
        ON visit_logs(target_subject, target_year, visited_at)"#,
    r#"CREATE INDEX IF NOT EXISTS idx_visits_fingerprint
        ON visit_logs(target_subject, target_year, visitor_fingerprint, visited_at)"#,
];
