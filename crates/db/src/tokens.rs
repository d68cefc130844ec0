// crates/db/src/tokens.rs
//! Stored GitHub tokens, one per username.
//!
//! Thin collaborator storage: the aggregation service never reads this
//! table itself. The HTTP layer resolves a stored token into the explicit
//! credential it passes down.

use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::{Database, DbResult};

/// A stored token row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredToken {
    pub username: String,
    pub github_token: String,
    pub token_type: Option<String>,
    pub scopes: Option<String>,
    pub is_valid: bool,
    pub updated_at: DateTime<Utc>,
}

impl StoredToken {
    /// Masked form for display: first 8 and last 4 characters.
    pub fn masked(&self) -> String {
        let t = &self.github_token;
        if t.len() > 12 {
            format!("{}...{}", &t[..8], &t[t.len() - 4..])
        } else {
            "***".to_string()
        }
    }
}

impl Database {
    /// Save or replace the token stored for `username`. Replacing marks the
    /// token valid again.
    pub async fn save_token(
        &self,
        username: &str,
        github_token: &str,
        token_type: Option<&str>,
        scopes: Option<&str>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"INSERT INTO user_tokens (username, github_token, token_type, scopes, is_valid, updated_at)
            VALUES (?, ?, ?, ?, 1, ?)
            ON CONFLICT(username) DO UPDATE SET
                github_token = excluded.github_token,
                token_type = excluded.token_type,
                scopes = excluded.scopes,
                is_valid = 1,
                updated_at = excluded.updated_at"#,
        )
        .bind(username)
        .bind(github_token)
        .bind(token_type)
        .bind(scopes)
        .bind(Utc::now().timestamp())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Look up the stored token for `username`.
    pub async fn get_token(&self, username: &str) -> DbResult<Option<StoredToken>> {
        let row = sqlx::query("SELECT * FROM user_tokens WHERE username = ?")
            .bind(username)
            .fetch_optional(self.pool())
            .await?;

        row.map(|row| {
            Ok(StoredToken {
                username: row.try_get("username")?,
                github_token: row.try_get("github_token")?,
                token_type: row.try_get("token_type")?,
                scopes: row.try_get("scopes")?,
                is_valid: row.try_get::<i64, _>("is_valid")? != 0,
                updated_at: DateTime::<Utc>::from_timestamp(row.try_get("updated_at")?, 0)
                    .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            })
        })
        .transpose()
    }

    /// Stored token for `username` only if it is marked valid.
    pub async fn get_valid_token(&self, username: &str) -> DbResult<Option<StoredToken>> {
        Ok(self
            .get_token(username)
            .await?
            .filter(|token| token.is_valid))
    }

    /// Delete the stored token for `username`. Absent is a no-op.
    pub async fn delete_token(&self, username: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM user_tokens WHERE username = ?")
            .bind(username)
            .execute(self.pool())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_long_token() {
        let token = StoredToken {
            username: "octocat".into(),
            github_token: "ghp_abcd1234efgh5678ijkl".into(),
            token_type: None,
            scopes: None,
            is_valid: true,
            updated_at: Utc::now(),
        };
        assert_eq!(token.masked(), "ghp_abcd...ijkl");
    }

    #[test]
    fn test_masked_short_token() {
        let token = StoredToken {
            username: "octocat".into(),
            github_token: "short".into(),
            token_type: None,
            scopes: None,
            is_valid: true,
            updated_at: Utc::now(),
        };
        assert_eq!(token.masked(), "***");
    }
}
