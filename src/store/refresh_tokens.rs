use super::{enum_column, opt_time_column, time_column, uuid_column, Database};
use crate::auth::models::{RefreshTokenRecord, RefreshTokenState};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

const TOKEN_COLUMNS: &str =
    "id, token_digest, user_id, state, expires_at, created_at, revoked_at";

fn token_from_row(row: &Row<'_>) -> rusqlite::Result<RefreshTokenRecord> {
    Ok(RefreshTokenRecord {
        id: uuid_column(row, 0)?,
        token_digest: row.get(1)?,
        user_id: uuid_column(row, 2)?,
        state: enum_column(row, 3, "refresh token state", RefreshTokenState::parse)?,
        expires_at: time_column(row, 4)?,
        created_at: time_column(row, 5)?,
        revoked_at: opt_time_column(row, 6)?,
    })
}

impl Database {
    /// Revoke every active refresh token of the record's owner, then store the
    /// record as the single active one. Both steps commit together.
    ///
    /// Returns how many tokens were revoked.
    pub async fn replace_refresh_tokens(&self, record: &RefreshTokenRecord) -> Result<usize> {
        let mut conn = self.conn().await;
        let tx = conn
            .transaction()
            .context("Failed to start refresh token transaction")?;

        let revoked = tx.execute(
            "UPDATE refresh_tokens SET state = 'REVOKED', revoked_at = ?2
             WHERE user_id = ?1 AND state = 'ACTIVE'",
            params![record.user_id.to_string(), record.created_at.timestamp_millis()],
        )?;

        tx.execute(
            "INSERT INTO refresh_tokens (id, token_digest, user_id, state, expires_at, created_at, revoked_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)",
            params![
                record.id.to_string(),
                record.token_digest,
                record.user_id.to_string(),
                record.state.as_str(),
                record.expires_at.timestamp_millis(),
                record.created_at.timestamp_millis(),
            ],
        )?;

        tx.commit().context("Failed to commit refresh token rotation")?;
        Ok(revoked)
    }

    /// Active, unexpired record for a token digest.
    pub async fn find_active_refresh_token(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshTokenRecord>> {
        let conn = self.conn().await;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {TOKEN_COLUMNS} FROM refresh_tokens
             WHERE token_digest = ?1 AND state = 'ACTIVE' AND expires_at > ?2"
        ))?;
        stmt.query_row(params![token_digest, now.timestamp_millis()], token_from_row)
            .optional()
            .context("Failed to look up refresh token")
    }

    /// Mark one token revoked. Returns false when it was unknown or already revoked.
    pub async fn revoke_refresh_token(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let conn = self.conn().await;
        let changed = conn.execute(
            "UPDATE refresh_tokens SET state = 'REVOKED', revoked_at = ?2
             WHERE token_digest = ?1 AND state = 'ACTIVE'",
            params![token_digest, now.timestamp_millis()],
        )?;
        Ok(changed > 0)
    }

    /// Full audit trail of a user's refresh tokens, newest first.
    #[cfg(test)]
    pub(crate) async fn list_refresh_tokens(&self, user_id: Uuid) -> Result<Vec<RefreshTokenRecord>> {
        let conn = self.conn().await;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {TOKEN_COLUMNS} FROM refresh_tokens
             WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC"
        ))?;
        let records = stmt
            .query_map(params![user_id.to_string()], token_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}
