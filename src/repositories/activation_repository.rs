use crate::models::{ActivationPurpose, ActivationToken};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::{FromRow, SqlitePool};

use super::{format_timestamp, parse_timestamp, RepositoryError, RepositoryResult};

/// Storage for hashed activation codes, one row per (email, purpose).
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait ActivationRepository: Send + Sync {
    /// Replaces any previous code for the pair; `expires_at = now + ttl_minutes`.
    async fn save(
        &self,
        email: &str,
        purpose: ActivationPurpose,
        code_hash: &str,
        ttl_minutes: i64,
    ) -> RepositoryResult<()>;

    /// Returns the stored row regardless of expiry; callers decide liveness.
    async fn get(&self, email: &str, purpose: ActivationPurpose)
        -> RepositoryResult<ActivationToken>;

    /// Atomically claims the live code whose hash is `code_hash`. Exactly one caller can claim a
    /// given code; every other caller, and any caller after expiry or supersession, gets
    /// `NotFound`.
    async fn consume(
        &self,
        email: &str,
        purpose: ActivationPurpose,
        code_hash: &str,
    ) -> RepositoryResult<()>;

    /// Undoes a claim made with the same `code_hash`. A newer code for the pair is left alone.
    async fn release(
        &self,
        email: &str,
        purpose: ActivationPurpose,
        code_hash: &str,
    ) -> RepositoryResult<()>;

    /// Deletes expired and consumed rows, returning how many were removed.
    async fn purge_expired(&self) -> RepositoryResult<u64>;
}

#[derive(FromRow)]
struct ActivationRow {
    email: String,
    purpose: String,
    code_hash: String,
    expires_at: String,
    consumed_at: Option<String>,
}

impl TryFrom<ActivationRow> for ActivationToken {
    type Error = RepositoryError;

    fn try_from(row: ActivationRow) -> Result<Self, Self::Error> {
        let purpose = row
            .purpose
            .parse::<ActivationPurpose>()
            .map_err(|e| RepositoryError::Corrupt(e.to_string()))?;

        Ok(ActivationToken {
            email: row.email,
            purpose,
            code_hash: row.code_hash,
            expires_at: parse_timestamp(&row.expires_at)?,
            consumed_at: row
                .consumed_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
        })
    }
}

pub struct SqliteActivationRepository {
    pool: SqlitePool,
}

impl SqliteActivationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivationRepository for SqliteActivationRepository {
    async fn save(
        &self,
        email: &str,
        purpose: ActivationPurpose,
        code_hash: &str,
        ttl_minutes: i64,
    ) -> RepositoryResult<()> {
        let now = Utc::now();
        let expires_at = Duration::try_minutes(ttl_minutes)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .map(format_timestamp)
            .ok_or(RepositoryError::InvalidTtl(ttl_minutes))?;
        let created_at = format_timestamp(now);

        sqlx::query(
            r#"
            INSERT INTO activation_tokens (email, purpose, code_hash, expires_at, consumed_at, created_at)
            VALUES (?, ?, ?, ?, NULL, ?)
            ON CONFLICT (email, purpose) DO UPDATE SET
                code_hash = excluded.code_hash,
                expires_at = excluded.expires_at,
                consumed_at = NULL,
                created_at = excluded.created_at
            "#,
        )
        .bind(email)
        .bind(purpose.as_str())
        .bind(code_hash)
        .bind(expires_at)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(
        &self,
        email: &str,
        purpose: ActivationPurpose,
    ) -> RepositoryResult<ActivationToken> {
        let row = sqlx::query_as::<_, ActivationRow>(
            r#"
            SELECT email, purpose, code_hash, expires_at, consumed_at
            FROM activation_tokens
            WHERE email = ? AND purpose = ?
            "#,
        )
        .bind(email)
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn consume(
        &self,
        email: &str,
        purpose: ActivationPurpose,
        code_hash: &str,
    ) -> RepositoryResult<()> {
        let now = format_timestamp(Utc::now());

        let result = sqlx::query(
            r#"
            UPDATE activation_tokens
            SET consumed_at = ?
            WHERE email = ? AND purpose = ? AND code_hash = ?
              AND consumed_at IS NULL AND expires_at > ?
            "#,
        )
        .bind(&now)
        .bind(email)
        .bind(purpose.as_str())
        .bind(code_hash)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() != 1 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn release(
        &self,
        email: &str,
        purpose: ActivationPurpose,
        code_hash: &str,
    ) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            UPDATE activation_tokens
            SET consumed_at = NULL
            WHERE email = ? AND purpose = ? AND code_hash = ? AND consumed_at IS NOT NULL
            "#,
        )
        .bind(email)
        .bind(purpose.as_str())
        .bind(code_hash)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn purge_expired(&self) -> RepositoryResult<u64> {
        let now = format_timestamp(Utc::now());

        let result = sqlx::query(
            "DELETE FROM activation_tokens WHERE expires_at <= ? OR consumed_at IS NOT NULL",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
