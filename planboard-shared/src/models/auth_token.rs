/// Single-use tokens backing email verification and password reset
///
/// # Schema
///
/// ```sql
/// CREATE TYPE auth_token_purpose AS ENUM ('email_verification', 'password_reset');
///
/// CREATE TABLE auth_tokens (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     purpose auth_token_purpose NOT NULL,
///     token_hash VARCHAR(64) NOT NULL UNIQUE,
///     expires_at TIMESTAMPTZ NOT NULL,
///     used_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Lifecycle
///
/// ```text
/// issue → (emailed link) → consume → used_at set
///       ↘ expires_at passes → rejected
/// ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::token::{generate_token, hash_token};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "auth_token_purpose", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    EmailVerification,
    PasswordReset,
}

impl TokenPurpose {
    /// How long a freshly issued token stays valid
    pub fn ttl(&self) -> Duration {
        match self {
            TokenPurpose::EmailVerification => Duration::hours(24),
            TokenPurpose::PasswordReset => Duration::hours(1),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub purpose: TokenPurpose,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AuthToken {
    /// Issues a new token and returns the plaintext for the email link
    ///
    /// Earlier unused tokens of the same purpose are invalidated, so only the
    /// most recent link works.
    pub async fn issue(
        pool: &PgPool,
        user_id: Uuid,
        purpose: TokenPurpose,
    ) -> Result<String, sqlx::Error> {
        let (token, token_hash) = generate_token();
        let expires_at = Utc::now() + purpose.ttl();

        let mut tx = pool.begin().await?;

        sqlx::query(
            "UPDATE auth_tokens SET used_at = NOW() \
             WHERE user_id = $1 AND purpose = $2 AND used_at IS NULL",
        )
        .bind(user_id)
        .bind(purpose)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO auth_tokens (user_id, purpose, token_hash, expires_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(user_id)
        .bind(purpose)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(token)
    }

    /// Marks a token used and returns its owner
    ///
    /// Returns None if the token is unknown, already used, expired, or was
    /// issued for a different purpose. The check and the update are a single
    /// statement, so a token can only be consumed once.
    pub async fn consume(
        pool: &PgPool,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE auth_tokens SET used_at = NOW() \
             WHERE token_hash = $1 AND purpose = $2 AND used_at IS NULL AND expires_at > NOW() \
             RETURNING user_id",
        )
        .bind(hash_token(token))
        .bind(purpose)
        .fetch_optional(pool)
        .await
    }

    /// Removes expired and used tokens older than a day
    pub async fn purge_stale(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM auth_tokens \
             WHERE expires_at < NOW() - INTERVAL '1 day' \
                OR used_at < NOW() - INTERVAL '1 day'",
        )
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttls() {
        assert_eq!(TokenPurpose::EmailVerification.ttl(), Duration::hours(24));
        assert_eq!(TokenPurpose::PasswordReset.ttl(), Duration::hours(1));
    }
}
