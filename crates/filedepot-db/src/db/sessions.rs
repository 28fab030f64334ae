use chrono::{DateTime, Duration, Utc};
use filedepot_core::{models::AuthSession, AppError};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Fixed expiry for a session created at `now`; there is no sliding window.
fn expiry_from(now: DateTime<Utc>, ttl_hours: i64) -> DateTime<Utc> {
    now + Duration::hours(ttl_hours)
}

/// Session store: opaque tokens mapped to user ids with a fixed expiry.
///
/// Expiry is store-enforced: resolution filters on `expires_at`, so an expired
/// row behaves exactly like a missing one even before it is purged. There is
/// no sliding expiration.
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
    ttl_hours: i64,
}

impl SessionRepository {
    pub fn new(pool: PgPool, ttl_hours: i64) -> Self {
        Self { pool, ttl_hours }
    }

    /// Create a session for a user and return its token. Multiple concurrent
    /// sessions per user are permitted.
    #[tracing::instrument(skip(self), fields(db.table = "sessions", db.operation = "insert"))]
    pub async fn create(&self, user_id: Uuid) -> Result<AuthSession, AppError> {
        let token = Uuid::new_v4().to_string();
        let expires_at = expiry_from(Utc::now(), self.ttl_hours);

        let session = sqlx::query_as::<Postgres, AuthSession>(
            r#"
            INSERT INTO sessions (token, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING token, user_id, created_at, expires_at
            "#,
        )
        .bind(&token)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(user_id = %user_id, "Session created");

        Ok(session)
    }

    /// Resolve a token to a user id. Unknown and expired tokens both resolve
    /// to `None`; neither is an error.
    #[tracing::instrument(skip(self, token), fields(db.table = "sessions", db.operation = "select"))]
    pub async fn resolve(&self, token: &str) -> Result<Option<Uuid>, AppError> {
        let user_id = sqlx::query_scalar::<Postgres, Uuid>(
            "SELECT user_id FROM sessions WHERE token = $1 AND expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user_id)
    }

    /// Delete a session; returns whether a live session existed.
    #[tracing::instrument(skip(self, token), fields(db.table = "sessions", db.operation = "delete"))]
    pub async fn revoke(&self, token: &str) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM sessions WHERE token = $1 AND expires_at > now()")
                .bind(token)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove expired rows. Expired sessions are already unresolvable; this
    /// just keeps the table from growing without bound.
    #[tracing::instrument(skip(self), fields(db.table = "sessions", db.operation = "delete"))]
    pub async fn purge_expired(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;

        let purged = result.rows_affected();
        if purged > 0 {
            tracing::info!(purged, "Expired sessions purged");
        }

        Ok(purged)
    }

    /// Liveness probe for GET /status.
    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_is_exactly_ttl_hours_ahead() {
        let now = Utc::now();
        assert_eq!(expiry_from(now, 24) - now, Duration::hours(24));
        assert_eq!(expiry_from(now, 1) - now, Duration::hours(1));
    }

    #[test]
    fn test_expiry_lies_in_the_future_for_positive_ttl() {
        let now = Utc::now();
        assert!(expiry_from(now, 24) > now);
    }
}
