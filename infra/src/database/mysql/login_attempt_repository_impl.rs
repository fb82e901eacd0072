//! MySQL implementation of the LoginAttemptRepository trait (append-only).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

use tg_core::domain::entities::login_attempt::LoginAttempt;
use tg_core::errors::DomainResult;
use tg_core::repositories::LoginAttemptRepository;

use super::store_error;

pub struct MySqlLoginAttemptRepository {
    pool: MySqlPool,
}

impl MySqlLoginAttemptRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoginAttemptRepository for MySqlLoginAttemptRepository {
    async fn append(&self, attempt: &LoginAttempt) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO login_attempts (
                id, user_id, status, ip_address, user_agent, device_id, login_name_or_email, attempted_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(attempt.id.to_string())
        .bind(attempt.user_id.map(|id| id.to_string()))
        .bind(attempt.status.as_str())
        .bind(&attempt.ip_address)
        .bind(&attempt.user_agent)
        .bind(&attempt.device_id)
        .bind(&attempt.login_name_or_email)
        .bind(attempt.attempted_at)
        .execute(&self.pool)
        .await
        .map_err(store_error("append login attempt"))?;
        Ok(())
    }

    async fn count_failed_from_ip(&self, ip: &str, since: DateTime<Utc>) -> DomainResult<u64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM login_attempts
            WHERE ip_address = ? AND attempted_at >= ? AND status IN ('failed', 'locked_out')
            "#,
        )
        .bind(ip)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error("count failed login attempts"))?;

        Ok(count.max(0) as u64)
    }

    async fn purge_older_than(&self, before: DateTime<Utc>) -> DomainResult<u64> {
        let result = sqlx::query("DELETE FROM login_attempts WHERE attempted_at < ?")
            .bind(before)
            .execute(&self.pool)
            .await
            .map_err(store_error("purge login attempts"))?;

        Ok(result.rows_affected())
    }
}
