//! MySQL implementation of the OtpVerificationRepository trait.
//!
//! Only HMAC digests of codes are stored. Attempt counting and verification
//! are single conditional UPDATEs so concurrent guesses cannot overshoot the
//! attempt cap or verify a record twice.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use tg_core::domain::entities::otp_verification::OtpVerification;
use tg_core::errors::DomainResult;
use tg_core::repositories::OtpVerificationRepository;

use super::{decode_error, parse_uuid, store_error};

const SELECT_COLUMNS: &str = r#"
    SELECT id, user_id, code_hash, phone_number, created_at, expires_at, attempts,
           max_attempts, is_verified, verified_at, locked_until
    FROM otp_verifications
"#;

pub struct MySqlOtpRepository {
    pool: MySqlPool,
}

impl MySqlOtpRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_record(row: &MySqlRow) -> DomainResult<OtpVerification> {
        let id: String = row.try_get("id").map_err(|e| decode_error("id", e))?;
        let user_id: String = row.try_get("user_id").map_err(|e| decode_error("user_id", e))?;

        Ok(OtpVerification {
            id: parse_uuid("id", &id)?,
            user_id: parse_uuid("user_id", &user_id)?,
            code_hash: row.try_get("code_hash").map_err(|e| decode_error("code_hash", e))?,
            phone_number: row.try_get("phone_number").map_err(|e| decode_error("phone_number", e))?,
            created_at: row.try_get("created_at").map_err(|e| decode_error("created_at", e))?,
            expires_at: row.try_get("expires_at").map_err(|e| decode_error("expires_at", e))?,
            attempts: row.try_get("attempts").map_err(|e| decode_error("attempts", e))?,
            max_attempts: row.try_get("max_attempts").map_err(|e| decode_error("max_attempts", e))?,
            is_verified: row.try_get("is_verified").map_err(|e| decode_error("is_verified", e))?,
            verified_at: row.try_get("verified_at").map_err(|e| decode_error("verified_at", e))?,
            locked_until: row.try_get("locked_until").map_err(|e| decode_error("locked_until", e))?,
        })
    }
}

#[async_trait]
impl OtpVerificationRepository for MySqlOtpRepository {
    async fn insert(&self, record: &OtpVerification) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO otp_verifications (
                id, user_id, code_hash, phone_number, created_at, expires_at, attempts,
                max_attempts, is_verified, verified_at, locked_until
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.user_id.to_string())
        .bind(&record.code_hash)
        .bind(&record.phone_number)
        .bind(record.created_at)
        .bind(record.expires_at)
        .bind(record.attempts)
        .bind(record.max_attempts)
        .bind(record.is_verified)
        .bind(record.verified_at)
        .bind(record.locked_until)
        .execute(&self.pool)
        .await
        .map_err(store_error("insert otp verification"))?;
        Ok(())
    }

    async fn find_latest_for_user(&self, user_id: Uuid) -> DomainResult<Option<OtpVerification>> {
        let query = format!("{} WHERE user_id = ? ORDER BY created_at DESC LIMIT 1", SELECT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error("find latest otp verification"))?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn find_latest_pending(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<OtpVerification>> {
        let query = format!(
            "{} WHERE user_id = ? AND is_verified = FALSE AND expires_at > ? ORDER BY created_at DESC LIMIT 1",
            SELECT_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(user_id.to_string())
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error("find pending otp verification"))?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn try_increment_attempts(
        &self,
        id: Uuid,
        lock: Option<Duration>,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<OtpVerification>> {
        let lock_until = lock.map(|duration| now + duration);
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(store_error("begin otp attempt"))?;

        // MySQL applies SET assignments left to right: locked_until must read
        // the attempt count before it is incremented.
        sqlx::query(
            r#"
            UPDATE otp_verifications
            SET locked_until = CASE
                    WHEN ? IS NOT NULL AND attempts + 1 >= max_attempts THEN ?
                    ELSE locked_until
                END,
                attempts = LEAST(attempts + 1, max_attempts)
            WHERE id = ?
            "#,
        )
        .bind(lock_until)
        .bind(lock_until)
        .bind(id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(store_error("increment otp attempts"))?;

        let query = format!("{} WHERE id = ?", SELECT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(store_error("read otp verification"))?;

        tx.commit().await.map_err(store_error("commit otp attempt"))?;
        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn mark_verified(&self, id: Uuid, now: DateTime<Utc>) -> DomainResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE otp_verifications
            SET is_verified = TRUE, verified_at = ?
            WHERE id = ?
              AND is_verified = FALSE
              AND expires_at > ?
              AND (locked_until IS NULL OR locked_until <= ?)
              AND attempts < max_attempts
            "#,
        )
        .bind(now)
        .bind(id.to_string())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(store_error("mark otp verified"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn reset_code(
        &self,
        id: Uuid,
        code_hash: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE otp_verifications
            SET code_hash = ?, created_at = ?, expires_at = ?, attempts = 0,
                is_verified = FALSE, verified_at = NULL, locked_until = NULL
            WHERE id = ?
            "#,
        )
        .bind(code_hash)
        .bind(now)
        .bind(now + ttl)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(store_error("reset otp code"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired(&self, older_than: DateTime<Utc>) -> DomainResult<u64> {
        let result = sqlx::query("DELETE FROM otp_verifications WHERE expires_at < ?")
            .bind(older_than)
            .execute(&self.pool)
            .await
            .map_err(store_error("purge otp verifications"))?;

        Ok(result.rows_affected())
    }
}
