//! MySQL implementation of the RefreshTokenRepository trait.
//!
//! Tokens are stored by SHA-256 hash only. Superseding and rotation run in a
//! transaction so the (user, device) pair never ends up with two active rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tracing::debug;
use uuid::Uuid;

use tg_core::domain::entities::token::{RefreshToken, RevocationReason};
use tg_core::errors::DomainResult;
use tg_core::repositories::{RefreshTokenRepository, RotationOutcome};

use super::{decode_error, parse_optional_uuid, parse_uuid, store_error};

const SELECT_COLUMNS: &str = r#"
    SELECT id, user_id, token_hash, device_id, created_at, expires_at, revoked_at,
           revoked_reason, replaced_by_token_id, parent_token_id, created_by_ip, user_agent
    FROM refresh_tokens
"#;

const INSERT_TOKEN: &str = r#"
    INSERT INTO refresh_tokens (
        id, user_id, token_hash, device_id, created_at, expires_at, revoked_at,
        revoked_reason, replaced_by_token_id, parent_token_id, created_by_ip, user_agent
    ) VALUES (?, ?, ?, ?, ?, ?, NULL, NULL, NULL, ?, ?, ?)
"#;

pub struct MySqlRefreshTokenRepository {
    pool: MySqlPool,
}

impl MySqlRefreshTokenRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_token(row: &MySqlRow) -> DomainResult<RefreshToken> {
        let id: String = row.try_get("id").map_err(|e| decode_error("id", e))?;
        let user_id: String = row.try_get("user_id").map_err(|e| decode_error("user_id", e))?;
        let revoked_reason: Option<String> = row
            .try_get("revoked_reason")
            .map_err(|e| decode_error("revoked_reason", e))?;

        Ok(RefreshToken {
            id: parse_uuid("id", &id)?,
            user_id: parse_uuid("user_id", &user_id)?,
            token_hash: row.try_get("token_hash").map_err(|e| decode_error("token_hash", e))?,
            device_id: row.try_get("device_id").map_err(|e| decode_error("device_id", e))?,
            created_at: row.try_get("created_at").map_err(|e| decode_error("created_at", e))?,
            expires_at: row.try_get("expires_at").map_err(|e| decode_error("expires_at", e))?,
            revoked_at: row.try_get("revoked_at").map_err(|e| decode_error("revoked_at", e))?,
            revoked_reason: revoked_reason
                .map(|r| r.parse::<RevocationReason>())
                .transpose()
                .map_err(|e| decode_error("revoked_reason", e))?,
            replaced_by_token_id: parse_optional_uuid(
                "replaced_by_token_id",
                row.try_get("replaced_by_token_id")
                    .map_err(|e| decode_error("replaced_by_token_id", e))?,
            )?,
            parent_token_id: parse_optional_uuid(
                "parent_token_id",
                row.try_get("parent_token_id")
                    .map_err(|e| decode_error("parent_token_id", e))?,
            )?,
            created_by_ip: row.try_get("created_by_ip").map_err(|e| decode_error("created_by_ip", e))?,
            user_agent: row.try_get("user_agent").map_err(|e| decode_error("user_agent", e))?,
        })
    }

    fn insert_query(token: &RefreshToken) -> sqlx::query::Query<'_, sqlx::MySql, sqlx::mysql::MySqlArguments> {
        sqlx::query(INSERT_TOKEN)
            .bind(token.id.to_string())
            .bind(token.user_id.to_string())
            .bind(&token.token_hash)
            .bind(&token.device_id)
            .bind(token.created_at)
            .bind(token.expires_at)
            .bind(token.parent_token_id.map(|id| id.to_string()))
            .bind(&token.created_by_ip)
            .bind(&token.user_agent)
    }
}

#[async_trait]
impl RefreshTokenRepository for MySqlRefreshTokenRepository {
    async fn insert_superseding(&self, token: &RefreshToken, now: DateTime<Utc>) -> DomainResult<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(store_error("begin insert_superseding"))?;

        let superseded = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = ?, revoked_reason = ?
            WHERE user_id = ? AND device_id = ? AND revoked_at IS NULL AND expires_at > ?
            "#,
        )
        .bind(now)
        .bind(RevocationReason::NewLogin.as_str())
        .bind(token.user_id.to_string())
        .bind(&token.device_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(store_error("supersede refresh tokens"))?
        .rows_affected();

        Self::insert_query(token)
            .execute(&mut *tx)
            .await
            .map_err(store_error("insert refresh token"))?;

        tx.commit().await.map_err(store_error("commit insert_superseding"))?;
        Ok(superseded)
    }

    async fn find_by_hash(&self, token_hash: &str) -> DomainResult<Option<RefreshToken>> {
        let query = format!("{} WHERE token_hash = ? LIMIT 1", SELECT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error("find refresh token by hash"))?;

        row.as_ref().map(Self::row_to_token).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<RefreshToken>> {
        let query = format!("{} WHERE id = ? LIMIT 1", SELECT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error("find refresh token by id"))?;

        row.as_ref().map(Self::row_to_token).transpose()
    }

    async fn find_active_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<RefreshToken>> {
        let query = format!(
            "{} WHERE user_id = ? AND revoked_at IS NULL AND expires_at > ? ORDER BY created_at DESC",
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(user_id.to_string())
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error("find active refresh tokens"))?;

        rows.iter().map(Self::row_to_token).collect()
    }

    async fn rotate(
        &self,
        old_id: Uuid,
        child: &RefreshToken,
        now: DateTime<Utc>,
    ) -> DomainResult<RotationOutcome> {
        let mut tx = self.pool.begin().await.map_err(store_error("begin rotate"))?;

        let revoked = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = ?, revoked_reason = ?, replaced_by_token_id = ?
            WHERE id = ? AND revoked_at IS NULL
            "#,
        )
        .bind(now)
        .bind(RevocationReason::Rotated.as_str())
        .bind(child.id.to_string())
        .bind(old_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(store_error("revoke rotated token"))?
        .rows_affected();

        if revoked == 0 {
            tx.rollback().await.map_err(store_error("rollback rotate"))?;
            debug!(token_id = %old_id, "Rotation found token already revoked");
            return Ok(RotationOutcome::AlreadyRevoked);
        }

        Self::insert_query(child)
            .execute(&mut *tx)
            .await
            .map_err(store_error("insert rotated child"))?;

        tx.commit().await.map_err(store_error("commit rotate"))?;
        Ok(RotationOutcome::Rotated)
    }

    async fn revoke_if_active(
        &self,
        id: Uuid,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = ?, revoked_reason = ? WHERE id = ? AND revoked_at IS NULL",
        )
        .bind(now)
        .bind(reason.as_str())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(store_error("revoke refresh token"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> DomainResult<u64> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = ?, revoked_reason = ? WHERE user_id = ? AND revoked_at IS NULL",
        )
        .bind(now)
        .bind(reason.as_str())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(store_error("revoke user refresh tokens"))?;

        Ok(result.rows_affected())
    }

    async fn purge(&self, older_than: DateTime<Utc>) -> DomainResult<u64> {
        let result = sqlx::query(
            "DELETE FROM refresh_tokens WHERE (revoked_at IS NOT NULL AND revoked_at < ?) OR expires_at < ?",
        )
        .bind(older_than)
        .bind(older_than)
        .execute(&self.pool)
        .await
        .map_err(store_error("purge refresh tokens"))?;

        Ok(result.rows_affected())
    }
}
