//! MySQL implementation of the DeviceRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use tg_core::domain::entities::device::DeviceRecord;
use tg_core::errors::{DomainError, DomainResult};
use tg_core::repositories::DeviceRepository;

use super::{decode_error, parse_uuid, store_error};

const SELECT_COLUMNS: &str = r#"
    SELECT user_id, device_id, user_agent, last_ip, first_seen_at, last_seen_at, trusted_until
    FROM devices
"#;

pub struct MySqlDeviceRepository {
    pool: MySqlPool,
}

impl MySqlDeviceRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_device(row: &MySqlRow) -> DomainResult<DeviceRecord> {
        let user_id: String = row.try_get("user_id").map_err(|e| decode_error("user_id", e))?;

        Ok(DeviceRecord {
            user_id: parse_uuid("user_id", &user_id)?,
            device_id: row.try_get("device_id").map_err(|e| decode_error("device_id", e))?,
            user_agent: row.try_get("user_agent").map_err(|e| decode_error("user_agent", e))?,
            last_ip: row.try_get("last_ip").map_err(|e| decode_error("last_ip", e))?,
            first_seen_at: row.try_get("first_seen_at").map_err(|e| decode_error("first_seen_at", e))?,
            last_seen_at: row.try_get("last_seen_at").map_err(|e| decode_error("last_seen_at", e))?,
            trusted_until: row.try_get("trusted_until").map_err(|e| decode_error("trusted_until", e))?,
        })
    }
}

#[async_trait]
impl DeviceRepository for MySqlDeviceRepository {
    async fn find(&self, user_id: Uuid, device_id: &str) -> DomainResult<Option<DeviceRecord>> {
        let query = format!("{} WHERE user_id = ? AND device_id = ?", SELECT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(user_id.to_string())
            .bind(device_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error("find device"))?;

        row.as_ref().map(Self::row_to_device).transpose()
    }

    async fn touch(
        &self,
        user_id: Uuid,
        device_id: &str,
        user_agent: &str,
        ip: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<DeviceRecord> {
        sqlx::query(
            r#"
            INSERT INTO devices (user_id, device_id, user_agent, last_ip, first_seen_at, last_seen_at, trusted_until)
            VALUES (?, ?, ?, ?, ?, ?, NULL)
            ON DUPLICATE KEY UPDATE
                user_agent = VALUES(user_agent),
                last_ip = VALUES(last_ip),
                last_seen_at = VALUES(last_seen_at)
            "#,
        )
        .bind(user_id.to_string())
        .bind(device_id)
        .bind(user_agent)
        .bind(ip)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(store_error("touch device"))?;

        self.find(user_id, device_id)
            .await?
            .ok_or_else(|| DomainError::internal("device missing after upsert"))
    }

    async fn list_trusted(&self, user_id: Uuid, now: DateTime<Utc>) -> DomainResult<Vec<DeviceRecord>> {
        let query = format!(
            "{} WHERE user_id = ? AND trusted_until IS NOT NULL AND trusted_until >= ? ORDER BY trusted_until",
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(user_id.to_string())
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error("list trusted devices"))?;

        rows.iter().map(Self::row_to_device).collect()
    }

    async fn set_trusted_until(
        &self,
        user_id: Uuid,
        device_id: &str,
        trusted_until: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let result = sqlx::query("UPDATE devices SET trusted_until = ? WHERE user_id = ? AND device_id = ?")
            .bind(trusted_until)
            .bind(user_id.to_string())
            .bind(device_id)
            .execute(&self.pool)
            .await
            .map_err(store_error("set device trust"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_trust(&self, user_id: Uuid, device_id: &str) -> DomainResult<bool> {
        let result = sqlx::query(
            "UPDATE devices SET trusted_until = NULL WHERE user_id = ? AND device_id = ? AND trusted_until IS NOT NULL",
        )
        .bind(user_id.to_string())
        .bind(device_id)
        .execute(&self.pool)
        .await
        .map_err(store_error("clear device trust"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_idle_trust(
        &self,
        user_id: Option<Uuid>,
        idle_before: DateTime<Utc>,
    ) -> DomainResult<u64> {
        let result = match user_id {
            Some(user_id) => {
                sqlx::query(
                    r#"
                    UPDATE devices SET trusted_until = NULL
                    WHERE user_id = ? AND last_seen_at < ? AND trusted_until IS NOT NULL
                    "#,
                )
                .bind(user_id.to_string())
                .bind(idle_before)
                .execute(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "UPDATE devices SET trusted_until = NULL WHERE last_seen_at < ? AND trusted_until IS NOT NULL",
                )
                .bind(idle_before)
                .execute(&self.pool)
                .await
            }
        }
        .map_err(store_error("clear idle device trust"))?;

        Ok(result.rows_affected())
    }
}
