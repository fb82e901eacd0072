//! MySQL implementation of the OutboxRepository trait.
//!
//! Claims use `FOR UPDATE SKIP LOCKED` so several dispatchers can poll the
//! same table without handing out a message twice within one lease.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use tg_core::domain::entities::outbox::{OutboxMessage, OutboxStatus};
use tg_core::errors::DomainResult;
use tg_core::repositories::OutboxRepository;

use super::{decode_error, parse_uuid, store_error};

const SELECT_COLUMNS: &str = r#"
    SELECT id, event_type, payload, status, attempts, available_at, created_at,
           dispatched_at, last_error
    FROM security_outbox
"#;

pub struct MySqlOutboxRepository {
    pool: MySqlPool,
}

impl MySqlOutboxRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_message(row: &MySqlRow) -> DomainResult<OutboxMessage> {
        let id: String = row.try_get("id").map_err(|e| decode_error("id", e))?;
        let status: String = row.try_get("status").map_err(|e| decode_error("status", e))?;

        Ok(OutboxMessage {
            id: parse_uuid("id", &id)?,
            event_type: row.try_get("event_type").map_err(|e| decode_error("event_type", e))?,
            payload: row.try_get("payload").map_err(|e| decode_error("payload", e))?,
            status: status
                .parse::<OutboxStatus>()
                .map_err(|e| decode_error("status", e))?,
            attempts: row.try_get("attempts").map_err(|e| decode_error("attempts", e))?,
            available_at: row.try_get("available_at").map_err(|e| decode_error("available_at", e))?,
            created_at: row.try_get("created_at").map_err(|e| decode_error("created_at", e))?,
            dispatched_at: row.try_get("dispatched_at").map_err(|e| decode_error("dispatched_at", e))?,
            last_error: row.try_get("last_error").map_err(|e| decode_error("last_error", e))?,
        })
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

#[async_trait]
impl OutboxRepository for MySqlOutboxRepository {
    async fn enqueue(&self, message: &OutboxMessage) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO security_outbox (
                id, event_type, payload, status, attempts, available_at, created_at,
                dispatched_at, last_error
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(message.id.to_string())
        .bind(&message.event_type)
        .bind(&message.payload)
        .bind(message.status.as_str())
        .bind(message.attempts)
        .bind(message.available_at)
        .bind(message.created_at)
        .bind(message.dispatched_at)
        .bind(&message.last_error)
        .execute(&self.pool)
        .await
        .map_err(store_error("enqueue outbox message"))?;
        Ok(())
    }

    async fn claim_due(
        &self,
        limit: u32,
        now: DateTime<Utc>,
        lease: Duration,
    ) -> DomainResult<Vec<OutboxMessage>> {
        let mut tx = self.pool.begin().await.map_err(store_error("begin outbox claim"))?;

        let ids: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT id FROM security_outbox
            WHERE status = ? AND available_at <= ?
            ORDER BY available_at, created_at
            LIMIT ?
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(OutboxStatus::Pending.as_str())
        .bind(now)
        .bind(limit)
        .fetch_all(&mut *tx)
        .await
        .map_err(store_error("select due outbox messages"))?;

        if ids.is_empty() {
            tx.commit().await.map_err(store_error("commit outbox claim"))?;
            return Ok(Vec::new());
        }

        let update = format!(
            "UPDATE security_outbox SET attempts = attempts + 1, available_at = ? WHERE id IN ({})",
            placeholders(ids.len())
        );
        let mut query = sqlx::query(&update).bind(now + lease);
        for (id,) in &ids {
            query = query.bind(id);
        }
        query
            .execute(&mut *tx)
            .await
            .map_err(store_error("lease outbox messages"))?;

        let select = format!(
            "{} WHERE id IN ({}) ORDER BY created_at",
            SELECT_COLUMNS,
            placeholders(ids.len())
        );
        let mut query = sqlx::query(&select);
        for (id,) in &ids {
            query = query.bind(id);
        }
        let rows = query
            .fetch_all(&mut *tx)
            .await
            .map_err(store_error("read claimed outbox messages"))?;

        tx.commit().await.map_err(store_error("commit outbox claim"))?;
        rows.iter().map(Self::row_to_message).collect()
    }

    async fn mark_dispatched(&self, id: Uuid, now: DateTime<Utc>) -> DomainResult<()> {
        sqlx::query("UPDATE security_outbox SET status = ?, dispatched_at = ?, last_error = NULL WHERE id = ?")
            .bind(OutboxStatus::Dispatched.as_str())
            .bind(now)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(store_error("mark outbox message dispatched"))?;
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
        retry_at: Option<DateTime<Utc>>,
    ) -> DomainResult<()> {
        let query = match retry_at {
            Some(at) => sqlx::query("UPDATE security_outbox SET last_error = ?, available_at = ? WHERE id = ?")
                .bind(error)
                .bind(at)
                .bind(id.to_string()),
            None => sqlx::query("UPDATE security_outbox SET last_error = ?, status = ? WHERE id = ?")
                .bind(error)
                .bind(OutboxStatus::DeadLetter.as_str())
                .bind(id.to_string()),
        };
        query
            .execute(&self.pool)
            .await
            .map_err(store_error("mark outbox message failed"))?;
        Ok(())
    }

    async fn purge_dispatched(&self, before: DateTime<Utc>) -> DomainResult<u64> {
        let result = sqlx::query("DELETE FROM security_outbox WHERE status = ? AND dispatched_at < ?")
            .bind(OutboxStatus::Dispatched.as_str())
            .bind(before)
            .execute(&self.pool)
            .await
            .map_err(store_error("purge outbox messages"))?;

        Ok(result.rows_affected())
    }
}
