//! MySQL implementation of the IdentityStore trait.
//!
//! Passwords are stored as bcrypt hashes; verification runs on the blocking
//! pool so it does not stall the async workers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tracing::{error, info};
use uuid::Uuid;

use tg_core::domain::entities::user::UserAccount;
use tg_core::errors::{DomainError, DomainResult};
use tg_core::repositories::IdentityStore;

use super::{decode_error, parse_uuid, store_error};

const SELECT_COLUMNS: &str = r#"
    SELECT id, login_name, email, phone_number, phone_confirmed, lockout_end,
           access_failed_count, created_at
    FROM users
"#;

pub struct MySqlIdentityStore {
    pool: MySqlPool,
}

impl MySqlIdentityStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: &MySqlRow) -> DomainResult<UserAccount> {
        let id: String = row.try_get("id").map_err(|e| decode_error("id", e))?;

        Ok(UserAccount {
            id: parse_uuid("id", &id)?,
            login_name: row.try_get("login_name").map_err(|e| decode_error("login_name", e))?,
            email: row.try_get("email").map_err(|e| decode_error("email", e))?,
            phone_number: row.try_get("phone_number").map_err(|e| decode_error("phone_number", e))?,
            phone_confirmed: row
                .try_get("phone_confirmed")
                .map_err(|e| decode_error("phone_confirmed", e))?,
            lockout_end: row.try_get("lockout_end").map_err(|e| decode_error("lockout_end", e))?,
            access_failed_count: row
                .try_get("access_failed_count")
                .map_err(|e| decode_error("access_failed_count", e))?,
            created_at: row.try_get("created_at").map_err(|e| decode_error("created_at", e))?,
        })
    }

    async fn find_one(&self, filter: &str, value: &str, operation: &'static str) -> DomainResult<Option<UserAccount>> {
        let query = format!("{} WHERE {} LIMIT 1", SELECT_COLUMNS, filter);
        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error(operation))?;

        row.as_ref().map(Self::row_to_user).transpose()
    }
}

#[async_trait]
impl IdentityStore for MySqlIdentityStore {
    async fn find_by_id(&self, user_id: Uuid) -> DomainResult<Option<UserAccount>> {
        self.find_one("id = ?", &user_id.to_string(), "find user by id").await
    }

    async fn find_by_login(&self, login_name_or_email: &str) -> DomainResult<Option<UserAccount>> {
        let query = format!("{} WHERE login_name = ? OR email = ? LIMIT 1", SELECT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(login_name_or_email)
            .bind(login_name_or_email)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error("find user by login"))?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn find_by_phone(&self, phone_number: &str) -> DomainResult<Option<UserAccount>> {
        self.find_one("phone_number = ?", phone_number, "find user by phone").await
    }

    async fn create_for_phone(&self, phone_number: &str, now: DateTime<Utc>) -> DomainResult<UserAccount> {
        let account = UserAccount::for_phone(phone_number, now);

        // The unique phone index turns a concurrent create into a no-op
        let result = sqlx::query(
            r#"
            INSERT IGNORE INTO users (id, phone_number, phone_confirmed, access_failed_count, created_at)
            VALUES (?, ?, FALSE, 0, ?)
            "#,
        )
        .bind(account.id.to_string())
        .bind(phone_number)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(store_error("create user for phone"))?;

        if result.rows_affected() > 0 {
            info!(user_id = %account.id, "Account created for phone login");
        }

        self.find_by_phone(phone_number)
            .await?
            .ok_or_else(|| DomainError::internal("account missing after create"))
    }

    async fn confirm_phone(&self, user_id: Uuid) -> DomainResult<()> {
        sqlx::query("UPDATE users SET phone_confirmed = TRUE WHERE id = ?")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(store_error("confirm phone"))?;
        Ok(())
    }

    async fn check_password(&self, user_id: Uuid, password: &str) -> DomainResult<bool> {
        let hash: Option<Option<String>> = sqlx::query_scalar("SELECT password_hash FROM users WHERE id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error("load password hash"))?;

        let Some(hash) = hash.flatten() else {
            return Ok(false);
        };

        let password = password.to_string();
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| DomainError::internal(format!("password check aborted: {}", e)))?;

        match verified {
            Ok(matches) => Ok(matches),
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Stored password hash is unreadable");
                Ok(false)
            }
        }
    }

    async fn is_locked_out(&self, user_id: Uuid, now: DateTime<Utc>) -> DomainResult<bool> {
        let locked: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE id = ? AND lockout_end IS NOT NULL AND lockout_end > ?",
        )
        .bind(user_id.to_string())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error("check lockout"))?;

        Ok(locked.unwrap_or(0) > 0)
    }

    async fn record_failed_attempt(&self, user_id: Uuid) -> DomainResult<i32> {
        let mut tx = self.pool.begin().await.map_err(store_error("begin failed attempt"))?;

        sqlx::query("UPDATE users SET access_failed_count = access_failed_count + 1 WHERE id = ?")
            .bind(user_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(store_error("increment failed attempts"))?;

        let count: Option<i32> = sqlx::query_scalar("SELECT access_failed_count FROM users WHERE id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(store_error("read failed attempts"))?;

        tx.commit().await.map_err(store_error("commit failed attempt"))?;
        Ok(count.unwrap_or(0))
    }

    async fn set_lockout_end(&self, user_id: Uuid, lockout_end: Option<DateTime<Utc>>) -> DomainResult<()> {
        sqlx::query("UPDATE users SET lockout_end = ? WHERE id = ?")
            .bind(lockout_end)
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(store_error("set lockout end"))?;
        Ok(())
    }

    async fn reset_failed_attempts(&self, user_id: Uuid) -> DomainResult<()> {
        sqlx::query("UPDATE users SET access_failed_count = 0 WHERE id = ?")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(store_error("reset failed attempts"))?;
        Ok(())
    }
}
