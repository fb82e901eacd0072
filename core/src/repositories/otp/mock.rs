//! Mock implementation of OtpVerificationRepository for testing

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::otp_verification::OtpVerification;
use crate::errors::DomainResult;

use super::r#trait::OtpVerificationRepository;

#[derive(Clone, Default)]
pub struct MockOtpVerificationRepository {
    records: Arc<RwLock<Vec<OtpVerification>>>,
}

impl MockOtpVerificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<OtpVerification> {
        self.records.read().await.clone()
    }

    pub async fn get(&self, id: Uuid) -> Option<OtpVerification> {
        self.records.read().await.iter().find(|r| r.id == id).cloned()
    }

    pub async fn update<F: FnOnce(&mut OtpVerification)>(&self, id: Uuid, f: F) {
        if let Some(record) = self.records.write().await.iter_mut().find(|r| r.id == id) {
            f(record);
        }
    }
}

#[async_trait]
impl OtpVerificationRepository for MockOtpVerificationRepository {
    async fn insert(&self, record: &OtpVerification) -> DomainResult<()> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn find_latest_for_user(&self, user_id: Uuid) -> DomainResult<Option<OtpVerification>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.user_id == user_id)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn find_latest_pending(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<OtpVerification>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.user_id == user_id && !r.is_verified && !r.is_expired(now))
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn try_increment_attempts(
        &self,
        id: Uuid,
        lock: Option<Duration>,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<OtpVerification>> {
        let mut records = self.records.write().await;
        Ok(records.iter_mut().find(|r| r.id == id).map(|record| {
            record.try_increment_attempts(lock, now);
            record.clone()
        }))
    }

    async fn mark_verified(&self, id: Uuid, now: DateTime<Utc>) -> DomainResult<bool> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| r.id == id) {
            Some(record) if record.is_valid(now) => {
                record.mark_verified(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn reset_code(
        &self,
        id: Uuid,
        code_hash: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.reset_code(code_hash.to_string(), ttl, now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn purge_expired(&self, older_than: DateTime<Utc>) -> DomainResult<u64> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.expires_at >= older_than);
        Ok((before - records.len()) as u64)
    }
}
