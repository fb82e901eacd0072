//! Mock implementation of LoginAttemptRepository for testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::entities::login_attempt::LoginAttempt;
use crate::errors::{DomainError, DomainResult};

use super::r#trait::LoginAttemptRepository;

#[derive(Clone, Default)]
pub struct MockLoginAttemptRepository {
    pub attempts: Arc<Mutex<Vec<LoginAttempt>>>,
    failing: Arc<AtomicBool>,
}

impl MockLoginAttemptRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn recorded(&self) -> Vec<LoginAttempt> {
        self.attempts.lock().unwrap().clone()
    }

    fn check(&self) -> DomainResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::unavailable("mock attempt log down"));
        }
        Ok(())
    }
}

#[async_trait]
impl LoginAttemptRepository for MockLoginAttemptRepository {
    async fn append(&self, attempt: &LoginAttempt) -> DomainResult<()> {
        self.check()?;
        self.attempts.lock().unwrap().push(attempt.clone());
        Ok(())
    }

    async fn count_failed_from_ip(&self, ip: &str, since: DateTime<Utc>) -> DomainResult<u64> {
        self.check()?;
        let attempts = self.attempts.lock().unwrap();
        Ok(attempts
            .iter()
            .filter(|a| a.ip_address == ip && a.attempted_at >= since && a.status.is_failure())
            .count() as u64)
    }

    async fn purge_older_than(&self, before: DateTime<Utc>) -> DomainResult<u64> {
        self.check()?;
        let mut attempts = self.attempts.lock().unwrap();
        let count = attempts.len();
        attempts.retain(|a| a.attempted_at >= before);
        Ok((count - attempts.len()) as u64)
    }
}
