//! Tests for login attempt recording

use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::login_attempt::{LoginAttempt, LoginStatus};
use crate::domain::value_objects::ClientContext;
use crate::repositories::MockLoginAttemptRepository;
use crate::services::lockout::LoginAttemptRecorder;

fn client(ip: &str) -> ClientContext {
    ClientContext::new(ip, "agent", "dev-1")
}

#[tokio::test]
async fn test_record_appends_attempt() {
    let repository = Arc::new(MockLoginAttemptRepository::new());
    let recorder = LoginAttemptRecorder::new(repository.clone());
    let attempt = LoginAttempt::new(
        Some(Uuid::new_v4()),
        LoginStatus::Success,
        &client("203.0.113.1"),
        Some("alice".to_string()),
        Utc::now(),
    );

    let id = recorder.record(attempt.clone()).await;
    assert_eq!(id, Some(attempt.id));
    assert_eq!(repository.recorded(), vec![attempt]);
}

#[tokio::test]
async fn test_record_swallows_store_failure() {
    let repository = Arc::new(MockLoginAttemptRepository::new());
    repository.set_failing(true);
    let recorder = LoginAttemptRecorder::new(repository.clone());

    let attempt = LoginAttempt::new(None, LoginStatus::Failed, &client("203.0.113.1"), None, Utc::now());
    assert_eq!(recorder.record(attempt).await, None);
}

#[tokio::test]
async fn test_failed_attempts_counted_per_ip_within_window() {
    let repository = Arc::new(MockLoginAttemptRepository::new());
    let recorder = LoginAttemptRecorder::new(repository.clone());
    let now = Utc::now();

    for status in [LoginStatus::Failed, LoginStatus::LockedOut, LoginStatus::Success] {
        recorder
            .record(LoginAttempt::new(None, status, &client("203.0.113.1"), None, now))
            .await;
    }
    recorder
        .record(LoginAttempt::new(None, LoginStatus::Failed, &client("198.51.100.2"), None, now))
        .await;
    recorder
        .record(LoginAttempt::new(
            None,
            LoginStatus::Failed,
            &client("203.0.113.1"),
            None,
            now - Duration::hours(2),
        ))
        .await;

    let count = recorder
        .failed_attempts_from_ip("203.0.113.1", Duration::minutes(15), now)
        .await
        .unwrap();
    assert_eq!(count, 2);
}
