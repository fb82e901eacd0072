//! Tests for the token blacklist

use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use tg_shared::config::BlacklistConfig;

use crate::repositories::MockCacheStore;
use crate::services::blacklist::TokenBlacklist;

fn blacklist() -> (Arc<MockCacheStore>, TokenBlacklist<MockCacheStore>) {
    let store = Arc::new(MockCacheStore::new());
    (store.clone(), TokenBlacklist::new(store, BlacklistConfig::default()))
}

#[tokio::test]
async fn test_revoked_jti_is_reported() {
    let (store, blacklist) = blacklist();
    let now = Utc::now();

    assert!(!blacklist.is_revoked("jti-1").await);
    assert!(blacklist.revoke_token("jti-1", now + Duration::minutes(10), now).await.unwrap());
    assert!(blacklist.is_revoked("jti-1").await);
    assert!(!blacklist.is_revoked("jti-2").await);

    let ttl = store.ttl_of("blacklist:jti:jti-1").unwrap();
    assert!(ttl <= std::time::Duration::from_secs(600));
    assert!(ttl > std::time::Duration::from_secs(590));
}

#[tokio::test]
async fn test_expired_token_is_not_written() {
    let (store, blacklist) = blacklist();
    let now = Utc::now();

    assert!(!blacklist.revoke_token("old", now - Duration::seconds(1), now).await.unwrap());
    assert!(!blacklist.revoke_token("edge", now, now).await.unwrap());
    assert!(store.peek("blacklist:jti:old").is_none());
}

#[tokio::test]
async fn test_user_marker_rejects_tokens_up_to_its_second() {
    let (store, blacklist) = blacklist();
    let user_id = Uuid::new_v4();
    let now = Utc::now();

    assert!(!blacklist.is_user_revoked(user_id, now.timestamp() - 60).await);
    blacklist.revoke_user(user_id, now).await.unwrap();

    assert!(blacklist.is_user_revoked(user_id, now.timestamp() - 60).await);
    assert!(blacklist.is_user_revoked(user_id, now.timestamp()).await);
    assert!(!blacklist.is_user_revoked(user_id, now.timestamp() + 1).await);
    assert!(!blacklist.is_user_revoked(user_id, now.timestamp() + 5).await);
    assert!(!blacklist.is_user_revoked(Uuid::new_v4(), now.timestamp() - 60).await);

    let ttl = store.ttl_of(&format!("blacklist:user:{}", user_id)).unwrap();
    assert!(ttl > std::time::Duration::from_secs(89 * 86_400));
}

#[tokio::test]
async fn test_reads_fail_open() {
    let (store, blacklist) = blacklist();
    let user_id = Uuid::new_v4();
    let now = Utc::now();
    blacklist.revoke_token("jti", now + Duration::minutes(5), now).await.unwrap();
    blacklist.revoke_user(user_id, now).await.unwrap();

    store.set_failing(true);
    assert!(!blacklist.is_revoked("jti").await);
    assert!(!blacklist.is_user_revoked(user_id, 0).await);
}

#[tokio::test]
async fn test_writes_fail_closed() {
    let (store, blacklist) = blacklist();
    store.set_failing(true);
    let now = Utc::now();

    assert!(blacklist.revoke_token("jti", now + Duration::minutes(5), now).await.is_err());
    assert!(blacklist.revoke_user(Uuid::new_v4(), now).await.is_err());
}
