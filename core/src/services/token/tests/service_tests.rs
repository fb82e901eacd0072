//! Tests for token issuance, rotation, reuse detection and revocation

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use std::sync::Arc;
use uuid::Uuid;

use tg_shared::config::BlacklistConfig;

use crate::domain::entities::token::{AccessClaims, RefreshToken, RevocationReason};
use crate::domain::value_objects::ClientContext;
use crate::errors::{DomainError, TokenError};
use crate::repositories::{MockCacheStore, MockOutboxRepository, MockRefreshTokenRepository};
use crate::services::blacklist::TokenBlacklist;
use crate::services::outbox::SecurityEventPublisher;
use crate::services::token::{hash_refresh_token, SigningKeys, TokenService, TokenServiceConfig};

const SECRET: &[u8] = b"test-secret-key-with-at-least-32-bytes!!";

struct Harness {
    repository: Arc<MockRefreshTokenRepository>,
    cache: Arc<MockCacheStore>,
    outbox: Arc<MockOutboxRepository>,
    service: TokenService<MockRefreshTokenRepository, MockCacheStore>,
}

fn harness() -> Harness {
    let repository = Arc::new(MockRefreshTokenRepository::new());
    let cache = Arc::new(MockCacheStore::new());
    let outbox = Arc::new(MockOutboxRepository::new());
    let service = TokenService::new(
        repository.clone(),
        Arc::new(TokenBlacklist::new(cache.clone(), BlacklistConfig::default())),
        SecurityEventPublisher::new(outbox.clone()),
        SigningKeys::hs256(SECRET),
        TokenServiceConfig::default(),
    );
    Harness {
        repository,
        cache,
        outbox,
        service,
    }
}

fn client(device_id: &str) -> ClientContext {
    ClientContext::new("203.0.113.10", "test-agent/1.0", device_id)
}

fn sign(claims: &AccessClaims) -> String {
    encode(&Header::default(), claims, &EncodingKey::from_secret(SECRET)).unwrap()
}

#[tokio::test]
async fn test_issue_stores_only_the_hash() {
    let h = harness();
    let user_id = Uuid::new_v4();

    let tokens = h.service.issue(user_id, &client("phone")).await.unwrap();
    assert_eq!(tokens.token_type, "Bearer");
    assert!(!tokens.refresh_token.is_empty());

    let stored = h.repository.get(tokens.refresh_token_id).await.unwrap();
    assert_eq!(stored.token_hash, hash_refresh_token(&tokens.refresh_token));
    assert_ne!(stored.token_hash, tokens.refresh_token);
    assert_eq!(stored.device_id, "phone");
    assert_eq!(stored.created_by_ip, "203.0.113.10");
    assert_eq!(stored.parent_token_id, None);

    let claims = h.service.validate_access_token(&tokens.access_token).await.unwrap();
    assert_eq!(claims.user_id().unwrap(), user_id);
    assert_eq!(claims.jti, tokens.jti);
    assert_eq!(claims.iss, "tokengate");
    assert_eq!(claims.aud, "tokengate-api");
    assert_eq!(claims.exp - claims.iat, 15 * 60);
}

#[tokio::test]
async fn test_refresh_tokens_are_unique() {
    let h = harness();
    let user_id = Uuid::new_v4();
    let a = h.service.issue(user_id, &client("a")).await.unwrap();
    let b = h.service.issue(user_id, &client("b")).await.unwrap();
    assert_ne!(a.refresh_token, b.refresh_token);
    assert_ne!(a.jti, b.jti);
}

#[tokio::test]
async fn test_new_login_supersedes_same_device_only() {
    let h = harness();
    let user_id = Uuid::new_v4();

    let first = h.service.issue(user_id, &client("phone")).await.unwrap();
    let laptop = h.service.issue(user_id, &client("laptop")).await.unwrap();
    let second = h.service.issue(user_id, &client("phone")).await.unwrap();

    let superseded = h.repository.get(first.refresh_token_id).await.unwrap();
    assert_eq!(superseded.revoked_reason, Some(RevocationReason::NewLogin));
    assert!(h.repository.get(laptop.refresh_token_id).await.unwrap().is_active(Utc::now()));
    assert!(h.repository.get(second.refresh_token_id).await.unwrap().is_active(Utc::now()));

    let sessions = h.service.active_sessions(user_id).await.unwrap();
    assert_eq!(sessions.len(), 2);
}

#[tokio::test]
async fn test_refresh_rotates_into_child() {
    let h = harness();
    let user_id = Uuid::new_v4();
    let original = h.service.issue(user_id, &client("phone")).await.unwrap();

    let rotated = h.service.refresh(&original.refresh_token).await.unwrap();
    assert_ne!(rotated.refresh_token, original.refresh_token);

    let parent = h.repository.get(original.refresh_token_id).await.unwrap();
    assert_eq!(parent.revoked_reason, Some(RevocationReason::Rotated));
    assert_eq!(parent.replaced_by_token_id, Some(rotated.refresh_token_id));

    let child = h.repository.get(rotated.refresh_token_id).await.unwrap();
    assert_eq!(child.parent_token_id, Some(parent.id));
    assert_eq!(child.device_id, "phone");

    let active: Vec<RefreshToken> = h
        .repository
        .all()
        .await
        .into_iter()
        .filter(|t| t.is_active(Utc::now()))
        .collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, child.id);

    h.service.validate_access_token(&rotated.access_token).await.unwrap();
}

#[tokio::test]
async fn test_replayed_token_revokes_every_session() {
    let h = harness();
    let user_id = Uuid::new_v4();
    let phone = h.service.issue(user_id, &client("phone")).await.unwrap();
    let laptop = h.service.issue(user_id, &client("laptop")).await.unwrap();
    let bystander = h.service.issue(Uuid::new_v4(), &client("phone")).await.unwrap();

    let rotated = h.service.refresh(&phone.refresh_token).await.unwrap();

    let replay = h.service.refresh(&phone.refresh_token).await;
    assert!(matches!(
        replay,
        Err(DomainError::Token(TokenError::InvalidRefreshToken))
    ));

    for id in [rotated.refresh_token_id, laptop.refresh_token_id] {
        let token = h.repository.get(id).await.unwrap();
        assert_eq!(token.revoked_reason, Some(RevocationReason::ReuseDetected));
    }
    // The replayed token keeps its original revocation
    let replayed = h.repository.get(phone.refresh_token_id).await.unwrap();
    assert_eq!(replayed.revoked_reason, Some(RevocationReason::Rotated));

    assert!(h
        .repository
        .get(bystander.refresh_token_id)
        .await
        .unwrap()
        .is_active(Utc::now()));

    assert!(h.cache.peek(&format!("blacklist:user:{}", user_id)).is_some());
    assert_eq!(h.outbox.event_types(), vec!["refresh_token_reuse"]);

    // The rotated child is dead as well
    assert!(h.service.refresh(&rotated.refresh_token).await.is_err());
    let result = h.service.validate_access_token(&rotated.access_token).await;
    assert!(matches!(result, Err(DomainError::Token(TokenError::TokenRevoked))));
}

#[tokio::test]
async fn test_unknown_and_expired_tokens_fail_generically() {
    let h = harness();
    let user_id = Uuid::new_v4();
    let live = h.service.issue(user_id, &client("laptop")).await.unwrap();

    let unknown = h.service.refresh("not-a-real-token").await;
    assert!(matches!(
        unknown,
        Err(DomainError::Token(TokenError::InvalidRefreshToken))
    ));

    let now = Utc::now();
    let expired = RefreshToken::new(
        user_id,
        hash_refresh_token("expired-token"),
        "phone",
        "203.0.113.10",
        "agent",
        Duration::days(1),
        now - Duration::days(2),
    );
    h.repository.put(expired).await;

    let result = h.service.refresh("expired-token").await;
    assert!(matches!(
        result,
        Err(DomainError::Token(TokenError::InvalidRefreshToken))
    ));

    // No cascade for ordinary failures
    assert!(h
        .repository
        .get(live.refresh_token_id)
        .await
        .unwrap()
        .is_active(Utc::now()));
    assert!(h.outbox.snapshot().is_empty());
}

#[tokio::test]
async fn test_issue_fails_closed_when_store_is_down() {
    let h = harness();
    h.repository.set_failing(true);

    let result = h.service.issue(Uuid::new_v4(), &client("phone")).await;
    assert!(matches!(result, Err(DomainError::Unavailable { .. })));
}

#[tokio::test]
async fn test_refresh_fails_closed_when_store_is_down() {
    let h = harness();
    let tokens = h.service.issue(Uuid::new_v4(), &client("phone")).await.unwrap();
    h.repository.set_failing(true);

    let result = h.service.refresh(&tokens.refresh_token).await;
    assert!(matches!(result, Err(DomainError::Unavailable { .. })));
}

#[tokio::test]
async fn test_revoke_is_idempotent() {
    let h = harness();
    let user_id = Uuid::new_v4();
    let tokens = h.service.issue(user_id, &client("phone")).await.unwrap();

    h.service.revoke(&tokens.refresh_token, user_id).await.unwrap();
    h.service.revoke(&tokens.refresh_token, user_id).await.unwrap();
    h.service.revoke("never-issued", user_id).await.unwrap();

    let stored = h.repository.get(tokens.refresh_token_id).await.unwrap();
    assert_eq!(stored.revoked_reason, Some(RevocationReason::Manual));
}

#[tokio::test]
async fn test_revoke_ignores_tokens_of_other_users() {
    let h = harness();
    let owner = Uuid::new_v4();
    let tokens = h.service.issue(owner, &client("phone")).await.unwrap();

    h.service.revoke(&tokens.refresh_token, Uuid::new_v4()).await.unwrap();
    assert!(h
        .repository
        .get(tokens.refresh_token_id)
        .await
        .unwrap()
        .is_active(Utc::now()));
}

#[tokio::test]
async fn test_revoke_all_logs_out_everywhere() {
    let h = harness();
    let user_id = Uuid::new_v4();
    for device in ["phone", "laptop", "tablet"] {
        h.service.issue(user_id, &client(device)).await.unwrap();
    }

    assert_eq!(h.service.revoke_all(user_id).await.unwrap(), 3);
    assert!(h.service.active_sessions(user_id).await.unwrap().is_empty());
    assert!(h
        .repository
        .all()
        .await
        .iter()
        .all(|t| t.revoked_reason == Some(RevocationReason::GlobalLogout)));
    assert_eq!(h.outbox.event_types(), vec!["sessions_revoked"]);

    // Access tokens minted before the marker are rejected
    let now = Utc::now();
    let stale = AccessClaims::new(user_id, "tokengate", "tokengate-api", Duration::minutes(15), now - Duration::minutes(2));
    let result = h.service.validate_access_token(&sign(&stale)).await;
    assert!(matches!(result, Err(DomainError::Token(TokenError::TokenRevoked))));

    // New logins work again
    let fresh = h.service.issue(user_id, &client("phone")).await.unwrap();
    h.service.refresh(&fresh.refresh_token).await.unwrap();
}

#[tokio::test]
async fn test_revoke_all_rejects_token_issued_in_same_second() {
    let h = harness();
    let user_id = Uuid::new_v4();
    let tokens = h.service.issue(user_id, &client("phone")).await.unwrap();
    h.service.validate_access_token(&tokens.access_token).await.unwrap();

    h.service.revoke_all(user_id).await.unwrap();

    let result = h.service.validate_access_token(&tokens.access_token).await;
    assert!(matches!(result, Err(DomainError::Token(TokenError::TokenRevoked))));
}

#[tokio::test]
async fn test_revoke_all_fails_when_marker_cannot_be_written() {
    let h = harness();
    let user_id = Uuid::new_v4();
    h.service.issue(user_id, &client("phone")).await.unwrap();
    h.cache.set_failing(true);

    let result = h.service.revoke_all(user_id).await;
    assert!(matches!(result, Err(DomainError::Unavailable { .. })));
}

#[tokio::test]
async fn test_revoked_access_token_is_rejected() {
    let h = harness();
    let tokens = h.service.issue(Uuid::new_v4(), &client("phone")).await.unwrap();

    assert!(h.service.revoke_access_token(&tokens.access_token).await.unwrap());
    let result = h.service.validate_access_token(&tokens.access_token).await;
    assert!(matches!(result, Err(DomainError::Token(TokenError::TokenRevoked))));
}

#[tokio::test]
async fn test_blacklist_outage_fails_open() {
    let h = harness();
    let tokens = h.service.issue(Uuid::new_v4(), &client("phone")).await.unwrap();
    h.cache.set_failing(true);

    assert!(h.service.validate_access_token(&tokens.access_token).await.is_ok());
}

#[tokio::test]
async fn test_expired_access_token() {
    let h = harness();
    let now = Utc::now();
    let claims = AccessClaims::new(Uuid::new_v4(), "tokengate", "tokengate-api", Duration::minutes(15), now - Duration::hours(1));

    let result = h.service.validate_access_token(&sign(&claims)).await;
    assert!(matches!(result, Err(DomainError::Token(TokenError::TokenExpired))));
}

#[tokio::test]
async fn test_foreign_issuer_audience_or_key_is_rejected() {
    let h = harness();
    let now = Utc::now();
    let user_id = Uuid::new_v4();

    let wrong_issuer = AccessClaims::new(user_id, "someone-else", "tokengate-api", Duration::minutes(15), now);
    let wrong_audience = AccessClaims::new(user_id, "tokengate", "other-api", Duration::minutes(15), now);
    for claims in [wrong_issuer, wrong_audience] {
        let result = h.service.validate_access_token(&sign(&claims)).await;
        assert!(matches!(result, Err(DomainError::Token(TokenError::InvalidToken))));
    }

    let good = AccessClaims::new(user_id, "tokengate", "tokengate-api", Duration::minutes(15), now);
    let forged = encode(
        &Header::default(),
        &good,
        &EncodingKey::from_secret(b"another-secret-of-sufficient-length!!"),
    )
    .unwrap();
    let result = h.service.validate_access_token(&forged).await;
    assert!(matches!(result, Err(DomainError::Token(TokenError::InvalidToken))));

    let result = h.service.validate_access_token("not.a.jwt").await;
    assert!(matches!(result, Err(DomainError::Token(TokenError::InvalidToken))));
}

#[tokio::test]
async fn test_try_read_access_token_skips_verification() {
    let h = harness();
    let now = Utc::now();
    let user_id = Uuid::new_v4();

    let expired = AccessClaims::new(user_id, "tokengate", "tokengate-api", Duration::minutes(1), now - Duration::days(1));
    let forged = encode(
        &Header::default(),
        &expired,
        &EncodingKey::from_secret(b"another-secret-of-sufficient-length!!"),
    )
    .unwrap();

    let claims = h.service.try_read_access_token(&forged).unwrap();
    assert_eq!(claims.jti, expired.jti);
    assert_eq!(claims.user_id().unwrap(), user_id);
    assert_eq!(claims.exp, expired.exp);

    assert!(h.service.try_read_access_token("garbage").is_none());
}

#[tokio::test]
async fn test_revoking_expired_access_token_is_a_noop() {
    let h = harness();
    let now = Utc::now();
    let claims = AccessClaims::new(Uuid::new_v4(), "tokengate", "tokengate-api", Duration::minutes(1), now - Duration::hours(1));

    assert!(!h.service.revoke_access_token(&sign(&claims)).await.unwrap());
    assert!(h.cache.peek(&format!("blacklist:jti:{}", claims.jti)).is_none());
}
