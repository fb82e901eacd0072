//! Tests for RS256 signing and algorithm pinning

use jsonwebtoken::{encode, EncodingKey, Header};
use std::sync::Arc;
use uuid::Uuid;

use tg_shared::config::{BlacklistConfig, JwtAlgorithm, JwtConfig};

use crate::domain::entities::token::AccessClaims;
use crate::domain::value_objects::ClientContext;
use crate::errors::{DomainError, TokenError};
use crate::repositories::{MockCacheStore, MockOutboxRepository, MockRefreshTokenRepository};
use crate::services::blacklist::TokenBlacklist;
use crate::services::outbox::SecurityEventPublisher;
use crate::services::token::{SigningKeys, TokenService, TokenServiceConfig};

const TEST_PRIVATE_KEY: &str = include_str!("fixtures/jwt_private_key.pem");
const TEST_PUBLIC_KEY: &str = include_str!("fixtures/jwt_public_key.pem");

fn rs256_service() -> TokenService<MockRefreshTokenRepository, MockCacheStore> {
    let keys = SigningKeys::rs256_from_pem(TEST_PRIVATE_KEY.as_bytes(), TEST_PUBLIC_KEY.as_bytes())
        .expect("Failed to load test keys");
    TokenService::new(
        Arc::new(MockRefreshTokenRepository::new()),
        Arc::new(TokenBlacklist::new(Arc::new(MockCacheStore::new()), BlacklistConfig::default())),
        SecurityEventPublisher::new(Arc::new(MockOutboxRepository::new())),
        keys,
        TokenServiceConfig::default(),
    )
}

#[tokio::test]
async fn test_rs256_issue_and_validate() {
    let service = rs256_service();
    let user_id = Uuid::new_v4();

    let tokens = service
        .issue(user_id, &ClientContext::new("203.0.113.1", "agent", "phone"))
        .await
        .unwrap();

    let header = jsonwebtoken::decode_header(&tokens.access_token).unwrap();
    assert_eq!(header.alg, jsonwebtoken::Algorithm::RS256);

    let claims = service.validate_access_token(&tokens.access_token).await.unwrap();
    assert_eq!(claims.user_id().unwrap(), user_id);
}

#[tokio::test]
async fn test_rs256_rejects_hs256_token() {
    let service = rs256_service();
    let claims = AccessClaims::new(
        Uuid::new_v4(),
        "tokengate",
        "tokengate-api",
        chrono::Duration::minutes(15),
        chrono::Utc::now(),
    );

    // Algorithm substitution: HMAC keyed with the public key
    let substituted = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_PUBLIC_KEY.as_bytes()),
    )
    .unwrap();

    let result = service.validate_access_token(&substituted).await;
    assert!(matches!(result, Err(DomainError::Token(TokenError::InvalidToken))));
}

#[test]
fn test_invalid_pem_is_rejected() {
    let result = SigningKeys::rs256_from_pem(b"not a key", TEST_PUBLIC_KEY.as_bytes());
    assert!(matches!(
        result,
        Err(DomainError::Token(TokenError::KeyLoadError { .. }))
    ));
}

#[test]
fn test_rs256_config_requires_key_paths() {
    let config = JwtConfig {
        algorithm: JwtAlgorithm::RS256,
        ..JwtConfig::default()
    };
    assert!(matches!(
        SigningKeys::from_config(&config),
        Err(DomainError::Token(TokenError::KeyLoadError { .. }))
    ));
}

#[test]
fn test_missing_key_files_are_reported() {
    let config = JwtConfig {
        algorithm: JwtAlgorithm::RS256,
        private_key_path: Some("/nonexistent/private.pem".to_string()),
        public_key_path: Some("/nonexistent/public.pem".to_string()),
        ..JwtConfig::default()
    };
    assert!(matches!(
        SigningKeys::from_config(&config),
        Err(DomainError::Token(TokenError::KeyLoadError { .. }))
    ));
}

#[test]
fn test_hs256_from_config() {
    let keys = SigningKeys::from_config(&JwtConfig::with_secret("x".repeat(32))).unwrap();
    assert_eq!(keys.algorithm(), jsonwebtoken::Algorithm::HS256);
}
