//! Main token service implementation

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, Header, Validation};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::entities::outbox::SecurityEvent;
use crate::domain::entities::token::{AccessClaims, IssuedTokens, RefreshToken, RevocationReason};
use crate::domain::value_objects::ClientContext;
use crate::errors::{DomainError, DomainResult, TokenError};
use crate::repositories::{CacheStore, RefreshTokenRepository, RotationOutcome};
use crate::services::blacklist::TokenBlacklist;
use crate::services::outbox::SecurityEventPublisher;

use super::config::TokenServiceConfig;
use super::keys::SigningKeys;

const REFRESH_TOKEN_BYTES: usize = 32;

/// SHA-256 hex digest under which a refresh token is stored
pub fn hash_refresh_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Service for issuing, rotating and revoking tokens
///
/// Refresh tokens form rotation chains in the repository. Presenting a token
/// that has already been revoked is treated as theft: every active session of
/// the user is revoked and outstanding access tokens are cut off through the
/// per-user blacklist marker.
pub struct TokenService<R: RefreshTokenRepository, C: CacheStore> {
    repository: Arc<R>,
    blacklist: Arc<TokenBlacklist<C>>,
    events: SecurityEventPublisher,
    keys: SigningKeys,
    validation: Validation,
    config: TokenServiceConfig,
}

impl<R: RefreshTokenRepository, C: CacheStore> TokenService<R, C> {
    pub fn new(
        repository: Arc<R>,
        blacklist: Arc<TokenBlacklist<C>>,
        events: SecurityEventPublisher,
        keys: SigningKeys,
        config: TokenServiceConfig,
    ) -> Self {
        let mut validation = Validation::new(keys.algorithm());
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.validate_exp = true;
        validation.validate_nbf = true;

        Self {
            repository,
            blacklist,
            events,
            keys,
            validation,
            config,
        }
    }

    pub fn config(&self) -> &TokenServiceConfig {
        &self.config
    }

    /// Issue a fresh token pair for a login on `client.device_id`
    ///
    /// Any token still active for the same (user, device) is revoked with
    /// `new_login` in the same write. Store failures fail the issuance.
    pub async fn issue(&self, user_id: Uuid, client: &ClientContext) -> DomainResult<IssuedTokens> {
        let now = Utc::now();
        let (plaintext, token_hash) = generate_refresh_token();
        let refresh = RefreshToken::new(
            user_id,
            token_hash,
            client.device_id.as_str(),
            client.ip_address.as_str(),
            client.user_agent.as_str(),
            self.config.refresh_token_ttl,
            now,
        );

        let superseded = self.repository.insert_superseding(&refresh, now).await?;
        if superseded > 0 {
            info!(
                user_id = %user_id,
                device_id = %client.device_id,
                superseded = superseded,
                "Superseded previous session on device"
            );
        }

        self.build_pair(&refresh, plaintext, now)
    }

    /// Exchange a refresh token for a new pair
    ///
    /// Every rejection returns `TokenError::InvalidRefreshToken`; the cause is
    /// only logged.
    pub async fn refresh(&self, refresh_token: &str) -> DomainResult<IssuedTokens> {
        let now = Utc::now();
        let token_hash = hash_refresh_token(refresh_token);

        let Some(current) = self.repository.find_by_hash(&token_hash).await? else {
            debug!("Refresh token not found");
            return Err(DomainError::invalid_refresh_token());
        };

        if current.is_revoked() {
            self.handle_reuse(&current, now).await;
            return Err(DomainError::invalid_refresh_token());
        }

        if current.is_expired(now) {
            debug!(token_id = %current.id, user_id = %current.user_id, "Refresh token expired");
            return Err(DomainError::invalid_refresh_token());
        }

        let (plaintext, child_hash) = generate_refresh_token();
        let child = current.child(child_hash, self.config.refresh_token_ttl, now);

        match self.repository.rotate(current.id, &child, now).await? {
            RotationOutcome::Rotated => {
                debug!(
                    user_id = %current.user_id,
                    parent_id = %current.id,
                    token_id = %child.id,
                    "Refresh token rotated"
                );
                self.build_pair(&child, plaintext, now)
            }
            RotationOutcome::AlreadyRevoked => {
                warn!(
                    user_id = %current.user_id,
                    token_id = %current.id,
                    event = "refresh_rotation_conflict",
                    "Concurrent refresh lost the rotation race"
                );
                Err(DomainError::invalid_refresh_token())
            }
        }
    }

    async fn handle_reuse(&self, token: &RefreshToken, now: DateTime<Utc>) {
        warn!(
            user_id = %token.user_id,
            token_id = %token.id,
            device_id = %token.device_id,
            revoked_reason = ?token.revoked_reason,
            event = "refresh_token_reuse",
            "Revoked refresh token presented, revoking all sessions"
        );

        let tokens_revoked = match self
            .repository
            .revoke_all_for_user(token.user_id, RevocationReason::ReuseDetected, now)
            .await
        {
            Ok(count) => count,
            Err(e) => {
                error!(user_id = %token.user_id, error = %e, "Failed to revoke sessions after reuse");
                0
            }
        };

        if let Err(e) = self.blacklist.revoke_user(token.user_id, now).await {
            error!(user_id = %token.user_id, error = %e, "Failed to set user revocation marker after reuse");
        }

        self.events
            .publish(SecurityEvent::RefreshTokenReuse {
                user_id: token.user_id,
                token_id: token.id,
                device_id: token.device_id.clone(),
                revoked_reason: token.revoked_reason,
                tokens_revoked,
            })
            .await;
    }

    /// Revoke one refresh token of `user_id`
    ///
    /// Idempotent: unknown, foreign or already revoked tokens still succeed.
    pub async fn revoke(&self, refresh_token: &str, user_id: Uuid) -> DomainResult<()> {
        let token_hash = hash_refresh_token(refresh_token);
        let Some(token) = self.repository.find_by_hash(&token_hash).await? else {
            return Ok(());
        };

        if token.user_id != user_id {
            warn!(
                user_id = %user_id,
                owner_id = %token.user_id,
                "Refusing to revoke a refresh token owned by another user"
            );
            return Ok(());
        }

        if self
            .repository
            .revoke_if_active(token.id, RevocationReason::Manual, Utc::now())
            .await?
        {
            info!(user_id = %user_id, token_id = %token.id, "Refresh token revoked");
        }
        Ok(())
    }

    /// Revoke every active session of the user and cut off their access tokens
    ///
    /// # Returns
    /// * `Ok(u64)` - Number of refresh tokens revoked
    pub async fn revoke_all(&self, user_id: Uuid) -> DomainResult<u64> {
        let now = Utc::now();
        let revoked = self
            .repository
            .revoke_all_for_user(user_id, RevocationReason::GlobalLogout, now)
            .await?;
        self.blacklist.revoke_user(user_id, now).await?;

        info!(user_id = %user_id, revoked = revoked, "All sessions revoked");
        self.events
            .publish(SecurityEvent::SessionsRevoked {
                user_id,
                reason: RevocationReason::GlobalLogout,
                tokens_revoked: revoked,
            })
            .await;
        Ok(revoked)
    }

    /// Blacklist an access token by `jti` until `expires_at`
    pub async fn revoke_access_jti(&self, jti: &str, expires_at: DateTime<Utc>) -> DomainResult<bool> {
        self.blacklist.revoke_token(jti, expires_at, Utc::now()).await
    }

    /// Blacklist a presented access token using its own `jti` and `exp`
    pub async fn revoke_access_token(&self, access_token: &str) -> DomainResult<bool> {
        let claims = self
            .try_read_access_token(access_token)
            .ok_or(DomainError::Token(TokenError::InvalidToken))?;
        let expires_at = claims
            .expires_at()
            .ok_or(DomainError::Token(TokenError::InvalidToken))?;
        self.revoke_access_jti(&claims.jti, expires_at).await
    }

    /// Read claims without verifying the signature or expiry
    ///
    /// For introspection and logging only; never authorize on the result.
    pub fn try_read_access_token(&self, access_token: &str) -> Option<AccessClaims> {
        let mut validation = Validation::new(self.keys.algorithm());
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        decode::<AccessClaims>(access_token, &DecodingKey::from_secret(&[]), &validation)
            .map(|data| data.claims)
            .ok()
    }

    /// Verify signature, algorithm, issuer, audience and expiry, then the blacklist
    pub async fn validate_access_token(&self, access_token: &str) -> DomainResult<AccessClaims> {
        let claims = decode::<AccessClaims>(access_token, self.keys.decoding_key(), &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => DomainError::Token(TokenError::TokenExpired),
                _ => DomainError::Token(TokenError::InvalidToken),
            })?
            .claims;

        let user_id = claims
            .user_id()
            .map_err(|_| DomainError::Token(TokenError::InvalidToken))?;

        if self.blacklist.is_revoked(&claims.jti).await {
            return Err(DomainError::Token(TokenError::TokenRevoked));
        }
        if self.blacklist.is_user_revoked(user_id, claims.iat).await {
            return Err(DomainError::Token(TokenError::TokenRevoked));
        }
        Ok(claims)
    }

    /// Active refresh tokens of the user, one per signed-in device
    pub async fn active_sessions(&self, user_id: Uuid) -> DomainResult<Vec<RefreshToken>> {
        self.repository.find_active_for_user(user_id, Utc::now()).await
    }

    fn build_pair(
        &self,
        refresh: &RefreshToken,
        refresh_plaintext: String,
        now: DateTime<Utc>,
    ) -> DomainResult<IssuedTokens> {
        let claims = AccessClaims::new(
            refresh.user_id,
            &self.config.issuer,
            &self.config.audience,
            self.config.access_token_ttl,
            now,
        );
        let access_token = encode(&Header::new(self.keys.algorithm()), &claims, self.keys.encoding_key())
            .map_err(|e| {
                error!(user_id = %refresh.user_id, error = %e, "Failed to sign access token");
                DomainError::Token(TokenError::TokenGenerationFailed)
            })?;

        Ok(IssuedTokens {
            access_token,
            refresh_token: refresh_plaintext,
            token_type: "Bearer".to_string(),
            access_expires_at: now + self.config.access_token_ttl,
            refresh_expires_at: refresh.expires_at,
            refresh_token_id: refresh.id,
            jti: claims.jti,
        })
    }
}

/// Random opaque refresh token and its storage hash
fn generate_refresh_token() -> (String, String) {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let token = URL_SAFE_NO_PAD.encode(bytes);
    let hash = hash_refresh_token(&token);
    (token, hash)
}
