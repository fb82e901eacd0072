//! Signing key material for access tokens

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use std::fs;
use std::path::Path;

use tg_shared::config::{JwtAlgorithm, JwtConfig};

use crate::errors::{DomainError, TokenError};

/// Encoding and decoding keys for the one algorithm this deployment accepts
#[derive(Clone)]
pub struct SigningKeys {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for SigningKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeys")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl SigningKeys {
    pub fn hs256(secret: &[u8]) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Build RS256 keys from PEM-encoded private and public keys
    pub fn rs256_from_pem(private_pem: &[u8], public_pem: &[u8]) -> Result<Self, DomainError> {
        let encoding = EncodingKey::from_rsa_pem(private_pem).map_err(|e| key_error("Invalid private key format", e))?;
        let decoding = DecodingKey::from_rsa_pem(public_pem).map_err(|e| key_error("Invalid public key format", e))?;
        Ok(Self {
            algorithm: Algorithm::RS256,
            encoding,
            decoding,
        })
    }

    pub fn rs256_from_files<P: AsRef<Path>>(private_key_path: P, public_key_path: P) -> Result<Self, DomainError> {
        let private_pem = fs::read(private_key_path.as_ref()).map_err(|e| key_error("Failed to read private key", e))?;
        let public_pem = fs::read(public_key_path.as_ref()).map_err(|e| key_error("Failed to read public key", e))?;
        Self::rs256_from_pem(&private_pem, &public_pem)
    }

    pub fn from_config(config: &JwtConfig) -> Result<Self, DomainError> {
        match config.algorithm {
            JwtAlgorithm::HS256 => Ok(Self::hs256(config.secret.as_bytes())),
            JwtAlgorithm::RS256 => {
                let (Some(private), Some(public)) = (&config.private_key_path, &config.public_key_path) else {
                    return Err(DomainError::Token(TokenError::KeyLoadError {
                        message: "RS256 requires private_key_path and public_key_path".to_string(),
                    }));
                };
                Self::rs256_from_files(private, public)
            }
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }
}

fn key_error(context: &str, e: impl std::fmt::Display) -> DomainError {
    DomainError::Token(TokenError::KeyLoadError {
        message: format!("{}: {}", context, e),
    })
}
