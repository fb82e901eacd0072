//! Code generation and keyed hashing

use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::Rng;
use sha2::Sha256;

use crate::errors::{DomainError, DomainResult};

type HmacSha256 = Hmac<Sha256>;

/// Uniformly random decimal code from the OS CSPRNG
pub fn generate_numeric_code(length: usize) -> String {
    let mut rng = OsRng;
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// HMAC-SHA256 over `phone:code`, hex encoded
///
/// Binding the phone number means a hash leaked for one number is useless
/// for any other.
pub fn hash_code(secret: &str, phone: &str, code: &str) -> DomainResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| DomainError::internal(format!("Invalid OTP key: {}", e)))?;
    mac.update(phone.as_bytes());
    mac.update(b":");
    mac.update(code.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time comparison of two code hashes
pub fn codes_match(stored_hash: &str, candidate_hash: &str) -> bool {
    if stored_hash.len() != candidate_hash.len() {
        return false;
    }
    constant_time_eq(stored_hash.as_bytes(), candidate_hash.as_bytes())
}
