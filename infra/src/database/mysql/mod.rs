//! MySQL implementations of the `tg_core` store contracts

mod device_repository_impl;
mod identity_store_impl;
mod login_attempt_repository_impl;
mod otp_repository_impl;
mod outbox_repository_impl;
mod token_repository_impl;

pub use device_repository_impl::MySqlDeviceRepository;
pub use identity_store_impl::MySqlIdentityStore;
pub use login_attempt_repository_impl::MySqlLoginAttemptRepository;
pub use otp_repository_impl::MySqlOtpRepository;
pub use outbox_repository_impl::MySqlOutboxRepository;
pub use token_repository_impl::MySqlRefreshTokenRepository;

use std::fmt::Display;
use tracing::error;
use uuid::Uuid;

use tg_core::errors::DomainError;

/// Map a driver error to `Unavailable`, logging the operation that failed
pub(crate) fn store_error(operation: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| {
        error!(operation = operation, error = %e, "MySQL operation failed");
        DomainError::unavailable(format!("{}: {}", operation, e))
    }
}

/// A stored value could not be turned back into a domain type
pub(crate) fn decode_error(column: &str, e: impl Display) -> DomainError {
    DomainError::internal(format!("Failed to decode {}: {}", column, e))
}

pub(crate) fn parse_uuid(column: &str, value: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(value).map_err(|e| decode_error(column, e))
}

pub(crate) fn parse_optional_uuid(column: &str, value: Option<String>) -> Result<Option<Uuid>, DomainError> {
    value.map(|v| parse_uuid(column, &v)).transpose()
}
