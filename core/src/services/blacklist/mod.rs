//! Access token revocation markers

mod service;

#[cfg(test)]
mod tests;

pub use service::TokenBlacklist;
