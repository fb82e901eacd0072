//! Login attempt log and account lockout

mod recorder;
mod service;

#[cfg(test)]
mod tests;

pub use recorder::LoginAttemptRecorder;
pub use service::LockoutService;
