//! OTP (one-time code) authentication
//!
//! Phone-based login: send a short numeric code over SMS, verify it, then
//! confirm the phone, register the device and issue tokens.

mod code;
mod config;
mod delay;
mod delivery;
mod service;


pub use code::{codes_match, generate_numeric_code, hash_code};
pub use config::OtpAuthConfig;
pub use delay::UniformDelay;
pub use delivery::{deliver_with_retry, DeliveryPolicy, SmsSender};
pub use service::OtpAuthService;
