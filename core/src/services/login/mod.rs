//! Password login orchestration

mod service;


pub use service::{LoginService, LoginServiceConfig};
