//! Periodic purge of expired security state

mod job;


pub use job::{CleanupReport, RetentionJob};
