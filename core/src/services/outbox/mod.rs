//! Security event outbox: best-effort publishing and background dispatch

mod dispatcher;
mod publisher;


pub use dispatcher::{DispatchReport, EventSink, OutboxDispatcher, TracingEventSink};
pub use publisher::SecurityEventPublisher;
