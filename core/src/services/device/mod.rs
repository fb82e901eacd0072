//! Device registry: device tracking and time-bounded trust

mod registry;


pub use registry::DeviceRegistry;
