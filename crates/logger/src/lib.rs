//! Tracing setup shared by the Pulse binaries.

mod subscriber;

pub use subscriber::{LogFormat, init_tracing_with};
