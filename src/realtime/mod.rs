//! Realtime layer: event registry, frame normalization and the reconnecting
//! room transport.

pub mod bus;
pub mod channel;
pub mod event;
pub mod normalizer;
pub mod registry;
pub mod transport;
pub mod ws;

/// Returns the realtime module name for smoke checks.
pub fn module_name() -> &'static str {
    "realtime"
}
