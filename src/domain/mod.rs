//! Domain layer: core entities and session state.

pub mod events;
pub mod message;
pub mod presence;
pub mod room;
pub mod session_state;
pub mod status;

/// Returns the domain module name for smoke checks.
pub fn module_name() -> &'static str {
    "domain"
}
