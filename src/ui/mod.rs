//! UI layer: console rendering and line input for a joined room.

pub mod console;
pub mod event_source;
mod message_rendering;
pub mod shell;
mod styles;

pub use console::ConsoleRenderer;
pub use event_source::LineEventSource;

/// Returns the UI module name for smoke checks.
pub fn module_name() -> &'static str {
    "ui"
}
