use std::time::Duration;

use thiserror::Error;

/// Inputs the physical link feeds into the transport state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Opened,
    /// One physical text message; may hold several newline-separated documents.
    Frame(String),
    /// Link failure. A connection may report `Closed` after it as well.
    Error(String),
    Closed(String),
    TimerFired,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("channel is not open")]
    NotOpen,
    #[error("channel writer is gone")]
    WriterClosed,
}

/// Physical connection plus the reconnect timer the transport arms on it.
///
/// Implementations report progress asynchronously as [`LinkEvent`]s; none of
/// these calls block.
pub trait Channel {
    fn open(&mut self, url: &str);
    fn send(&mut self, frame: String) -> Result<(), ChannelError>;
    fn close(&mut self);
    fn arm_timer(&mut self, delay: Duration);
    fn disarm_timer(&mut self);

    /// Whether a signal tagged with `epoch` still belongs to the live
    /// connection. Channels without epochs accept everything.
    fn is_current(&self, _epoch: u64) -> bool {
        true
    }
}
