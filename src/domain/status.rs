use std::time::{SystemTime, UNIX_EPOCH};

/// Lifecycle of one transport instance.
///
/// `Idle -> Connecting -> Open -> {Closed -> Reconnecting -> Connecting} | Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Open,
    Closed,
    Reconnecting,
    Failed,
}

impl ConnectionState {
    pub fn as_label(self) -> &'static str {
        match self {
            Self::Idle => "CONNECTION_IDLE",
            Self::Connecting => "CONNECTION_CONNECTING",
            Self::Open => "CONNECTION_OPEN",
            Self::Closed => "CONNECTION_CLOSED",
            Self::Reconnecting => "CONNECTION_RECONNECTING",
            Self::Failed => "CONNECTION_FAILED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    pub reconnect_attempt: u32,
}

pub fn now_unix_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}
