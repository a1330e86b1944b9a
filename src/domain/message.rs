use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::status::now_unix_ms;

pub const UNKNOWN_USERNAME: &str = "Unknown User";
pub const SYSTEM_USERNAME: &str = "System";

/// Kind of a chat message as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Message,
    System,
    Notification,
}

impl MessageKind {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "message" => Some(Self::Message),
            "system" => Some(Self::System),
            "notification" => Some(Self::Notification),
            _ => None,
        }
    }
}

/// Canonical chat message. Every field is populated; inbound gaps are
/// filled by the normalizer before a value of this type exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub room_id: String,
    pub user_id: i64,
    pub username: String,
    pub chat: String,
    /// ISO-8601 timestamp as received, or the local time of synthesis.
    pub timestamp: String,
    pub kind: MessageKind,
}

impl ChatMessage {
    pub fn system(room_id: impl Into<String>, chat: impl Into<String>) -> Self {
        Self {
            id: generate_message_id("system"),
            room_id: room_id.into(),
            user_id: 0,
            username: SYSTEM_USERNAME.to_owned(),
            chat: chat.into(),
            timestamp: now_iso8601(),
            kind: MessageKind::System,
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self.kind, MessageKind::System | MessageKind::Notification)
    }
}

/// Builds a unique id from the current time plus a random suffix,
/// e.g. `msg-1718000000000-3f9c2a1bd`.
pub fn generate_message_id(prefix: &str) -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}-{}", now_unix_ms(), &random[..9])
}

pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
