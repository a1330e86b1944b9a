//! Sending one chat line into the joined room.

use serde_json::json;
use thiserror::Error;

use crate::{
    domain::message::now_iso8601,
    realtime::{channel::Channel, registry::EventKind, transport::Transport},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    /// Text is empty after trimming whitespace.
    #[error("message is empty")]
    EmptyMessage,
    #[error("not connected to the room")]
    NotConnected,
}

pub trait MessageSender {
    fn is_connected(&self) -> bool;
    fn send_chat(&mut self, chat: &str, timestamp: &str);
}

impl<C: Channel> MessageSender for Transport<C> {
    fn is_connected(&self) -> bool {
        self.connected()
    }

    fn send_chat(&mut self, chat: &str, timestamp: &str) {
        self.emit(
            EventKind::SendMessage,
            json!({
                "message_type": EventKind::SendMessage.wire_token(),
                "data": {
                    "chat": chat,
                    "timestamp": timestamp,
                },
            }),
        );
    }
}

/// Trims `content` and hands it to the sender. Rejected sends are logged and
/// leave the wire untouched.
pub fn send_message(sender: &mut dyn MessageSender, content: &str) -> Result<(), SendMessageError> {
    let chat = content.trim();
    if chat.is_empty() {
        tracing::debug!("ignoring empty message");
        return Err(SendMessageError::EmptyMessage);
    }
    if !sender.is_connected() {
        tracing::warn!(code = "SEND_WHILE_DISCONNECTED", "cannot send message, room is not connected");
        return Err(SendMessageError::NotConnected);
    }

    sender.send_chat(chat, &now_iso8601());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSender {
        connected: bool,
        sent: Vec<String>,
    }

    impl MessageSender for RecordingSender {
        fn is_connected(&self) -> bool {
            self.connected
        }

        fn send_chat(&mut self, chat: &str, _timestamp: &str) {
            self.sent.push(chat.to_owned());
        }
    }

    #[test]
    fn rejects_empty_and_whitespace_only_text() {
        let mut sender = RecordingSender {
            connected: true,
            ..RecordingSender::default()
        };

        assert_eq!(send_message(&mut sender, ""), Err(SendMessageError::EmptyMessage));
        assert_eq!(send_message(&mut sender, "   "), Err(SendMessageError::EmptyMessage));
        assert!(sender.sent.is_empty());
    }

    #[test]
    fn rejects_send_while_disconnected() {
        let mut sender = RecordingSender::default();

        assert_eq!(send_message(&mut sender, "hi"), Err(SendMessageError::NotConnected));
        assert!(sender.sent.is_empty());
    }

    #[test]
    fn sends_trimmed_text() {
        let mut sender = RecordingSender {
            connected: true,
            ..RecordingSender::default()
        };

        send_message(&mut sender, "  hello there \n").expect("send should succeed");

        assert_eq!(sender.sent, ["hello there"]);
    }
}
