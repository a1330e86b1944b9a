use super::{message::ChatMessage, presence::PresenceSnapshot};

/// UI-facing state of one joined room: ordered message log, presence and
/// connection flags.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    messages: Vec<ChatMessage>,
    presence: PresenceSnapshot,
    connected: bool,
    connection_lost: bool,
    history_requested: bool,
}

impl SessionState {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn presence(&self) -> &PresenceSnapshot {
        &self.presence
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// True once reconnection has been exhausted for the current transport.
    pub fn is_connection_lost(&self) -> bool {
        self.connection_lost
    }

    /// Appends in arrival order. Returns false when the id is already logged.
    pub fn append_message(&mut self, message: ChatMessage) -> bool {
        if self.messages.iter().any(|known| known.id == message.id) {
            return false;
        }

        self.messages.push(message);
        true
    }

    pub fn replace_messages(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
    }

    pub fn clear_messages(&mut self) {
        self.messages.clear();
    }

    pub fn set_presence(&mut self, presence: PresenceSnapshot) {
        self.presence = presence;
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
        if connected {
            self.connection_lost = false;
        }
    }

    pub fn mark_connection_lost(&mut self) {
        self.connected = false;
        self.connection_lost = true;
    }

    pub fn request_history(&mut self) {
        self.history_requested = true;
    }

    pub fn take_history_request(&mut self) -> bool {
        std::mem::take(&mut self.history_requested)
    }
}
