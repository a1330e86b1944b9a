use serde_json::Value;

use crate::domain::{
    message::ChatMessage,
    presence::{PresenceMember, PresenceSnapshot},
};

use super::registry::EventKind;

#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Empty,
    /// Close or error reason for lifecycle events.
    Reason(String),
    Message(ChatMessage),
    Presence(PresenceSnapshot),
    Member(PresenceMember),
    Raw(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(kind: EventKind, payload: EventPayload) -> Self {
        Self { kind, payload }
    }

    pub fn bare(kind: EventKind) -> Self {
        Self::new(kind, EventPayload::Empty)
    }

    pub fn message(&self) -> Option<&ChatMessage> {
        match &self.payload {
            EventPayload::Message(message) => Some(message),
            _ => None,
        }
    }

    pub fn presence(&self) -> Option<&PresenceSnapshot> {
        match &self.payload {
            EventPayload::Presence(presence) => Some(presence),
            _ => None,
        }
    }

    pub fn member(&self) -> Option<&PresenceMember> {
        match &self.payload {
            EventPayload::Member(member) => Some(member),
            _ => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::Reason(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn raw(&self) -> Option<&Value> {
        match &self.payload {
            EventPayload::Raw(value) => Some(value),
            _ => None,
        }
    }
}
