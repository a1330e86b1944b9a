//! Maps one parsed inbound JSON document onto typed events.
//!
//! Frame shapes are tried in a fixed order, first match wins:
//!
//! 1. `Enveloped`: `{ type, payload }`; the enclosed type selects the kind.
//!    An echoed `send_message` envelope becomes `MessageReceived`, enriched
//!    with sender fields from the outer object.
//! 2. `Direct`: `{ id, chat | content, userId }`, a complete message.
//! 3. `Typed`: a known inbound `type` without a payload wrapper.
//! 4. `Unrecognized`: anything else, routed as generic `Message`, plus a
//!    `MessageReceived` fallback when it carries chat-like content.

use serde_json::{Map, Value};

use crate::domain::{
    message::{generate_message_id, now_iso8601, ChatMessage, MessageKind, UNKNOWN_USERNAME},
    presence::{PresenceMember, PresenceSnapshot},
};

use super::{
    event::{Event, EventPayload},
    registry::{self, EventKind},
};

const SENDER_ID_FIELDS: [&str; 4] = ["senderId", "sender_id", "userId", "user_id"];
const SENDER_NAME_FIELDS: [&str; 4] = ["senderName", "sender_name", "username", "user_name"];
const ENVELOPE_ID_FIELDS: [&str; 4] = ["userId", "user_id", "senderId", "sender_id"];
const ENVELOPE_NAME_FIELDS: [&str; 4] = ["username", "user_name", "senderName", "sender_name"];
const CONTENT_FIELDS: [&str; 3] = ["chat", "content", "message"];

/// Inbound kinds recognised without a payload wrapper.
const BARE_TYPED_KINDS: [EventKind; 4] = [
    EventKind::MessageReceived,
    EventKind::UserJoined,
    EventKind::UserLeft,
    EventKind::UserCount,
];

#[derive(Debug, Clone, PartialEq)]
enum FrameShape {
    Enveloped { kind: EventKind, payload: Value },
    Direct(Value),
    Typed { kind: EventKind, object: Value },
    Unrecognized(Value),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalizer {
    room_id: String,
}

impl Normalizer {
    pub fn new(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn normalize(&self, value: Value) -> Vec<Event> {
        match classify(value) {
            FrameShape::Enveloped { kind, payload } => vec![self.shape(kind, payload)],
            FrameShape::Direct(object) => vec![self.shape(EventKind::MessageReceived, object)],
            FrameShape::Typed { kind, object } => {
                let payload = if kind == EventKind::UserCount {
                    count_source(object)
                } else {
                    object
                };
                vec![self.shape(kind, payload)]
            }
            FrameShape::Unrecognized(value) => {
                let fallback = has_any_field(&value, &["chat", "message"])
                    .then(|| self.shape(EventKind::MessageReceived, value.clone()));
                let mut events = vec![Event::new(EventKind::Message, EventPayload::Raw(value))];
                events.extend(fallback);
                events
            }
        }
    }

    /// Builds a canonical message from any message-like payload, filling
    /// every missing field.
    pub fn message_from_payload(&self, payload: &Value) -> ChatMessage {
        let id = string_field(payload, &["id"])
            .unwrap_or_else(|| generate_message_id("msg"));
        let chat = string_field(payload, &CONTENT_FIELDS).unwrap_or_else(|| match payload {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        });
        let room_id =
            string_field(payload, &["roomId", "room_id"]).unwrap_or_else(|| self.room_id.clone());

        ChatMessage {
            id,
            room_id,
            user_id: int_field(payload, &SENDER_ID_FIELDS).unwrap_or(0),
            username: string_field(payload, &SENDER_NAME_FIELDS)
                .unwrap_or_else(|| UNKNOWN_USERNAME.to_owned()),
            chat,
            timestamp: string_field(payload, &["timestamp"]).unwrap_or_else(now_iso8601),
            kind: string_field(payload, &["type"])
                .and_then(|label| MessageKind::from_label(&label))
                .unwrap_or_default(),
        }
    }

    fn shape(&self, kind: EventKind, payload: Value) -> Event {
        let payload = match kind {
            EventKind::MessageReceived => EventPayload::Message(self.message_from_payload(&payload)),
            EventKind::SystemMessage => {
                let chat = string_field(&payload, &CONTENT_FIELDS).unwrap_or_default();
                EventPayload::Message(ChatMessage::system(self.room_id.clone(), chat))
            }
            EventKind::UserCount => EventPayload::Presence(presence_from(&payload)),
            EventKind::UserJoined | EventKind::UserLeft => {
                EventPayload::Member(member_from(&payload))
            }
            _ => EventPayload::Raw(payload),
        };
        Event::new(kind, payload)
    }
}

fn classify(value: Value) -> FrameShape {
    let Value::Object(object) = value else {
        return FrameShape::Unrecognized(value);
    };

    if let (Some(token), Some(payload)) = (
        non_empty_str(object.get("type")),
        object.get("payload").filter(|p| !p.is_null()),
    ) {
        let kind = registry::resolve(token);
        if kind == EventKind::SendMessage {
            return FrameShape::Enveloped {
                kind: EventKind::MessageReceived,
                payload: enrich_echo(payload.clone(), &object),
            };
        }
        return FrameShape::Enveloped {
            kind,
            payload: payload.clone(),
        };
    }

    if is_direct_message(&object) {
        return FrameShape::Direct(Value::Object(object));
    }

    if let Some(kind) = non_empty_str(object.get("type"))
        .and_then(registry::lookup)
        .filter(|kind| BARE_TYPED_KINDS.contains(kind))
    {
        return FrameShape::Typed {
            kind,
            object: Value::Object(object),
        };
    }

    FrameShape::Unrecognized(Value::Object(object))
}

fn is_direct_message(object: &Map<String, Value>) -> bool {
    let has_id = object.get("id").is_some_and(is_present);
    let has_content = ["chat", "content"]
        .iter()
        .any(|field| object.get(*field).is_some_and(is_present));
    let has_user = object.get("userId").is_some_and(|v| !v.is_null());

    has_id && has_content && has_user
}

/// Copies sender identity from the outer envelope into the payload so the
/// echoed message is attributed to its author.
fn enrich_echo(payload: Value, envelope: &Map<String, Value>) -> Value {
    let mut enriched = match payload {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("chat".to_owned(), other);
            map
        }
    };

    let outer = Value::Object(envelope.clone());
    if let Some(user_id) = first_present(&outer, &ENVELOPE_ID_FIELDS) {
        enriched.insert("userId".to_owned(), user_id.clone());
    }
    if let Some(username) = first_present(&outer, &ENVELOPE_NAME_FIELDS) {
        enriched.insert("username".to_owned(), username.clone());
    }

    Value::Object(enriched)
}

/// `count`, then `payload`, then the object itself.
fn count_source(object: Value) -> Value {
    if object.get("count").and_then(count_value).is_some() {
        return object;
    }
    match object.get("payload") {
        Some(payload) if !payload.is_null() => payload.clone(),
        _ => object,
    }
}

fn presence_from(value: &Value) -> PresenceSnapshot {
    let users: Vec<PresenceMember> = value
        .get("users")
        .and_then(Value::as_array)
        .map(|users| users.iter().map(member_from).collect())
        .unwrap_or_default();

    let count = count_value(value)
        .or_else(|| {
            ["count", "userCount", "user_count"]
                .iter()
                .find_map(|field| value.get(*field).and_then(count_value))
        })
        .unwrap_or(users.len() as u64);

    PresenceSnapshot::new(count, users)
}

/// Servers send counts as numbers or numeric strings.
fn count_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn member_from(value: &Value) -> PresenceMember {
    PresenceMember {
        user_id: int_field(value, &["userId", "user_id", "id"]).unwrap_or(0),
        username: string_field(value, &["username", "user_name", "name"])
            .unwrap_or_else(|| UNKNOWN_USERNAME.to_owned()),
        avatar: string_field(value, &["avatar"]),
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(text) => !text.is_empty(),
        Value::Number(number) => number.as_f64() != Some(0.0),
        _ => true,
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|text| !text.is_empty())
}

fn has_any_field(value: &Value, fields: &[&str]) -> bool {
    first_present(value, fields).is_some()
}

fn first_present<'a>(value: &'a Value, fields: &[&str]) -> Option<&'a Value> {
    fields
        .iter()
        .filter_map(|field| value.get(*field))
        .find(|candidate| is_present(candidate))
}

fn string_field(value: &Value, fields: &[&str]) -> Option<String> {
    first_present(value, fields).and_then(|found| match found {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

fn int_field(value: &Value, fields: &[&str]) -> Option<i64> {
    first_present(value, fields).and_then(|found| match found {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    })
}
