//! Closed set of event kinds exchanged with the room server and their wire
//! tokens. Transport and normalizer both resolve names through this table.

/// Which way an event kind travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Produced by the server or raised by the transport itself for
    /// connection lifecycle. Delivered to local listeners only.
    InboundOnly,
    /// Client command written to the wire by `emit`.
    OutboundOnly,
    /// Written to the wire by `emit` and also consumed in-process, like the
    /// session credentials sent on every (re)connect.
    BidirectionalLocal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Connect,
    Disconnect,
    ConnectError,
    /// Generic or unrecognized server frame.
    Message,
    MessageReceived,
    MessageHistory,
    SystemMessage,
    UserJoined,
    UserLeft,
    UserCount,
    SendMessage,
    JoinRoom,
    Authenticate,
    LeaveRoom,
    ReconnectFailed,
}

struct Entry {
    kind: EventKind,
    token: &'static str,
    direction: Direction,
}

const REGISTRY: [Entry; 15] = [
    Entry {
        kind: EventKind::Connect,
        token: "connect",
        direction: Direction::InboundOnly,
    },
    Entry {
        kind: EventKind::Disconnect,
        token: "disconnect",
        direction: Direction::InboundOnly,
    },
    Entry {
        kind: EventKind::ConnectError,
        token: "connect_error",
        direction: Direction::InboundOnly,
    },
    Entry {
        kind: EventKind::Message,
        token: "message",
        direction: Direction::InboundOnly,
    },
    Entry {
        kind: EventKind::MessageReceived,
        token: "message_received",
        direction: Direction::InboundOnly,
    },
    Entry {
        kind: EventKind::MessageHistory,
        token: "message_history",
        direction: Direction::InboundOnly,
    },
    Entry {
        kind: EventKind::SystemMessage,
        token: "system_message",
        direction: Direction::InboundOnly,
    },
    Entry {
        kind: EventKind::UserJoined,
        token: "user_joined",
        direction: Direction::InboundOnly,
    },
    Entry {
        kind: EventKind::UserLeft,
        token: "user_left",
        direction: Direction::InboundOnly,
    },
    Entry {
        kind: EventKind::UserCount,
        token: "user_count",
        direction: Direction::InboundOnly,
    },
    Entry {
        kind: EventKind::SendMessage,
        token: "send_message",
        direction: Direction::OutboundOnly,
    },
    Entry {
        kind: EventKind::JoinRoom,
        token: "join_room",
        direction: Direction::OutboundOnly,
    },
    Entry {
        kind: EventKind::Authenticate,
        token: "authenticate",
        direction: Direction::BidirectionalLocal,
    },
    Entry {
        kind: EventKind::LeaveRoom,
        token: "leave_room",
        direction: Direction::OutboundOnly,
    },
    Entry {
        kind: EventKind::ReconnectFailed,
        token: "reconnect_failed",
        direction: Direction::InboundOnly,
    },
];

/// Extra inbound spellings accepted from the server.
const ALIASES: [(&str, EventKind); 1] = [("new_message", EventKind::MessageReceived)];

impl EventKind {
    pub const ALL: [EventKind; 15] = [
        EventKind::Connect,
        EventKind::Disconnect,
        EventKind::ConnectError,
        EventKind::Message,
        EventKind::MessageReceived,
        EventKind::MessageHistory,
        EventKind::SystemMessage,
        EventKind::UserJoined,
        EventKind::UserLeft,
        EventKind::UserCount,
        EventKind::SendMessage,
        EventKind::JoinRoom,
        EventKind::Authenticate,
        EventKind::LeaveRoom,
        EventKind::ReconnectFailed,
    ];

    pub fn wire_token(self) -> &'static str {
        entry(self).token
    }

    pub fn direction(self) -> Direction {
        entry(self).direction
    }

    /// Outbound and bidirectional-local kinds are framed onto the wire.
    pub fn is_outgoing(self) -> bool {
        self.direction() != Direction::InboundOnly
    }
}

fn entry(kind: EventKind) -> &'static Entry {
    REGISTRY
        .iter()
        .find(|entry| entry.kind == kind)
        .unwrap_or(&REGISTRY[3])
}

/// Strict lookup: `None` for tokens the registry does not know.
pub fn lookup(token: &str) -> Option<EventKind> {
    REGISTRY
        .iter()
        .find(|entry| entry.token == token)
        .map(|entry| entry.kind)
        .or_else(|| {
            ALIASES
                .iter()
                .find(|(alias, _)| *alias == token)
                .map(|(_, kind)| *kind)
        })
}

/// Unknown tokens resolve to the generic `Message` kind so the raw payload
/// still reaches listeners.
pub fn resolve(token: &str) -> EventKind {
    lookup(token).unwrap_or(EventKind::Message)
}

pub fn wire_token_of(kind: EventKind) -> &'static str {
    kind.wire_token()
}

pub fn is_outgoing(kind: EventKind) -> bool {
    kind.is_outgoing()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_distinct_token_that_resolves_back() {
        let mut tokens: Vec<_> = EventKind::ALL.iter().map(|k| k.wire_token()).collect();
        tokens.sort_unstable();
        tokens.dedup();
        assert_eq!(tokens.len(), EventKind::ALL.len());

        for kind in EventKind::ALL {
            assert_eq!(resolve(wire_token_of(kind)), kind);
        }
    }

    #[test]
    fn unknown_tokens_resolve_to_generic_message() {
        assert_eq!(resolve("typing_started"), EventKind::Message);
        assert_eq!(resolve(""), EventKind::Message);
        assert_eq!(lookup("typing_started"), None);
    }

    #[test]
    fn new_message_is_an_alias_of_message_received() {
        assert_eq!(resolve("new_message"), EventKind::MessageReceived);
        assert_eq!(EventKind::MessageReceived.wire_token(), "message_received");
    }

    #[test]
    fn only_client_commands_are_outgoing() {
        let outgoing: Vec<_> = EventKind::ALL
            .into_iter()
            .filter(|kind| is_outgoing(*kind))
            .collect();

        assert_eq!(
            outgoing,
            [
                EventKind::SendMessage,
                EventKind::JoinRoom,
                EventKind::Authenticate,
                EventKind::LeaveRoom,
            ]
        );
    }

    #[test]
    fn lifecycle_kinds_stay_local() {
        for kind in [
            EventKind::Connect,
            EventKind::Disconnect,
            EventKind::ConnectError,
            EventKind::ReconnectFailed,
        ] {
            assert_eq!(kind.direction(), Direction::InboundOnly);
            assert!(!is_outgoing(kind));
        }
    }

    #[test]
    fn bidirectional_local_kinds_are_written() {
        assert_eq!(EventKind::Authenticate.direction(), Direction::BidirectionalLocal);
        assert!(is_outgoing(EventKind::Authenticate));
    }
}
