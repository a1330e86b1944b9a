//! Socket-like transport for one room connection.
//!
//! Owns the physical [`Channel`], drives the reconnect state machine and
//! re-emits normalized frames to local listeners. All inputs arrive through
//! [`Transport::handle`], so the machine runs identically against a real
//! WebSocket or an injected fake.

use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    domain::{
        message::now_iso8601,
        status::{ConnectionState, ConnectionStatus},
    },
    infra::{
        config::{ServerConfig, TransportSettings},
        secrets::redact_url_token,
    },
};

use super::{
    bus::{EventBus, ListenerId, Outbox},
    channel::{Channel, LinkEvent},
    event::{Event, EventPayload},
    normalizer::Normalizer,
    registry::EventKind,
};

const TRANSPORT_CONNECTING: &str = "TRANSPORT_CONNECTING";
const TRANSPORT_OPEN: &str = "TRANSPORT_OPEN";
const TRANSPORT_CLOSED: &str = "TRANSPORT_CLOSED";
const TRANSPORT_RECONNECT_SCHEDULED: &str = "TRANSPORT_RECONNECT_SCHEDULED";
const TRANSPORT_RECONNECT_EXHAUSTED: &str = "TRANSPORT_RECONNECT_EXHAUSTED";
const TRANSPORT_SEND_WHILE_DISCONNECTED: &str = "TRANSPORT_SEND_WHILE_DISCONNECTED";
const TRANSPORT_SEND_FAILED: &str = "TRANSPORT_SEND_FAILED";
const TRANSPORT_FRAME_PARSE_FAILED: &str = "TRANSPORT_FRAME_PARSE_FAILED";
const TRANSPORT_MISSING_CREDENTIALS: &str = "TRANSPORT_MISSING_CREDENTIALS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub ws_base_url: String,
    pub reconnect_base_delay: Duration,
    pub max_reconnect_attempts: u32,
}

impl TransportConfig {
    pub fn new(server: &ServerConfig, settings: &TransportSettings) -> Self {
        Self {
            ws_base_url: server.ws_base_url.clone(),
            reconnect_base_delay: Duration::from_millis(settings.reconnect_base_delay_ms),
            max_reconnect_attempts: settings.max_reconnect_attempts,
        }
    }

    /// Delay before reconnect attempt `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.reconnect_base_delay.saturating_mul(attempt)
    }
}

/// `<ws-base>/<roomId>?token=<urlencoded token>`
pub fn connection_url(ws_base_url: &str, room_id: &str, token: &str) -> String {
    format!(
        "{}/{}?token={}",
        ws_base_url.trim_end_matches('/'),
        room_id,
        urlencoding::encode(token)
    )
}

#[derive(Serialize)]
struct WireFrame<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    chat_data: Value,
    timestamp: String,
}

pub struct Transport<C: Channel> {
    config: TransportConfig,
    url: String,
    channel: C,
    state: ConnectionState,
    reconnect_attempt: u32,
    bus: EventBus,
    normalizer: Normalizer,
    stopped: bool,
}

impl<C: Channel> std::fmt::Debug for Transport<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("url", &redact_url_token(&self.url))
            .field("state", &self.state)
            .field("reconnect_attempt", &self.reconnect_attempt)
            .field("bus", &self.bus)
            .finish()
    }
}

impl<C: Channel> Transport<C> {
    /// Starts connecting right away when both `room_id` and `token` are
    /// non-empty; otherwise the transport stays idle.
    pub fn new(config: TransportConfig, room_id: &str, token: &str, channel: C) -> Self {
        let url = connection_url(&config.ws_base_url, room_id, token);
        let mut transport = Self {
            config,
            url,
            channel,
            state: ConnectionState::Idle,
            reconnect_attempt: 0,
            bus: EventBus::default(),
            normalizer: Normalizer::new(room_id),
            stopped: false,
        };

        if room_id.is_empty() || token.is_empty() {
            tracing::warn!(
                code = TRANSPORT_MISSING_CREDENTIALS,
                "transport created without room id or token; staying idle"
            );
        } else {
            transport.open_channel();
        }

        transport
    }

    pub fn room_id(&self) -> &str {
        self.normalizer.room_id()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn reconnect_attempt(&self) -> u32 {
        self.reconnect_attempt
    }

    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus {
            state: self.state,
            reconnect_attempt: self.reconnect_attempt,
        }
    }

    pub fn connected(&self) -> bool {
        self.state == ConnectionState::Open
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&Event, &mut Outbox) + 'static,
    {
        self.bus.on(kind, listener)
    }

    pub fn off(&mut self, kind: EventKind, id: Option<ListenerId>) -> usize {
        self.bus.off(kind, id)
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.bus.listener_count(kind)
    }

    /// Delivers `payload` to local listeners of `kind` and, for outgoing
    /// kinds, frames it onto the wire. Never fails; a write while the link is
    /// not open is dropped with a warning.
    pub fn emit(&mut self, kind: EventKind, payload: Value) {
        if kind.is_outgoing() {
            self.write_frame(kind, &payload);
        }
        self.dispatch(Event::new(kind, EventPayload::Raw(payload)));
    }

    pub fn handle(&mut self, input: LinkEvent) {
        if self.stopped {
            tracing::debug!(input = ?input, "ignoring link input after disconnect");
            return;
        }

        match input {
            LinkEvent::Opened => self.on_opened(),
            LinkEvent::Frame(text) => self.on_frame(&text),
            LinkEvent::Error(reason) => self.on_error(reason),
            LinkEvent::Closed(reason) => self.on_closed(reason),
            LinkEvent::TimerFired => self.on_timer_fired(),
        }
    }

    /// Stops for good: cancels any pending reconnect and closes the link.
    /// Later link inputs are ignored.
    pub fn disconnect(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.channel.disarm_timer();
        self.channel.close();
        if self.state != ConnectionState::Failed {
            self.state = ConnectionState::Closed;
        }
        tracing::info!(code = TRANSPORT_CLOSED, "transport disconnected by client");
    }

    fn open_channel(&mut self) {
        self.state = ConnectionState::Connecting;
        tracing::info!(
            code = TRANSPORT_CONNECTING,
            url = %redact_url_token(&self.url),
            attempt = self.reconnect_attempt,
            "opening room connection"
        );
        self.channel.open(&self.url);
    }

    fn on_opened(&mut self) {
        if self.state != ConnectionState::Connecting {
            tracing::debug!(state = ?self.state, "ignoring open outside connecting state");
            return;
        }
        self.state = ConnectionState::Open;
        self.reconnect_attempt = 0;
        tracing::info!(code = TRANSPORT_OPEN, "room connection open");
        self.dispatch(Event::bare(EventKind::Connect));
    }

    fn on_frame(&mut self, text: &str) {
        tracing::trace!(frame = text, "raw frame received");
        for document in text.trim().split('\n').filter(|doc| !doc.trim().is_empty()) {
            match serde_json::from_str::<Value>(document) {
                Ok(value) => {
                    for event in self.normalizer.normalize(value) {
                        self.dispatch(event);
                    }
                }
                Err(error) => {
                    tracing::warn!(
                        code = TRANSPORT_FRAME_PARSE_FAILED,
                        error = %error,
                        document,
                        "skipping unparseable sub-frame"
                    );
                }
            }
        }
    }

    fn on_error(&mut self, reason: String) {
        if matches!(self.state, ConnectionState::Idle | ConnectionState::Failed) {
            return;
        }
        tracing::warn!(reason = %reason, state = ?self.state, "room connection error");
        self.dispatch(Event::new(
            EventKind::ConnectError,
            EventPayload::Reason(reason.clone()),
        ));

        // A failed open link is detached here; the close that follows it
        // arrives while reconnecting and is ignored.
        if self.state == ConnectionState::Open {
            self.channel.close();
            self.lose_open_link(reason);
        }
    }

    fn on_closed(&mut self, reason: String) {
        match self.state {
            ConnectionState::Open => self.lose_open_link(reason),
            ConnectionState::Connecting => {
                tracing::warn!(
                    reason = %reason,
                    attempt = self.reconnect_attempt,
                    "room connection attempt failed"
                );
                self.schedule_reconnect();
            }
            _ => {}
        }
    }

    fn lose_open_link(&mut self, reason: String) {
        self.state = ConnectionState::Closed;
        tracing::warn!(code = TRANSPORT_CLOSED, reason = %reason, "room connection closed");
        self.dispatch(Event::new(EventKind::Disconnect, EventPayload::Reason(reason)));
        self.schedule_reconnect();
    }

    fn on_timer_fired(&mut self) {
        if self.state == ConnectionState::Reconnecting {
            self.open_channel();
        }
    }

    fn schedule_reconnect(&mut self) {
        if self.reconnect_attempt >= self.config.max_reconnect_attempts {
            self.state = ConnectionState::Failed;
            tracing::error!(
                code = TRANSPORT_RECONNECT_EXHAUSTED,
                attempts = self.reconnect_attempt,
                "max reconnection attempts reached"
            );
            self.dispatch(Event::bare(EventKind::ReconnectFailed));
            return;
        }

        self.reconnect_attempt += 1;
        self.state = ConnectionState::Reconnecting;
        let delay = self.config.backoff(self.reconnect_attempt);
        tracing::info!(
            code = TRANSPORT_RECONNECT_SCHEDULED,
            attempt = self.reconnect_attempt,
            max_attempts = self.config.max_reconnect_attempts,
            delay_ms = delay.as_millis() as u64,
            "reconnect scheduled"
        );
        self.channel.arm_timer(delay);
    }

    fn write_frame(&mut self, kind: EventKind, payload: &Value) {
        if self.state != ConnectionState::Open {
            tracing::warn!(
                code = TRANSPORT_SEND_WHILE_DISCONNECTED,
                event = kind.wire_token(),
                "cannot send, room connection is not open"
            );
            return;
        }

        let frame = WireFrame {
            kind: kind.wire_token(),
            chat_data: payload
                .get("data")
                .filter(|data| !data.is_null())
                .cloned()
                .unwrap_or_else(|| json!({})),
            timestamp: now_iso8601(),
        };
        let encoded = match serde_json::to_string(&frame) {
            Ok(encoded) => encoded,
            Err(error) => {
                tracing::warn!(code = TRANSPORT_SEND_FAILED, error = %error, "frame encoding failed");
                return;
            }
        };

        match self.channel.send(encoded) {
            Ok(()) => tracing::debug!(event = kind.wire_token(), "frame sent"),
            Err(error) => tracing::warn!(
                code = TRANSPORT_SEND_FAILED,
                event = kind.wire_token(),
                error = %error,
                "frame write failed"
            ),
        }
    }

    fn dispatch(&mut self, event: Event) {
        let mut outbox = Outbox::default();
        self.bus.dispatch(&event, &mut outbox);
        for (kind, payload) in outbox.drain() {
            self.emit(kind, payload);
        }
    }
}

impl<C: Channel> Drop for Transport<C> {
    fn drop(&mut self) {
        if !self.stopped {
            self.channel.disarm_timer();
            self.channel.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use serde_json::json;

    use super::*;
    use crate::test_support::FakeChannel;

    fn config() -> TransportConfig {
        TransportConfig {
            ws_base_url: "ws://rooms.test/api/v1/ws/".to_owned(),
            reconnect_base_delay: Duration::from_millis(1000),
            max_reconnect_attempts: 5,
        }
    }

    fn open_transport() -> (Transport<FakeChannel>, FakeChannel) {
        let channel = FakeChannel::default();
        let mut transport = Transport::new(config(), "room-1", "tok en", channel.clone());
        transport.handle(LinkEvent::Opened);
        (transport, channel)
    }

    fn record(transport: &mut Transport<FakeChannel>, kinds: &[EventKind]) -> Rc<RefCell<Vec<Event>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        for kind in kinds {
            let seen = seen.clone();
            transport.on(*kind, move |event, _| seen.borrow_mut().push(event.clone()));
        }
        seen
    }

    #[test]
    fn builds_connection_url_with_encoded_token() {
        assert_eq!(
            connection_url("ws://host/ws/", "abc", "a b&c"),
            "ws://host/ws/abc?token=a%20b%26c"
        );
    }

    #[test]
    fn stays_idle_without_room_or_token() {
        let channel = FakeChannel::default();
        let transport = Transport::new(config(), "", "token", channel.clone());

        assert_eq!(transport.state(), ConnectionState::Idle);
        assert!(channel.opened().is_empty());
    }

    #[test]
    fn construction_opens_channel_and_open_emits_connect() {
        let channel = FakeChannel::default();
        let mut transport = Transport::new(config(), "room-1", "tok", channel.clone());
        let seen = record(&mut transport, &[EventKind::Connect]);

        assert_eq!(transport.state(), ConnectionState::Connecting);
        assert_eq!(channel.opened(), ["ws://rooms.test/api/v1/ws/room-1?token=tok"]);

        transport.handle(LinkEvent::Opened);

        assert!(transport.connected());
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn multi_document_frame_dispatches_in_order() {
        let (mut transport, _) = open_transport();
        let seen = record(&mut transport, &[EventKind::UserCount, EventKind::MessageReceived]);

        transport.handle(LinkEvent::Frame(
            "{\"type\":\"user_count\",\"payload\":{\"count\":3,\"users\":[]}}\n{\"id\":\"m1\",\"chat\":\"hi\",\"userId\":7,\"username\":\"al\",\"timestamp\":\"2024-01-01T00:00:00Z\"}".to_owned(),
        ));

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].kind, EventKind::UserCount);
        assert_eq!(seen[0].presence().map(|p| p.count), Some(3));
        assert_eq!(seen[1].kind, EventKind::MessageReceived);
        assert_eq!(seen[1].message().map(|m| m.id.as_str()), Some("m1"));
    }

    #[test]
    fn broken_sub_frame_does_not_abort_the_rest() {
        let (mut transport, _) = open_transport();
        let seen = record(&mut transport, &[EventKind::MessageReceived]);

        transport.handle(LinkEvent::Frame(
            "{not json\n\n{\"id\":\"m2\",\"chat\":\"ok\",\"userId\":1}\n".to_owned(),
        ));

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].message().map(|m| m.id.as_str()), Some("m2"));
    }

    #[test]
    fn outgoing_emit_frames_chat_data_and_notifies_local_listeners() {
        let (mut transport, channel) = open_transport();
        let seen = record(&mut transport, &[EventKind::SendMessage]);

        transport.emit(
            EventKind::SendMessage,
            json!({"message_type": "send_message", "data": {"chat": "hi"}}),
        );

        let sent = channel.sent_json();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["type"], "send_message");
        assert_eq!(sent[0]["chat_data"], json!({"chat": "hi"}));
        assert!(sent[0]["timestamp"].as_str().is_some());
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn outgoing_emit_without_data_sends_empty_object() {
        let (mut transport, channel) = open_transport();

        transport.emit(EventKind::LeaveRoom, json!({"roomId": "room-1"}));

        assert_eq!(channel.sent_json()[0]["chat_data"], json!({}));
    }

    #[test]
    fn outgoing_emit_with_null_data_sends_empty_object() {
        let (mut transport, channel) = open_transport();

        transport.emit(EventKind::LeaveRoom, json!({"data": null}));

        assert_eq!(channel.sent_json()[0]["chat_data"], json!({}));
    }

    #[test]
    fn local_kinds_are_never_written() {
        let (mut transport, channel) = open_transport();
        let seen = record(&mut transport, &[EventKind::SystemMessage]);

        transport.emit(EventKind::SystemMessage, json!({"chat": "local only"}));

        assert!(channel.sent().is_empty());
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn emit_while_not_open_does_not_write() {
        let channel = FakeChannel::default();
        let mut transport = Transport::new(config(), "room-1", "tok", channel.clone());
        let seen = record(&mut transport, &[EventKind::SendMessage]);

        transport.emit(EventKind::SendMessage, json!({"data": {"chat": "lost"}}));

        assert!(channel.sent().is_empty());
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn listener_emits_are_flushed_in_order_after_dispatch() {
        let channel = FakeChannel::default();
        let mut transport = Transport::new(config(), "room-1", "tok", channel.clone());
        transport.on(EventKind::Connect, |_, outbox| {
            outbox.emit(EventKind::Authenticate, json!({"data": {"token": "tok"}}));
            outbox.emit(EventKind::JoinRoom, json!({"data": {"roomId": "room-1"}}));
        });

        transport.handle(LinkEvent::Opened);

        let types: Vec<_> = channel
            .sent_json()
            .iter()
            .map(|frame| frame["type"].as_str().unwrap_or_default().to_owned())
            .collect();
        assert_eq!(types, ["authenticate", "join_room"]);
    }

    #[test]
    fn remote_close_emits_disconnect_and_schedules_reconnect() {
        let (mut transport, channel) = open_transport();
        let seen = record(&mut transport, &[EventKind::Disconnect]);

        transport.handle(LinkEvent::Closed("server restart".to_owned()));

        assert_eq!(seen.borrow()[0].reason(), Some("server restart"));
        assert_eq!(transport.state(), ConnectionState::Reconnecting);
        assert_eq!(transport.reconnect_attempt(), 1);
        assert_eq!(channel.armed(), [Duration::from_millis(1000)]);

        transport.handle(LinkEvent::TimerFired);
        assert_eq!(transport.state(), ConnectionState::Connecting);
        assert_eq!(channel.opened().len(), 2);

        transport.handle(LinkEvent::Opened);
        assert_eq!(transport.reconnect_attempt(), 0);
    }

    #[test]
    fn error_on_open_link_disconnects_and_schedules_reconnect() {
        let (mut transport, channel) = open_transport();
        let seen = record(&mut transport, &[EventKind::ConnectError, EventKind::Disconnect]);

        transport.handle(LinkEvent::Error("tls alert".to_owned()));

        assert!(!transport.connected());
        assert_eq!(transport.state(), ConnectionState::Reconnecting);
        assert_eq!(transport.reconnect_attempt(), 1);
        assert_eq!(channel.closed(), 1);
        assert_eq!(channel.armed(), [Duration::from_millis(1000)]);
        {
            let seen = seen.borrow();
            assert_eq!(seen.len(), 2);
            assert_eq!(seen[0].kind, EventKind::ConnectError);
            assert_eq!(seen[1].kind, EventKind::Disconnect);
            assert_eq!(seen[1].reason(), Some("tls alert"));
        }

        transport.handle(LinkEvent::Closed("tls alert".to_owned()));

        assert_eq!(transport.reconnect_attempt(), 1);
        assert_eq!(channel.armed().len(), 1);
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn error_while_connecting_waits_for_the_close() {
        let channel = FakeChannel::default();
        let mut transport = Transport::new(config(), "room-1", "tok", channel.clone());
        let seen = record(&mut transport, &[EventKind::ConnectError, EventKind::Disconnect]);

        transport.handle(LinkEvent::Error("refused".to_owned()));

        assert_eq!(transport.state(), ConnectionState::Connecting);
        assert_eq!(seen.borrow().len(), 1);

        transport.handle(LinkEvent::Closed("refused".to_owned()));

        assert_eq!(transport.state(), ConnectionState::Reconnecting);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn exhausted_reconnects_fail_exactly_once() {
        let channel = FakeChannel::default();
        let mut transport = Transport::new(config(), "room-1", "tok", channel.clone());
        let failed = record(&mut transport, &[EventKind::ReconnectFailed]);

        transport.handle(LinkEvent::Closed("refused".to_owned()));
        for _ in 0..5 {
            assert_eq!(transport.state(), ConnectionState::Reconnecting);
            transport.handle(LinkEvent::TimerFired);
            transport.handle(LinkEvent::Closed("refused".to_owned()));
        }

        assert_eq!(transport.state(), ConnectionState::Failed);
        assert_eq!(failed.borrow().len(), 1);
        assert_eq!(
            channel.armed(),
            [1000, 2000, 3000, 4000, 5000].map(Duration::from_millis)
        );

        transport.handle(LinkEvent::TimerFired);
        transport.handle(LinkEvent::Closed("refused".to_owned()));
        assert_eq!(channel.opened().len(), 6);
        assert_eq!(failed.borrow().len(), 1);
    }

    #[test]
    fn disconnect_cancels_timer_and_ignores_late_inputs() {
        let (mut transport, channel) = open_transport();
        let seen = record(&mut transport, &[EventKind::Disconnect, EventKind::MessageReceived]);
        transport.handle(LinkEvent::Closed("blip".to_owned()));

        transport.disconnect();
        transport.handle(LinkEvent::TimerFired);
        transport.handle(LinkEvent::Frame("{\"id\":\"x\",\"chat\":\"late\",\"userId\":1}".to_owned()));

        assert!(channel.disarmed() >= 1);
        assert_eq!(channel.closed(), 1);
        assert_eq!(channel.opened().len(), 1);
        assert_eq!(transport.state(), ConnectionState::Closed);
        assert_eq!(seen.borrow().len(), 1);
    }
}
