//! Binds one room [`Transport`] to the UI-facing [`SessionState`].
//!
//! The session registers its listeners on construction and keeps their ids
//! so teardown removes exactly what it added. Listeners only touch the shared
//! state; anything that must go back onto the wire is queued on the
//! [`Outbox`] and flushed by the transport after the current dispatch.

use std::{cell::RefCell, rc::Rc};

use serde_json::json;

use crate::{
    domain::{message::ChatMessage, session_state::SessionState},
    realtime::{
        bus::{ListenerId, Outbox},
        channel::Channel,
        event::Event,
        registry::EventKind,
        transport::{Transport, TransportConfig},
    },
    usecases::{
        contracts::ChatHistorySource,
        load_history::{load_history, LoadHistoryError},
        send_message::{send_message, SendMessageError},
    },
};

const SESSION_AUTHENTICATING: &str = "SESSION_AUTHENTICATING";
const SESSION_DUPLICATE_MESSAGE: &str = "SESSION_DUPLICATE_MESSAGE";
const SESSION_RECONNECT_FAILED: &str = "SESSION_RECONNECT_FAILED";
const SESSION_HISTORY_FAILED: &str = "SESSION_HISTORY_FAILED";

pub type SharedTransport<C> = Rc<RefCell<Transport<C>>>;

pub struct ChatSession<C: Channel + 'static> {
    transport: SharedTransport<C>,
    state: Rc<RefCell<SessionState>>,
    listeners: Vec<(EventKind, ListenerId)>,
    owns_transport: bool,
    torn_down: bool,
}

impl<C: Channel + 'static> ChatSession<C> {
    /// Creates the transport for `room_id` and owns it: teardown leaves the
    /// room and disconnects.
    pub fn open(config: TransportConfig, room_id: &str, token: &str, channel: C) -> Self {
        let transport = Rc::new(RefCell::new(Transport::new(config, room_id, token, channel)));
        Self::attach(transport, token, true)
    }

    /// Wires the session onto an existing transport. With `owns_transport`
    /// false, teardown only removes this session's listeners.
    pub fn attach(transport: SharedTransport<C>, token: &str, owns_transport: bool) -> Self {
        let state = Rc::new(RefCell::new(SessionState::default()));
        let mut session = Self {
            transport,
            state,
            listeners: Vec::new(),
            owns_transport,
            torn_down: false,
        };
        session.register(token);
        session
            .state
            .borrow_mut()
            .set_connected(session.transport.borrow().connected());
        session
    }

    pub fn transport(&self) -> &SharedTransport<C> {
        &self.transport
    }

    pub fn state(&self) -> std::cell::Ref<'_, SessionState> {
        self.state.borrow()
    }

    pub fn room_id(&self) -> String {
        self.transport.borrow().room_id().to_owned()
    }

    pub fn is_connected(&self) -> bool {
        self.transport.borrow().connected()
    }

    pub fn send(&self, content: &str) -> Result<(), SendMessageError> {
        send_message(&mut *self.transport.borrow_mut(), content)
    }

    /// Fetches the room history and replaces the log with it. On failure the
    /// log is left as it was.
    pub async fn load_history<S>(&self, source: &S) -> Result<usize, LoadHistoryError>
    where
        S: ChatHistorySource + ?Sized,
    {
        let room_id = self.room_id();
        match load_history(source, &room_id).await {
            Ok(output) => {
                let count = output.messages.len();
                self.state.borrow_mut().replace_messages(output.messages);
                tracing::info!(room_id = %room_id, count, "message history loaded");
                Ok(count)
            }
            Err(error) => {
                tracing::warn!(
                    code = SESSION_HISTORY_FAILED,
                    room_id = %room_id,
                    error = %error,
                    "failed to load message history"
                );
                Err(error)
            }
        }
    }

    pub fn clear_messages(&self) {
        self.state.borrow_mut().clear_messages();
    }

    /// True once per `message_history` notification from the server.
    pub fn take_history_request(&self) -> bool {
        self.state.borrow_mut().take_history_request()
    }

    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        let mut transport = self.transport.borrow_mut();
        for (kind, id) in self.listeners.drain(..) {
            transport.off(kind, Some(id));
        }

        if self.owns_transport {
            let room_id = transport.room_id().to_owned();
            transport.emit(EventKind::LeaveRoom, json!({ "data": { "roomId": room_id } }));
            transport.disconnect();
        }
        self.state.borrow_mut().set_connected(false);
    }

    fn register(&mut self, token: &str) {
        let room_id = self.room_id();

        let state = self.state.clone();
        let auth_token = token.to_owned();
        let auth_room = room_id.clone();
        self.listen(EventKind::Connect, move |_, outbox| {
            state.borrow_mut().set_connected(true);
            tracing::info!(
                code = SESSION_AUTHENTICATING,
                room_id = %auth_room,
                "connected, authenticating and joining room"
            );
            outbox.emit(
                EventKind::Authenticate,
                json!({ "data": { "token": auth_token, "roomId": auth_room } }),
            );
            outbox.emit(EventKind::JoinRoom, json!({ "data": { "roomId": auth_room } }));
        });

        let state = self.state.clone();
        self.listen(EventKind::Disconnect, move |event, _| {
            tracing::info!(reason = event.reason().unwrap_or_default(), "room disconnected");
            state.borrow_mut().set_connected(false);
        });

        let state = self.state.clone();
        self.listen(EventKind::ReconnectFailed, move |_, _| {
            tracing::error!(code = SESSION_RECONNECT_FAILED, "giving up on the room connection");
            state.borrow_mut().mark_connection_lost();
        });

        let state = self.state.clone();
        self.listen(EventKind::MessageReceived, move |event, _| {
            if let Some(message) = event.message() {
                append(&state, message.clone());
            }
        });

        let state = self.state.clone();
        self.listen(EventKind::SystemMessage, move |event, _| {
            if let Some(message) = event.message() {
                append(&state, message.clone());
            }
        });

        let state = self.state.clone();
        self.listen(EventKind::MessageHistory, move |_, _| {
            state.borrow_mut().request_history();
        });

        let state = self.state.clone();
        self.listen(EventKind::UserCount, move |event, _| {
            if let Some(presence) = event.presence() {
                tracing::debug!(count = presence.count, "presence updated");
                state.borrow_mut().set_presence(presence.clone());
            }
        });

        self.listen(EventKind::UserJoined, |event, _| {
            if let Some(member) = event.member() {
                tracing::info!(user_id = member.user_id, username = %member.username, "user joined");
            }
        });

        self.listen(EventKind::UserLeft, |event, _| {
            if let Some(member) = event.member() {
                tracing::info!(user_id = member.user_id, username = %member.username, "user left");
            }
        });
    }

    fn listen<F>(&mut self, kind: EventKind, listener: F)
    where
        F: FnMut(&Event, &mut Outbox) + 'static,
    {
        let id = self.transport.borrow_mut().on(kind, listener);
        self.listeners.push((kind, id));
    }
}

impl<C: Channel + 'static> Drop for ChatSession<C> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn append(state: &RefCell<SessionState>, message: ChatMessage) {
    let id = message.id.clone();
    if !state.borrow_mut().append_message(message) {
        tracing::debug!(code = SESSION_DUPLICATE_MESSAGE, id = %id, "skipping duplicate message");
    }
}
