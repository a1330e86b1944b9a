use std::collections::HashMap;

use serde_json::Value;

use super::{event::Event, registry::EventKind};

/// Handle returned by `on`, used to remove one specific listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Listener = Box<dyn FnMut(&Event, &mut Outbox)>;

/// Emits requested by listeners during a dispatch. The transport flushes
/// them in order once the dispatch returns.
#[derive(Debug, Default)]
pub struct Outbox {
    queued: Vec<(EventKind, Value)>,
}

impl Outbox {
    pub fn emit(&mut self, kind: EventKind, payload: Value) {
        self.queued.push((kind, payload));
    }

    pub(super) fn drain(&mut self) -> Vec<(EventKind, Value)> {
        std::mem::take(&mut self.queued)
    }
}

/// Per-transport listener table: an ordered list of listeners per kind.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    listeners: HashMap<EventKind, Vec<(ListenerId, Listener)>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<_, _> = self
            .listeners
            .iter()
            .map(|(kind, list)| (*kind, list.len()))
            .collect();
        f.debug_struct("EventBus")
            .field("listeners", &counts)
            .finish()
    }
}

impl EventBus {
    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&Event, &mut Outbox) + 'static,
    {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners
            .entry(kind)
            .or_default()
            .push((id, Box::new(listener)));
        id
    }

    /// Without an id every listener of `kind` is removed. Returns how many
    /// listeners were dropped.
    pub fn off(&mut self, kind: EventKind, id: Option<ListenerId>) -> usize {
        match id {
            None => self
                .listeners
                .remove(&kind)
                .map(|list| list.len())
                .unwrap_or(0),
            Some(id) => {
                let Some(list) = self.listeners.get_mut(&kind) else {
                    return 0;
                };
                let before = list.len();
                list.retain(|(listener_id, _)| *listener_id != id);
                before - list.len()
            }
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map(Vec::len).unwrap_or(0)
    }

    pub fn dispatch(&mut self, event: &Event, outbox: &mut Outbox) {
        if let Some(list) = self.listeners.get_mut(&event.kind) {
            for (_, listener) in list.iter_mut() {
                listener(event, outbox);
            }
        }
    }
}
