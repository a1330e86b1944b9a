use crate::domain::{events::AppEvent, message::ChatMessage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistorySourceError {
    Unauthorized,
    Unavailable,
    InvalidData,
    RoomNotFound,
}

/// Backend that returns the stored chat history of one room, oldest first.
#[allow(async_fn_in_trait)]
pub trait ChatHistorySource {
    async fn chat_history(&self, room_id: &str) -> Result<Vec<ChatMessage>, HistorySourceError>;
}

impl<T> ChatHistorySource for &T
where
    T: ChatHistorySource + ?Sized,
{
    async fn chat_history(&self, room_id: &str) -> Result<Vec<ChatMessage>, HistorySourceError> {
        (*self).chat_history(room_id).await
    }
}

/// Console input as application events. `Ok(None)` means input is closed.
#[allow(async_fn_in_trait)]
pub trait AppEventSource {
    async fn next_event(&mut self) -> anyhow::Result<Option<AppEvent>>;
}
