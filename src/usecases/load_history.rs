use thiserror::Error;

use crate::{
    domain::message::ChatMessage,
    usecases::contracts::{ChatHistorySource, HistorySourceError},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadHistoryOutput {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadHistoryError {
    #[error("not authorized to read this room")]
    Unauthorized,
    #[error("history is temporarily unavailable")]
    TemporarilyUnavailable,
    #[error("history response was malformed")]
    DataContractViolation,
    #[error("room not found")]
    RoomNotFound,
}

pub async fn load_history<S>(source: &S, room_id: &str) -> Result<LoadHistoryOutput, LoadHistoryError>
where
    S: ChatHistorySource + ?Sized,
{
    if room_id.trim().is_empty() {
        return Err(LoadHistoryError::RoomNotFound);
    }

    let messages = source
        .chat_history(room_id)
        .await
        .map_err(map_source_error)?;

    Ok(LoadHistoryOutput { messages })
}

fn map_source_error(error: HistorySourceError) -> LoadHistoryError {
    match error {
        HistorySourceError::Unauthorized => LoadHistoryError::Unauthorized,
        HistorySourceError::Unavailable => LoadHistoryError::TemporarilyUnavailable,
        HistorySourceError::InvalidData => LoadHistoryError::DataContractViolation,
        HistorySourceError::RoomNotFound => LoadHistoryError::RoomNotFound,
    }
}
