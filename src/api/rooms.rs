use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
    domain::{
        message::ChatMessage,
        room::{CreateRoomRequest, Room},
    },
    infra::{config::ServerConfig, contracts::TokenStore},
    realtime::normalizer::Normalizer,
    usecases::contracts::{ChatHistorySource, HistorySourceError},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Timestamp for history entries when no entry in the page carries one.
const UNDATED_HISTORY_TIMESTAMP: &str = "1970-01-01T00:00:00.000Z";

#[derive(Debug, Error)]
pub enum RoomApiError {
    #[error("no authentication token found")]
    NoToken,
    #[error("room not found, check the room id and try again")]
    NotFound,
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl RoomApiError {
    fn into_history_error(self) -> HistorySourceError {
        match self {
            Self::NoToken => HistorySourceError::Unauthorized,
            Self::Status { status: 401 | 403, .. } => HistorySourceError::Unauthorized,
            Self::NotFound => HistorySourceError::RoomNotFound,
            Self::Decode(_) => HistorySourceError::InvalidData,
            Self::Status { .. } | Self::Http(_) => HistorySourceError::Unavailable,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    chats: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Bearer-authenticated client for `{api}/rooms`.
#[derive(Debug, Clone)]
pub struct RoomApiClient<T: TokenStore> {
    http: reqwest::Client,
    api_base_url: String,
    tokens: T,
}

impl<T: TokenStore> RoomApiClient<T> {
    pub fn new(server: &ServerConfig, tokens: T) -> Result<Self, RoomApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_base_url: server.api_base_url.trim_end_matches('/').to_owned(),
            tokens,
        })
    }

    pub async fn create_room(&self, request: &CreateRoomRequest) -> Result<Room, RoomApiError> {
        let token = self.token()?;
        tracing::info!(code = "ROOM_CREATE", room_name = %request.room_name, "creating room");

        let response = self
            .http
            .post(self.rooms_url())
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;
        let response = check_status(response, false).await?;

        let room: Room = response
            .json()
            .await
            .map_err(|error| RoomApiError::Decode(error.to_string()))?;
        tracing::info!(code = "ROOM_CREATED", room_id = %room.room_id, "room created");
        Ok(room)
    }

    pub async fn get_room_by_id(&self, room_id: &str) -> Result<Room, RoomApiError> {
        let token = self.token()?;
        tracing::debug!(room_id, "fetching room");

        let response = self
            .http
            .get(self.room_url(room_id))
            .bearer_auth(token)
            .send()
            .await?;
        let response = check_status(response, true).await?;

        response
            .json()
            .await
            .map_err(|error| RoomApiError::Decode(error.to_string()))
    }

    pub async fn get_chat_history(&self, room_id: &str) -> Result<Vec<ChatMessage>, RoomApiError> {
        let token = self.token()?;
        tracing::debug!(room_id, "fetching chat history");

        let response = self
            .http
            .get(format!("{}/chats", self.room_url(room_id)))
            .bearer_auth(token)
            .send()
            .await?;
        let response = check_status(response, true).await?;

        let body: Value = response
            .json()
            .await
            .map_err(|error| RoomApiError::Decode(error.to_string()))?;
        let messages = parse_history(room_id, body)?;
        tracing::info!(
            code = "HISTORY_FETCHED",
            room_id,
            count = messages.len(),
            "chat history fetched"
        );
        Ok(messages)
    }

    fn token(&self) -> Result<String, RoomApiError> {
        self.tokens.token().ok_or(RoomApiError::NoToken)
    }

    fn rooms_url(&self) -> String {
        format!("{}/rooms", self.api_base_url)
    }

    fn room_url(&self, room_id: &str) -> String {
        format!("{}/{}", self.rooms_url(), urlencoding::encode(room_id))
    }
}

impl<T: TokenStore> ChatHistorySource for RoomApiClient<T> {
    async fn chat_history(&self, room_id: &str) -> Result<Vec<ChatMessage>, HistorySourceError> {
        self.get_chat_history(room_id).await.map_err(|error| {
            tracing::warn!(code = "HISTORY_FETCH_FAILED", room_id, error = %error, "history fetch failed");
            error.into_history_error()
        })
    }
}

async fn check_status(response: Response, not_found_is_missing_room: bool) -> Result<Response, RoomApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if not_found_is_missing_room && status == StatusCode::NOT_FOUND {
        return Err(RoomApiError::NotFound);
    }

    let body = response.text().await.unwrap_or_default();
    Err(RoomApiError::Status {
        status: status.as_u16(),
        message: error_message(&body, status),
    })
}

fn error_message(body: &str, status: StatusCode) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| format!("request failed: {}", status.as_u16()))
}

/// `{ "chats": [...] }`; a missing or null list is an empty history.
fn parse_history(room_id: &str, body: Value) -> Result<Vec<ChatMessage>, RoomApiError> {
    let response: HistoryResponse =
        serde_json::from_value(body).map_err(|error| RoomApiError::Decode(error.to_string()))?;
    let normalizer = Normalizer::new(room_id);

    Ok(fill_history_gaps(room_id, response.chats.unwrap_or_default())
        .iter()
        .map(|entry| normalizer.message_from_payload(entry))
        .collect())
}

/// Gives entries without an id or timestamp stable stand-ins, so an
/// unchanged history always loads into the same log. Missing timestamps
/// carry the previous entry's forward.
fn fill_history_gaps(room_id: &str, chats: Vec<Value>) -> Vec<Value> {
    let mut last_timestamp = chats
        .iter()
        .find_map(|entry| timestamp_of(entry.as_object()?))
        .unwrap_or_else(|| UNDATED_HISTORY_TIMESTAMP.to_owned());

    chats
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let mut object = match entry {
                Value::Object(map) => map,
                other => {
                    let chat = match other {
                        Value::String(text) => text,
                        other => other.to_string(),
                    };
                    let mut map = Map::new();
                    map.insert("chat".to_owned(), Value::String(chat));
                    map
                }
            };

            match timestamp_of(&object) {
                Some(timestamp) => last_timestamp = timestamp,
                None => {
                    object.insert("timestamp".to_owned(), Value::String(last_timestamp.clone()));
                }
            }

            let has_id = match object.get("id") {
                Some(Value::String(id)) => !id.is_empty(),
                Some(Value::Number(id)) => id.as_f64() != Some(0.0),
                _ => false,
            };
            if !has_id {
                let id = fallback_history_id(room_id, index, &object);
                object.insert("id".to_owned(), Value::String(id));
            }

            Value::Object(object)
        })
        .collect()
}

fn timestamp_of(object: &Map<String, Value>) -> Option<String> {
    object
        .get("timestamp")
        .and_then(Value::as_str)
        .filter(|timestamp| !timestamp.is_empty())
        .map(str::to_owned)
}

fn fallback_history_id(room_id: &str, index: usize, entry: &Map<String, Value>) -> String {
    let mut hasher = DefaultHasher::new();
    Value::Object(entry.clone()).to_string().hash(&mut hasher);
    format!("history-{room_id}-{index}-{:012x}", hasher.finish() & 0xffff_ffff_ffff)
}
