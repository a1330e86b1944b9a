use serde::{Deserialize, Serialize};

/// Room record owned by the REST backend. The realtime layer only uses
/// `room_id` as a context key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub room_id: String,
    pub short_room_id: String,
    pub room_name: String,
    #[serde(default)]
    pub room_description: String,
    #[serde(default)]
    pub is_private: bool,
    pub created_by: i64,
    pub created_at: String,
    #[serde(default)]
    pub invitations: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateRoomRequest {
    pub room_name: String,
    pub room_description: String,
}
