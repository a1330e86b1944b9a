use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceMember {
    pub user_id: i64,
    pub username: String,
    pub avatar: Option<String>,
}

/// Who is connected to a room right now. Replaced wholesale on every update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PresenceSnapshot {
    pub count: u64,
    pub users: Vec<PresenceMember>,
}

impl PresenceSnapshot {
    pub fn new(count: u64, users: Vec<PresenceMember>) -> Self {
        Self { count, users }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0 && self.users.is_empty()
    }
}
