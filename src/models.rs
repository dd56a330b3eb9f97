use serde::{Deserialize, Serialize};

/// A user identity as handed to the hub by the (external, pre-authenticating) client.
/// `id` is the stable identity; `username` is the display handle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
    Admin,
}

impl Role {
    pub fn can_stream(self) -> bool {
        matches!(self, Role::Teacher | Role::Admin)
    }

    pub fn can_moderate(self) -> bool {
        matches!(self, Role::Teacher | Role::Admin)
    }
}

pub type ConnectionId = String;

/// Ephemeral, hub-owned: one per (room, connection).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Participant {
    pub user_id: String,
    pub username: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub connection_id: ConnectionId,
    pub joined_at: String,
    pub can_stream: bool,
    pub can_screen_share: bool,
    pub can_chat: bool,
    pub hand_raised: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand_raised_at: Option<String>,
}

impl Participant {
    /// Capability flags are a pure function of role — computed once here, never mutated.
    pub fn new(connection_id: ConnectionId, user: &User, joined_at: String) -> Self {
        Participant {
            user_id: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
            display_name: user.display_name.clone(),
            status: user.status.clone(),
            connection_id,
            joined_at,
            can_stream: user.role.can_stream(),
            can_screen_share: user.role.can_stream(),
            can_chat: true,
            hand_raised: false,
            hand_raised_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StreamQuality {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamState {
    pub active: bool,
    pub streamer_display_name: String,
    pub quality: StreamQuality,
}

/// Ephemeral chat message held in a room's bounded in-memory history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub message_id: String,
    pub sequence: u64,
    pub user_id: String,
    pub username: String,
    pub content: String,
    pub timestamp: String,
}

// --- Persistent entities (Document Store) ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LectureStatus {
    Scheduled,
    Delayed,
    InProgress,
    Completed,
    Cancelled,
}

impl LectureStatus {
    /// The lecture status DAG (§3): whether `self -> next` is a legal edge.
    pub fn can_transition_to(self, next: LectureStatus) -> bool {
        use LectureStatus::*;
        matches!(
            (self, next),
            (Scheduled, Delayed)
                | (Scheduled, InProgress)
                | (Scheduled, Cancelled)
                | (Delayed, InProgress)
                | (Delayed, Cancelled)
                | (InProgress, Completed)
                | (InProgress, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LectureStatus::Completed | LectureStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lecture {
    pub id: String,
    pub name: String,
    pub date: String,
    pub room_id: String,
    pub teacher_id: String,
    pub created_by: String,
    pub status: LectureStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub last_modified: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Available,
    Scheduled,
    Occupied,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub capacity: u32,
    pub status: RoomStatus,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_lecture: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub last_modified: String,
}

/// Shallow-merge patches applied by `DocumentStore::update_*`. Every field is optional;
/// `None` means "leave as-is", mirroring the "shallow merge a patch object" contract.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct LecturePatch {
    pub status: Option<LectureStatus>,
    pub description: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RoomPatch {
    pub status: Option<RoomStatus>,
    pub current_lecture: Option<Option<String>>,
    pub name: Option<String>,
    pub capacity: Option<u32>,
    pub features: Option<Vec<String>>,
}
