//! The wire protocol (§6): tagged JSON frames exchanged over the bidirectional
//! connection. The Hub never sees raw JSON — only these typed enums — so the
//! encoding itself stays opaque to the core per the Connection Endpoint
//! contract (§4.3).

use crate::models::{Message, Participant, Role, StreamQuality, StreamState, User};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessageInput {
    pub user_id: String,
    pub username: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    JoinRoom {
        room_id: String,
        user: User,
    },
    LeaveRoom {
        room_id: String,
    },
    RequestMessageHistory {
        room_id: String,
    },
    SendMessage {
        room_id: String,
        message: ChatMessageInput,
    },
    StartStream {
        room_id: String,
        username: String,
        quality: StreamQuality,
    },
    StopStream {
        room_id: String,
    },
    #[serde(rename = "offer", alias = "webrtc:offer")]
    Offer {
        room_id: String,
        target_peer_id: String,
        offer: serde_json::Value,
    },
    #[serde(rename = "answer", alias = "webrtc:answer")]
    Answer {
        room_id: String,
        target_peer_id: String,
        answer: serde_json::Value,
    },
    #[serde(rename = "ice-candidate", alias = "webrtc:ice-candidate")]
    IceCandidate {
        room_id: String,
        target_peer_id: String,
        candidate: serde_json::Value,
    },
    MuteAllParticipants {
        room_id: String,
        requester_id: String,
    },
    MuteParticipant {
        room_id: String,
        target_user_id: String,
        requester_id: String,
    },
    KickParticipant {
        room_id: String,
        target_user_id: String,
        requester_id: String,
        #[serde(default)]
        reason: Option<String>,
    },
    RaiseHand {
        room_id: String,
        user_id: String,
    },
    LowerHand {
        room_id: String,
        user_id: String,
    },
    RecordingStarted {
        room_id: String,
        teacher_id: String,
    },
    RecordingStopped {
        room_id: String,
        teacher_id: String,
        duration: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinErrorCode {
    RoomUnavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    Welcome {
        message: String,
        timestamp: String,
    },
    RoomState {
        stream: Option<StreamState>,
        participants: Vec<Participant>,
    },
    MessageHistory {
        messages: Vec<Message>,
    },
    NewMessage {
        message_id: String,
        sequence: u64,
        user_id: String,
        username: String,
        content: String,
        timestamp: String,
    },
    UserJoined {
        user_id: String,
        username: String,
        connection_id: String,
        role: Role,
        #[serde(skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<String>,
    },
    UserLeft {
        user_id: String,
        username: String,
        connection_id: String,
    },
    StreamStarted {
        state: StreamState,
    },
    StreamStopped {},
    #[serde(rename = "offer")]
    Offer {
        from_peer_id: String,
        payload: serde_json::Value,
    },
    #[serde(rename = "answer")]
    Answer {
        from_peer_id: String,
        payload: serde_json::Value,
    },
    #[serde(rename = "ice-candidate")]
    IceCandidate {
        from_peer_id: String,
        payload: serde_json::Value,
    },
    MuteAll {
        requested_by: String,
        timestamp: String,
    },
    MutedByTeacher {
        requested_by: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        timestamp: String,
    },
    KickedFromRoom {
        room_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        kicked_by: String,
        timestamp: String,
    },
    ParticipantKicked {
        user_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    HandRaised {
        user_id: String,
        username: String,
        timestamp: String,
    },
    HandLowered {
        user_id: String,
        timestamp: String,
    },
    LectureRecordingStarted {
        teacher_id: String,
        timestamp: String,
    },
    LectureRecordingStopped {
        teacher_id: String,
        duration: f64,
        timestamp: String,
    },
    RoomCleared {
        room_id: String,
        reason: String,
        timestamp: String,
    },
    RoomClosed {
        room_id: String,
        reason: String,
        timestamp: String,
    },
    ServerShutdown {
        message: String,
        timestamp: String,
    },
    JoinRoomError {
        code: JoinErrorCode,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        lecture_status: Option<crate::models::LectureStatus>,
        room_id: String,
    },
    Error {
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_room_deserializes_from_tagged_json() {
        let raw = serde_json::json!({
            "event": "join_room",
            "roomId": "r1",
            "user": {"id": "u1", "username": "alice", "role": "teacher"}
        });
        let event: ClientEvent = serde_json::from_value(raw).unwrap();
        match event {
            ClientEvent::JoinRoom { room_id, user } => {
                assert_eq!(room_id, "r1");
                assert_eq!(user.username, "alice");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn offer_and_webrtc_offer_alias_to_the_same_variant() {
        let a: ClientEvent = serde_json::from_value(serde_json::json!({
            "event": "offer", "roomId": "r1", "targetPeerId": "c2", "offer": {"sdp": "x"}
        }))
        .unwrap();
        let b: ClientEvent = serde_json::from_value(serde_json::json!({
            "event": "webrtc:offer", "roomId": "r1", "targetPeerId": "c2", "offer": {"sdp": "x"}
        }))
        .unwrap();
        assert!(matches!(a, ClientEvent::Offer { .. }));
        assert!(matches!(b, ClientEvent::Offer { .. }));
    }

    #[test]
    fn server_event_serializes_with_tag_and_camelcase_fields() {
        let event = ServerEvent::NewMessage {
            message_id: "m1".into(),
            sequence: 1,
            user_id: "u1".into(),
            username: "alice".into(),
            content: "hi".into(),
            timestamp: "2026-01-01T00:00:00Z".into(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "new_message");
        assert_eq!(value["messageId"], "m1");
        assert_eq!(value["sequence"], 1);
    }
}
