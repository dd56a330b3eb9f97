//! Inbound messages accepted by a room actor (§4.4.1). One variant per
//! operation the Hub performs under a room's serialization boundary.

use crate::models::{ConnectionId, StreamQuality, User};
use crate::protocol::ChatMessageInput;
use std::time::Duration;
use tokio::sync::oneshot;

#[derive(Debug)]
pub enum RoomCommand {
    Join {
        connection_id: ConnectionId,
        user: User,
    },
    Leave {
        connection_id: ConnectionId,
    },
    RequestMessageHistory {
        connection_id: ConnectionId,
    },
    Chat {
        connection_id: ConnectionId,
        message: ChatMessageInput,
    },
    StartStream {
        connection_id: ConnectionId,
        username: String,
        quality: StreamQuality,
    },
    StopStream {
        connection_id: ConnectionId,
    },
    Offer {
        connection_id: ConnectionId,
        target_peer_id: ConnectionId,
        payload: serde_json::Value,
    },
    Answer {
        connection_id: ConnectionId,
        target_peer_id: ConnectionId,
        payload: serde_json::Value,
    },
    IceCandidate {
        connection_id: ConnectionId,
        target_peer_id: ConnectionId,
        payload: serde_json::Value,
    },
    MuteAllParticipants {
        requester_id: String,
    },
    MuteParticipant {
        requester_id: String,
        target_user_id: String,
    },
    KickParticipant {
        requester_id: String,
        target_user_id: String,
        reason: Option<String>,
    },
    RaiseHand {
        user_id: String,
    },
    LowerHand {
        user_id: String,
    },
    RecordingStarted {
        teacher_id: String,
    },
    RecordingStopped {
        teacher_id: String,
        duration: f64,
    },
    /// Issued by the Event Coordinator (C5) when a lecture ends.
    ClearRoom {
        reason: String,
    },
    /// Issued by the idle sweep (§4.4.10). The actor decides, under its own
    /// boundary, whether it is idle-empty-and-old; if so it clears its state
    /// and exits, replying `true` so the Hub can drop its map entry.
    CheckIdle {
        threshold: Duration,
        reply: oneshot::Sender<bool>,
    },
    /// Issued once at process shutdown (§4.4.11).
    Shutdown {
        message: String,
    },
}
