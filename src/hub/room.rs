//! The room actor itself: a `tokio::task` that owns one room's live state
//! and processes [`RoomCommand`]s one at a time, off a bounded queue. This
//! is what gives the Hub its per-room total order (§4.4.1) while letting
//! distinct rooms run fully concurrently.

use super::commands::RoomCommand;
use crate::connection::ConnectionRegistry;
use crate::models::{ConnectionId, Message, Participant, StreamState};
use crate::protocol::ServerEvent;
use crate::rate_limit::{RateLimitConfig, RateLimiter};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use uuid::Uuid;

pub const ROOM_COMMAND_QUEUE_CAPACITY: usize = 1024;
const KICK_GRACE_PERIOD: Duration = Duration::from_secs(1);

pub struct RoomDeps {
    pub connections: Arc<ConnectionRegistry>,
    pub rate_limiter: Arc<RateLimiter>,
    pub rate_limit_config: RateLimitConfig,
    pub message_history_limit: usize,
}

struct RoomState {
    participants: Vec<Participant>,
    messages: Vec<Message>,
    stream: Option<StreamState>,
    streamer_connection: Option<ConnectionId>,
    next_sequence: u64,
    last_activity: Instant,
}

impl RoomState {
    fn new() -> Self {
        RoomState {
            participants: Vec::new(),
            messages: Vec::new(),
            stream: None,
            streamer_connection: None,
            next_sequence: 1,
            last_activity: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    fn find_by_connection(&self, connection_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.connection_id == connection_id)
    }

    fn find_by_user(&self, user_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }
}

fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn generate_message_id(room_id: &str) -> String {
    let epoch_ms = chrono::Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{room_id}_{epoch_ms}_{}", &suffix[..8])
}

pub fn spawn_room(room_id: String, deps: RoomDeps) -> mpsc::Sender<RoomCommand> {
    let (tx, rx) = mpsc::channel(ROOM_COMMAND_QUEUE_CAPACITY);
    tokio::spawn(run_room(room_id, rx, deps));
    tx
}

async fn run_room(room_id: String, mut rx: mpsc::Receiver<RoomCommand>, deps: RoomDeps) {
    let mut state = RoomState::new();

    while let Some(command) = rx.recv().await {
        match command {
            RoomCommand::Join { connection_id, user } => {
                handle_join(&room_id, &mut state, &deps, connection_id, user);
            }
            RoomCommand::Leave { connection_id } => {
                handle_leave(&room_id, &mut state, &deps, &connection_id);
            }
            RoomCommand::RequestMessageHistory { connection_id } => {
                deliver(
                    &room_id,
                    &mut state,
                    &deps,
                    &connection_id,
                    ServerEvent::MessageHistory {
                        messages: state.messages.clone(),
                    },
                );
            }
            RoomCommand::Chat { connection_id, message } => {
                handle_chat(&room_id, &mut state, &deps, &connection_id, message);
            }
            RoomCommand::StartStream {
                connection_id,
                username,
                quality,
            } => {
                handle_start_stream(&room_id, &mut state, &deps, &connection_id, username, quality);
            }
            RoomCommand::StopStream { connection_id } => {
                handle_stop_stream(&room_id, &mut state, &deps, &connection_id);
            }
            RoomCommand::Offer {
                connection_id,
                target_peer_id,
                payload,
            } => relay_signal(&room_id, &mut state, &deps, &connection_id, &target_peer_id, payload, |p| {
                ServerEvent::Offer {
                    from_peer_id: connection_id_clone(&connection_id),
                    payload: p,
                }
            }),
            RoomCommand::Answer {
                connection_id,
                target_peer_id,
                payload,
            } => relay_signal(&room_id, &mut state, &deps, &connection_id, &target_peer_id, payload, |p| {
                ServerEvent::Answer {
                    from_peer_id: connection_id_clone(&connection_id),
                    payload: p,
                }
            }),
            RoomCommand::IceCandidate {
                connection_id,
                target_peer_id,
                payload,
            } => relay_signal(&room_id, &mut state, &deps, &connection_id, &target_peer_id, payload, |p| {
                ServerEvent::IceCandidate {
                    from_peer_id: connection_id_clone(&connection_id),
                    payload: p,
                }
            }),
            RoomCommand::MuteAllParticipants { requester_id } => {
                handle_mute_all(&room_id, &mut state, &deps, &requester_id);
            }
            RoomCommand::MuteParticipant {
                requester_id,
                target_user_id,
            } => {
                handle_mute_participant(&room_id, &mut state, &deps, &requester_id, &target_user_id);
            }
            RoomCommand::KickParticipant {
                requester_id,
                target_user_id,
                reason,
            } => {
                handle_kick(&room_id, &mut state, &deps, &requester_id, &target_user_id, reason);
            }
            RoomCommand::RaiseHand { user_id } => {
                handle_raise_hand(&room_id, &mut state, &deps, &user_id);
            }
            RoomCommand::LowerHand { user_id } => {
                handle_lower_hand(&room_id, &mut state, &deps, &user_id);
            }
            RoomCommand::RecordingStarted { teacher_id } => {
                handle_recording_started(&room_id, &mut state, &deps, &teacher_id);
            }
            RoomCommand::RecordingStopped { teacher_id, duration } => {
                handle_recording_stopped(&room_id, &mut state, &deps, &teacher_id, duration);
            }
            RoomCommand::ClearRoom { reason } => {
                handle_clear_room(&room_id, &mut state, &deps, &reason);
                return;
            }
            RoomCommand::CheckIdle { threshold, reply } => {
                let idle = state.participants.is_empty() && state.last_activity.elapsed() > threshold;
                if idle {
                    handle_room_closed(&room_id, &mut state, &deps, "inactive");
                    let _ = reply.send(true);
                    return;
                }
                let _ = reply.send(false);
            }
            RoomCommand::Shutdown { message } => {
                let event = ServerEvent::ServerShutdown {
                    message,
                    timestamp: now_iso(),
                };
                broadcast(&room_id, &mut state, &deps, event, None);
                return;
            }
        }
    }
}

fn connection_id_clone(id: &str) -> String {
    id.to_string()
}

fn handle_join(room_id: &str, state: &mut RoomState, deps: &RoomDeps, connection_id: ConnectionId, user: crate::models::User) {
    let participant = Participant::new(connection_id.clone(), &user, now_iso());
    deps.connections.join(&connection_id, room_id);

    let joined_event = ServerEvent::UserJoined {
        user_id: participant.user_id.clone(),
        username: participant.username.clone(),
        connection_id: participant.connection_id.clone(),
        role: participant.role,
        display_name: participant.display_name.clone(),
        status: participant.status.clone(),
    };
    broadcast(room_id, state, deps, joined_event, None);

    deliver(
        room_id,
        state,
        deps,
        &connection_id,
        ServerEvent::Welcome {
            message: "connected".to_string(),
            timestamp: now_iso(),
        },
    );
    deliver(
        room_id,
        state,
        deps,
        &connection_id,
        ServerEvent::RoomState {
            stream: state.stream.clone(),
            participants: {
                let mut all = state.participants.clone();
                all.push(participant.clone());
                all
            },
        },
    );
    deliver(
        room_id,
        state,
        deps,
        &connection_id,
        ServerEvent::MessageHistory {
            messages: state.messages.clone(),
        },
    );

    state.participants.push(participant);
    state.touch();
}

fn handle_leave(room_id: &str, state: &mut RoomState, deps: &RoomDeps, connection_id: &str) {
    let Some(pos) = state.participants.iter().position(|p| p.connection_id == connection_id) else {
        return;
    };
    let participant = state.participants.remove(pos);
    deps.connections.leave(connection_id, room_id);

    if state.streamer_connection.as_deref() == Some(connection_id) {
        state.stream = None;
        state.streamer_connection = None;
        broadcast(room_id, state, deps, ServerEvent::StreamStopped {}, None);
    }

    let left_event = ServerEvent::UserLeft {
        user_id: participant.user_id,
        username: participant.username,
        connection_id: participant.connection_id,
    };
    broadcast(room_id, state, deps, left_event, None);
    state.touch();
}

fn handle_chat(room_id: &str, state: &mut RoomState, deps: &RoomDeps, connection_id: &str, message: crate::protocol::ChatMessageInput) {
    if !deps.rate_limiter.check(&message.user_id, &deps.rate_limit_config) {
        deliver(
            room_id,
            state,
            deps,
            connection_id,
            ServerEvent::Error {
                message: "Rate limit exceeded".to_string(),
            },
        );
        return;
    }

    let sequence = state.next_sequence;
    state.next_sequence += 1;

    let record = Message {
        message_id: generate_message_id(room_id),
        sequence,
        user_id: message.user_id,
        username: message.username,
        content: message.content,
        timestamp: now_iso(),
    };

    state.messages.push(record.clone());
    if state.messages.len() > deps.message_history_limit {
        let overflow = state.messages.len() - deps.message_history_limit;
        state.messages.drain(0..overflow);
    }

    broadcast(
        room_id,
        state,
        deps,
        ServerEvent::NewMessage {
            message_id: record.message_id,
            sequence: record.sequence,
            user_id: record.user_id,
            username: record.username,
            content: record.content,
            timestamp: record.timestamp,
        },
        None,
    );
    state.touch();
}

fn handle_start_stream(
    room_id: &str,
    state: &mut RoomState,
    deps: &RoomDeps,
    connection_id: &str,
    username: String,
    quality: crate::models::StreamQuality,
) {
    let Some(participant) = state.find_by_connection(connection_id) else {
        return;
    };
    if !participant.can_stream {
        deliver(
            room_id,
            state,
            deps,
            connection_id,
            ServerEvent::Error {
                message: "not permitted to stream".to_string(),
            },
        );
        return;
    }

    let stream_state = StreamState {
        active: true,
        streamer_display_name: username,
        quality,
    };
    state.stream = Some(stream_state.clone());
    state.streamer_connection = Some(connection_id.to_string());
    broadcast(room_id, state, deps, ServerEvent::StreamStarted { state: stream_state }, None);
    state.touch();
}

fn handle_stop_stream(room_id: &str, state: &mut RoomState, deps: &RoomDeps, connection_id: &str) {
    if state.stream.is_none() {
        return;
    }
    if state.streamer_connection.as_deref() != Some(connection_id) {
        return;
    }
    state.stream = None;
    state.streamer_connection = None;
    broadcast(room_id, state, deps, ServerEvent::StreamStopped {}, None);
    state.touch();
}

fn relay_signal(
    room_id: &str,
    state: &mut RoomState,
    deps: &RoomDeps,
    connection_id: &str,
    target_peer_id: &str,
    payload: serde_json::Value,
    build_event: impl FnOnce(serde_json::Value) -> ServerEvent,
) {
    if state.find_by_connection(connection_id).is_none() {
        return;
    }
    deliver(room_id, state, deps, target_peer_id, build_event(payload));
}

fn handle_mute_all(room_id: &str, state: &mut RoomState, deps: &RoomDeps, requester_id: &str) {
    let Some(requester) = state.find_by_user(requester_id) else {
        return;
    };
    if !requester.role.can_moderate() {
        deny(room_id, state, deps, requester_id);
        return;
    }
    broadcast(
        room_id,
        state,
        deps,
        ServerEvent::MuteAll {
            requested_by: requester_id.to_string(),
            timestamp: now_iso(),
        },
        None,
    );
}

fn handle_mute_participant(room_id: &str, state: &mut RoomState, deps: &RoomDeps, requester_id: &str, target_user_id: &str) {
    let Some(requester) = state.find_by_user(requester_id) else {
        return;
    };
    if !requester.role.can_moderate() {
        deny(room_id, state, deps, requester_id);
        return;
    }
    let Some(target) = state.find_by_user(target_user_id) else {
        return;
    };
    let target_connection_id = target.connection_id.clone();
    deliver(
        room_id,
        state,
        deps,
        &target_connection_id,
        ServerEvent::MutedByTeacher {
            requested_by: requester_id.to_string(),
            reason: None,
            timestamp: now_iso(),
        },
    );
}

fn handle_kick(
    room_id: &str,
    state: &mut RoomState,
    deps: &RoomDeps,
    requester_id: &str,
    target_user_id: &str,
    reason: Option<String>,
) {
    let Some(requester) = state.find_by_user(requester_id) else {
        return;
    };
    if !requester.role.can_moderate() {
        deny(room_id, state, deps, requester_id);
        return;
    }
    let Some(pos) = state.participants.iter().position(|p| p.user_id == target_user_id) else {
        return;
    };
    let target = state.participants.remove(pos);
    deps.connections.leave(&target.connection_id, room_id);

    // Already removed from participants above, so a failed send here has no
    // eviction to do; the grace-period task below closes the socket either way.
    deps.connections.send_to_connection(
        &target.connection_id,
        ServerEvent::KickedFromRoom {
            room_id: room_id.to_string(),
            reason: reason.clone(),
            kicked_by: requester_id.to_string(),
            timestamp: now_iso(),
        },
    );
    broadcast(
        room_id,
        state,
        deps,
        ServerEvent::ParticipantKicked {
            user_id: target_user_id.to_string(),
            reason,
        },
        None,
    );

    let connections = Arc::clone(&deps.connections);
    let target_connection_id = target.connection_id.clone();
    tokio::spawn(async move {
        tokio::time::sleep(KICK_GRACE_PERIOD).await;
        connections.close(&target_connection_id);
    });
    state.touch();
}

fn handle_raise_hand(room_id: &str, state: &mut RoomState, deps: &RoomDeps, user_id: &str) {
    let Some(participant) = state.participants.iter_mut().find(|p| p.user_id == user_id) else {
        return;
    };
    participant.hand_raised = true;
    participant.hand_raised_at = Some(now_iso());
    let username = participant.username.clone();
    broadcast(
        room_id,
        state,
        deps,
        ServerEvent::HandRaised {
            user_id: user_id.to_string(),
            username,
            timestamp: now_iso(),
        },
        None,
    );
}

fn handle_lower_hand(room_id: &str, state: &mut RoomState, deps: &RoomDeps, user_id: &str) {
    let Some(participant) = state.participants.iter_mut().find(|p| p.user_id == user_id) else {
        return;
    };
    participant.hand_raised = false;
    participant.hand_raised_at = None;
    broadcast(
        room_id,
        state,
        deps,
        ServerEvent::HandLowered {
            user_id: user_id.to_string(),
            timestamp: now_iso(),
        },
        None,
    );
}

fn handle_recording_started(room_id: &str, state: &mut RoomState, deps: &RoomDeps, teacher_id: &str) {
    let Some(requester) = state.find_by_user(teacher_id) else {
        return;
    };
    if !requester.can_stream {
        deny(room_id, state, deps, teacher_id);
        return;
    }
    broadcast(
        room_id,
        state,
        deps,
        ServerEvent::LectureRecordingStarted {
            teacher_id: teacher_id.to_string(),
            timestamp: now_iso(),
        },
        None,
    );
}

fn handle_recording_stopped(room_id: &str, state: &mut RoomState, deps: &RoomDeps, teacher_id: &str, duration: f64) {
    let Some(requester) = state.find_by_user(teacher_id) else {
        return;
    };
    if !requester.can_stream {
        deny(room_id, state, deps, teacher_id);
        return;
    }
    broadcast(
        room_id,
        state,
        deps,
        ServerEvent::LectureRecordingStopped {
            teacher_id: teacher_id.to_string(),
            duration,
            timestamp: now_iso(),
        },
        None,
    );
}

/// Lecture-ended teardown (§4.4.9): broadcasts `room_cleared` and tears down
/// the room's state. The caller ends the actor task right after this runs.
fn handle_clear_room(room_id: &str, state: &mut RoomState, deps: &RoomDeps, reason: &str) {
    broadcast(
        room_id,
        state,
        deps,
        ServerEvent::RoomCleared {
            room_id: room_id.to_string(),
            reason: reason.to_string(),
            timestamp: now_iso(),
        },
        None,
    );
    teardown(room_id, state, deps);
}

/// Idle-sweep teardown (§4.4.10): broadcasts `room_closed` instead of
/// `room_cleared` — same state wipe, a distinct wire event for a distinct
/// trigger. Only ever called on an empty room, so the broadcast is a no-op,
/// but it's emitted for symmetry with `handle_clear_room`.
fn handle_room_closed(room_id: &str, state: &mut RoomState, deps: &RoomDeps, reason: &str) {
    broadcast(
        room_id,
        state,
        deps,
        ServerEvent::RoomClosed {
            room_id: room_id.to_string(),
            reason: reason.to_string(),
            timestamp: now_iso(),
        },
        None,
    );
    teardown(room_id, state, deps);
}

fn teardown(room_id: &str, state: &mut RoomState, deps: &RoomDeps) {
    for participant in &state.participants {
        deps.connections.leave(&participant.connection_id, room_id);
    }
    state.participants.clear();
    state.messages.clear();
    state.stream = None;
    state.streamer_connection = None;
    state.touch();
}

fn deny(room_id: &str, state: &mut RoomState, deps: &RoomDeps, requester_id: &str) {
    let Some(requester_connection_id) = state.find_by_user(requester_id).map(|p| p.connection_id.clone()) else {
        return;
    };
    deliver(
        room_id,
        state,
        deps,
        &requester_connection_id,
        ServerEvent::Error {
            message: "not permitted".to_string(),
        },
    );
}

/// Unicasts `event` to `connection_id`. A failed send (unknown connection,
/// or a full outbound queue — a slow consumer) closes the connection and, if
/// it was a participant in this room, evicts it the same way an explicit
/// `leave` would (§4.3: overflow closes the connection as `slow_consumer`).
fn deliver(room_id: &str, state: &mut RoomState, deps: &RoomDeps, connection_id: &str, event: ServerEvent) {
    if !deps.connections.send_to_connection(connection_id, event) {
        evict_slow_consumer(room_id, state, deps, connection_id);
    }
}

fn evict_slow_consumer(room_id: &str, state: &mut RoomState, deps: &RoomDeps, connection_id: &str) {
    deps.connections.close(connection_id);
    let Some(pos) = state.participants.iter().position(|p| p.connection_id == connection_id) else {
        return;
    };
    let participant = state.participants.remove(pos);
    if state.streamer_connection.as_deref() == Some(connection_id) {
        state.stream = None;
        state.streamer_connection = None;
        broadcast(room_id, state, deps, ServerEvent::StreamStopped {}, None);
    }
    broadcast(
        room_id,
        state,
        deps,
        ServerEvent::UserLeft {
            user_id: participant.user_id,
            username: participant.username,
            connection_id: participant.connection_id,
        },
        None,
    );
}

fn broadcast(room_id: &str, state: &mut RoomState, deps: &RoomDeps, event: ServerEvent, exclude: Option<&str>) {
    let mut failed = Vec::new();
    for participant in &state.participants {
        if exclude == Some(participant.connection_id.as_str()) {
            continue;
        }
        if !deps.connections.send_to_connection(&participant.connection_id, event.clone()) {
            failed.push(participant.connection_id.clone());
        }
    }
    for connection_id in failed {
        evict_slow_consumer(room_id, state, deps, &connection_id);
    }
}
