//! The Room Hub (C4) — the engineering core (§4.4). Each room is realized
//! as an independent `tokio::task` (see [`room`]) so that rooms never
//! contend with one another; the Hub itself is just a registry mapping
//! `roomId -> mpsc::Sender<RoomCommand>` plus the join-time gate that
//! consults the Lecture Registry before a room is ever materialized.

pub mod commands;
mod room;

use crate::config::RuntimeConfig;
use crate::connection::ConnectionRegistry;
use crate::models::ConnectionId;
use crate::protocol::{ClientEvent, JoinErrorCode, ServerEvent};
use crate::rate_limit::RateLimiter;
use crate::registry::LectureRegistry;
use commands::RoomCommand;
use room::RoomDeps;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

pub struct RoomHub {
    connections: Arc<ConnectionRegistry>,
    registry: Arc<LectureRegistry>,
    rate_limiter: Arc<RateLimiter>,
    config: RuntimeConfig,
    rooms: Mutex<HashMap<String, mpsc::Sender<RoomCommand>>>,
}

impl RoomHub {
    pub fn new(connections: Arc<ConnectionRegistry>, registry: Arc<LectureRegistry>, config: RuntimeConfig) -> Self {
        RoomHub {
            connections,
            registry,
            rate_limiter: Arc::new(RateLimiter::new()),
            config,
            rooms: Mutex::new(HashMap::new()),
        }
    }

    fn get_room_sender(&self, room_id: &str) -> Option<mpsc::Sender<RoomCommand>> {
        let rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
        rooms.get(room_id).cloned()
    }

    fn get_or_create_room_sender(&self, room_id: &str) -> mpsc::Sender<RoomCommand> {
        let mut rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
        rooms
            .entry(room_id.to_string())
            .or_insert_with(|| {
                let deps = RoomDeps {
                    connections: Arc::clone(&self.connections),
                    rate_limiter: Arc::clone(&self.rate_limiter),
                    rate_limit_config: self.config.rate_limit,
                    message_history_limit: self.config.message_history_limit,
                };
                room::spawn_room(room_id.to_string(), deps)
            })
            .clone()
    }

    /// The single entry point the Connection Endpoint calls for every
    /// inbound frame. `join_room` is special-cased: it must not materialize
    /// a room before the Lecture Registry confirms admission (§4.4.2).
    pub async fn handle_client_event(&self, connection_id: ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::JoinRoom { room_id, user } => {
                self.join(connection_id, room_id, user).await;
            }
            ClientEvent::LeaveRoom { room_id } => {
                self.dispatch(&room_id, RoomCommand::Leave { connection_id }).await;
            }
            ClientEvent::RequestMessageHistory { room_id } => {
                self.dispatch(&room_id, RoomCommand::RequestMessageHistory { connection_id }).await;
            }
            ClientEvent::SendMessage { room_id, message } => {
                self.dispatch(&room_id, RoomCommand::Chat { connection_id, message }).await;
            }
            ClientEvent::StartStream { room_id, username, quality } => {
                self.dispatch(&room_id, RoomCommand::StartStream { connection_id, username, quality })
                    .await;
            }
            ClientEvent::StopStream { room_id } => {
                self.dispatch(&room_id, RoomCommand::StopStream { connection_id }).await;
            }
            ClientEvent::Offer {
                room_id,
                target_peer_id,
                offer,
            } => {
                self.dispatch(
                    &room_id,
                    RoomCommand::Offer {
                        connection_id,
                        target_peer_id,
                        payload: offer,
                    },
                )
                .await;
            }
            ClientEvent::Answer {
                room_id,
                target_peer_id,
                answer,
            } => {
                self.dispatch(
                    &room_id,
                    RoomCommand::Answer {
                        connection_id,
                        target_peer_id,
                        payload: answer,
                    },
                )
                .await;
            }
            ClientEvent::IceCandidate {
                room_id,
                target_peer_id,
                candidate,
            } => {
                self.dispatch(
                    &room_id,
                    RoomCommand::IceCandidate {
                        connection_id,
                        target_peer_id,
                        payload: candidate,
                    },
                )
                .await;
            }
            ClientEvent::MuteAllParticipants { room_id, requester_id } => {
                self.dispatch(&room_id, RoomCommand::MuteAllParticipants { requester_id }).await;
            }
            ClientEvent::MuteParticipant {
                room_id,
                target_user_id,
                requester_id,
            } => {
                self.dispatch(
                    &room_id,
                    RoomCommand::MuteParticipant {
                        requester_id,
                        target_user_id,
                    },
                )
                .await;
            }
            ClientEvent::KickParticipant {
                room_id,
                target_user_id,
                requester_id,
                reason,
            } => {
                self.dispatch(
                    &room_id,
                    RoomCommand::KickParticipant {
                        requester_id,
                        target_user_id,
                        reason,
                    },
                )
                .await;
            }
            ClientEvent::RaiseHand { room_id, user_id } => {
                self.dispatch(&room_id, RoomCommand::RaiseHand { user_id }).await;
            }
            ClientEvent::LowerHand { room_id, user_id } => {
                self.dispatch(&room_id, RoomCommand::LowerHand { user_id }).await;
            }
            ClientEvent::RecordingStarted { room_id, teacher_id } => {
                self.dispatch(&room_id, RoomCommand::RecordingStarted { teacher_id }).await;
            }
            ClientEvent::RecordingStopped {
                room_id,
                teacher_id,
                duration,
            } => {
                self.dispatch(&room_id, RoomCommand::RecordingStopped { teacher_id, duration }).await;
            }
        }
    }

    async fn dispatch(&self, room_id: &str, command: RoomCommand) {
        if let Some(sender) = self.get_room_sender(room_id) {
            let _ = sender.send(command).await;
        }
    }

    async fn join(&self, connection_id: ConnectionId, room_id: String, user: crate::models::User) {
        if !self.registry.is_room_available(&room_id) {
            let lecture_status = self.registry.entry_for_room(&room_id).map(|e| e.status);
            self.connections.send_to_connection(
                &connection_id,
                ServerEvent::JoinRoomError {
                    code: JoinErrorCode::RoomUnavailable,
                    message: "room is not currently available".to_string(),
                    lecture_status,
                    room_id,
                },
            );
            return;
        }

        let sender = self.get_or_create_room_sender(&room_id);
        let _ = sender.send(RoomCommand::Join { connection_id, user }).await;
    }

    /// Called by a connection's transport task when the socket closes
    /// without an explicit `leave_room` (§4.4.3). Tells every room the
    /// connection had joined that it's gone.
    pub async fn handle_disconnect(&self, connection_id: ConnectionId) {
        let rooms = self.connections.close(&connection_id);
        for room_id in rooms {
            self.dispatch(
                &room_id,
                RoomCommand::Leave {
                    connection_id: connection_id.clone(),
                },
            )
            .await;
        }
    }

    /// Invoked by the Event Coordinator (C5) when a lecture becomes
    /// `completed` or `cancelled` (§4.4.9). The room actor tears itself down
    /// after broadcasting `room_cleared`; dropping its entry here is what
    /// makes a second `clear_room` on the same room truly a no-op (no
    /// sender found, nothing dispatched) rather than a message sent into a
    /// zombie task.
    pub async fn clear_room(&self, room_id: &str, reason: &str) {
        self.dispatch(room_id, RoomCommand::ClearRoom { reason: reason.to_string() }).await;
        let mut rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
        rooms.remove(room_id);
    }

    /// The idle sweep (§4.4.10): checks every live room and drops the ones
    /// that are both empty and past `threshold`.
    pub async fn sweep_idle_rooms(&self, threshold: Duration) {
        let snapshot: Vec<(String, mpsc::Sender<RoomCommand>)> = {
            let rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
            rooms.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        };

        let mut to_remove = Vec::new();
        for (room_id, sender) in snapshot {
            let (reply_tx, reply_rx) = oneshot::channel();
            if sender.send(RoomCommand::CheckIdle { threshold, reply: reply_tx }).await.is_err() {
                to_remove.push(room_id);
                continue;
            }
            if let Ok(true) = reply_rx.await {
                to_remove.push(room_id);
            }
        }

        if !to_remove.is_empty() {
            let mut rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
            for room_id in to_remove {
                rooms.remove(&room_id);
            }
        }
    }

    /// Graceful shutdown (§4.4.11): every live room broadcasts
    /// `server_shutdown` to its own members and exits.
    pub async fn shutdown(&self, message: &str) {
        let rooms: Vec<mpsc::Sender<RoomCommand>> = {
            let rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
            rooms.values().cloned().collect()
        };
        for sender in rooms {
            let _ = sender.send(RoomCommand::Shutdown { message: message.to_string() }).await;
        }
        let mut rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
        rooms.clear();
    }
}
