//! The Connection Endpoint (C3): owns the transport-facing side of each
//! long-lived connection. The Hub only ever sees typed [`ServerEvent`]s
//! handed to [`ConnectionRegistry::send_to_connection`] — how those get onto
//! the wire (WebSocket frame, SSE chunk, whatever) is this module's problem,
//! not the Hub's.
//!
//! Every connection gets a bounded outbound queue. A slow consumer — a
//! client that stops reading — fills its queue and gets dropped rather than
//! let a single bad connection back-pressure the room's actor loop.

use crate::models::ConnectionId;
use crate::protocol::ServerEvent;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tokio::sync::mpsc;

pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

struct ConnectionEntry {
    sender: mpsc::Sender<ServerEvent>,
    rooms: HashSet<String>,
}

#[derive(Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, ConnectionEntry>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly-accepted connection. The returned receiver is
    /// what the socket task drains and forwards to the wire.
    pub fn register(&self, connection_id: ConnectionId) -> mpsc::Receiver<ServerEvent> {
        let (sender, receiver) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        let mut connections = self.connections.lock().unwrap_or_else(|e| e.into_inner());
        connections.insert(
            connection_id,
            ConnectionEntry {
                sender,
                rooms: HashSet::new(),
            },
        );
        receiver
    }

    pub fn join(&self, connection_id: &str, room_id: &str) {
        let mut connections = self.connections.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = connections.get_mut(connection_id) {
            entry.rooms.insert(room_id.to_string());
        }
    }

    pub fn leave(&self, connection_id: &str, room_id: &str) {
        let mut connections = self.connections.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = connections.get_mut(connection_id) {
            entry.rooms.remove(room_id);
        }
    }

    /// Idempotent. Removes the connection and returns the rooms it had
    /// joined, so the caller can tell each of those rooms' hubs it's gone.
    pub fn close(&self, connection_id: &str) -> Vec<String> {
        let mut connections = self.connections.lock().unwrap_or_else(|e| e.into_inner());
        match connections.remove(connection_id) {
            Some(entry) => entry.rooms.into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Best-effort unicast. Returns `false` if the connection is unknown or
    /// its queue is full (slow consumer) — in the latter case the caller
    /// should treat the connection as dead and close it.
    pub fn send_to_connection(&self, connection_id: &str, event: ServerEvent) -> bool {
        let sender = {
            let connections = self.connections.lock().unwrap_or_else(|e| e.into_inner());
            connections.get(connection_id).map(|e| e.sender.clone())
        };
        match sender {
            Some(sender) => sender.try_send(event).is_ok(),
            None => false,
        }
    }

    /// Unicasts the same event to each connection in `connection_ids`,
    /// returning the subset that failed (unknown or slow-consumer dropped).
    pub fn broadcast(&self, connection_ids: &[ConnectionId], event: &ServerEvent) -> Vec<ConnectionId> {
        connection_ids
            .iter()
            .filter(|id| !self.send_to_connection(id, event.clone()))
            .cloned()
            .collect()
    }
}
