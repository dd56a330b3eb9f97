//! Idle-room sweep (§4.4.10): a background task that periodically asks the
//! Hub to drop rooms that are both empty and past the inactivity threshold.

use crate::hub::RoomHub;
use std::sync::Arc;
use std::time::Duration;

pub fn spawn_sweep_task(hub: Arc<RoomHub>, interval: Duration, threshold: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // first tick fires immediately; skip it

        loop {
            ticker.tick().await;
            hub.sweep_idle_rooms(threshold).await;
        }
    });
}
