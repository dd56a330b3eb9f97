//! The Lecture Registry (C2): an O(1) "is this room joinable right now?"
//! lookup, kept in memory so the hub never has to hit the Document Store on
//! the join hot path. A single mutex covers all four operations — the
//! registry is tiny, and per-entry locking would buy nothing.

use crate::models::LectureStatus;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryEntry {
    pub status: LectureStatus,
}

#[derive(Default)]
struct RegistryState {
    by_room: HashMap<String, (String, LectureStatus)>,
    room_of_lecture: HashMap<String, String>,
}

#[derive(Default)]
pub struct LectureRegistry {
    state: Mutex<RegistryState>,
}

impl LectureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called on transition to `in-progress`. Each lecture maps to at most
    /// one room and vice versa — registering a lecture drops any stale
    /// mapping for the room it replaces.
    pub fn register_lecture(&self, lecture_id: &str, room_id: &str, status: LectureStatus) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old_room) = state.room_of_lecture.remove(lecture_id) {
            state.by_room.remove(&old_room);
        }
        state
            .by_room
            .insert(room_id.to_string(), (lecture_id.to_string(), status));
        state
            .room_of_lecture
            .insert(lecture_id.to_string(), room_id.to_string());
    }

    /// Called on a status change while the lecture is already mapped. A
    /// no-op if the lecture isn't currently registered.
    pub fn update_lecture_status(&self, lecture_id: &str, status: LectureStatus) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(room_id) = state.room_of_lecture.get(lecture_id).cloned()
            && let Some(entry) = state.by_room.get_mut(&room_id)
        {
            entry.1 = status;
        }
    }

    /// Called on `completed`/`cancelled`. Removes the mapping entirely.
    pub fn unregister_lecture(&self, lecture_id: &str) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(room_id) = state.room_of_lecture.remove(lecture_id) {
            state.by_room.remove(&room_id);
        }
    }

    /// True iff there is a mapped lecture for `room_id` whose status is
    /// exactly `in-progress`.
    pub fn is_room_available(&self, room_id: &str) -> bool {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        matches!(
            state.by_room.get(room_id),
            Some((_, LectureStatus::InProgress))
        )
    }

    /// The mapped lecture entry for a room, if any — used by the hub to
    /// report `lectureStatus` on a `join_room_error`.
    pub fn entry_for_room(&self, room_id: &str) -> Option<RegistryEntry> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state
            .by_room
            .get(room_id)
            .map(|(_, status)| RegistryEntry { status: *status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_is_unavailable_until_lecture_registered_in_progress() {
        let registry = LectureRegistry::new();
        assert!(!registry.is_room_available("r1"));

        registry.register_lecture("l1", "r1", LectureStatus::Scheduled);
        assert!(!registry.is_room_available("r1"));

        registry.update_lecture_status("l1", LectureStatus::InProgress);
        assert!(registry.is_room_available("r1"));
    }

    #[test]
    fn unregister_makes_room_unavailable_again() {
        let registry = LectureRegistry::new();
        registry.register_lecture("l1", "r1", LectureStatus::InProgress);
        assert!(registry.is_room_available("r1"));

        registry.unregister_lecture("l1");
        assert!(!registry.is_room_available("r1"));
        assert!(registry.entry_for_room("r1").is_none());
    }

    #[test]
    fn each_lecture_maps_to_at_most_one_room() {
        let registry = LectureRegistry::new();
        registry.register_lecture("l1", "r1", LectureStatus::InProgress);
        registry.register_lecture("l1", "r2", LectureStatus::InProgress);

        assert!(!registry.is_room_available("r1"));
        assert!(registry.is_room_available("r2"));
    }
}
