//! The Event Coordinator (C5, §4.5): the only bridge between the external
//! admin surface (lecture/room CRUD) and the Hub/Registry/Store. It owns
//! the lecture status DAG check (§3) and the side effects each legal
//! transition triggers.

use crate::hub::RoomHub;
use crate::models::{Lecture, LecturePatch, LectureStatus, Room, RoomPatch, RoomStatus};
use crate::registry::LectureRegistry;
use crate::store::{DocumentStore, StoreError};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug)]
pub enum CoordinatorError {
    Store(StoreError),
    InvalidStatusTransition { from: LectureStatus, to: LectureStatus },
    NotFound,
}

impl fmt::Display for CoordinatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinatorError::Store(e) => write!(f, "{e}"),
            CoordinatorError::InvalidStatusTransition { from, to } => {
                write!(f, "INVALID_STATUS_TRANSITION: {from:?} -> {to:?}")
            }
            CoordinatorError::NotFound => write!(f, "lecture not found"),
        }
    }
}

impl std::error::Error for CoordinatorError {}

impl From<StoreError> for CoordinatorError {
    fn from(e: StoreError) -> Self {
        CoordinatorError::Store(e)
    }
}

pub struct EventCoordinator {
    store: Arc<DocumentStore>,
    registry: Arc<LectureRegistry>,
    hub: Arc<RoomHub>,
}

impl EventCoordinator {
    pub fn new(store: Arc<DocumentStore>, registry: Arc<LectureRegistry>, hub: Arc<RoomHub>) -> Self {
        EventCoordinator { store, registry, hub }
    }

    pub fn create_room(&self, name: String, capacity: u32, features: Vec<String>) -> Result<Room, CoordinatorError> {
        let now = chrono::Utc::now().to_rfc3339();
        let room = Room {
            id: Uuid::new_v4().to_string(),
            name,
            capacity,
            status: RoomStatus::Available,
            features,
            current_lecture: None,
            created_at: now.clone(),
            updated_at: now.clone(),
            last_modified: now,
        };
        Ok(self.store.insert_room(room)?)
    }

    /// On lecture creation: store-insert, then stamp the room `scheduled` and
    /// point its `currentLecture` at the new lecture (§4.5).
    pub fn create_lecture(
        &self,
        name: String,
        date: String,
        room_id: String,
        teacher_id: String,
        created_by: String,
    ) -> Result<Lecture, CoordinatorError> {
        let now = chrono::Utc::now().to_rfc3339();
        let lecture = Lecture {
            id: Uuid::new_v4().to_string(),
            name,
            date,
            room_id: room_id.clone(),
            teacher_id,
            created_by,
            status: LectureStatus::Scheduled,
            description: None,
            max_participants: None,
            start_time: None,
            end_time: None,
            metadata: None,
            last_modified: now,
        };
        let inserted = self.store.insert_lecture(lecture)?;

        self.store.update_room(
            |r| r.id == room_id,
            RoomPatch {
                status: Some(RoomStatus::Scheduled),
                current_lecture: Some(Some(inserted.id.clone())),
                ..Default::default()
            },
        )?;

        Ok(inserted)
    }

    /// On status transition: validate against the DAG, persist, then fire
    /// the side effects named in §4.5.
    pub async fn transition_lecture_status(
        &self,
        lecture_id: &str,
        next: LectureStatus,
    ) -> Result<Lecture, CoordinatorError> {
        let current = self
            .store
            .find_one_lecture(|l| l.id == lecture_id)
            .ok_or(CoordinatorError::NotFound)?;

        if !current.status.can_transition_to(next) {
            return Err(CoordinatorError::InvalidStatusTransition {
                from: current.status,
                to: next,
            });
        }

        let updated = self
            .store
            .update_lecture(
                |l| l.id == lecture_id,
                LecturePatch {
                    status: Some(next),
                    ..Default::default()
                },
            )?
            .ok_or(CoordinatorError::NotFound)?;

        match next {
            LectureStatus::InProgress => {
                self.registry.register_lecture(lecture_id, &updated.room_id, next);
                self.store.update_room(
                    |r| r.id == updated.room_id,
                    RoomPatch {
                        status: Some(RoomStatus::Occupied),
                        ..Default::default()
                    },
                )?;
            }
            LectureStatus::Completed | LectureStatus::Cancelled => {
                self.registry.update_lecture_status(lecture_id, next);
                self.hub.clear_room(&updated.room_id, reason_for(next)).await;
                self.registry.unregister_lecture(lecture_id);
                self.store.update_room(
                    |r| r.id == updated.room_id,
                    RoomPatch {
                        status: Some(RoomStatus::Available),
                        current_lecture: Some(None),
                        ..Default::default()
                    },
                )?;
            }
            LectureStatus::Scheduled | LectureStatus::Delayed => {
                self.registry.update_lecture_status(lecture_id, next);
            }
        }

        Ok(updated)
    }
}

fn reason_for(status: LectureStatus) -> &'static str {
    match status {
        LectureStatus::Completed => "completed",
        LectureStatus::Cancelled => "cancelled",
        _ => "lecture_ended",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionRegistry;
    use std::fs;
    use std::path::PathBuf;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("classroom-coordinator-test-{}.json", Uuid::new_v4()))
    }

    fn make_coordinator(path: &PathBuf) -> EventCoordinator {
        let store = Arc::new(DocumentStore::open(path).unwrap());
        let registry = Arc::new(LectureRegistry::new());
        let connections = Arc::new(ConnectionRegistry::new());
        let hub = Arc::new(RoomHub::new(connections, Arc::clone(&registry), crate::config::RuntimeConfig::default()));
        EventCoordinator::new(store, registry, hub)
    }

    #[tokio::test]
    async fn in_progress_registers_lecture_and_occupies_room() {
        let path = temp_path();
        let coordinator = make_coordinator(&path);
        let room = coordinator.create_room("Room A".into(), 10, vec![]).unwrap();
        let lecture = coordinator
            .create_lecture("Intro".into(), "2026-01-01".into(), room.id.clone(), "t1".into(), "t1".into())
            .unwrap();

        let updated = coordinator
            .transition_lecture_status(&lecture.id, LectureStatus::InProgress)
            .await
            .unwrap();

        assert_eq!(updated.status, LectureStatus::InProgress);
        assert!(coordinator.registry.is_room_available(&room.id));
        let _ = fs::remove_file(&path);
    }

    #[tokio::test]
    async fn illegal_transition_is_rejected_without_side_effects() {
        let path = temp_path();
        let coordinator = make_coordinator(&path);
        let room = coordinator.create_room("Room A".into(), 10, vec![]).unwrap();
        let lecture = coordinator
            .create_lecture("Intro".into(), "2026-01-01".into(), room.id.clone(), "t1".into(), "t1".into())
            .unwrap();

        let result = coordinator
            .transition_lecture_status(&lecture.id, LectureStatus::Completed)
            .await;

        assert!(matches!(result, Err(CoordinatorError::InvalidStatusTransition { .. })));
        let unchanged = coordinator.store.find_one_lecture(|l| l.id == lecture.id).unwrap();
        assert_eq!(unchanged.status, LectureStatus::Scheduled);
        let _ = fs::remove_file(&path);
    }

    #[tokio::test]
    async fn completed_unregisters_and_frees_the_room() {
        let path = temp_path();
        let coordinator = make_coordinator(&path);
        let room = coordinator.create_room("Room A".into(), 10, vec![]).unwrap();
        let lecture = coordinator
            .create_lecture("Intro".into(), "2026-01-01".into(), room.id.clone(), "t1".into(), "t1".into())
            .unwrap();
        coordinator
            .transition_lecture_status(&lecture.id, LectureStatus::InProgress)
            .await
            .unwrap();

        coordinator
            .transition_lecture_status(&lecture.id, LectureStatus::Completed)
            .await
            .unwrap();

        assert!(!coordinator.registry.is_room_available(&room.id));
        let room_doc = coordinator.store.find_one_room(|r| r.id == room.id).unwrap();
        assert_eq!(room_doc.status, RoomStatus::Available);
        let _ = fs::remove_file(&path);
    }
}
