//! The Document Store (C1): a single-writer, multi-reader, in-memory cached
//! collection store whose authoritative copy is one JSON document on disk.
//!
//! Two collections exist: `events` (Lectures — the on-disk key is kept as
//! `events`, a naming holdover from the system this was distilled from) and
//! `rooms` (Rooms). Every mutating operation acquires the store's mutex once
//! and performs its entire read-modify-write inside that single critical
//! section, then commits the whole document to disk before releasing it —
//! this is the only concurrency-correctness mechanism the store needs.

use crate::models::{Lecture, LecturePatch, Room, RoomPatch};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Debug)]
pub enum StoreError {
    Read(io::Error),
    Write(io::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Read(e) => write!(f, "document store read failed: {e}"),
            StoreError::Write(e) => write!(f, "document store write failed: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    events: Vec<Lecture>,
    #[serde(default)]
    rooms: Vec<Room>,
}

pub struct DocumentStore {
    path: PathBuf,
    data: Mutex<StoreData>,
}

fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn write_atomic(path: &std::path::Path, data: &StoreData) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(data).expect("StoreData always serializes");
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, &json).map_err(StoreError::Write)?;
    fs::rename(&tmp_path, path).map_err(StoreError::Write)?;
    Ok(())
}

impl DocumentStore {
    /// Opens (or seeds) the document at `path`. A missing or corrupt file is
    /// treated the same way: initialize with the default skeleton and write
    /// it out; if that write fails, the error propagates.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(StoreError::Write)?;
        }

        let existing = fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str::<StoreData>(&raw).ok());

        let data = match existing {
            Some(data) => data,
            None => {
                let seeded = StoreData::default();
                write_atomic(&path, &seeded)?;
                seeded
            }
        };

        Ok(DocumentStore {
            path,
            data: Mutex::new(data),
        })
    }

    fn commit(&self, data: &StoreData) -> Result<(), StoreError> {
        write_atomic(&self.path, data)
    }

    // --- Lectures (persisted under the `events` key) ---

    pub fn find_lectures(&self, predicate: impl Fn(&Lecture) -> bool) -> Vec<Lecture> {
        let data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        data.events.iter().filter(|l| predicate(l)).cloned().collect()
    }

    pub fn find_one_lecture(&self, predicate: impl Fn(&Lecture) -> bool) -> Option<Lecture> {
        let data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        data.events.iter().find(|l| predicate(l)).cloned()
    }

    pub fn insert_lecture(&self, lecture: Lecture) -> Result<Lecture, StoreError> {
        let mut data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        data.events.push(lecture.clone());
        self.commit(&data)?;
        Ok(lecture)
    }

    pub fn update_lecture(
        &self,
        predicate: impl Fn(&Lecture) -> bool,
        patch: LecturePatch,
    ) -> Result<Option<Lecture>, StoreError> {
        let mut data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        let now = now_iso();
        let updated = data.events.iter_mut().find(|l| predicate(l)).map(|l| {
            if let Some(status) = patch.status {
                l.status = status;
            }
            if let Some(description) = patch.description {
                l.description = Some(description);
            }
            if let Some(start_time) = patch.start_time {
                l.start_time = Some(start_time);
            }
            if let Some(end_time) = patch.end_time {
                l.end_time = Some(end_time);
            }
            if let Some(metadata) = patch.metadata {
                l.metadata = Some(metadata);
            }
            l.last_modified = now.clone();
            l.clone()
        });
        if updated.is_some() {
            self.commit(&data)?;
        }
        Ok(updated)
    }

    pub fn delete_lecture(&self, predicate: impl Fn(&Lecture) -> bool) -> Result<bool, StoreError> {
        let mut data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        let before = data.events.len();
        data.events.retain(|l| !predicate(l));
        let removed = data.events.len() != before;
        if removed {
            self.commit(&data)?;
        }
        Ok(removed)
    }

    // --- Rooms ---

    pub fn find_rooms(&self, predicate: impl Fn(&Room) -> bool) -> Vec<Room> {
        let data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        data.rooms.iter().filter(|r| predicate(r)).cloned().collect()
    }

    pub fn find_one_room(&self, predicate: impl Fn(&Room) -> bool) -> Option<Room> {
        let data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        data.rooms.iter().find(|r| predicate(r)).cloned()
    }

    pub fn insert_room(&self, room: Room) -> Result<Room, StoreError> {
        let mut data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        data.rooms.push(room.clone());
        self.commit(&data)?;
        Ok(room)
    }

    pub fn update_room(
        &self,
        predicate: impl Fn(&Room) -> bool,
        patch: RoomPatch,
    ) -> Result<Option<Room>, StoreError> {
        let mut data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        let now = now_iso();
        let updated = data.rooms.iter_mut().find(|r| predicate(r)).map(|r| {
            if let Some(status) = patch.status {
                r.status = status;
            }
            if let Some(current_lecture) = patch.current_lecture {
                r.current_lecture = current_lecture;
            }
            if let Some(name) = patch.name {
                r.name = name;
            }
            if let Some(capacity) = patch.capacity {
                r.capacity = capacity;
            }
            if let Some(features) = patch.features {
                r.features = features;
            }
            r.updated_at = now.clone();
            r.last_modified = now.clone();
            r.clone()
        });
        if updated.is_some() {
            self.commit(&data)?;
        }
        Ok(updated)
    }

    pub fn delete_room(&self, predicate: impl Fn(&Room) -> bool) -> Result<bool, StoreError> {
        let mut data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        let before = data.rooms.len();
        data.rooms.retain(|r| !predicate(r));
        let removed = data.rooms.len() != before;
        if removed {
            self.commit(&data)?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LectureStatus, RoomStatus};

    fn temp_path() -> PathBuf {
        let dir = std::env::temp_dir();
        dir.join(format!("classroom-store-test-{}.json", uuid::Uuid::new_v4()))
    }

    fn sample_room(id: &str) -> Room {
        let now = now_iso();
        Room {
            id: id.to_string(),
            name: "Room A".to_string(),
            capacity: 30,
            status: RoomStatus::Available,
            features: vec![],
            current_lecture: None,
            created_at: now.clone(),
            updated_at: now.clone(),
            last_modified: now,
        }
    }

    fn sample_lecture(id: &str, room_id: &str) -> Lecture {
        let now = now_iso();
        Lecture {
            id: id.to_string(),
            name: "Intro".to_string(),
            date: now.clone(),
            room_id: room_id.to_string(),
            teacher_id: "t1".to_string(),
            created_by: "t1".to_string(),
            status: LectureStatus::Scheduled,
            description: None,
            max_participants: None,
            start_time: None,
            end_time: None,
            metadata: None,
            last_modified: now,
        }
    }

    #[test]
    fn insert_then_find_one_round_trips() {
        let path = temp_path();
        let store = DocumentStore::open(&path).unwrap();
        store.insert_room(sample_room("r1")).unwrap();
        let found = store.find_one_room(|r| r.id == "r1");
        assert_eq!(found.unwrap().id, "r1");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn update_then_find_one_returns_merged_doc_with_last_modified_set() {
        let path = temp_path();
        let store = DocumentStore::open(&path).unwrap();
        store.insert_lecture(sample_lecture("l1", "r1")).unwrap();
        let before = store.find_one_lecture(|l| l.id == "l1").unwrap();

        let updated = store
            .update_lecture(
                |l| l.id == "l1",
                LecturePatch {
                    status: Some(LectureStatus::InProgress),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.status, LectureStatus::InProgress);
        assert_ne!(updated.last_modified, before.last_modified);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn missing_file_seeds_default_skeleton() {
        let path = temp_path();
        assert!(!path.exists());
        let store = DocumentStore::open(&path).unwrap();
        assert!(path.exists());
        assert!(store.find_rooms(|_| true).is_empty());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn corrupt_file_is_reseeded_instead_of_failing() {
        let path = temp_path();
        fs::write(&path, b"not json").unwrap();
        let store = DocumentStore::open(&path).unwrap();
        assert!(store.find_rooms(|_| true).is_empty());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn delete_removes_matching_documents() {
        let path = temp_path();
        let store = DocumentStore::open(&path).unwrap();
        store.insert_room(sample_room("r1")).unwrap();
        assert!(store.delete_room(|r| r.id == "r1").unwrap());
        assert!(store.find_one_room(|r| r.id == "r1").is_none());
        assert!(!store.delete_room(|r| r.id == "r1").unwrap());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn concurrent_updates_to_the_same_document_both_apply() {
        use std::sync::Arc;
        use std::thread;

        let path = temp_path();
        let store = Arc::new(DocumentStore::open(&path).unwrap());
        store.insert_room(sample_room("r1")).unwrap();

        let s1 = Arc::clone(&store);
        let s2 = Arc::clone(&store);
        let t1 = thread::spawn(move || {
            s1.update_room(
                |r| r.id == "r1",
                RoomPatch {
                    status: Some(RoomStatus::Scheduled),
                    ..Default::default()
                },
            )
            .unwrap()
        });
        let t2 = thread::spawn(move || {
            s2.update_room(
                |r| r.id == "r1",
                RoomPatch {
                    capacity: Some(99),
                    ..Default::default()
                },
            )
            .unwrap()
        });

        let r1 = t1.join().unwrap();
        let r2 = t2.join().unwrap();
        assert!(r1.is_some());
        assert!(r2.is_some());

        let final_doc = store.find_one_room(|r| r.id == "r1").unwrap();
        assert_eq!(final_doc.status, RoomStatus::Scheduled);
        assert_eq!(final_doc.capacity, 99);
        let _ = fs::remove_file(&path);
    }
}
