use crate::store::DocumentStore;
use rocket::serde::json::Json;
use rocket::{get, State};

#[get("/api/v1/health")]
pub fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "classroom-core",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[get("/api/v1/stats")]
pub fn stats(store: &State<DocumentStore>) -> Json<serde_json::Value> {
    let rooms = store.find_rooms(|_| true);
    let lectures = store.find_lectures(|_| true);
    let in_progress = lectures
        .iter()
        .filter(|l| l.status == crate::models::LectureStatus::InProgress)
        .count();

    Json(serde_json::json!({
        "rooms": rooms.len(),
        "lectures": lectures.len(),
        "lectures_in_progress": in_progress
    }))
}

#[rocket::catch(429)]
pub fn too_many_requests() -> Json<serde_json::Value> {
    Json(serde_json::json!({"error": "Too many requests"}))
}

#[rocket::catch(404)]
pub fn not_found() -> Json<serde_json::Value> {
    Json(serde_json::json!({"error": "Not found"}))
}
