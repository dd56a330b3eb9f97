//! Thin, non-admin HTTP surface for lectures (§6.4A). Status transitions go
//! through the Event Coordinator so the DAG check and side effects (§4.5)
//! always run.

use crate::coordinator::{CoordinatorError, EventCoordinator};
use crate::models::{Lecture, LectureStatus};
use crate::store::DocumentStore;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, patch, post, State};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateLectureBody {
    pub name: String,
    pub date: String,
    pub room_id: String,
    pub teacher_id: String,
    pub created_by: String,
}

#[post("/api/v1/lectures", format = "json", data = "<body>")]
pub fn create_lecture(
    coordinator: &State<EventCoordinator>,
    body: Json<CreateLectureBody>,
) -> Result<Json<Lecture>, (Status, Json<serde_json::Value>)> {
    coordinator
        .create_lecture(
            body.name.clone(),
            body.date.clone(),
            body.room_id.clone(),
            body.teacher_id.clone(),
            body.created_by.clone(),
        )
        .map(Json)
        .map_err(|e| (Status::InternalServerError, Json(serde_json::json!({"error": e.to_string()}))))
}

#[get("/api/v1/lectures/<lecture_id>")]
pub fn get_lecture(
    store: &State<DocumentStore>,
    lecture_id: &str,
) -> Result<Json<Lecture>, (Status, Json<serde_json::Value>)> {
    store
        .find_one_lecture(|l| l.id == lecture_id)
        .map(Json)
        .ok_or_else(|| (Status::NotFound, Json(serde_json::json!({"error": "lecture not found"}))))
}

#[derive(Debug, Deserialize)]
pub struct StatusPatchBody {
    pub status: LectureStatus,
}

#[patch("/api/v1/lectures/<lecture_id>/status", format = "json", data = "<body>")]
pub async fn update_lecture_status(
    coordinator: &State<EventCoordinator>,
    lecture_id: &str,
    body: Json<StatusPatchBody>,
) -> Result<Json<Lecture>, (Status, Json<serde_json::Value>)> {
    coordinator
        .transition_lecture_status(lecture_id, body.status)
        .await
        .map(Json)
        .map_err(|e| match e {
            CoordinatorError::InvalidStatusTransition { .. } => (
                Status::Conflict,
                Json(serde_json::json!({"error": "INVALID_STATUS_TRANSITION", "detail": e.to_string()})),
            ),
            CoordinatorError::NotFound => (Status::NotFound, Json(serde_json::json!({"error": "lecture not found"}))),
            CoordinatorError::Store(_) => (Status::InternalServerError, Json(serde_json::json!({"error": e.to_string()}))),
        })
}
