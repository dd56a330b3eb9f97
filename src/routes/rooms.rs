//! Thin, non-admin HTTP surface for rooms. The full admin CRUD surface is
//! explicitly out of scope (§1) — these routes exist only so the Event
//! Coordinator has something to create rooms/lectures against in a demo or
//! test deployment.

use crate::coordinator::EventCoordinator;
use crate::models::Room;
use crate::store::DocumentStore;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, post, State};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateRoomBody {
    pub name: String,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub features: Vec<String>,
}

#[post("/api/v1/rooms", format = "json", data = "<body>")]
pub fn create_room(
    coordinator: &State<EventCoordinator>,
    body: Json<CreateRoomBody>,
) -> Result<Json<Room>, (Status, Json<serde_json::Value>)> {
    let name = body.name.trim().to_string();
    if name.is_empty() {
        return Err((Status::BadRequest, Json(serde_json::json!({"error": "name is required"}))));
    }

    coordinator
        .create_room(name, body.capacity.unwrap_or(30), body.features.clone())
        .map(Json)
        .map_err(|e| (Status::InternalServerError, Json(serde_json::json!({"error": e.to_string()}))))
}

#[get("/api/v1/rooms/<room_id>")]
pub fn get_room(store: &State<DocumentStore>, room_id: &str) -> Result<Json<Room>, (Status, Json<serde_json::Value>)> {
    store
        .find_one_room(|r| r.id == room_id)
        .map(Json)
        .ok_or_else(|| (Status::NotFound, Json(serde_json::json!({"error": "room not found"}))))
}
