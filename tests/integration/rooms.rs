use crate::common::test_client;
use rocket::http::{ContentType, Status};

#[test]
fn create_room_assigns_available_status() {
    let client = test_client();
    let res = client
        .post("/api/v1/rooms")
        .header(ContentType::JSON)
        .body(r#"{"name": "Room A", "capacity": 20}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["name"], "Room A");
    assert_eq!(body["capacity"], 20);
    assert_eq!(body["status"], "available");
    assert!(!body["id"].as_str().unwrap().is_empty());
}

#[test]
fn create_room_rejects_blank_name() {
    let client = test_client();
    let res = client
        .post("/api/v1/rooms")
        .header(ContentType::JSON)
        .body(r#"{"name": "   "}"#)
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

#[test]
fn get_room_returns_the_created_room() {
    let client = test_client();
    let room_id = crate::common::create_test_room(&client, "Room B");

    let res = client.get(format!("/api/v1/rooms/{room_id}")).dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["id"], room_id);
    assert_eq!(body["name"], "Room B");
}

#[test]
fn get_room_returns_not_found_for_unknown_id() {
    let client = test_client();
    let res = client.get("/api/v1/rooms/does-not-exist").dispatch();
    assert_eq!(res.status(), Status::NotFound);
}
