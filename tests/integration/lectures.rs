use crate::common::{create_test_lecture, create_test_room, test_client};
use rocket::http::{ContentType, Status};

#[test]
fn create_lecture_defaults_to_scheduled_and_links_the_room() {
    let client = test_client();
    let room_id = create_test_room(&client, "Room A");
    let lecture_id = create_test_lecture(&client, &room_id);

    let res = client.get(format!("/api/v1/lectures/{lecture_id}")).dispatch();
    assert_eq!(res.status(), Status::Ok);
    let lecture: serde_json::Value = res.into_json().unwrap();
    assert_eq!(lecture["status"], "scheduled");
    assert_eq!(lecture["room_id"], room_id);

    let room: serde_json::Value = client.get(format!("/api/v1/rooms/{room_id}")).dispatch().into_json().unwrap();
    assert_eq!(room["status"], "scheduled");
    assert_eq!(room["current_lecture"], lecture_id);
}

#[test]
fn status_transition_to_in_progress_occupies_the_room() {
    let client = test_client();
    let room_id = create_test_room(&client, "Room A");
    let lecture_id = create_test_lecture(&client, &room_id);

    let res = client
        .patch(format!("/api/v1/lectures/{lecture_id}/status"))
        .header(ContentType::JSON)
        .body(r#"{"status": "in-progress"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let lecture: serde_json::Value = res.into_json().unwrap();
    assert_eq!(lecture["status"], "in-progress");

    let room: serde_json::Value = client.get(format!("/api/v1/rooms/{room_id}")).dispatch().into_json().unwrap();
    assert_eq!(room["status"], "occupied");
}

#[test]
fn illegal_status_transition_is_rejected_with_conflict() {
    let client = test_client();
    let room_id = create_test_room(&client, "Room A");
    let lecture_id = create_test_lecture(&client, &room_id);

    // scheduled -> completed skips in-progress, which the DAG forbids.
    let res = client
        .patch(format!("/api/v1/lectures/{lecture_id}/status"))
        .header(ContentType::JSON)
        .body(r#"{"status": "completed"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Conflict);
}

#[test]
fn completing_a_lecture_frees_the_room() {
    let client = test_client();
    let room_id = create_test_room(&client, "Room A");
    let lecture_id = create_test_lecture(&client, &room_id);

    client
        .patch(format!("/api/v1/lectures/{lecture_id}/status"))
        .header(ContentType::JSON)
        .body(r#"{"status": "in-progress"}"#)
        .dispatch();
    let res = client
        .patch(format!("/api/v1/lectures/{lecture_id}/status"))
        .header(ContentType::JSON)
        .body(r#"{"status": "completed"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);

    let room: serde_json::Value = client.get(format!("/api/v1/rooms/{room_id}")).dispatch().into_json().unwrap();
    assert_eq!(room["status"], "available");
    assert!(room["current_lecture"].is_null());
}

#[test]
fn status_transition_for_unknown_lecture_is_not_found() {
    let client = test_client();
    let res = client
        .patch("/api/v1/lectures/does-not-exist/status")
        .header(ContentType::JSON)
        .body(r#"{"status": "in-progress"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::NotFound);
}
