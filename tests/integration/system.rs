use crate::common::test_client;
use rocket::http::Status;

#[test]
fn health_reports_ok() {
    let client = test_client();
    let res = client.get("/api/v1/health").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "classroom-core");
}

#[test]
fn stats_reflects_created_rooms_and_lectures() {
    let client = test_client();
    let room_id = crate::common::create_test_room(&client, "Room A");
    crate::common::create_test_lecture(&client, &room_id);

    let res = client.get("/api/v1/stats").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["rooms"], 1);
    assert_eq!(body["lectures"], 1);
    assert_eq!(body["lectures_in_progress"], 0);
}

#[test]
fn unknown_route_returns_not_found() {
    let client = test_client();
    let res = client.get("/api/v1/nonexistent").dispatch();
    assert_eq!(res.status(), Status::NotFound);
}
