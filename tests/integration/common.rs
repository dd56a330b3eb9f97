use rocket::local::blocking::Client;

/// Wrapper around `Client` that cleans up its temp document-store file on drop.
pub struct TestClient {
    client: Option<Client>,
    storage_path: String,
}

impl Drop for TestClient {
    fn drop(&mut self) {
        drop(self.client.take());
        let _ = std::fs::remove_file(&self.storage_path);
    }
}

impl std::ops::Deref for TestClient {
    type Target = Client;
    fn deref(&self) -> &Client {
        self.client.as_ref().unwrap()
    }
}

pub fn test_client() -> TestClient {
    let storage_path = format!(
        "/tmp/classroom_test_{}.json",
        uuid::Uuid::new_v4().to_string().split('-').next().unwrap()
    );

    let mut config = classroom_core::config::RuntimeConfig::default();
    config.storage_path = storage_path.clone();
    let rocket = classroom_core::build_rocket(config);
    let client = Client::tracked(rocket).expect("valid rocket instance");
    TestClient {
        client: Some(client),
        storage_path,
    }
}

/// Creates a room and returns its id.
pub fn create_test_room(client: &Client, name: &str) -> String {
    use rocket::http::{ContentType, Status};
    let res = client
        .post("/api/v1/rooms")
        .header(ContentType::JSON)
        .body(format!(r#"{{"name": "{name}"}}"#))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    body["id"].as_str().unwrap().to_string()
}

/// Creates a lecture bound to `room_id` and returns its id.
pub fn create_test_lecture(client: &Client, room_id: &str) -> String {
    use rocket::http::{ContentType, Status};
    let res = client
        .post("/api/v1/lectures")
        .header(ContentType::JSON)
        .body(format!(
            r#"{{"name": "Intro", "date": "2026-01-01", "room_id": "{room_id}", "teacher_id": "t1", "created_by": "t1"}}"#
        ))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    body["id"].as_str().unwrap().to_string()
}
