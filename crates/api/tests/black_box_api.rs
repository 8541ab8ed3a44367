use std::path::PathBuf;
use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};

use afterschool_api::{app, config::AppConfig};
use afterschool_infra::{InMemoryInventoryStore, InventoryStore};
use afterschool_lessons::NewLesson;

struct TestServer {
    base_url: String,
    store: Arc<InMemoryInventoryStore>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let store = Arc::new(InMemoryInventoryStore::new());
        let config = AppConfig {
            images_dir: images_dir(),
            ..AppConfig::default()
        };

        // Same router as prod, bound to an ephemeral port.
        let app = app::build_app(store.clone(), &config);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            store,
            handle,
        }
    }

    async fn lesson(&self, subject: &str, location: &str, price: f64, spaces: u32) -> String {
        self.store
            .insert_lesson(NewLesson::new(subject, location, price, spaces))
            .await
            .unwrap()
            .id
            .to_string()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn images_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("afterschool-images-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("music.png"), b"not really a png").unwrap();
    dir
}

async fn get_json(client: &reqwest::Client, url: String) -> (StatusCode, Value) {
    let res = client.get(url).send().await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

async fn spaces_of(srv: &TestServer, client: &reqwest::Client, id: &str) -> u64 {
    let (status, body) = get_json(client, srv.url(&format!("/lessons/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    body["spaces"].as_u64().unwrap()
}

#[tokio::test]
async fn health_and_ready_respond() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let (status, body) = get_json(&client, srv.url("/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn lists_lessons_with_camel_case_fields() {
    let srv = TestServer::spawn().await;
    srv.lesson("Math", "Hendon", 100.0, 5).await;
    srv.lesson("Music", "Camden", 85.0, 3).await;

    let client = reqwest::Client::new();
    let (status, body) = get_json(&client, srv.url("/lessons")).await;

    assert_eq!(status, StatusCode::OK);
    let lessons = body.as_array().unwrap();
    assert_eq!(lessons.len(), 2);
    let music = lessons.iter().find(|l| l["subject"] == "Music").unwrap();
    assert_eq!(music["location"], "Camden");
    assert_eq!(music["spaces"], 3);
    assert_eq!(music["icon"], "fa-solid fa-music");
}

#[tokio::test]
async fn placing_an_order_decrements_every_requested_lesson() {
    let srv = TestServer::spawn().await;
    let math = srv.lesson("Math", "Hendon", 100.0, 5).await;
    let art = srv.lesson("Art", "Finchley", 70.0, 2).await;

    let client = reqwest::Client::new();
    let res = client
        .post(srv.url("/orders"))
        .json(&json!({
            "customerName": "Ada",
            "customerPhone": "07000000000",
            "lessonIds": [math, art, math],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let order: Value = res.json().await.unwrap();
    assert_eq!(order["customerName"], "Ada");
    assert_eq!(order["lessonIds"].as_array().unwrap().len(), 3);
    assert!(order["id"].as_str().is_some());
    assert!(order["createdAt"].as_str().is_some());

    assert_eq!(spaces_of(&srv, &client, &math).await, 3);
    assert_eq!(spaces_of(&srv, &client, &art).await, 1);

    let (status, orders) = get_json(&client, srv.url("/orders")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_ids_beyond_capacity_conflict_without_side_effects() {
    let srv = TestServer::spawn().await;
    let last = srv.lesson("Chess", "Barnet", 60.0, 1).await;
    let other = srv.lesson("Drama", "Hampstead", 90.0, 4).await;

    let client = reqwest::Client::new();
    let res = client
        .post(srv.url("/orders"))
        .json(&json!({
            "customerName": "Ada",
            "customerPhone": "07000000000",
            "lessonIds": [other, last, last],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_seats");
    let shortfalls = body["shortfalls"].as_array().unwrap();
    assert_eq!(shortfalls.len(), 1);
    assert_eq!(shortfalls[0]["lessonId"], last.as_str());
    assert_eq!(shortfalls[0]["requested"], 2);
    assert_eq!(shortfalls[0]["available"], 1);

    assert_eq!(spaces_of(&srv, &client, &last).await, 1);
    assert_eq!(spaces_of(&srv, &client, &other).await, 4);

    let (_, orders) = get_json(&client, srv.url("/orders")).await;
    assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_order_bodies_are_bad_requests() {
    let srv = TestServer::spawn().await;
    let math = srv.lesson("Math", "Hendon", 100.0, 5).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/orders"))
        .json(&json!({ "customerName": "  ", "customerPhone": "0700", "lessonIds": [math] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_input");

    let res = client
        .post(srv.url("/orders"))
        .json(&json!({ "customerName": "Ada", "customerPhone": "0700", "lessonIds": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(srv.url("/orders"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    assert_eq!(spaces_of(&srv, &client, &math).await, 5);
}

#[tokio::test]
async fn unknown_lesson_in_order_is_invalid_input() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/orders"))
        .json(&json!({
            "customerName": "Ada",
            "customerPhone": "0700",
            "lessonIds": [afterschool_core::LessonId::new().to_string()],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn updating_subject_recomputes_icon() {
    let srv = TestServer::spawn().await;
    let id = srv.lesson("Math", "Hendon", 100.0, 5).await;
    let client = reqwest::Client::new();

    let res = client
        .put(srv.url(&format!("/lessons/{id}")))
        .json(&json!({ "subject": "Music" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let lesson: Value = res.json().await.unwrap();
    assert_eq!(lesson["subject"], "Music");
    assert_eq!(lesson["icon"], "fa-solid fa-music");
    assert_eq!(lesson["location"], "Hendon");
    assert_eq!(lesson["spaces"], 5);
}

#[tokio::test]
async fn update_rejects_empty_and_unknown_fields() {
    let srv = TestServer::spawn().await;
    let id = srv.lesson("Math", "Hendon", 100.0, 5).await;
    let client = reqwest::Client::new();

    let res = client
        .put(srv.url(&format!("/lessons/{id}")))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .put(srv.url(&format!("/lessons/{id}")))
        .json(&json!({ "teacher": "Smith" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .put(srv.url(&format!("/lessons/{id}")))
        .json(&json!({ "spaces": -1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    assert_eq!(spaces_of(&srv, &client, &id).await, 5);
}

#[tokio::test]
async fn unknown_and_malformed_lesson_ids() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let missing = afterschool_core::LessonId::new();
    let (status, body) = get_json(&client, srv.url(&format!("/lessons/{missing}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let res = client
        .put(srv.url(&format!("/lessons/{missing}")))
        .json(&json!({ "price": 50.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let (status, body) = get_json(&client, srv.url("/lessons/not-an-id")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn search_matches_text_and_numbers() {
    let srv = TestServer::spawn().await;
    srv.lesson("Math", "Hendon", 100.0, 5).await;
    srv.lesson("Music", "Camden", 85.0, 3).await;
    srv.lesson("Art", "Finchley", 70.0, 2).await;
    let client = reqwest::Client::new();

    let (status, body) = get_json(&client, srv.url("/search?q=m")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = get_json(&client, srv.url("/search/camden")).await;
    let hits = body.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["subject"], "Music");

    let (_, body) = get_json(&client, srv.url("/search?q=70")).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = get_json(&client, srv.url("/search?q=")).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn images_are_served_and_missing_ones_are_json_404() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/images/music.png")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let (status, body) = get_json(&client, srv.url("/images/missing.png")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Image file does not exist");
}

#[tokio::test]
async fn concurrent_orders_for_the_last_seat_admit_exactly_one() {
    let srv = TestServer::spawn().await;
    let last = srv.lesson("Coding", "Kings Cross", 120.0, 1).await;
    let client = reqwest::Client::new();

    let mut handles = Vec::new();
    for i in 0..8 {
        let client = client.clone();
        let url = srv.url("/orders");
        let last = last.clone();
        handles.push(tokio::spawn(async move {
            client
                .post(url)
                .json(&json!({
                    "customerName": format!("Customer {i}"),
                    "customerPhone": "0700",
                    "lessonIds": [last],
                }))
                .send()
                .await
                .unwrap()
                .status()
        }));
    }

    let mut accepted = 0;
    let mut conflicts = 0;
    for h in handles {
        match h.await.unwrap() {
            StatusCode::OK => accepted += 1,
            StatusCode::CONFLICT => conflicts += 1,
            other => panic!("unexpected status {other}"),
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(conflicts, 7);
    assert_eq!(spaces_of(&srv, &client, &last).await, 0);
}
