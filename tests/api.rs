//! Router-level tests: an in-memory store and a recording fake generator.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use carousel_api::{
    app, AppConfig, AppState, ContentGenerator, GeneratorError, GeneratorFactory, Idea, PostDraft,
    PostStore, StoreSession,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

#[derive(Clone, Debug, PartialEq)]
struct Call {
    kind: &'static str,
    topic: String,
    days: Option<i64>,
    api_key: Option<String>,
}

#[derive(Clone, Default)]
struct FakeFactory {
    calls: Arc<Mutex<Vec<Call>>>,
    fail_with: Option<String>,
}

struct FakeGenerator {
    _session: StoreSession,
    api_key: Option<String>,
    calls: Arc<Mutex<Vec<Call>>>,
    fail_with: Option<String>,
}

impl GeneratorFactory for FakeFactory {
    fn bind(&self, session: StoreSession, api_key: Option<&str>) -> Box<dyn ContentGenerator> {
        Box::new(FakeGenerator {
            _session: session,
            api_key: api_key.map(str::to_string),
            calls: Arc::clone(&self.calls),
            fail_with: self.fail_with.clone(),
        })
    }
}

impl FakeGenerator {
    fn record(
        &self,
        kind: &'static str,
        topic: &str,
        days: Option<i64>,
    ) -> Result<(), GeneratorError> {
        self.calls.lock().unwrap().push(Call {
            kind,
            topic: topic.to_string(),
            days,
            api_key: self.api_key.clone(),
        });
        match &self.fail_with {
            Some(message) => Err(GeneratorError::Api {
                status: 503,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ContentGenerator for FakeGenerator {
    async fn generate_posts(
        &mut self,
        topic: &str,
        days: i64,
    ) -> Result<Vec<PostDraft>, GeneratorError> {
        self.record("posts", topic, Some(days))?;
        tokio::task::yield_now().await;
        Ok((0..days.max(1))
            .map(|day| PostDraft {
                day_offset: day,
                content: format!("{} / day {}", topic, day + 1),
                image_prompt: Some(format!("illustration of {}", topic)),
                layout: None,
                data_points: Vec::new(),
            })
            .collect())
    }

    async fn generate_ideas(&mut self, topic: &str) -> Result<Vec<Idea>, GeneratorError> {
        self.record("ideas", topic, None)?;
        Ok(vec![Idea {
            title: format!("Why {} matters", topic),
            description: String::new(),
        }])
    }
}

fn test_config() -> AppConfig {
    AppConfig::from_lookup(|key| match key {
        "DATABASE_URL" => Some("sqlite::memory:".to_string()),
        _ => None,
    })
    .unwrap()
}

async fn setup(factory: FakeFactory) -> (Router, PostStore) {
    let config = test_config();
    let store = PostStore::connect(&config.database_url).await.unwrap();
    let state = AppState::new(store.clone(), Arc::new(factory), config);
    (app(state).unwrap(), store)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = router.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn health_returns_fixed_payload() {
    let (router, _store) = setup(FakeFactory {
        fail_with: Some("generator down".into()),
        ..Default::default()
    })
    .await;
    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "message": "Carousel API is running" }));
}

#[tokio::test]
async fn generate_wraps_drafts_and_closes_session_once() {
    let factory = FakeFactory::default();
    let (router, store) = setup(factory.clone()).await;

    let req = post_json("/generate", json!({ "topic": "Rust", "days": 2 }));
    let (status, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_object().unwrap().len(), 1, "envelope carries only data");
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["content"], "Rust / day 1");
    assert_eq!(data[1]["day_offset"], 1);

    assert_eq!(store.stats().opened(), 1);
    assert_eq!(store.stats().closed(), 1);
    assert_eq!(store.stats().active(), 0);
}

#[tokio::test]
async fn days_default_to_five() {
    let factory = FakeFactory::default();
    let (router, _store) = setup(factory.clone()).await;
    let (status, _) = send(&router, post_json("/generate", json!({ "topic": "Rust" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(factory.calls.lock().unwrap()[0].days, Some(5));
}

#[tokio::test]
async fn generator_failure_returns_detail_and_still_closes_session() {
    let factory = FakeFactory {
        fail_with: Some("quota exhausted".into()),
        ..Default::default()
    };
    let (router, store) = setup(factory).await;

    let req = post_json("/generate", json!({ "topic": "Rust", "days": 3 }));
    let (status, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "detail": "generator returned 503: quota exhausted" }));
    assert_eq!(store.stats().opened(), 1);
    assert_eq!(store.stats().closed(), 1);

    let (status, _) = send(&router, post_json("/generate-ideas", json!({ "topic": "Rust" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(store.stats().opened(), 2);
    assert_eq!(store.stats().closed(), 2);
}

#[tokio::test]
async fn non_positive_days_are_forwarded_unchanged() {
    let factory = FakeFactory::default();
    let (router, _store) = setup(factory.clone()).await;

    for days in [0, -3] {
        let req = post_json("/generate", json!({ "topic": "Rust", "days": days }));
        let (status, _) = send(&router, req).await;
        assert_eq!(status, StatusCode::OK);
    }
    let days: Vec<_> = factory.calls.lock().unwrap().iter().map(|c| c.days).collect();
    assert_eq!(days, vec![Some(0), Some(-3)]);
}

#[tokio::test]
async fn missing_topic_is_rejected_before_any_session() {
    let factory = FakeFactory::default();
    let (router, store) = setup(factory.clone()).await;

    let (status, body) = send(&router, post_json("/generate", json!({ "days": 3 }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("topic"));

    let (status, _) = send(&router, post_json("/generate-ideas", json!({}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(&router, post_json("/generate", json!({ "topic": "   " }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"], "topic must not be empty");

    assert_eq!(store.stats().opened(), 0);
    assert!(factory.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let (router, store) = setup(FakeFactory::default()).await;
    let req = Request::builder()
        .method(Method::POST)
        .uri("/generate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"topic\": "))
        .unwrap();
    let (status, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
    assert_eq!(store.stats().opened(), 0);
}

#[tokio::test]
async fn ideas_receive_request_api_key() {
    let factory = FakeFactory::default();
    let (router, _store) = setup(factory.clone()).await;

    let mut req = post_json("/generate-ideas", json!({ "topic": "Rust" }));
    req.headers_mut().insert("x-gemini-api-key", "caller-key".parse().unwrap());
    let (status, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "data": [{ "title": "Why Rust matters", "description": "" }] }));

    let calls = factory.calls.lock().unwrap();
    assert_eq!(calls[0].kind, "ideas");
    assert_eq!(calls[0].topic, "Rust");
    assert_eq!(calls[0].api_key.as_deref(), Some("caller-key"));
}

#[tokio::test]
async fn schedule_is_a_stub_that_persists_nothing() {
    let (router, store) = setup(FakeFactory::default()).await;
    let body = json!({
        "posts": [
            { "day_offset": 0, "content": "First", "image_prompt": "sunrise", "layout": "classic" },
            { "day_offset": 1, "content": "Second", "layout": "infographic",
              "data_points": [{ "label": "adoption", "value": 42.5 }] }
        ]
    });
    let (status, resp) = send(&router, post_json("/schedule", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp, json!({ "status": "implemented soon" }));
    assert_eq!(store.stats().opened(), 0);

    let mut session = store.session().await.unwrap();
    assert_eq!(session.count_posts().await.unwrap(), 0);
}

#[tokio::test]
async fn schedule_accepts_arbitrary_records() {
    let (router, store) = setup(FakeFactory::default()).await;
    let bodies = [
        json!({ "posts": [{ "scheduled_date": "2026-11-01T09:00:00Z", "content_text": "hi" }] }),
        json!({ "posts": [{ "anything": 1 }] }),
        json!({ "posts": [{ "content": 7 }, "loose text", null] }),
    ];
    for body in bodies {
        let (status, resp) = send(&router, post_json("/schedule", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp, json!({ "status": "implemented soon" }));
    }
    assert_eq!(store.stats().opened(), 0);
}

#[tokio::test]
async fn concurrent_generates_do_not_mix_topics() {
    let factory = FakeFactory::default();
    let (router, store) = setup(factory.clone()).await;

    let (a, b) = tokio::join!(
        send(&router, post_json("/generate", json!({ "topic": "Rust", "days": 3 }))),
        send(&router, post_json("/generate", json!({ "topic": "Gardening", "days": 2 }))),
    );
    assert_eq!(a.0, StatusCode::OK);
    assert_eq!(b.0, StatusCode::OK);
    let a_data = a.1["data"].as_array().unwrap();
    let b_data = b.1["data"].as_array().unwrap();
    assert_eq!(a_data.len(), 3);
    assert_eq!(b_data.len(), 2);
    assert!(a_data.iter().all(|d| d["content"].as_str().unwrap().starts_with("Rust /")));
    assert!(b_data.iter().all(|d| d["content"].as_str().unwrap().starts_with("Gardening /")));

    assert_eq!(store.stats().opened(), 2);
    assert_eq!(store.stats().closed(), 2);
}

#[tokio::test]
async fn ready_reports_database_ok() {
    let (router, _store) = setup(FakeFactory::default()).await;
    let req = Request::builder().uri("/ready").body(Body::empty()).unwrap();
    let (status, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "database": "ok" }));
}

#[tokio::test]
async fn cors_allows_only_the_configured_origin() {
    let (router, _store) = setup(FakeFactory::default()).await;
    let preflight = |origin: &str| {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/generate")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type,x-gemini-api-key")
            .body(Body::empty())
            .unwrap()
    };

    let res = router.clone().oneshot(preflight("http://localhost:3000")).await.unwrap();
    let headers = res.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:3000");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST");

    let res = router.clone().oneshot(preflight("http://evil.example")).await.unwrap();
    assert!(res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}
