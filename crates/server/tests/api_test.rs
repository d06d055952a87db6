//! Integration tests for the reading-log server API.

use bytes::Bytes;
use http::{header, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use reading_log_core::config::LookupConfig;
use reading_log_server::{app, config::ServerConfig, AppState};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn body_json<B>(body: B) -> serde_json::Value
where
    B: http_body::Body<Data = Bytes> + Unpin,
    B::Error: std::fmt::Debug,
{
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn state_with(dir: &tempfile::TempDir, lookup: LookupConfig) -> AppState {
    let config = ServerConfig {
        data_file: dir.path().join("books.json"),
        bind: "127.0.0.1:0".to_string(),
        lookup,
    };
    AppState::new(config).unwrap()
}

fn state(dir: &tempfile::TempDir) -> AppState {
    state_with(dir, LookupConfig::default())
}

fn get(uri: &str) -> Request<Full<Bytes>> {
    Request::builder().uri(uri).body(Full::new(Bytes::new())).unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Full<Bytes>> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

fn lookup_config(uri: &str) -> LookupConfig {
    LookupConfig {
        openbd_endpoint: format!("{uri}/v1/get"),
        ndl_endpoint: format!("{uri}/api/sru"),
        timeout_secs: 2,
        ..LookupConfig::default()
    }
}

#[tokio::test]
async fn health_returns_healthy() {
    let dir = tempfile::tempdir().unwrap();
    for uri in ["/health", "/api/health"] {
        let response = app(state(&dir)).oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response.into_body()).await;
        assert_eq!(json["status"], "healthy");
    }
}

#[tokio::test]
async fn responses_carry_permissive_cors() {
    let dir = tempfile::tempdir().unwrap();
    let req = Request::builder()
        .uri("/api/books")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let response = app(state(&dir)).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn books_crud_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(&dir);

    let response = app(state.clone()).oneshot(get("/api/books")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response.into_body()).await, serde_json::json!([]));

    let response = app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/books",
            serde_json::json!({
                "isbn": "9784065199816",
                "title": "Title",
                "totalPages": 300,
                "currentPage": 0,
                "readingTime": 0
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response.into_body()).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());
    assert!(created["created_at"].is_string());

    let response = app(state.clone())
        .oneshot(json_request(
            "PUT",
            &format!("/api/books/{id}"),
            serde_json::json!({ "currentPage": 120, "readingTime": 900 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response.into_body()).await;
    assert_eq!(updated["currentPage"], 120);
    assert_eq!(updated["readingTime"], 900);
    assert_eq!(updated["title"], "Title");

    let response = app(state.clone()).oneshot(get(&format!("/api/books/{id}"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response.into_body()).await["currentPage"], 120);

    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/api/books/{id}"))
        .body(Full::new(Bytes::new()))
        .unwrap();
    let response = app(state.clone()).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response.into_body()).await["message"].is_string());

    let response = app(state).oneshot(get("/api/books")).await.unwrap();
    assert_eq!(body_json(response.into_body()).await, serde_json::json!([]));
}

#[tokio::test]
async fn missing_record_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(&dir);

    let response = app(state.clone()).oneshot(get("/api/books/missing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_json(response.into_body()).await["error"].is_string());

    let response = app(state.clone())
        .oneshot(json_request("PUT", "/api/books/missing", serde_json::json!({ "currentPage": 1 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let req = Request::builder()
        .method("DELETE")
        .uri("/api/books/missing")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let response = app(state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn off_schema_data_file_is_500_and_left_intact() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(&dir);
    let original = r#"[{"id":"a","title":"Keep me","currentPage":null}]"#;
    std::fs::write(dir.path().join("books.json"), original).unwrap();

    let response = app(state.clone()).oneshot(get("/api/books")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_json(response.into_body()).await["error"].is_string());

    let response = app(state)
        .oneshot(json_request("POST", "/api/books", serde_json::json!({ "title": "New" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(std::fs::read_to_string(dir.path().join("books.json")).unwrap(), original);
}

#[tokio::test]
async fn short_isbn_is_rejected_before_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(state(&dir)).oneshot(get("/api/book/12-34")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response.into_body()).await["error"].is_string());
}

#[tokio::test]
async fn book_info_requires_isbn() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(state(&dir)).oneshot(get("/api/book-info")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn lookup_returns_resolved_book() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/get"))
        .and(query_param("isbn", "9784065199816"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"summary":{"title":"Resolved","author":"Author","extent":"320p"},"onix":{}}]"#,
        ))
        .mount(&upstream)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let state = state_with(&dir, lookup_config(&upstream.uri()));

    for uri in ["/api/book/978-4-06-519981-6", "/api/book-info?isbn=978-4-06-519981-6"] {
        let response = app(state.clone()).oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response.into_body()).await;
        assert_eq!(json["isbn"], "9784065199816");
        assert_eq!(json["title"], "Resolved");
        assert_eq!(json["totalPages"], 320);
        assert_eq!(json["currentPage"], 0);
        assert_eq!(json["readingTime"], 0);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn lookup_miss_is_404_with_isbn() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/get"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[null]"))
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sru"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&upstream)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let state = state_with(&dir, lookup_config(&upstream.uri()));

    let response = app(state).oneshot(get("/api/book/9784065199816")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["isbn"], "9784065199816");
    assert!(json["error"].is_string());
}
