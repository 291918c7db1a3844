use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use melody_learning::server::{build_router, AppState};
use melody_learning::{Pipeline, Settings};

fn router_for(settings: Settings) -> Router {
    let pipeline = Pipeline::new(settings).unwrap();
    build_router(AppState {
        pipeline: Arc::new(pipeline),
    })
}

fn base_settings() -> Settings {
    Settings {
        openai_api_key: Some("test-key".to_string()),
        poll_interval: Duration::from_millis(10),
        generation_timeout: Duration::from_secs(2),
        ..Settings::default()
    }
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = router_for(base_settings());
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn invalid_base64_maps_to_a_bad_request_with_detail() {
    let app = router_for(base_settings());
    let response = app
        .oneshot(json_request(
            "/extract-text",
            json!({ "image_base64": "%%%not-base64%%%" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(
        body["detail"].as_str().unwrap().contains("extraction failed"),
        "{body}"
    );
}

#[tokio::test]
async fn generate_song_without_a_provider_key_is_a_server_error() {
    let app = router_for(base_settings());
    let response = app
        .oneshot(json_request(
            "/generate-song",
            json!({ "study_text": "text", "mnemonic_plan": "plan" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(
        body["detail"].as_str().unwrap().contains("provider API key"),
        "{body}"
    );
}

#[tokio::test]
async fn generate_song_waits_and_returns_audio_urls() {
    let suno = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "taskId": "task-http" }
        })))
        .mount(&suno)
        .await;
    Mock::given(method("GET"))
        .and(path("/generate/record-info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "status": "SUCCESS",
                "response": {
                    "sunoData": [
                        { "id": "t1", "audioUrl": "https://cdn.example.com/t1.mp3" }
                    ]
                }
            }
        })))
        .mount(&suno)
        .await;

    let settings = Settings {
        suno_api_key: Some("suno-key".to_string()),
        suno_base_url: suno.uri(),
        ..base_settings()
    };

    let app = router_for(settings);
    let response = app
        .oneshot(json_request(
            "/generate-song",
            json!({ "study_text": "text", "mnemonic_plan": "plan" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["task_id"], "task-http");
    assert_eq!(body["status"], "succeeded");
    assert_eq!(body["audio_urls"], json!(["https://cdn.example.com/t1.mp3"]));
}

#[tokio::test]
async fn generate_song_can_submit_without_waiting() {
    let suno = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "taskId": "task-async" }
        })))
        .mount(&suno)
        .await;

    let settings = Settings {
        suno_api_key: Some("suno-key".to_string()),
        suno_base_url: suno.uri(),
        ..base_settings()
    };

    let app = router_for(settings);
    let response = app
        .oneshot(json_request(
            "/generate-song",
            json!({
                "study_text": "text",
                "mnemonic_plan": "plan",
                "wait_for_audio": false
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["task_id"], "task-async");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["audio_urls"], json!([]));
}

#[tokio::test]
async fn provider_failure_maps_to_bad_gateway() {
    let suno = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "taskId": "task-doomed" }
        })))
        .mount(&suno)
        .await;
    Mock::given(method("GET"))
        .and(path("/generate/record-info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "status": "FAILED" }
        })))
        .mount(&suno)
        .await;

    let settings = Settings {
        suno_api_key: Some("suno-key".to_string()),
        suno_base_url: suno.uri(),
        ..base_settings()
    };

    let app = router_for(settings);
    let response = app
        .oneshot(json_request(
            "/generate-song",
            json!({ "study_text": "text", "mnemonic_plan": "plan" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
