mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::util::ServiceExt;

use common::{CountingProvider, FixedVoicesProvider, TestStorage, WavCodec};
use narrator::config::ServerConfig;
use narrator::core::tts::{BoxedSpeechProvider, ProviderVoice};
use narrator::routes;
use narrator::state::AppState;

async fn app_with(storage: &TestStorage, provider: BoxedSpeechProvider) -> Router {
    let state = storage
        .app_state(provider, Arc::new(WavCodec::default()))
        .await;
    routes::api::create_app(state)
}

async fn app(storage: &TestStorage) -> Router {
    app_with(storage, Arc::new(CountingProvider::new())).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body.to_vec())
}

fn post_tts(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/tts")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let storage = TestStorage::new();
    let app = app(&storage).await;

    let (status, _, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);

    let json = json_body(&body);
    assert_eq!(json["status"], "OK");
    assert_eq!(json["provider"], "stub");
    assert_eq!(json["cache"]["backend"], "filesystem");
    assert_eq!(json["cache"]["hits"], 0);
    assert_eq!(json["cache"]["misses"], 0);
}

#[tokio::test]
async fn test_tts_then_download() {
    let storage = TestStorage::new();
    let app = app(&storage).await;

    let (status, _, body) = send(
        &app,
        post_tts(json!({"text": "Olá [[pause_ms:300]] mundo", "lang": "pt-BR"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let json = json_body(&body);
    let id = json["id"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 64);
    assert_eq!(json["audioUrl"], format!("/audio/{id}"));
    assert_eq!(json["format"], "mp3");
    assert_eq!(json["cached"], false);
    assert!(json["durationSec"].as_f64().unwrap() > 0.0);
    let bytes = json["bytes"].as_u64().unwrap();

    let (status, headers, audio) = send(&app, get(&format!("/audio/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "audio/mpeg");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        format!("inline; filename=\"{id}.mp3\"").as_str()
    );
    assert_eq!(audio.len() as u64, bytes);
    assert_eq!(headers[header::CONTENT_LENGTH], bytes.to_string().as_str());

    let (_, _, body) = send(
        &app,
        post_tts(json!({"text": "Olá [[pause_ms:300]] mundo", "lang": "pt-BR"})),
    )
    .await;
    assert_eq!(json_body(&body)["cached"], true);

    let (_, _, body) = send(&app, get("/health")).await;
    let health = json_body(&body);
    assert_eq!(health["cache"]["hits"], 1);
    assert_eq!(health["cache"]["misses"], 1);
}

#[tokio::test]
async fn test_wav_download_content_type() {
    let storage = TestStorage::new();
    let app = app(&storage).await;

    let (_, _, body) = send(&app, post_tts(json!({"text": "Wave", "format": "wav"}))).await;
    let json = json_body(&body);
    assert_eq!(json["format"], "wav");

    let url = json["audioUrl"].as_str().unwrap();
    let (status, headers, _) = send(&app, get(url)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "audio/wav");
}

#[tokio::test]
async fn test_directive_error_is_bad_request() {
    let storage = TestStorage::new();
    let app = app(&storage).await;

    let (status, _, body) = send(&app, post_tts(json!({"text": "Hi [[shout:loud]]"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let json = json_body(&body);
    assert_eq!(json["status"], 400);
    assert!(json["error"].as_str().unwrap().contains("[[shout:loud]]"));
    assert_eq!(json["details"]["directive"], "[[shout:loud]]");
}

#[tokio::test]
async fn test_request_body_errors() {
    let storage = TestStorage::new();
    let app = app(&storage).await;

    let (status, _, body) = send(&app, post_tts(json!({"text": "   "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["status"], 400);

    let (status, _, _) = send(&app, post_tts(json!({"voice": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(&app, post_tts(json!({"text": "hi", "format": "ogg"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(&app, post_tts(json!({"text": "hi", "rate": 5.0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_text_too_long() {
    let storage = TestStorage::new();
    let config = ServerConfig {
        max_text_chars: 10,
        ..storage.config()
    };
    let state = AppState::with_components(
        config,
        Arc::new(CountingProvider::new()),
        Arc::new(WavCodec::default()),
    )
    .await
    .unwrap();
    let app = routes::api::create_app(state);

    let (status, _, body) = send(&app, post_tts(json!({"text": "this is way too long"}))).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json_body(&body)["status"], 413);
}

#[tokio::test]
async fn test_unknown_voice_details() {
    let storage = TestStorage::new();
    let app = app(&storage).await;

    let (status, _, body) = send(
        &app,
        post_tts(json!({"text": "[[voice:ghost]] boo", "lang": "pt-BR"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let json = json_body(&body);
    assert!(json["error"].as_str().unwrap().contains("ghost"));
    assert_eq!(json["details"]["missing"], json!(["ghost"]));
    assert_eq!(
        json["details"]["availableVoicesSample"]
            .as_array()
            .unwrap()
            .len(),
        3
    );
}

#[tokio::test]
async fn test_synthesis_failure_is_internal() {
    let storage = TestStorage::new();
    let app = app_with(&storage, Arc::new(CountingProvider::failing_on("boom"))).await;

    let (status, _, body) = send(&app, post_tts(json!({"text": "fine [[break]] boom"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let json = json_body(&body);
    assert_eq!(json["error"], "Internal server error");
    assert_eq!(json["status"], 500);
    assert_eq!(json["details"]["segment"], 3);
    assert!(!body.windows(4).any(|w| w == b"tmp/"));
}

#[tokio::test]
async fn test_audio_id_checks() {
    let storage = TestStorage::new();
    let app = app(&storage).await;

    let (status, _, _) = send(&app, get("/audio/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(&app, get("/audio/not-a-hex-id-at-all")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = send(&app, get(&format!("/audio/{}", "f".repeat(64)))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json_body(&body)["status"], 404);
}

#[tokio::test]
async fn test_voices_defaults_to_portuguese() {
    let storage = TestStorage::new();
    let app = app(&storage).await;

    let (status, _, body) = send(&app, get("/api/voices")).await;
    assert_eq!(status, StatusCode::OK);

    let json = json_body(&body);
    assert_eq!(json["provider"], "stub");
    assert_eq!(json["lang"], "pt-BR");
    assert_eq!(json["count"], 1);
    assert_eq!(json["voices"][0]["name"], "stub-pt-1");
    assert_eq!(json["voices"][0]["gender"], "Unknown");
    assert_eq!(json["recommended"]["male"], json!([]));

    let (_, _, body) = send(&app, get("/api/voices?lang=en-US")).await;
    let json = json_body(&body);
    assert_eq!(json["lang"], "en-US");
    assert_eq!(json["voices"][0]["name"], "stub-en-1");
}

#[tokio::test]
async fn test_voices_recommendations() {
    let storage = TestStorage::new();
    let voices = vec![
        ProviderVoice::new("m1").with_gender("Male"),
        ProviderVoice::new("m2").with_gender("m"),
        ProviderVoice::new("m3").with_gender("male"),
        ProviderVoice::new("f1").with_gender("Female"),
        ProviderVoice::new("n1").with_gender("Neutral"),
    ];
    let app = app_with(&storage, Arc::new(FixedVoicesProvider::new(voices))).await;

    let (status, _, body) = send(&app, get("/api/voices?lang=pt-BR")).await;
    assert_eq!(status, StatusCode::OK);

    let json = json_body(&body);
    assert_eq!(json["provider"], "fixed");
    assert_eq!(json["count"], 5);
    let male: Vec<&str> = json["recommended"]["male"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["name"].as_str().unwrap())
        .collect();
    assert_eq!(male, vec!["m1", "m2"]);
    assert_eq!(json["recommended"]["female"][0]["name"], "f1");
    assert_eq!(json["voices"][1]["gender"], "Male");
    assert_eq!(json["voices"][4]["gender"], "Unknown");
}

#[tokio::test]
async fn test_cors_allows_browser_origins() {
    let storage = TestStorage::new();
    let app = app(&storage).await;

    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
}
