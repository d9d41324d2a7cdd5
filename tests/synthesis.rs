use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use vc_narrator::config::TtsConfig;
use vc_narrator::speech::client::{Synthesizer, TtsClient, AUDIO_MPEG};
use vc_narrator::NarratorError;

/// Serve `app` on an ephemeral port and return a client pointed at it.
async fn client_for(app: Router, timeout_secs: u64) -> TtsClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TtsClient::new(&TtsConfig {
        endpoint: format!("http://{addr}/api/generation"),
        timeout_secs,
    })
    .unwrap()
}

fn answering(body: Value) -> Router {
    Router::new().route(
        "/api/generation",
        post(move || {
            let body = body.clone();
            async move { Json(body) }
        }),
    )
}

#[tokio::test]
async fn sends_text_and_voice_and_decodes_audio() {
    // Echo the request back as the "audio" so the body shape is checked too.
    let app = Router::new().route(
        "/api/generation",
        post(|Json(req): Json<Value>| async move {
            let echoed = format!("{}|{}", req["text"].as_str().unwrap_or(""), req["voice"].as_str().unwrap_or(""));
            Json(json!({ "success": true, "data": STANDARD.encode(echoed) }))
        }),
    );
    let client = client_for(app, 5).await;

    let audio = client.synthesize("Bob joined", "en_us_006").await.unwrap().unwrap();
    assert_eq!(audio.bytes, b"Bob joined|en_us_006");
    assert_eq!(audio.mime_type, AUDIO_MPEG);
}

#[tokio::test]
async fn server_error_status_is_transport_error() {
    let app = Router::new().route("/api/generation", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
    let client = client_for(app, 5).await;

    match client.synthesize("hi", "en_us_001").await {
        Err(NarratorError::Transport { status, message }) => {
            assert_eq!(status, Some(500));
            assert!(message.contains("500 Internal Server Error"), "{message}");
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn unsuccessful_response_is_service_error() {
    let client = client_for(answering(json!({ "success": false, "error": "Text too long" })), 5).await;

    match client.synthesize("hi", "en_us_001").await {
        Err(NarratorError::Service(message)) => assert_eq!(message, "Text too long"),
        other => panic!("expected service error, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_success_flag_is_service_error() {
    let client = client_for(answering(json!({ "data": "SUQz" })), 5).await;

    match client.synthesize("hi", "en_us_001").await {
        Err(NarratorError::Service(message)) => assert_eq!(message, "Unknown TTS API error"),
        other => panic!("expected service error, got {other:?}"),
    }
}

#[tokio::test]
async fn bad_payloads_are_decode_errors() {
    let client = client_for(answering(json!({ "success": true, "data": "%%%" })), 5).await;
    assert!(matches!(client.synthesize("hi", "v").await, Err(NarratorError::Decode(_))));

    let client = client_for(answering(json!({ "success": true, "data": "" })), 5).await;
    assert!(matches!(client.synthesize("hi", "v").await, Err(NarratorError::Decode(_))));
}

#[tokio::test]
async fn slow_endpoint_times_out() {
    let app = Router::new().route(
        "/api/generation",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "success": true, "data": "SUQz" }))
        }),
    );
    let client = client_for(app, 1).await;

    match client.synthesize("hi", "en_us_001").await {
        Err(NarratorError::Transport { status: None, message }) => {
            assert!(message.contains("timed out"), "{message}")
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    // Bind then drop, so nothing listens on the port.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = TtsClient::new(&TtsConfig {
        endpoint: format!("http://{addr}/api/generation"),
        timeout_secs: 2,
    })
    .unwrap();

    assert!(matches!(
        client.synthesize("hi", "en_us_001").await,
        Err(NarratorError::Transport { status: None, .. })
    ));
}
