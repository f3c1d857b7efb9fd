//! HTTP chat server for integration with messaging front-ends.
//!
//! A bot or webhook relays each incoming message to `POST /message` (or the raw
//! audio of a voice message to `POST /voice/{user_id}`) and sends back the
//! returned parts in order. `POST /speech` turns a reply into mp3 audio.

use crate::assistant::Assistant;
use crate::cli::preflight::{self, Operation};
use crate::cli::{label_parts, split_reply, Output, MAX_REPLY_CHARS};
use crate::config::Settings;
use crate::voice::AudioClip;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

/// Largest accepted voice upload (the provider's transcription limit).
const MAX_VOICE_BYTES: usize = 25 * 1024 * 1024;

/// Shared application state.
struct AppState {
    assistant: Assistant,
}

/// Run the HTTP chat server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Converse) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let assistant = Assistant::from_settings(&settings)?;
    let app = router(Arc::new(AppState { assistant }));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("vidbrief chat server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Message", "POST /message");
    Output::kv("Voice", "POST /voice/{user_id}");
    Output::kv("Speech", "POST /speech");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/message", post(message))
        .route(
            "/voice/{user_id}",
            post(voice).layer(DefaultBodyLimit::max(MAX_VOICE_BYTES)),
        )
        .route("/speech", post(speech))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct MessageRequest {
    user_id: String,
    text: String,
}

#[derive(Serialize)]
struct MessageResponse {
    /// The complete reply.
    reply: String,
    /// The reply split for transports with a message size limit.
    parts: Vec<String>,
}

#[derive(Deserialize)]
struct VoiceParams {
    /// Upload file name; its extension tells the transcriber the format.
    #[serde(default = "default_voice_file")]
    file_name: String,
}

fn default_voice_file() -> String {
    "voice.ogg".to_string()
}

#[derive(Serialize)]
struct VoiceResponse {
    /// Transcribed text, absent when nothing was understood.
    #[serde(skip_serializing_if = "Option::is_none")]
    heard: Option<String>,
    reply: String,
    parts: Vec<String>,
}

#[derive(Deserialize)]
struct SpeechRequest {
    text: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn message(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MessageRequest>,
) -> impl IntoResponse {
    let user_id = req.user_id.trim();
    if user_id.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "user_id must not be empty".to_string(),
            }),
        )
            .into_response();
    }

    match state.assistant.handle_message(user_id, &req.text).await {
        Ok(reply) => {
            let parts = label_parts(split_reply(&reply, MAX_REPLY_CHARS));
            Json(MessageResponse { reply, parts }).into_response()
        }
        Err(e) => {
            error!("Failed to handle message for {}: {}", user_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn voice(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(params): Query<VoiceParams>,
    body: Bytes,
) -> impl IntoResponse {
    if body.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "request body must contain audio".to_string(),
            }),
        )
            .into_response();
    }

    let clip = AudioClip::new(params.file_name, body.to_vec());
    match state.assistant.handle_voice(&user_id, clip).await {
        Ok(turn) => {
            let parts = label_parts(split_reply(&turn.reply, MAX_REPLY_CHARS));
            Json(VoiceResponse {
                heard: turn.heard,
                reply: turn.reply,
                parts,
            })
            .into_response()
        }
        Err(e) => {
            error!("Failed to handle voice message for {}: {}", user_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn speech(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SpeechRequest>,
) -> impl IntoResponse {
    if !state.assistant.speaks() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "Voice output is disabled".to_string(),
            }),
        )
            .into_response();
    }

    match state.assistant.speak(&req.text).await {
        Some(audio) => ([(header::CONTENT_TYPE, "audio/mpeg")], audio).into_response(),
        None => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: "Could not synthesize speech".to_string(),
            }),
        )
            .into_response(),
    }
}
