//! Handlers for the voice turn surface: `/stt`, `/audio`, `/voices`,
//! and `/tts-status`.

use crate::api::ApiError;
use crate::AppState;
use axum::{
    extract::{Extension, Multipart},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use calliope_dialog::TurnRequest;
use calliope_types::AgentId;
use serde::Serialize;
use std::sync::Arc;

/// Response body for a processed turn.
#[derive(Debug, Serialize)]
pub struct SttResponse {
    /// What the user said.
    pub text: String,
    /// The agent's reply.
    pub reply: String,
}

/// Handler for `POST /stt`.
///
/// Accepts a multipart form with a `file` audio part, an `agentId`
/// field, and an optional `voiceId` override, and runs the full turn
/// pipeline on it.
pub async fn stt_handler(
    Extension(state): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<SttResponse>, ApiError> {
    let mut audio: Option<Vec<u8>> = None;
    let mut agent_id: Option<AgentId> = None;
    let mut voice_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read audio: {}", e)))?;
                audio = Some(bytes.to_vec());
            }
            Some("agentId") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read agentId: {}", e)))?;
                let parsed = raw
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| ApiError::BadRequest(format!("invalid agentId: {}", raw)))?;
                agent_id = Some(AgentId(parsed));
            }
            Some("voiceId") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read voiceId: {}", e)))?;
                voice_id = Some(raw);
            }
            // Unknown parts are ignored so older clients keep working.
            _ => {}
        }
    }

    let audio = audio.ok_or_else(|| ApiError::BadRequest("no audio file provided".to_string()))?;
    let agent_id =
        agent_id.ok_or_else(|| ApiError::BadRequest("no agentId provided".to_string()))?;

    let outcome = state
        .pipeline
        .process_turn(TurnRequest {
            agent_id,
            voice_id,
            audio,
        })
        .await?;

    Ok(Json(SttResponse {
        text: outcome.transcript,
        reply: outcome.reply,
    }))
}

/// Handler for `GET /audio`.
///
/// Streams the most recently synthesized reply. The slot is process-wide
/// and last-write-wins, so under concurrent turns the artifact may belong
/// to another request.
pub async fn audio_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    match state.pipeline.artifacts().current() {
        Some(artifact) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, artifact.mime_type)],
            artifact.data,
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "No audio available" })),
        )
            .into_response(),
    }
}

/// Handler for `GET /voices`.
///
/// Returns the voice catalog of the active synthesis backend as a bare
/// JSON array, resolved once at startup.
pub async fn voices_handler(Extension(state): Extension<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!(state.engine.voices()))
}

/// Handler for `GET /tts-status`.
pub async fn tts_status_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "method": state.engine.method().as_str(),
        "status": "ready",
        "voices_available": state.engine.voices().len(),
    }))
}
