//! Calliope server library logic.

pub mod api;
pub mod api_agents;
pub mod api_turn;
pub mod config;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use calliope_db::DbPool;
use calliope_dialog::TurnPipeline;
use calliope_types::ResponseGenerator;
use calliope_voice::SynthesisEngine;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Maximum request body size for the JSON API (2 MiB).
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Maximum request body size for audio uploads (30 MiB). The transcoder
/// enforces its own tighter cap on the audio part itself.
const MAX_UPLOAD_BODY_BYTES: usize = 30 * 1024 * 1024;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// The turn pipeline, including conversation history and the audio
    /// artifact slot.
    pub pipeline: TurnPipeline,
    /// Synthesis engine, exposed for catalog and status queries.
    pub engine: Arc<SynthesisEngine>,
    /// Reply generator, shared with the persona prompt drafting endpoint.
    pub generator: Arc<dyn ResponseGenerator>,
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    // The turn upload needs a larger body limit than the JSON API.
    let upload_routes = Router::new()
        .route("/stt", post(api_turn::stt_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES));

    Router::new()
        .route("/health", get(health))
        .route("/audio", get(api_turn::audio_handler))
        .route("/voices", get(api_turn::voices_handler))
        .route("/tts-status", get(api_turn::tts_status_handler))
        .route(
            "/api/agents",
            post(api_agents::create_agent_handler).get(api_agents::list_agents_handler),
        )
        .route(
            "/api/agents/{agentId}",
            get(api_agents::get_agent_handler)
                .put(api_agents::update_agent_handler)
                .delete(api_agents::delete_agent_handler),
        )
        .route(
            "/api/generate-prompt",
            post(api_agents::generate_prompt_handler),
        )
        .merge(upload_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
