//! Agent persona CRUD handlers and persona prompt drafting.

use crate::api::ApiError;
use crate::AppState;
use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
};
use calliope_db::{AgentStoreError, NewAgent, UpdateAgent};
use calliope_dialog::prompt::persona_draft_prompt;
use calliope_types::{AgentId, AgentPersona};
use serde::Deserialize;
use std::sync::Arc;

/// Request body for persona creation.
#[derive(Debug, Deserialize)]
pub struct CreateAgentRequest {
    pub name: String,
    /// The persona system prompt.
    pub prompt: String,
    /// Voice to speak with. Falls back to the platform default.
    #[serde(default)]
    pub voice_id: Option<String>,
}

/// Request body for persona updates. Omitted fields keep their value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAgentRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub voice_id: Option<String>,
}

/// Request body for persona prompt drafting.
#[derive(Debug, Deserialize)]
pub struct GeneratePromptRequest {
    pub role: String,
    pub goal: String,
}

fn map_store_error(e: AgentStoreError) -> ApiError {
    match e {
        AgentStoreError::NotFound(id) => ApiError::NotFound(format!("agent {} not found", id)),
        AgentStoreError::Invalid(msg) => ApiError::BadRequest(msg),
        AgentStoreError::Database(e) => {
            ApiError::InternalServerError(format!("db query failed: {}", e))
        }
    }
}

/// Handler for `POST /api/agents`.
pub async fn create_agent_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CreateAgentRequest>,
) -> Result<(StatusCode, Json<AgentPersona>), ApiError> {
    let persona = tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;
        calliope_db::create_agent(
            &conn,
            &NewAgent {
                name: payload.name,
                system_prompt: payload.prompt,
                voice_id: payload.voice_id,
            },
        )
        .map_err(map_store_error)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    Ok((StatusCode::CREATED, Json(persona)))
}

/// Handler for `GET /api/agents`.
pub async fn list_agents_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<AgentPersona>>, ApiError> {
    let personas = tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;
        calliope_db::list_agents(&conn).map_err(map_store_error)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    Ok(Json(personas))
}

/// Handler for `GET /api/agents/:agentId`.
pub async fn get_agent_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(agent_id): Path<i64>,
) -> Result<Json<AgentPersona>, ApiError> {
    let id = AgentId(agent_id);
    let persona = tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;
        calliope_db::get_agent(&conn, id).map_err(map_store_error)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??
    .ok_or_else(|| ApiError::NotFound(format!("agent {} not found", id)))?;

    Ok(Json(persona))
}

/// Handler for `PUT /api/agents/:agentId`.
pub async fn update_agent_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(agent_id): Path<i64>,
    Json(payload): Json<UpdateAgentRequest>,
) -> Result<Json<AgentPersona>, ApiError> {
    let id = AgentId(agent_id);
    let persona = tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;
        calliope_db::update_agent(
            &conn,
            id,
            &UpdateAgent {
                name: payload.name,
                system_prompt: payload.prompt,
                voice_id: payload.voice_id,
            },
        )
        .map_err(map_store_error)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    Ok(Json(persona))
}

/// Handler for `DELETE /api/agents/:agentId`.
///
/// Also drops the agent's in-memory conversation history, so a later
/// agent reusing the id starts with a clean context.
pub async fn delete_agent_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(agent_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = AgentId(agent_id);
    let db_state = state.clone();
    tokio::task::spawn_blocking(move || {
        let conn = db_state
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;
        calliope_db::delete_agent(&conn, id).map_err(map_store_error)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    state.pipeline.history().clear(id);

    Ok(Json(serde_json::json!({ "status": "deleted" })))
}

/// Handler for `POST /api/generate-prompt`.
///
/// Drafts a persona system prompt from a role and goal description using
/// the same generator that produces conversation replies.
pub async fn generate_prompt_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<GeneratePromptRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if payload.role.trim().is_empty() || payload.goal.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "role and goal must not be empty".to_string(),
        ));
    }

    let prompt = persona_draft_prompt(payload.role.trim(), payload.goal.trim());
    let drafted = state
        .generator
        .generate(&prompt)
        .await
        .map_err(|e| ApiError::InternalServerError(e.to_string()))?;

    Ok(Json(serde_json::json!({ "prompt": drafted.trim() })))
}
