//! Calliope server binary — the main entry point for the voice agent
//! platform.
//!
//! Starts an axum HTTP server with structured logging, database
//! initialization, the synthesis engine, and graceful shutdown on
//! SIGTERM/SIGINT.

use calliope_dialog::{ArtifactCache, ConversationStore, GeminiGenerator, TurnPipeline};
use calliope_server::{app, config, AppState};
use calliope_voice::{FfmpegTranscoder, SynthesisEngine, WhisperStt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("CALLIOPE_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    // Load configuration
    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration — the server cannot start without valid config");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    // Initialize database
    let pool = calliope_db::create_pool(
        &config.database.path,
        calliope_db::PoolSettings {
            busy_timeout_ms: config.database.busy_timeout_ms,
            max_connections: config.database.pool_max_size,
        },
    )
    .expect("failed to create database pool — check database.path in config");

    {
        let conn = pool
            .get()
            .expect("failed to get database connection for migrations");
        let applied =
            calliope_db::run_migrations(&conn).expect("failed to run database migrations");
        if applied > 0 {
            tracing::info!(count = applied, "applied database migrations");
        }
    }

    // Initialize the synthesis engine (resolves the voice catalog once)
    let engine = Arc::new(
        SynthesisEngine::init(&config.synthesis)
            .await
            .expect("failed to initialize synthesis engine — check the [synthesis] config"),
    );

    if config.generation.api_key.trim().is_empty() {
        tracing::warn!("no Gemini API key configured; reply generation will fail");
    }

    let generator: Arc<dyn calliope_types::ResponseGenerator> = Arc::new(GeminiGenerator::new(
        reqwest::Client::new(),
        &config.generation.api_key,
        &config.generation.model,
        &config.generation.base_url,
    ));

    let pipeline = TurnPipeline::new(
        Arc::new(calliope_db::SqliteAgentStore::new(pool.clone())),
        Arc::new(FfmpegTranscoder::new(&config.audio.ffmpeg_binary)),
        Arc::new(WhisperStt::new(
            &config.audio.whisper_model,
            &config.audio.whisper_binary,
        )),
        generator.clone(),
        engine.clone(),
        ConversationStore::new(),
        ArtifactCache::new(),
    );

    let state = AppState {
        pool,
        pipeline,
        engine,
        generator,
    };

    // Build application
    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting calliope server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address — is another process using this port?");

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("calliope server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
