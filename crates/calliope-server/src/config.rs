//! Server configuration loading from file and environment variables.

use calliope_voice::SynthesisConfig;
use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Subprocess binaries for transcoding and transcription.
    #[serde(default)]
    pub audio: AudioConfig,

    /// Reply generation (Gemini) settings.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Speech synthesis settings.
    #[serde(default)]
    pub synthesis: SynthesisConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Maximum connections in the pool.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "calliope_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Paths of the subprocess tools the turn pipeline shells out to.
#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// ffmpeg binary used to normalize uploaded audio.
    #[serde(default = "default_ffmpeg_binary")]
    pub ffmpeg_binary: String,

    /// whisper.cpp binary used for transcription.
    #[serde(default = "default_whisper_binary")]
    pub whisper_binary: String,

    /// whisper.cpp model file.
    #[serde(default = "default_whisper_model")]
    pub whisper_model: String,
}

/// Gemini generation configuration.
#[derive(Clone, Deserialize)]
pub struct GenerationConfig {
    /// Gemini API key. Without it every generation request fails.
    #[serde(default)]
    pub api_key: String,

    /// Model used for reply and persona prompt generation.
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Gemini API endpoint. Overridable for tests.
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    5000
}

fn default_db_path() -> String {
    "calliope.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_pool_max_size() -> u32 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ffmpeg_binary() -> String {
    "ffmpeg".to_string()
}

fn default_whisper_binary() -> String {
    "whisper-cli".to_string()
}

fn default_whisper_model() -> String {
    "models/ggml-base.en.bin".to_string()
}

fn default_generation_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_generation_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            ffmpeg_binary: default_ffmpeg_binary(),
            whisper_binary: default_whisper_binary(),
            whisper_model: default_whisper_model(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_generation_model(),
            base_url: default_generation_base_url(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `CALLIOPE_HOST` overrides `server.host`
/// - `CALLIOPE_PORT` overrides `server.port`
/// - `CALLIOPE_DB_PATH` overrides `database.path`
/// - `CALLIOPE_LOG_LEVEL` overrides `logging.level`
/// - `CALLIOPE_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `GEMINI_API_KEY` overrides `generation.api_key`
/// - `ELEVENLABS_API_KEY` overrides `synthesis.elevenlabs_api_key`
/// - `TTS_METHOD` overrides `synthesis.method` (elevenlabs | google_tts | offline)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(host) = std::env::var("CALLIOPE_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("CALLIOPE_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(db_path) = std::env::var("CALLIOPE_DB_PATH") {
        config.database.path = db_path;
    }
    if let Ok(level) = std::env::var("CALLIOPE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("CALLIOPE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        config.generation.api_key = key;
    }
    if let Ok(key) = std::env::var("ELEVENLABS_API_KEY") {
        config.synthesis.elevenlabs_api_key = key;
    }
    if let Ok(method) = std::env::var("TTS_METHOD") {
        match serde_json::from_value(serde_json::Value::String(method.clone())) {
            Ok(parsed) => config.synthesis.method = parsed,
            Err(_) => tracing::warn!(value = %method, "unrecognized TTS_METHOD, keeping configured method"),
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calliope_types::SynthesisMethod;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.database.path, "calliope.db");
        assert_eq!(config.generation.model, "gemini-2.0-flash");
        assert_eq!(config.synthesis.method, SynthesisMethod::GoogleTts);
    }

    #[test]
    fn parses_full_toml() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 8080

            [generation]
            api_key = "gm-key"
            model = "gemini-2.0-flash"

            [synthesis]
            method = "elevenlabs"
            elevenlabs_api_key = "xi-key"

            [audio]
            ffmpeg_binary = "/usr/bin/ffmpeg"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.generation.api_key, "gm-key");
        assert_eq!(config.synthesis.method, SynthesisMethod::ElevenLabs);
        assert_eq!(config.synthesis.elevenlabs_api_key, "xi-key");
        assert_eq!(config.audio.ffmpeg_binary, "/usr/bin/ffmpeg");
        // Unspecified sections keep their defaults.
        assert_eq!(config.database.pool_max_size, 8);
    }

    #[test]
    fn env_variables_override_file_values() {
        std::env::set_var("CALLIOPE_PORT", "9100");
        std::env::set_var("GEMINI_API_KEY", "gm-from-env");
        std::env::set_var("TTS_METHOD", "offline");

        let config = load_config(None).unwrap();

        std::env::remove_var("CALLIOPE_PORT");
        std::env::remove_var("GEMINI_API_KEY");
        std::env::remove_var("TTS_METHOD");

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.generation.api_key, "gm-from-env");
        assert_eq!(config.synthesis.method, SynthesisMethod::Offline);
    }

    #[test]
    fn generation_debug_redacts_key() {
        let config = GenerationConfig {
            api_key: "gm-secret".to_string(),
            ..Default::default()
        };
        assert!(!format!("{:?}", config).contains("gm-secret"));
    }
}
