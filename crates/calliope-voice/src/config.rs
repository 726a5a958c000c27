//! Synthesis backend configuration.

use calliope_types::SynthesisMethod;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

fn default_elevenlabs_base_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_translate_base_url() -> String {
    "https://translate.google.com".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_espeak_binary() -> PathBuf {
    PathBuf::from("espeak-ng")
}

/// Process-wide synthesis configuration, immutable after startup.
#[derive(Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Which backend to use for the lifetime of the process.
    #[serde(default)]
    pub method: SynthesisMethod,

    /// ElevenLabs API key. Required when `method` is `elevenlabs`.
    #[serde(default, skip_serializing)]
    pub elevenlabs_api_key: String,

    /// ElevenLabs API endpoint. Overridable for tests.
    #[serde(default = "default_elevenlabs_base_url")]
    pub elevenlabs_base_url: String,

    /// Google Translate TTS endpoint. Overridable for tests.
    #[serde(default = "default_translate_base_url")]
    pub translate_base_url: String,

    /// Language used by the Google TTS fallback path.
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Path to the espeak-ng binary for the offline backend.
    #[serde(default = "default_espeak_binary")]
    pub espeak_binary: PathBuf,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            method: SynthesisMethod::default(),
            elevenlabs_api_key: String::new(),
            elevenlabs_base_url: default_elevenlabs_base_url(),
            translate_base_url: default_translate_base_url(),
            default_language: default_language(),
            espeak_binary: default_espeak_binary(),
        }
    }
}

impl fmt::Debug for SynthesisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynthesisConfig")
            .field("method", &self.method)
            .field("elevenlabs_api_key", &"[REDACTED]")
            .field("elevenlabs_base_url", &self.elevenlabs_base_url)
            .field("translate_base_url", &self.translate_base_url)
            .field("default_language", &self.default_language)
            .field("espeak_binary", &self.espeak_binary)
            .finish()
    }
}

/// Errors raised while validating voice configuration at startup.
#[derive(Debug, Error)]
pub enum VoiceConfigError {
    #[error("invalid synthesis configuration: {0}")]
    Invalid(String),
}
