//! The synthesis engine: one configured backend plus the fallback policy.
//!
//! The backend is chosen once at startup from [`SynthesisConfig`] and
//! never branched on per call outside the dispatch below. When the
//! configured backend is ElevenLabs and a synthesis attempt fails for any
//! reason, exactly one retry is made through Google Translate TTS before
//! the failure is surfaced. Failures of the other backends are terminal.

use crate::config::{SynthesisConfig, VoiceConfigError};
use crate::sanitize::sanitize_for_speech;
use crate::tts::{ElevenLabsTts, EspeakTts, GoogleTranslateTts};
use async_trait::async_trait;
use calliope_types::{AudioArtifact, SynthesisError, SynthesisMethod, Synthesizer, VoiceInfo};

/// The active backend, fixed for the process lifetime.
#[derive(Debug, Clone)]
enum Backend {
    ElevenLabs {
        primary: ElevenLabsTts,
        fallback: GoogleTranslateTts,
    },
    GoogleTts(GoogleTranslateTts),
    Offline(EspeakTts),
}

/// Uniform synthesis across heterogeneous providers.
#[derive(Debug, Clone)]
pub struct SynthesisEngine {
    method: SynthesisMethod,
    backend: Backend,
    default_language: String,
    /// Voice catalog, resolved once at startup and cached for the
    /// process lifetime. A stale ElevenLabs catalog is accepted.
    voices: Vec<VoiceInfo>,
}

impl SynthesisEngine {
    /// Builds the engine for the configured method and resolves the voice
    /// catalog once.
    ///
    /// For ElevenLabs the catalog is fetched over the network; a failed
    /// fetch logs a warning and leaves the catalog empty rather than
    /// failing startup.
    pub async fn init(config: &SynthesisConfig) -> Result<Self, VoiceConfigError> {
        let client = reqwest::Client::new();
        let translate = GoogleTranslateTts::new(client.clone(), &config.translate_base_url);

        let (backend, voices) = match config.method {
            SynthesisMethod::ElevenLabs => {
                if config.elevenlabs_api_key.trim().is_empty() {
                    return Err(VoiceConfigError::Invalid(
                        "elevenlabs synthesis requires an API key".to_string(),
                    ));
                }
                let primary = ElevenLabsTts::new(
                    client,
                    &config.elevenlabs_api_key,
                    &config.elevenlabs_base_url,
                );
                let voices = match primary.voices().await {
                    Ok(voices) => voices,
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to fetch ElevenLabs voice catalog, continuing with an empty catalog");
                        Vec::new()
                    }
                };
                (
                    Backend::ElevenLabs {
                        primary,
                        fallback: translate,
                    },
                    voices,
                )
            }
            SynthesisMethod::GoogleTts => {
                let voices = GoogleTranslateTts::languages();
                (Backend::GoogleTts(translate), voices)
            }
            SynthesisMethod::Offline => {
                let voices = vec![EspeakTts::catalog_entry()];
                (Backend::Offline(EspeakTts::new(&config.espeak_binary)), voices)
            }
        };

        tracing::info!(
            method = config.method.as_str(),
            voices = voices.len(),
            "synthesis engine ready"
        );

        Ok(Self {
            method: config.method,
            backend,
            default_language: config.default_language.clone(),
            voices,
        })
    }

    /// The configured synthesis method.
    pub fn method(&self) -> SynthesisMethod {
        self.method
    }

    /// The cached voice catalog of the active backend.
    pub fn voices(&self) -> &[VoiceInfo] {
        &self.voices
    }
}

#[async_trait]
impl Synthesizer for SynthesisEngine {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
    ) -> Result<AudioArtifact, SynthesisError> {
        // Markup is stripped here so every dispatch path below — including
        // the fallback — speaks clean text.
        let speech_text = sanitize_for_speech(text);

        match &self.backend {
            Backend::ElevenLabs { primary, fallback } => {
                match primary.synthesize(&speech_text, voice_id).await {
                    Ok(artifact) => Ok(artifact),
                    Err(primary_err) => {
                        tracing::warn!(
                            error = %primary_err,
                            "ElevenLabs synthesis failed, falling back to Google TTS"
                        );
                        fallback
                            .synthesize(&speech_text, &self.default_language)
                            .await
                    }
                }
            }
            Backend::GoogleTts(provider) => provider.synthesize(&speech_text, voice_id).await,
            Backend::Offline(provider) => provider.synthesize(&speech_text).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::Router;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Hits {
        eleven_tts: Arc<AtomicUsize>,
        translate_tts: Arc<AtomicUsize>,
    }

    /// Mock provider HTTP surface. ElevenLabs synthesis always returns
    /// 401; translate returns MP3 bytes unless `translate_fails`.
    async fn spawn_mock_providers(translate_fails: bool) -> (String, Hits) {
        let hits = Hits::default();

        let eleven_hits = hits.clone();
        let translate_hits = hits.clone();

        let router = Router::new()
            .route(
                "/v1/voices",
                get(|| async { (StatusCode::OK, axum::Json(serde_json::json!({"voices": []}))) }),
            )
            .route(
                "/v1/text-to-speech/{voice}",
                post(move || {
                    let hits = eleven_hits.clone();
                    async move {
                        hits.eleven_tts.fetch_add(1, Ordering::SeqCst);
                        StatusCode::UNAUTHORIZED
                    }
                }),
            )
            .route(
                "/translate_tts",
                get(move || {
                    let hits = translate_hits.clone();
                    async move {
                        hits.translate_tts.fetch_add(1, Ordering::SeqCst);
                        if translate_fails {
                            (StatusCode::INTERNAL_SERVER_ERROR, Vec::new())
                        } else {
                            (StatusCode::OK, b"mp3-bytes".to_vec())
                        }
                    }
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        (format!("http://{}", addr), hits)
    }

    fn engine_config(base_url: &str) -> SynthesisConfig {
        SynthesisConfig {
            method: SynthesisMethod::ElevenLabs,
            elevenlabs_api_key: "test-key".to_string(),
            elevenlabs_base_url: base_url.to_string(),
            translate_base_url: base_url.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn elevenlabs_failure_falls_back_exactly_once() {
        let (base_url, hits) = spawn_mock_providers(false).await;
        let engine = SynthesisEngine::init(&engine_config(&base_url)).await.unwrap();

        let artifact = engine.synthesize("hello there", "voice-1").await.unwrap();

        assert_eq!(hits.eleven_tts.load(Ordering::SeqCst), 1);
        assert_eq!(hits.translate_tts.load(Ordering::SeqCst), 1);
        assert_eq!(artifact.mime_type, "audio/mpeg");
        assert_eq!(artifact.data, b"mp3-bytes");
    }

    #[tokio::test]
    async fn fallback_failure_surfaces_error() {
        let (base_url, hits) = spawn_mock_providers(true).await;
        let engine = SynthesisEngine::init(&engine_config(&base_url)).await.unwrap();

        let err = engine.synthesize("hello there", "voice-1").await.unwrap_err();

        // One primary attempt, one fallback attempt, no further retries.
        assert_eq!(hits.eleven_tts.load(Ordering::SeqCst), 1);
        assert_eq!(hits.translate_tts.load(Ordering::SeqCst), 1);
        assert!(matches!(err, SynthesisError::Network(_)));
    }

    #[tokio::test]
    async fn google_tts_failure_is_terminal() {
        let (base_url, hits) = spawn_mock_providers(true).await;
        let config = SynthesisConfig {
            method: SynthesisMethod::GoogleTts,
            translate_base_url: base_url,
            ..Default::default()
        };
        let engine = SynthesisEngine::init(&config).await.unwrap();

        let err = engine.synthesize("bonjour", "fr").await.unwrap_err();
        assert!(matches!(err, SynthesisError::Network(_)));
        assert_eq!(hits.translate_tts.load(Ordering::SeqCst), 1);
        assert_eq!(hits.eleven_tts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn default_engine_exposes_language_catalog() {
        let config = SynthesisConfig::default();
        let engine = SynthesisEngine::init(&config).await.unwrap();
        assert_eq!(engine.method(), SynthesisMethod::GoogleTts);
        assert_eq!(engine.voices().len(), 7);
        assert_eq!(engine.voices()[0].id, "en");
    }

    #[tokio::test]
    async fn elevenlabs_without_key_is_rejected() {
        let config = SynthesisConfig {
            method: SynthesisMethod::ElevenLabs,
            ..Default::default()
        };
        let err = SynthesisEngine::init(&config).await.unwrap_err();
        assert!(matches!(err, VoiceConfigError::Invalid(_)));
    }

    #[tokio::test]
    async fn offline_catalog_is_single_entry() {
        let config = SynthesisConfig {
            method: SynthesisMethod::Offline,
            ..Default::default()
        };
        let engine = SynthesisEngine::init(&config).await.unwrap();
        assert_eq!(engine.voices().len(), 1);
        assert_eq!(engine.voices()[0].id, "default");
    }
}
