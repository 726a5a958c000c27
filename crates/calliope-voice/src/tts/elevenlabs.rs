//! ElevenLabs voice cloning backend.

use calliope_types::{AudioArtifact, SynthesisError, VoiceInfo};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::time::Duration;

const XI_API_KEY_HEADER: &str = "xi-api-key";

/// Timeout for the voice catalog fetch.
const VOICES_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for a synthesis request.
const SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote voice-synthesis client with a specific voice identity per request.
#[derive(Clone)]
pub struct ElevenLabsTts {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl fmt::Debug for ElevenLabsTts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElevenLabsTts")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Deserialize)]
struct VoicesResponse {
    voices: Vec<ApiVoice>,
}

#[derive(Deserialize)]
struct ApiVoice {
    voice_id: String,
    name: String,
}

impl ElevenLabsTts {
    pub fn new(
        client: reqwest::Client,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Fetches the account's voice catalog.
    pub async fn voices(&self) -> Result<Vec<VoiceInfo>, SynthesisError> {
        let response = self
            .client
            .get(format!("{}/v1/voices", self.base_url))
            .header(XI_API_KEY_HEADER, &self.api_key)
            .timeout(VOICES_TIMEOUT)
            .send()
            .await
            .map_err(|e| SynthesisError::Network(format!("voice catalog fetch failed: {}", e)))?;

        match response.status() {
            StatusCode::UNAUTHORIZED => {
                return Err(SynthesisError::Auth(
                    "ElevenLabs rejected the API key".to_string(),
                ))
            }
            status if !status.is_success() => {
                return Err(SynthesisError::Network(format!(
                    "voice catalog fetch returned {}",
                    status
                )))
            }
            _ => {}
        }

        let body: VoicesResponse = response
            .json()
            .await
            .map_err(|e| SynthesisError::Network(format!("voice catalog parse failed: {}", e)))?;

        Ok(body
            .voices
            .into_iter()
            .map(|v| VoiceInfo {
                id: v.voice_id,
                name: v.name,
            })
            .collect())
    }

    /// Synthesizes `text` with the given voice identity. Returns MP3 audio.
    pub async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
    ) -> Result<AudioArtifact, SynthesisError> {
        let payload = json!({
            "text": text,
            "voice_settings": {
                "stability": 0.5,
                "similarity_boost": 0.8
            }
        });

        let response = self
            .client
            .post(format!(
                "{}/v1/text-to-speech/{}",
                self.base_url, voice_id
            ))
            .header(XI_API_KEY_HEADER, &self.api_key)
            .json(&payload)
            .timeout(SYNTHESIS_TIMEOUT)
            .send()
            .await
            .map_err(|e| SynthesisError::Network(format!("synthesis request failed: {}", e)))?;

        match response.status() {
            StatusCode::UNAUTHORIZED => {
                return Err(SynthesisError::Auth(
                    "ElevenLabs rejected the API key".to_string(),
                ))
            }
            StatusCode::UNPROCESSABLE_ENTITY => {
                return Err(SynthesisError::InvalidInput(format!(
                    "ElevenLabs rejected voice '{}' or the text content",
                    voice_id
                )))
            }
            status if !status.is_success() => {
                return Err(SynthesisError::Network(format!(
                    "synthesis returned {}",
                    status
                )))
            }
            _ => {}
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::Network(format!("synthesis body read failed: {}", e)))?;

        Ok(AudioArtifact::mp3(data.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_api_key() {
        let tts = ElevenLabsTts::new(
            reqwest::Client::new(),
            "sk-secret",
            "https://api.elevenlabs.io/",
        );
        let rendered = format!("{:?}", tts);
        assert!(!rendered.contains("sk-secret"));
        // Trailing slash is normalized away.
        assert!(rendered.contains("https://api.elevenlabs.io"));
    }
}
