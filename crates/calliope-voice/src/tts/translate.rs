//! Google Translate TTS backend.
//!
//! Stateless text-to-language synthesis over the public `translate_tts`
//! endpoint. There is no per-voice catalog; the "voice" is a language
//! code from a fixed enumeration. The endpoint caps utterance length, so
//! long replies are split into chunks and the MP3 segments concatenated.

use calliope_types::{AudioArtifact, SynthesisError, VoiceInfo};
use std::time::Duration;

/// Timeout per chunk request.
const CHUNK_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum characters per synthesis request.
const MAX_CHUNK_CHARS: usize = 200;

/// Languages the backend advertises, in catalog order.
pub const LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("hi", "Hindi"),
];

/// Stateless cloud TTS keyed by language code.
#[derive(Debug, Clone)]
pub struct GoogleTranslateTts {
    client: reqwest::Client,
    base_url: String,
}

impl GoogleTranslateTts {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// The static language catalog.
    pub fn languages() -> Vec<VoiceInfo> {
        LANGUAGES
            .iter()
            .map(|(id, name)| VoiceInfo {
                id: (*id).to_string(),
                name: (*name).to_string(),
            })
            .collect()
    }

    /// Synthesizes `text` in the given language. Unrecognized codes fall
    /// back to English — personas configured with a cloning voice id keep
    /// working when this backend is active or used as the fallback.
    pub async fn synthesize(
        &self,
        text: &str,
        language: &str,
    ) -> Result<AudioArtifact, SynthesisError> {
        if text.trim().is_empty() {
            return Err(SynthesisError::InvalidInput(
                "cannot synthesize empty text".to_string(),
            ));
        }

        let lang = if LANGUAGES.iter().any(|(id, _)| *id == language) {
            language
        } else {
            "en"
        };

        let mut data = Vec::new();
        for chunk in chunk_text(text, MAX_CHUNK_CHARS) {
            let response = self
                .client
                .get(format!("{}/translate_tts", self.base_url))
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("tl", lang),
                    ("q", &chunk),
                ])
                .timeout(CHUNK_TIMEOUT)
                .send()
                .await
                .map_err(|e| SynthesisError::Network(format!("tts request failed: {}", e)))?;

            if !response.status().is_success() {
                return Err(SynthesisError::Network(format!(
                    "tts returned {}",
                    response.status()
                )));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| SynthesisError::Network(format!("tts body read failed: {}", e)))?;
            data.extend_from_slice(&bytes);
        }

        Ok(AudioArtifact::mp3(data))
    }
}

/// Splits `text` into whitespace-respecting chunks of at most `max` chars.
/// A single word longer than `max` is hard-split.
fn chunk_text(text: &str, max: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if word.chars().count() > max {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = word.chars().count() + if current.is_empty() { 0 } else { 1 };
        if current.chars().count() + needed > max && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
