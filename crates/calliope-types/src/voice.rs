//! Voice catalog and audio artifact definitions.

use serde::{Deserialize, Serialize};

/// Speech synthesis backend, selected once at startup from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisMethod {
    /// ElevenLabs voice cloning API (network, per-voice catalog).
    #[serde(rename = "elevenlabs")]
    ElevenLabs,
    /// Google Translate TTS (network, catalog is a fixed set of languages).
    #[default]
    GoogleTts,
    /// espeak-ng on the local machine (offline, single system voice).
    Offline,
}

impl SynthesisMethod {
    /// Stable name used in status reporting and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            SynthesisMethod::ElevenLabs => "elevenlabs",
            SynthesisMethod::GoogleTts => "google_tts",
            SynthesisMethod::Offline => "offline",
        }
    }
}

/// One entry in a provider's voice catalog.
///
/// For ElevenLabs the id is a voice identity; for Google TTS it is a
/// language code; for the offline engine there is a single synthetic entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceInfo {
    pub id: String,
    pub name: String,
}

/// Synthesized audio held in memory together with its MIME type.
///
/// Output containers differ per provider (MP3 for the network backends,
/// WAV for the offline engine), so consumers must read `mime_type` rather
/// than assume a format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    pub data: Vec<u8>,
    pub mime_type: &'static str,
}

impl AudioArtifact {
    pub fn mp3(data: Vec<u8>) -> Self {
        Self {
            data,
            mime_type: "audio/mpeg",
        }
    }

    pub fn wav(data: Vec<u8>) -> Self {
        Self {
            data,
            mime_type: "audio/wav",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parses_from_snake_case() {
        let m: SynthesisMethod = serde_json::from_str("\"elevenlabs\"").unwrap();
        assert_eq!(m, SynthesisMethod::ElevenLabs);
        let m: SynthesisMethod = serde_json::from_str("\"google_tts\"").unwrap();
        assert_eq!(m, SynthesisMethod::GoogleTts);
        let m: SynthesisMethod = serde_json::from_str("\"offline\"").unwrap();
        assert_eq!(m, SynthesisMethod::Offline);
    }
}
