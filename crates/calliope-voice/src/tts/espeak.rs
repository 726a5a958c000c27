//! Offline TTS via an espeak-ng subprocess.

use calliope_types::{AudioArtifact, SynthesisError, VoiceInfo};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Maximum text input size (64 KiB). Prevents resource exhaustion from
/// oversized synthesis requests.
const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

/// Timeout for TTS process execution.
const TTS_TIMEOUT: Duration = Duration::from_secs(60);

/// Local synthesis with the system default voice. Voice ids are ignored.
#[derive(Debug, Clone)]
pub struct EspeakTts {
    binary: PathBuf,
}

impl EspeakTts {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// The single synthetic catalog entry this backend advertises.
    pub fn catalog_entry() -> VoiceInfo {
        VoiceInfo {
            id: "default".to_string(),
            name: "System Voice".to_string(),
        }
    }

    /// Synthesizes `text` with the system voice. Returns WAV audio.
    ///
    /// espeak-ng writes a complete WAV stream to stdout with `--stdout`;
    /// the header is kept so the artifact is playable as-is.
    pub async fn synthesize(&self, text: &str) -> Result<AudioArtifact, SynthesisError> {
        if text.len() > MAX_TTS_INPUT_BYTES {
            return Err(SynthesisError::InvalidInput(format!(
                "text exceeds maximum size: {} bytes (limit: {} bytes)",
                text.len(),
                MAX_TTS_INPUT_BYTES
            )));
        }

        let mut command = Command::new(&self.binary);
        command
            .arg("--stdout")
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = command
            .spawn()
            .map_err(|e| SynthesisError::Engine(format!("failed to spawn espeak-ng: {}", e)))?;

        let output = tokio::time::timeout(TTS_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                SynthesisError::Engine(format!(
                    "TTS process timed out after {} seconds",
                    TTS_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| SynthesisError::Engine(format!("failed to wait for espeak-ng: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SynthesisError::Engine(format!(
                "espeak-ng failed: {}",
                stderr
            )));
        }

        Ok(AudioArtifact::wav(output.stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn oversized_text_is_rejected() {
        let tts = EspeakTts::new("espeak-ng-missing");
        let text = "a".repeat(MAX_TTS_INPUT_BYTES + 1);
        let err = tts.synthesize(&text).await.unwrap_err();
        assert!(matches!(err, SynthesisError::InvalidInput(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn synthesizes_via_mock_binary() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("mock_espeak.sh");
        tokio::fs::write(&script, "#!/bin/sh\nprintf 'RIFFfake-wav-bytes'\n")
            .await
            .unwrap();
        let mut perms = tokio::fs::metadata(&script).await.unwrap().permissions();
        perms.set_mode(0o755);
        tokio::fs::set_permissions(&script, perms).await.unwrap();

        let tts = EspeakTts::new(&script);
        let artifact = tts.synthesize("hello").await.unwrap();
        assert_eq!(artifact.mime_type, "audio/wav");
        assert_eq!(artifact.data, b"RIFFfake-wav-bytes");
    }
}
