//! Audio normalization via ffmpeg.
//!
//! Uploaded audio arrives in whatever container the client recorded
//! (typically WebM/Opus). The transcriber wants 16 kHz mono 16-bit
//! signed PCM, so every payload goes through ffmpeg first.

use async_trait::async_trait;
use calliope_types::{AudioTranscoder, TranscodeError};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Maximum audio input size (25 MiB). Prevents OOM from oversized payloads.
const MAX_INPUT_BYTES: usize = 25 * 1024 * 1024;

/// Timeout for the ffmpeg conversion.
const CONVERT_TIMEOUT: Duration = Duration::from_secs(60);

/// Shells out to ffmpeg to produce canonical PCM WAV.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl AudioTranscoder for FfmpegTranscoder {
    async fn to_pcm_wav(&self, raw: &[u8]) -> Result<Vec<u8>, TranscodeError> {
        if raw.is_empty() {
            return Err(TranscodeError::Failed("empty audio payload".to_string()));
        }
        if raw.len() > MAX_INPUT_BYTES {
            return Err(TranscodeError::Failed(format!(
                "audio payload exceeds maximum size: {} bytes (limit: {} bytes)",
                raw.len(),
                MAX_INPUT_BYTES
            )));
        }

        // Scratch dir is removed when `workdir` drops, which covers every
        // exit path below including timeouts and ffmpeg failures.
        let workdir = tempfile::tempdir()
            .map_err(|e| TranscodeError::Unavailable(format!("temp dir creation failed: {}", e)))?;
        let input_path = workdir.path().join("input");
        let output_path = workdir.path().join("output.wav");

        tokio::fs::write(&input_path, raw)
            .await
            .map_err(|e| TranscodeError::Unavailable(format!("temp file write failed: {}", e)))?;

        let mut command = Command::new(&self.binary);
        command
            .arg("-y")
            .arg("-i")
            .arg(&input_path)
            .args(["-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1"])
            .arg(&output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let output = tokio::time::timeout(CONVERT_TIMEOUT, command.output())
            .await
            .map_err(|_| {
                TranscodeError::Failed(format!(
                    "ffmpeg timed out after {} seconds",
                    CONVERT_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| TranscodeError::Unavailable(format!("failed to spawn ffmpeg: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscodeError::Failed(format!(
                "ffmpeg failed: {}",
                stderr.trim()
            )));
        }

        let wav = tokio::fs::read(&output_path).await.map_err(|e| {
            TranscodeError::Failed(format!("ffmpeg produced no readable output: {}", e))
        })?;

        if wav.is_empty() {
            return Err(TranscodeError::Failed(
                "ffmpeg produced empty output".to_string(),
            ));
        }

        Ok(wav)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_oversized_payload_without_spawning() {
        let transcoder = FfmpegTranscoder::new("ffmpeg-that-does-not-exist");
        let payload = vec![0u8; MAX_INPUT_BYTES + 1];
        let err = tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(transcoder.to_pcm_wav(&payload))
            .unwrap_err();
        assert!(matches!(err, TranscodeError::Failed(_)));
    }

    #[tokio::test]
    async fn rejects_empty_payload() {
        let transcoder = FfmpegTranscoder::new("ffmpeg-that-does-not-exist");
        let err = transcoder.to_pcm_wav(&[]).await.unwrap_err();
        assert!(matches!(err, TranscodeError::Failed(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn converts_via_mock_ffmpeg() {
        use std::os::unix::fs::PermissionsExt;

        // Mock ffmpeg: writes a fixed byte string to its last argument.
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("mock_ffmpeg.sh");
        tokio::fs::write(
            &script,
            "#!/bin/sh\nfor out; do :; done\nprintf 'RIFFWAVE' > \"$out\"\n",
        )
        .await
        .unwrap();
        let mut perms = tokio::fs::metadata(&script).await.unwrap().permissions();
        perms.set_mode(0o755);
        tokio::fs::set_permissions(&script, perms).await.unwrap();

        let transcoder = FfmpegTranscoder::new(&script);
        let wav = transcoder.to_pcm_wav(b"webm bytes").await.unwrap();
        assert_eq!(wav, b"RIFFWAVE");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn surfaces_ffmpeg_failure() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("mock_ffmpeg_fail.sh");
        tokio::fs::write(&script, "#!/bin/sh\necho 'invalid data' >&2\nexit 1\n")
            .await
            .unwrap();
        let mut perms = tokio::fs::metadata(&script).await.unwrap().permissions();
        perms.set_mode(0o755);
        tokio::fs::set_permissions(&script, perms).await.unwrap();

        let transcoder = FfmpegTranscoder::new(&script);
        let err = transcoder.to_pcm_wav(b"not audio").await.unwrap_err();
        match err {
            TranscodeError::Failed(msg) => assert!(msg.contains("invalid data")),
            other => panic!("expected Failed, got {:?}", other),
        }
    }
}
