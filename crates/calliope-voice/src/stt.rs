//! Speech-to-text via a whisper.cpp subprocess.

use async_trait::async_trait;
use calliope_types::{TranscribeError, Transcriber};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Maximum audio input size for STT (10 MiB). Prevents OOM from oversized payloads.
const MAX_STT_INPUT_BYTES: usize = 10 * 1024 * 1024;

/// Timeout for STT process execution.
const STT_TIMEOUT: Duration = Duration::from_secs(120);

/// Transcribes canonical PCM WAV by piping it to a whisper.cpp binary.
#[derive(Debug, Clone)]
pub struct WhisperStt {
    model_path: PathBuf,
    binary_path: PathBuf,
}

impl WhisperStt {
    pub fn new(model_path: impl Into<PathBuf>, binary_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            binary_path: binary_path.into(),
        }
    }
}

#[async_trait]
impl Transcriber for WhisperStt {
    async fn transcribe(&self, pcm_wav: &[u8]) -> Result<String, TranscribeError> {
        if pcm_wav.len() > MAX_STT_INPUT_BYTES {
            return Err(TranscribeError(format!(
                "audio data exceeds maximum size: {} bytes (limit: {} bytes)",
                pcm_wav.len(),
                MAX_STT_INPUT_BYTES
            )));
        }

        let mut command = Command::new(&self.binary_path);

        // Standard whisper.cpp arguments: -m <model>, -f - (read stdin).
        // The transcription is taken from stdout.
        command
            .arg("-m")
            .arg(&self.model_path)
            .arg("-f")
            .arg("-")
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|e| TranscribeError(format!("failed to spawn STT binary: {}", e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| TranscribeError("failed to open stdin".to_string()))?;

        // Feed stdin from a task so stdout is drained concurrently;
        // writing inline deadlocks once the child fills its output pipe.
        let audio = pcm_wav.to_vec();
        let write_task = tokio::spawn(async move {
            let result = stdin.write_all(&audio).await;
            drop(stdin); // Close stdin to signal EOF
            result
        });

        let output = tokio::time::timeout(STT_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                TranscribeError(format!(
                    "STT process timed out after {} seconds",
                    STT_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| TranscribeError(format!("failed to read stdout: {}", e)))?;

        match write_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(TranscribeError(format!("failed to write to stdin: {}", e)))
            }
            Err(e) => return Err(TranscribeError(format!("stdin writer task failed: {}", e))),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscribeError(format!("STT binary failed: {}", stderr)));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn oversized_input_is_rejected() {
        let stt = WhisperStt::new("model.bin", "whisper-main");
        let payload = vec![0u8; MAX_STT_INPUT_BYTES + 1];
        let err = stt.transcribe(&payload).await.unwrap_err();
        assert!(err.0.contains("maximum size"));
    }

    #[cfg(unix)]
    async fn write_script(dir: &std::path::Path, body: &str) -> std::path::PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("mock_whisper.sh");
        tokio::fs::write(&script, body).await.unwrap();
        let mut perms = tokio::fs::metadata(&script).await.unwrap().permissions();
        perms.set_mode(0o755);
        tokio::fs::set_permissions(&script, perms).await.unwrap();
        script
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn transcribes_via_mock_binary() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(
            dir.path(),
            "#!/bin/sh\ncat > /dev/null\nprintf '  hello world \\n'",
        )
        .await;

        let stt = WhisperStt::new("dummy_model", &script);
        let text = stt.transcribe(b"wav bytes").await.unwrap();
        // Output is trimmed before use.
        assert_eq!(text, "hello world");
    }

    /// A child that emits a pipe-buffer's worth of output before it
    /// drains stdin stalls unless stdin is written concurrently.
    #[cfg(unix)]
    #[tokio::test]
    async fn survives_output_larger_than_the_pipe_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(
            dir.path(),
            "#!/bin/sh\nhead -c 262144 /dev/zero | tr '\\0' 'x'\ncat > /dev/null\n",
        )
        .await;

        let stt = WhisperStt::new("dummy_model", &script);
        let audio = vec![0u8; 262_144];
        let text = tokio::time::timeout(Duration::from_secs(30), stt.transcribe(&audio))
            .await
            .expect("transcription stalled")
            .unwrap();
        assert_eq!(text.len(), 262_144);
        assert!(text.bytes().all(|b| b == b'x'));
    }
}
