//! Capability traits the turn pipeline is assembled from.
//!
//! Each external dependency of the pipeline — persona storage, audio
//! transcoding, transcription, reply generation, speech synthesis — is an
//! object-safe async trait with its own error type, so the orchestration
//! can pattern-match on failures instead of funneling everything through
//! one opaque error.

use crate::agent::{AgentId, AgentPersona};
use crate::voice::AudioArtifact;
use async_trait::async_trait;
use thiserror::Error;

/// Persona storage error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("agent store unavailable: {0}")]
    Unavailable(String),
    #[error("agent store query failed: {0}")]
    Query(String),
}

/// Read access to agent personas.
///
/// CRUD lives with the concrete store; the pipeline only resolves ids.
#[async_trait]
pub trait AgentStore: Send + Sync {
    /// Looks up a persona by id. `Ok(None)` means the agent does not exist.
    async fn get(&self, id: AgentId) -> Result<Option<AgentPersona>, StoreError>;
}

/// Audio container conversion error. Terminal for the turn, no retry.
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("audio conversion failed: {0}")]
    Failed(String),
    #[error("transcoder unavailable: {0}")]
    Unavailable(String),
}

/// Converts arbitrary uploaded audio into canonical PCM WAV
/// (16 kHz, mono, 16-bit signed) for transcription.
#[async_trait]
pub trait AudioTranscoder: Send + Sync {
    async fn to_pcm_wav(&self, raw: &[u8]) -> Result<Vec<u8>, TranscodeError>;
}

/// Speech-to-text error. Terminal for the turn.
#[derive(Debug, Error)]
#[error("transcription failed: {0}")]
pub struct TranscribeError(pub String);

/// Transcribes canonical PCM WAV audio to text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, pcm_wav: &[u8]) -> Result<String, TranscribeError>;
}

/// Language-model error. Terminal for the turn.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("generation request failed: {0}")]
    Network(String),
    #[error("generation provider rejected the request: {0}")]
    Provider(String),
    #[error("generation response was malformed: {0}")]
    Malformed(String),
}

/// Produces a reply for an assembled prompt.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

/// Speech synthesis error, one variant per provider failure mode.
///
/// The registry collapses all of these into its fallback-or-degrade
/// policy; none of them ever fails a turn outright.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("synthesis provider rejected credentials: {0}")]
    Auth(String),
    #[error("synthesis input rejected: {0}")]
    InvalidInput(String),
    #[error("synthesis network failure: {0}")]
    Network(String),
    #[error("synthesis engine failure: {0}")]
    Engine(String),
}

/// Uniform speech synthesis across heterogeneous providers.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesizes `text` with the given voice, applying the provider
    /// fallback policy internally. The meaning of `voice_id` is
    /// provider-specific (voice identity, language code, or ignored).
    async fn synthesize(&self, text: &str, voice_id: &str)
        -> Result<AudioArtifact, SynthesisError>;
}
