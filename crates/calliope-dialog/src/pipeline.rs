//! The turn pipeline: audio in, reply text plus optional speech out.
//!
//! One call to [`TurnPipeline::process_turn`] drives a full turn:
//! validate → normalize audio → transcribe → build context → generate →
//! record history → synthesize. Validation, conversion, transcription,
//! and generation failures abort the turn. Synthesis failures do not:
//! the turn degrades to a text-only success with `audio_synthesized`
//! cleared and the artifact slot untouched.

use crate::artifact::ArtifactCache;
use crate::conversation::{ConversationStore, CONTEXT_WINDOW};
use crate::prompt::turn_prompt;
use calliope_types::{
    AgentId, AgentStore, AudioTranscoder, ConversationTurn, GenerateError, ResponseGenerator,
    StoreError, Synthesizer, TranscodeError, TranscribeError, Transcriber,
};
use std::sync::Arc;
use thiserror::Error;

/// Fixed reply returned when the utterance transcribes to nothing.
pub const CLARIFY_REPLY: &str = "I didn't catch that. Could you please repeat?";

/// One spoken utterance to process.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub agent_id: AgentId,
    /// Overrides the persona's voice for this turn when set.
    pub voice_id: Option<String>,
    /// Raw uploaded audio in whatever container the client recorded.
    pub audio: Vec<u8>,
}

/// Result of a processed turn.
///
/// The synthesized audio itself is published through the artifact cache;
/// `audio_synthesized` records whether that happened, making the
/// degrade-to-text path observable instead of silent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub transcript: String,
    pub reply: String,
    pub audio_synthesized: bool,
}

/// Failures that abort a turn.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("agent {0} not found")]
    AgentNotFound(AgentId),
    #[error(transparent)]
    Conversion(#[from] TranscodeError),
    #[error(transparent)]
    Transcription(#[from] TranscribeError),
    #[error(transparent)]
    Generation(#[from] GenerateError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Orchestrates one conversation turn across the injected capabilities.
#[derive(Clone)]
pub struct TurnPipeline {
    agents: Arc<dyn AgentStore>,
    transcoder: Arc<dyn AudioTranscoder>,
    transcriber: Arc<dyn Transcriber>,
    generator: Arc<dyn ResponseGenerator>,
    synthesizer: Arc<dyn Synthesizer>,
    history: ConversationStore,
    artifacts: ArtifactCache,
}

impl TurnPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        agents: Arc<dyn AgentStore>,
        transcoder: Arc<dyn AudioTranscoder>,
        transcriber: Arc<dyn Transcriber>,
        generator: Arc<dyn ResponseGenerator>,
        synthesizer: Arc<dyn Synthesizer>,
        history: ConversationStore,
        artifacts: ArtifactCache,
    ) -> Self {
        Self {
            agents,
            transcoder,
            transcriber,
            generator,
            synthesizer,
            history,
            artifacts,
        }
    }

    /// The conversation store backing this pipeline.
    pub fn history(&self) -> &ConversationStore {
        &self.history
    }

    /// The artifact cache backing this pipeline.
    pub fn artifacts(&self) -> &ArtifactCache {
        &self.artifacts
    }

    /// Processes one turn to completion.
    ///
    /// Once a provider call is issued it runs to completion or failure;
    /// there is no mid-turn cancellation.
    pub async fn process_turn(&self, request: TurnRequest) -> Result<TurnOutcome, TurnError> {
        if request.audio.is_empty() {
            return Err(TurnError::InvalidRequest(
                "no audio payload provided".to_string(),
            ));
        }

        let persona = self
            .agents
            .get(request.agent_id)
            .await?
            .ok_or(TurnError::AgentNotFound(request.agent_id))?;

        let pcm_wav = self.transcoder.to_pcm_wav(&request.audio).await?;

        let transcript = self.transcriber.transcribe(&pcm_wav).await?;
        let transcript = transcript.trim().to_string();
        if transcript.is_empty() {
            // Nothing intelligible was said: ask for a repeat without
            // touching history, the generator, or the synthesizer.
            tracing::debug!(agent_id = %request.agent_id, "empty transcript, returning clarification");
            return Ok(TurnOutcome {
                transcript,
                reply: CLARIFY_REPLY.to_string(),
                audio_synthesized: false,
            });
        }

        let context = self
            .history
            .render_context(request.agent_id, CONTEXT_WINDOW);
        let prompt = turn_prompt(&persona.system_prompt, &context, &transcript);

        let reply = self.generator.generate(&prompt).await?;
        let reply = reply.trim().to_string();

        self.history.append(
            request.agent_id,
            [
                ConversationTurn::user(transcript.clone()),
                ConversationTurn::assistant(reply.clone()),
            ],
        );

        let voice_id = request
            .voice_id
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(&persona.voice_id);

        let audio_synthesized = match self.synthesizer.synthesize(&reply, voice_id).await {
            Ok(artifact) => {
                self.artifacts.store(artifact);
                true
            }
            Err(e) => {
                // Degrade to text: the reply still succeeds, the audio
                // endpoint simply keeps (or lacks) its previous artifact.
                tracing::warn!(agent_id = %request.agent_id, error = %e, "synthesis failed, returning text-only turn");
                false
            }
        };

        Ok(TurnOutcome {
            transcript,
            reply,
            audio_synthesized,
        })
    }
}
