//! Conversation state and turn orchestration for the Calliope platform.
//!
//! Owns the process-local conversation histories, the single-slot audio
//! artifact cache, prompt assembly, the Gemini reply generator, and the
//! [`TurnPipeline`] that drives a spoken utterance through
//! transcode → transcribe → generate → synthesize.

pub mod artifact;
pub mod conversation;
pub mod gemini;
pub mod pipeline;
pub mod prompt;

pub use artifact::ArtifactCache;
pub use conversation::{ConversationStore, CONTEXT_WINDOW};
pub use gemini::GeminiGenerator;
pub use pipeline::{TurnError, TurnOutcome, TurnPipeline, TurnRequest, CLARIFY_REPLY};
