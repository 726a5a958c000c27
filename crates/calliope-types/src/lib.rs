//! Shared types for the Calliope platform.
//!
//! Defines the domain model (agents, conversation turns, voices, audio
//! artifacts) and the capability traits the turn pipeline is built
//! against. Every other crate in the workspace depends on this one and
//! nothing here depends on any of them.

pub mod agent;
pub mod capability;
pub mod conversation;
pub mod voice;

pub use agent::{AgentId, AgentPersona};
pub use capability::{
    AgentStore, AudioTranscoder, GenerateError, ResponseGenerator, StoreError, SynthesisError,
    Synthesizer, TranscodeError, TranscribeError, Transcriber,
};
pub use conversation::{ConversationTurn, Role};
pub use voice::{AudioArtifact, SynthesisMethod, VoiceInfo};
