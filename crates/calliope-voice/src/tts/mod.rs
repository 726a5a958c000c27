//! Speech synthesis providers.
//!
//! Three backends with deliberately different shapes: ElevenLabs (remote
//! voice cloning with a per-account voice catalog), Google Translate TTS
//! (remote, catalog is a fixed set of languages), and espeak-ng (local
//! subprocess, single system voice). The [`crate::synth::SynthesisEngine`]
//! selects one at startup and owns the fallback policy.

pub mod elevenlabs;
pub mod espeak;
pub mod translate;

pub use elevenlabs::ElevenLabsTts;
pub use espeak::EspeakTts;
pub use translate::GoogleTranslateTts;
