//! Audio and speech services for the Calliope platform.
//!
//! Covers the audio half of a conversation turn: normalizing uploaded
//! audio into canonical PCM (ffmpeg), transcribing it (whisper.cpp),
//! stripping markup from generated replies, and rendering replies as
//! speech through one of three interchangeable synthesis backends with
//! an explicit fallback policy.

pub mod config;
pub mod sanitize;
pub mod stt;
pub mod synth;
pub mod transcode;
pub mod tts;

pub use config::{SynthesisConfig, VoiceConfigError};
pub use sanitize::sanitize_for_speech;
pub use stt::WhisperStt;
pub use synth::SynthesisEngine;
pub use transcode::FfmpegTranscoder;
