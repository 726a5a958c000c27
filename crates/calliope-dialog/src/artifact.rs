//! Single-slot cache for the most recently synthesized audio.
//!
//! Process-wide and last-write-wins: concurrent turns race on the slot,
//! and a consumer reading "the current audio" may receive another
//! request's artifact. That is the documented contract of the audio
//! retrieval endpoint, not a per-request store.

use calliope_types::AudioArtifact;
use std::sync::{Arc, RwLock};

/// Holds at most one artifact, overwritten on each successful synthesis.
///
/// Uses `std::sync::RwLock` intentionally: all lock acquisitions are
/// brief clone/replace operations that never span `.await` points.
#[derive(Debug, Clone, Default)]
pub struct ArtifactCache {
    slot: Arc<RwLock<Option<AudioArtifact>>>,
}

impl ArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `artifact` as the current one, replacing any prior artifact.
    pub fn store(&self, artifact: AudioArtifact) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(artifact);
    }

    /// Returns a copy of the current artifact, if any exists yet.
    pub fn current(&self) -> Option<AudioArtifact> {
        self.slot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
