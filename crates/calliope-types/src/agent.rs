//! Agent persona definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Strongly-typed agent identifier.
///
/// Wraps the SQLite rowid of the persona record so that conversation
/// histories and turn requests cannot be keyed by an arbitrary string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub i64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for AgentId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A named, reusable agent definition.
///
/// The `system_prompt` defines the agent's character and is prepended to
/// every generation request. Invariant: non-empty (enforced at
/// create/update time by the store).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPersona {
    pub id: AgentId,
    /// Display name of the agent.
    pub name: String,
    /// System prompt describing the agent's character and behavior.
    #[serde(rename = "prompt")]
    pub system_prompt: String,
    /// Default voice used for synthesis when a turn does not override it.
    pub voice_id: String,
}
