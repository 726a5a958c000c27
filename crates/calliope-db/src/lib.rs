//! Persistence layer for the Calliope platform.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode
//! initialization, embedded SQL migrations, and the agent persona store.
//! Conversation history is deliberately *not* persisted here — it is
//! process-local state owned by the dialog crate and does not survive
//! restarts.

mod agents;
mod migrations;
mod pool;

pub use agents::{
    create_agent, delete_agent, get_agent, list_agents, update_agent, AgentStoreError,
    NewAgent, SqliteAgentStore, UpdateAgent, DEFAULT_VOICE_ID,
};
pub use migrations::run_migrations;
pub use pool::{create_pool, DbPool, PoolSettings};
