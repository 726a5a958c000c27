//! Agent persona CRUD and the async store adapter.

use async_trait::async_trait;
use calliope_types::{AgentId, AgentPersona, AgentStore, StoreError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;

use crate::DbPool;

/// Voice assigned to new agents that do not specify one.
pub const DEFAULT_VOICE_ID: &str = "EXAVITQu4vr4xnSDxMaL";

/// Errors that can occur during persona operations.
#[derive(Debug, Error)]
pub enum AgentStoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("agent not found: {0}")]
    NotFound(AgentId),
    #[error("invalid persona: {0}")]
    Invalid(String),
}

/// Parameters for creating a new persona.
#[derive(Debug, Clone)]
pub struct NewAgent {
    pub name: String,
    pub system_prompt: String,
    pub voice_id: Option<String>,
}

/// Parameters for updating an existing persona. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct UpdateAgent {
    pub name: Option<String>,
    pub system_prompt: Option<String>,
    pub voice_id: Option<String>,
}

fn persona_from_row(row: &Row<'_>) -> rusqlite::Result<AgentPersona> {
    Ok(AgentPersona {
        id: AgentId(row.get(0)?),
        name: row.get(1)?,
        system_prompt: row.get(2)?,
        voice_id: row.get(3)?,
    })
}

/// Inserts a new persona and returns it with its assigned id.
pub fn create_agent(conn: &Connection, params: &NewAgent) -> Result<AgentPersona, AgentStoreError> {
    if params.name.trim().is_empty() {
        return Err(AgentStoreError::Invalid("name must not be empty".into()));
    }
    if params.system_prompt.trim().is_empty() {
        return Err(AgentStoreError::Invalid(
            "system prompt must not be empty".into(),
        ));
    }

    let voice_id = params.voice_id.as_deref().unwrap_or(DEFAULT_VOICE_ID);
    conn.execute(
        "INSERT INTO agents (name, system_prompt, voice_id) VALUES (?1, ?2, ?3)",
        params![params.name, params.system_prompt, voice_id],
    )?;
    let id = AgentId(conn.last_insert_rowid());

    Ok(AgentPersona {
        id,
        name: params.name.clone(),
        system_prompt: params.system_prompt.clone(),
        voice_id: voice_id.to_string(),
    })
}

/// Fetches a persona by id.
pub fn get_agent(conn: &Connection, id: AgentId) -> Result<Option<AgentPersona>, AgentStoreError> {
    let persona = conn
        .query_row(
            "SELECT id, name, system_prompt, voice_id FROM agents WHERE id = ?1",
            [id.0],
            persona_from_row,
        )
        .optional()?;
    Ok(persona)
}

/// Lists all personas in insertion order.
pub fn list_agents(conn: &Connection) -> Result<Vec<AgentPersona>, AgentStoreError> {
    let mut stmt =
        conn.prepare("SELECT id, name, system_prompt, voice_id FROM agents ORDER BY id")?;
    let personas = stmt
        .query_map([], persona_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(personas)
}

/// Applies a partial update to a persona and returns the updated record.
pub fn update_agent(
    conn: &Connection,
    id: AgentId,
    update: &UpdateAgent,
) -> Result<AgentPersona, AgentStoreError> {
    let current = get_agent(conn, id)?.ok_or(AgentStoreError::NotFound(id))?;

    let name = update.name.clone().unwrap_or(current.name);
    let system_prompt = update.system_prompt.clone().unwrap_or(current.system_prompt);
    let voice_id = update.voice_id.clone().unwrap_or(current.voice_id);

    if name.trim().is_empty() {
        return Err(AgentStoreError::Invalid("name must not be empty".into()));
    }
    if system_prompt.trim().is_empty() {
        return Err(AgentStoreError::Invalid(
            "system prompt must not be empty".into(),
        ));
    }

    conn.execute(
        "UPDATE agents SET name = ?1, system_prompt = ?2, voice_id = ?3 WHERE id = ?4",
        params![name, system_prompt, voice_id, id.0],
    )?;

    Ok(AgentPersona {
        id,
        name,
        system_prompt,
        voice_id,
    })
}

/// Deletes a persona. Returns `NotFound` if the id does not exist.
///
/// Callers that keep conversation state for the agent must clear it as
/// well; this function only touches the database.
pub fn delete_agent(conn: &Connection, id: AgentId) -> Result<(), AgentStoreError> {
    let affected = conn.execute("DELETE FROM agents WHERE id = ?1", [id.0])?;
    if affected == 0 {
        return Err(AgentStoreError::NotFound(id));
    }
    Ok(())
}

/// [`AgentStore`] implementation over the connection pool.
///
/// The pool is synchronous; lookups run on the blocking thread pool the
/// same way the HTTP handlers drive their queries.
#[derive(Clone)]
pub struct SqliteAgentStore {
    pool: DbPool,
}

impl SqliteAgentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AgentStore for SqliteAgentStore {
    async fn get(&self, id: AgentId) -> Result<Option<AgentPersona>, StoreError> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            get_agent(&conn, id).map_err(|e| StoreError::Query(e.to_string()))
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("task join error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations, PoolSettings};

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn create_and_get_round_trip() {
        let conn = test_conn();
        let created = create_agent(
            &conn,
            &NewAgent {
                name: "Sales".into(),
                system_prompt: "You are a persuasive sales agent.".into(),
                voice_id: None,
            },
        )
        .unwrap();

        assert_eq!(created.voice_id, DEFAULT_VOICE_ID);

        let fetched = get_agent(&conn, created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn create_rejects_empty_prompt() {
        let conn = test_conn();
        let err = create_agent(
            &conn,
            &NewAgent {
                name: "Broken".into(),
                system_prompt: "   ".into(),
                voice_id: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, AgentStoreError::Invalid(_)));
    }

    #[test]
    fn update_is_partial() {
        let conn = test_conn();
        let created = create_agent(
            &conn,
            &NewAgent {
                name: "Support".into(),
                system_prompt: "You are a support agent.".into(),
                voice_id: Some("voice-a".into()),
            },
        )
        .unwrap();

        let updated = update_agent(
            &conn,
            created.id,
            &UpdateAgent {
                name: Some("Support v2".into()),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(updated.name, "Support v2");
        assert_eq!(updated.system_prompt, created.system_prompt);
        assert_eq!(updated.voice_id, "voice-a");
    }

    #[test]
    fn delete_then_missing() {
        let conn = test_conn();
        let created = create_agent(
            &conn,
            &NewAgent {
                name: "Ephemeral".into(),
                system_prompt: "You vanish.".into(),
                voice_id: None,
            },
        )
        .unwrap();

        delete_agent(&conn, created.id).unwrap();
        assert!(get_agent(&conn, created.id).unwrap().is_none());
        assert!(matches!(
            delete_agent(&conn, created.id),
            Err(AgentStoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn async_store_resolves_personas() {
        // Every pooled connection to ":memory:" opens its own database, so
        // the test pool is capped at a single connection.
        let settings = PoolSettings {
            max_connections: 1,
            ..Default::default()
        };
        let pool = create_pool(":memory:", settings).unwrap();
        let created = {
            let conn = pool.get().unwrap();
            run_migrations(&conn).unwrap();
            create_agent(
                &conn,
                &NewAgent {
                    name: "Async".into(),
                    system_prompt: "You answer asynchronously.".into(),
                    voice_id: None,
                },
            )
            .unwrap()
        };

        let store = SqliteAgentStore::new(pool);
        let found = store.get(created.id).await.unwrap();
        assert_eq!(found, Some(created));
        assert_eq!(store.get(AgentId(9_999)).await.unwrap(), None);
    }
}
