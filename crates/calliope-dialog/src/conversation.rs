//! Per-agent conversation history.
//!
//! Histories live in process memory and do not survive restarts. Storage
//! is unbounded; only the most recent [`CONTEXT_WINDOW`] turns are read
//! when building generation context. Turns for different agents never
//! block each other (the map is sharded); a single append or read is
//! atomic, but concurrent turns for the *same* agent may interleave their
//! append pairs — that race is accepted and covered by a test rather
//! than serialized away.

use calliope_types::{AgentId, ConversationTurn};
use dashmap::DashMap;
use std::sync::Arc;

/// Number of most-recent turns included when building generation context.
pub const CONTEXT_WINDOW: usize = 10;

/// Process-wide conversation history keyed by agent id.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    histories: Arc<DashMap<AgentId, Vec<ConversationTurn>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends turns for an agent, creating the history lazily on first use.
    pub fn append(&self, agent_id: AgentId, turns: impl IntoIterator<Item = ConversationTurn>) {
        self.histories.entry(agent_id).or_default().extend(turns);
    }

    /// Returns up to `limit` most recent turns in chronological order.
    pub fn recent_context(&self, agent_id: AgentId, limit: usize) -> Vec<ConversationTurn> {
        match self.histories.get(&agent_id) {
            Some(history) => {
                let skip = history.len().saturating_sub(limit);
                history[skip..].to_vec()
            }
            None => Vec::new(),
        }
    }

    /// Renders the recent context as newline-joined `"<role>: <content>"` lines.
    pub fn render_context(&self, agent_id: AgentId, limit: usize) -> String {
        self.recent_context(agent_id, limit)
            .iter()
            .map(ConversationTurn::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Removes the agent's entire history. Called when the agent is deleted.
    pub fn clear(&self, agent_id: AgentId) {
        self.histories.remove(&agent_id);
    }

    /// Total stored turns for an agent, including those outside the window.
    pub fn turn_count(&self, agent_id: AgentId) -> usize {
        self.histories
            .get(&agent_id)
            .map(|history| history.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calliope_types::Role;

    #[test]
    fn context_is_windowed_and_ordered() {
        let store = ConversationStore::new();
        let agent = AgentId(1);

        for i in 0..8 {
            store.append(
                agent,
                [
                    ConversationTurn::user(format!("question {i}")),
                    ConversationTurn::assistant(format!("answer {i}")),
                ],
            );
        }
        assert_eq!(store.turn_count(agent), 16);

        let context = store.recent_context(agent, CONTEXT_WINDOW);
        assert_eq!(context.len(), CONTEXT_WINDOW);
        // The window covers the last 5 exchanges, oldest first.
        assert_eq!(context[0].content, "question 3");
        assert_eq!(context[0].role, Role::User);
        assert_eq!(context.last().unwrap().content, "answer 7");
        assert_eq!(context.last().unwrap().role, Role::Assistant);
    }

    #[test]
    fn render_formats_role_prefixed_lines() {
        let store = ConversationStore::new();
        let agent = AgentId(2);
        store.append(
            agent,
            [
                ConversationTurn::user("hi"),
                ConversationTurn::assistant("hello"),
            ],
        );
        assert_eq!(
            store.render_context(agent, CONTEXT_WINDOW),
            "User: hi\nAssistant: hello"
        );
    }

    #[test]
    fn unknown_agent_has_empty_context() {
        let store = ConversationStore::new();
        assert!(store.recent_context(AgentId(99), CONTEXT_WINDOW).is_empty());
        assert_eq!(store.render_context(AgentId(99), CONTEXT_WINDOW), "");
    }

    #[test]
    fn clear_removes_history_entirely() {
        let store = ConversationStore::new();
        let agent = AgentId(3);
        store.append(agent, [ConversationTurn::user("remember me")]);
        store.clear(agent);
        assert_eq!(store.turn_count(agent), 0);
        // A new agent reusing the id starts clean.
        assert!(store.recent_context(agent, CONTEXT_WINDOW).is_empty());
    }

    #[test]
    fn agents_do_not_share_history() {
        let store = ConversationStore::new();
        store.append(AgentId(1), [ConversationTurn::user("for one")]);
        store.append(AgentId(2), [ConversationTurn::user("for two")]);

        assert_eq!(store.recent_context(AgentId(1), 10)[0].content, "for one");
        assert_eq!(store.recent_context(AgentId(2), 10)[0].content, "for two");
    }

    #[test]
    fn interleaved_appends_stay_pairwise() {
        // Concurrent turns for the same agent may interleave across
        // threads, but each append of a (user, assistant) pair lands
        // atomically: pairs never split.
        let store = ConversationStore::new();
        let agent = AgentId(7);

        std::thread::scope(|scope| {
            for t in 0..4 {
                let store = store.clone();
                scope.spawn(move || {
                    for i in 0..50 {
                        store.append(
                            agent,
                            [
                                ConversationTurn::user(format!("u{t}-{i}")),
                                ConversationTurn::assistant(format!("a{t}-{i}")),
                            ],
                        );
                    }
                });
            }
        });

        let history = store.recent_context(agent, usize::MAX);
        assert_eq!(history.len(), 400);
        for pair in history.chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Assistant);
            // The pair came from the same logical turn.
            assert_eq!(pair[0].content[1..], pair[1].content[1..]);
        }
    }
}
