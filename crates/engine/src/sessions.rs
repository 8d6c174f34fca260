//! Per-session Conversation Memory storage (§4.14, §5: "no cross-session
//! sharing"), keyed by session id in a concurrent map.

use dashmap::DashMap;
use docqa_conversation::ConversationMemory;
use parking_lot::Mutex;

pub struct SessionStore {
    sessions: DashMap<String, Mutex<ConversationMemory>>,
    turns_per_session: usize,
}

impl SessionStore {
    pub fn new(turns_per_session: usize) -> Self {
        Self { sessions: DashMap::new(), turns_per_session }
    }

    /// Runs `f` against the session's memory, creating an empty one on
    /// first use.
    pub fn with_memory<R>(&self, session_id: &str, f: impl FnOnce(&mut ConversationMemory) -> R) -> R {
        let entry = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Mutex::new(ConversationMemory::new(self.turns_per_session)));
        let mut memory = entry.lock();
        f(&mut memory)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_core::ConversationTurn;

    #[test]
    fn sessions_are_isolated() {
        let store = SessionStore::new(10);
        store.with_memory("a", |m| m.push(ConversationTurn::user("hello from a")));
        store.with_memory("b", |m| assert!(m.turns().is_empty()));
        store.with_memory("a", |m| assert_eq!(m.turns().len(), 1));
        assert_eq!(store.session_count(), 2);
    }
}
