//! Per-session conversation ledgers

use std::sync::Arc;

use aura_core::ConversationLedger;
use dashmap::DashMap;
use tokio::sync::Mutex;

/// A session's ledger plus whether persisted turns were loaded into it.
#[derive(Debug)]
pub struct SessionState {
    pub ledger: ConversationLedger,
    pub hydrated: bool,
}

/// Handle to one session. Holding the lock serializes messages of that
/// session.
pub type SessionHandle = Arc<Mutex<SessionState>>;

/// Maps session ids to their ledgers.
///
/// Ledgers are created on first use; different sessions never contend.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: DashMap<String, SessionHandle>,
    capacity: usize,
}

impl SessionRegistry {
    pub fn new(capacity: usize) -> Self {
        Self { sessions: DashMap::new(), capacity }
    }

    /// The session's handle, creating an empty, unhydrated ledger if needed.
    pub fn get_or_create(&self, session_id: &str) -> SessionHandle {
        if let Some(existing) = self.sessions.get(session_id) {
            return Arc::clone(existing.value());
        }

        let handle = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(SessionState {
                    ledger: ConversationLedger::new(session_id, self.capacity),
                    hydrated: false,
                }))
            })
            .value()
            .clone();
        tracing::debug!(session_id, "session ledger created");
        handle
    }

    pub fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions.get(session_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Drop the in-memory ledger of a session. Returns whether one existed.
    pub fn remove(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_session_shares_one_ledger() {
        let registry = SessionRegistry::new(10);

        let first = registry.get_or_create("alice");
        let second = registry.get_or_create("alice");
        let other = registry.get_or_create("bob");

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(registry.len(), 2);

        let state = first.lock().await;
        assert_eq!(state.ledger.session_id(), "alice");
        assert_eq!(state.ledger.capacity(), 10);
        assert!(!state.hydrated);
    }

    #[test]
    fn remove_forgets_session() {
        let registry = SessionRegistry::new(5);
        registry.get_or_create("alice");

        assert!(registry.remove("alice"));
        assert!(!registry.remove("alice"));
        assert!(registry.get("alice").is_none());
        assert!(registry.is_empty());
    }
}
