//! Bounded conversation ledger
//!
//! One ledger per session, owned by the caller and passed by reference.
//! Appending past capacity evicts the oldest turn; nothing else evicts.

use std::collections::VecDeque;

use aura_domain::ConversationTurn;

#[derive(Debug, Clone)]
pub struct ConversationLedger {
    session_id: String,
    capacity: usize,
    turns: VecDeque<ConversationTurn>,
}

impl ConversationLedger {
    /// A capacity of zero is treated as one.
    pub fn new(session_id: impl Into<String>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { session_id: session_id.into(), capacity, turns: VecDeque::with_capacity(capacity) }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Append a turn, returning the evicted oldest turn when full.
    pub fn push(&mut self, turn: ConversationTurn) -> Option<ConversationTurn> {
        let evicted = if self.turns.len() >= self.capacity { self.turns.pop_front() } else { None };
        self.turns.push_back(turn);
        evicted
    }

    /// The last `n` turns, oldest first.
    pub fn recent(&self, n: usize) -> Vec<ConversationTurn> {
        let skip = self.turns.len().saturating_sub(n);
        self.turns.iter().skip(skip).cloned().collect()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter()
    }

    /// Replace the contents with persisted turns given newest first. Only
    /// the newest `capacity` are kept.
    pub fn rehydrate(&mut self, newest_first: Vec<ConversationTurn>) {
        self.turns.clear();
        for turn in newest_first.into_iter().take(self.capacity) {
            self.turns.push_front(turn);
        }
    }

    /// Empty the in-memory history. Persisted turns are untouched.
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}
