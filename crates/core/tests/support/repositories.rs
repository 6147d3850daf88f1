//! In-memory implementations of the core repository ports
//!
//! The event repository holds one mutex across conflict check and write,
//! giving the same atomicity the SQLite store gets from `BEGIN IMMEDIATE`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use aura_core::calendar::conflict::{intervals_overlap, resolve_conflicts};
use aura_core::{ConversationRepository, EventRepository, MemoryRepository, WriteOutcome};
use aura_domain::{
    AuraError, ConversationTurn, Event, EventPatch, Memory, NewConversationTurn, NewEvent,
    NewMemory, Result as DomainResult,
};
use chrono::NaiveDateTime;

use super::at;

#[derive(Default)]
struct EventState {
    next_id: i64,
    events: BTreeMap<i64, Event>,
}

/// In-memory `EventRepository`.
#[derive(Default)]
pub struct InMemoryEventRepository {
    state: Mutex<EventState>,
    failing: AtomicBool,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a database error.
    pub fn fail_all(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn all(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().events.len()
    }

    fn check(&self) -> DomainResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AuraError::Database("disk I/O error".into()));
        }
        Ok(())
    }

    fn store(state: &mut EventState, event: NewEvent) -> Event {
        state.next_id += 1;
        let stored = event.into_event(state.next_id, at(0, 0));
        state.events.insert(stored.id, stored.clone());
        stored
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn insert(&self, event: NewEvent) -> DomainResult<Event> {
        self.check()?;
        event.validate()?;
        let mut state = self.state.lock().unwrap();
        Ok(Self::store(&mut state, event))
    }

    async fn get(&self, id: i64) -> DomainResult<Option<Event>> {
        self.check()?;
        Ok(self.state.lock().unwrap().events.get(&id).cloned())
    }

    async fn update(&self, id: i64, patch: &EventPatch) -> DomainResult<bool> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let Some(current) = state.events.get(&id) else {
            return Ok(false);
        };
        let merged = patch.apply_to(current)?;
        state.events.insert(id, merged);
        Ok(true)
    }

    async fn delete(&self, id: i64) -> DomainResult<bool> {
        self.check()?;
        Ok(self.state.lock().unwrap().events.remove(&id).is_some())
    }

    async fn delete_returning(&self, id: i64) -> DomainResult<Option<Event>> {
        self.check()?;
        Ok(self.state.lock().unwrap().events.remove(&id))
    }

    async fn list_in_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> DomainResult<Vec<Event>> {
        self.check()?;
        if start > end {
            return Err(AuraError::validation("range start must not be after range end"));
        }
        let state = self.state.lock().unwrap();
        let mut events: Vec<Event> = state
            .events
            .values()
            .filter(|e| intervals_overlap(start, end, e.start_time, e.end_time))
            .cloned()
            .collect();
        events.sort_by_key(|e| (e.start_time, e.id));
        Ok(events)
    }

    async fn find_conflicts(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        exclude_id: Option<i64>,
    ) -> DomainResult<Vec<Event>> {
        self.check()?;
        let state = self.state.lock().unwrap();
        Ok(resolve_conflicts(state.events.values(), start, end, exclude_id))
    }

    async fn insert_if_free(&self, event: NewEvent) -> DomainResult<WriteOutcome> {
        self.check()?;
        event.validate()?;
        let mut state = self.state.lock().unwrap();
        let conflicts =
            resolve_conflicts(state.events.values(), event.start_time, event.end_time, None);
        if !conflicts.is_empty() {
            return Ok(WriteOutcome::Conflicted(conflicts));
        }
        Ok(WriteOutcome::Applied(Self::store(&mut state, event)))
    }

    async fn update_if_free(&self, id: i64, patch: &EventPatch) -> DomainResult<WriteOutcome> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let Some(current) = state.events.get(&id) else {
            return Ok(WriteOutcome::NotFound);
        };
        let merged = patch.apply_to(current)?;
        if patch.requires_conflict_check(current) {
            let conflicts = resolve_conflicts(
                state.events.values(),
                merged.start_time,
                merged.end_time,
                Some(id),
            );
            if !conflicts.is_empty() {
                return Ok(WriteOutcome::Conflicted(conflicts));
            }
        }
        state.events.insert(id, merged.clone());
        Ok(WriteOutcome::Applied(merged))
    }

    async fn count(&self) -> DomainResult<u64> {
        self.check()?;
        Ok(self.state.lock().unwrap().events.len() as u64)
    }
}

/// In-memory `MemoryRepository`.
#[derive(Default)]
pub struct InMemoryMemoryRepository {
    memories: Mutex<Vec<Memory>>,
    failing: AtomicBool,
}

impl InMemoryMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let repo = Self::default();
        repo.failing.store(true, Ordering::SeqCst);
        repo
    }

    pub fn all(&self) -> Vec<Memory> {
        self.memories.lock().unwrap().clone()
    }
}

#[async_trait]
impl MemoryRepository for InMemoryMemoryRepository {
    async fn save(&self, memory: NewMemory) -> DomainResult<Memory> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AuraError::Database("memory table is locked".into()));
        }
        let mut memories = self.memories.lock().unwrap();
        let stored = Memory {
            id: memories.len() as i64 + 1,
            event_id: memory.event_id,
            content: memory.content,
            embedding: memory.embedding,
            created_at: memory.created_at,
            event_title: None,
        };
        memories.push(stored.clone());
        Ok(stored)
    }

    async fn recent(&self, limit: usize) -> DomainResult<Vec<Memory>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AuraError::Database("memory table is locked".into()));
        }
        Ok(self.memories.lock().unwrap().iter().rev().take(limit).cloned().collect())
    }
}

/// In-memory `ConversationRepository`. When linked to an event repository,
/// related ids that no longer exist are stored as absent.
#[derive(Default)]
pub struct InMemoryConversationRepository {
    turns: Mutex<Vec<ConversationTurn>>,
    events: Option<Arc<InMemoryEventRepository>>,
    failing: AtomicBool,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn linked(events: Arc<InMemoryEventRepository>) -> Self {
        Self { events: Some(events), ..Self::default() }
    }

    pub fn fail_writes(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn all(&self) -> Vec<ConversationTurn> {
        self.turns.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn append(&self, turn: &NewConversationTurn) -> DomainResult<i64> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AuraError::Database("conversation_history is read-only".into()));
        }
        let related_event_id = match (&self.events, turn.related_event_id) {
            (Some(events), Some(id)) => events.get(id).await?.map(|e| e.id),
            (_, related) => related,
        };
        let mut turns = self.turns.lock().unwrap();
        let id = turns.len() as i64 + 1;
        turns.push(ConversationTurn { related_event_id, ..turn.clone().into_turn(Some(id)) });
        Ok(id)
    }

    async fn recent(&self, session_id: &str, limit: usize) -> DomainResult<Vec<ConversationTurn>> {
        Ok(self
            .turns
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|t| t.session_id == session_id)
            .take(limit)
            .cloned()
            .collect())
    }
}
