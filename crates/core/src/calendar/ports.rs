//! Port interfaces for event storage
//!
//! Implementations must make the check-then-write methods atomic: two
//! concurrent `insert_if_free` calls on overlapping windows can never both
//! return `Applied`. A write that reports an error must leave the store
//! unchanged.

use async_trait::async_trait;
use aura_domain::{Event, EventPatch, NewEvent, Result};
use chrono::NaiveDateTime;

/// Result of a conflict-guarded write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The write committed; carries the stored row.
    Applied(Event),
    /// Nothing was written; carries the blocking events, ranked.
    Conflicted(Vec<Event>),
    /// The target event does not exist.
    NotFound,
}

/// Trait for persisting calendar events
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Insert a validated event without checking for conflicts
    async fn insert(&self, event: NewEvent) -> Result<Event>;

    async fn get(&self, id: i64) -> Result<Option<Event>>;

    /// Apply a patch; `false` when no row matched
    async fn update(&self, id: i64, patch: &EventPatch) -> Result<bool>;

    /// Delete by id; `false` when no row matched
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Delete by id and return the row as it was, read and removed as one
    /// unit; `None` when no row matched
    async fn delete_returning(&self, id: i64) -> Result<Option<Event>>;

    /// Events of any status intersecting `[start, end]`, by start time
    async fn list_in_range(&self, start: NaiveDateTime, end: NaiveDateTime)
        -> Result<Vec<Event>>;

    /// Active events strictly overlapping `[start, end)`, ranked
    async fn find_conflicts(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        exclude_id: Option<i64>,
    ) -> Result<Vec<Event>>;

    /// Insert unless an active event overlaps, atomically
    async fn insert_if_free(&self, event: NewEvent) -> Result<WriteOutcome>;

    /// Apply a patch unless the result would overlap another active event,
    /// atomically
    async fn update_if_free(&self, id: i64, patch: &EventPatch) -> Result<WriteOutcome>;

    async fn count(&self) -> Result<u64>;
}
