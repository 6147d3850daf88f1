//! Calendar service - direct entry points over the event store
//!
//! Every store call is bounded by a timeout. A timed-out call surfaces as
//! [`AuraError::Timeout`]. Stores give their writes a shorter budget of
//! their own and roll back any write that overruns it, so a timeout never
//! hides a committed change.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use aura_domain::constants::{DEFAULT_STORE_TIMEOUT_MS, FUZZY_LOOKAHEAD_DAYS, FUZZY_LOOKBACK_DAYS};
use aura_domain::{AuraError, Event, EventDraft, EventPatch, Result};
use chrono::NaiveDateTime;
use tracing::{debug, instrument};

use super::ports::{EventRepository, WriteOutcome};

/// Calendar operations shared by the dispatcher and the app commands.
#[derive(Clone)]
pub struct CalendarService {
    repository: Arc<dyn EventRepository>,
    store_timeout: Duration,
    fuzzy_lookback: chrono::Duration,
    fuzzy_lookahead: chrono::Duration,
}

impl CalendarService {
    pub fn new(repository: Arc<dyn EventRepository>) -> Self {
        Self {
            repository,
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            fuzzy_lookback: chrono::Duration::days(FUZZY_LOOKBACK_DAYS),
            fuzzy_lookahead: chrono::Duration::days(FUZZY_LOOKAHEAD_DAYS),
        }
    }

    #[must_use]
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Window searched when deleting by title, relative to now.
    #[must_use]
    pub fn with_fuzzy_window(mut self, lookback_days: i64, lookahead_days: i64) -> Self {
        self.fuzzy_lookback = chrono::Duration::days(lookback_days);
        self.fuzzy_lookahead = chrono::Duration::days(lookahead_days);
        self
    }

    /// Validate and insert unless an active event overlaps.
    #[instrument(skip(self, draft))]
    pub async fn create_event(&self, draft: EventDraft) -> Result<WriteOutcome> {
        let event = draft.into_new_event()?;
        self.bounded("insert_if_free", self.repository.insert_if_free(event)).await
    }

    /// Apply a patch unless the result would overlap another active event.
    #[instrument(skip(self, patch))]
    pub async fn update_event(&self, id: i64, patch: EventPatch) -> Result<WriteOutcome> {
        if patch.is_empty() {
            return Err(AuraError::validation("no changes were given"));
        }
        self.bounded("update_if_free", self.repository.update_if_free(id, &patch)).await
    }

    /// Move an event; only the two time fields change.
    pub async fn reschedule_event(
        &self,
        id: i64,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    ) -> Result<WriteOutcome> {
        self.update_event(id, EventPatch::reschedule(start_time, end_time)).await
    }

    /// Delete, returning the row as it was just before deletion.
    #[instrument(skip(self))]
    pub async fn delete_event(&self, id: i64) -> Result<Option<Event>> {
        self.bounded("delete_returning", self.repository.delete_returning(id)).await
    }

    pub async fn get_event(&self, id: i64) -> Result<Option<Event>> {
        self.bounded("get", self.repository.get(id)).await
    }

    /// Events of any status intersecting `[start, end]`.
    pub async fn list_events(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<Vec<Event>> {
        if start > end {
            return Err(AuraError::validation(format!(
                "range start ({start}) must not be after range end ({end})"
            )));
        }
        self.bounded("list_in_range", self.repository.list_in_range(start, end)).await
    }

    /// Active events overlapping `[start, end)`, most important first.
    pub async fn check_conflicts(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        exclude_id: Option<i64>,
    ) -> Result<Vec<Event>> {
        if start >= end {
            return Err(AuraError::validation(format!(
                "start_time ({start}) must be before end_time ({end})"
            )));
        }
        self.bounded("find_conflicts", self.repository.find_conflicts(start, end, exclude_id))
            .await
    }

    /// Case-insensitive title substring search around `now`, any status.
    #[instrument(skip(self))]
    pub async fn find_by_title(&self, fragment: &str, now: NaiveDateTime) -> Result<Vec<Event>> {
        let needle = fragment.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let events = self
            .list_events(now - self.fuzzy_lookback, now + self.fuzzy_lookahead)
            .await?;
        let matches: Vec<Event> =
            events.into_iter().filter(|e| e.title.to_lowercase().contains(&needle)).collect();
        debug!(matches = matches.len(), "title lookup finished");
        Ok(matches)
    }

    pub async fn count_events(&self) -> Result<u64> {
        self.bounded("count", self.repository.count()).await
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T>> + Send,
    ) -> Result<T> {
        tokio::time::timeout(self.store_timeout, call).await.map_err(|_| {
            AuraError::Timeout(format!(
                "event store {operation} exceeded {}ms",
                self.store_timeout.as_millis()
            ))
        })?
    }
}
