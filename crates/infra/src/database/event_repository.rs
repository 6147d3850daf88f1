//! SQLite-backed implementation of the `EventRepository` port
//!
//! The guarded writes (`insert_if_free`, `update_if_free`) run the conflict
//! query and the write inside one `BEGIN IMMEDIATE` transaction. The write
//! lock is taken at `BEGIN`, so concurrent writers serialize and each one's
//! conflict query sees the other's committed row.
//!
//! Every write runs against a budget measured from the call. Pool and lock
//! waits are cut off at the budget, and a transaction that finishes its
//! statements after the budget is rolled back instead of committed. Callers
//! that bound the call with their own, longer timeout therefore never see a
//! timeout for a write that landed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use aura_core::{EventRepository, WriteOutcome};
use aura_domain::constants::DEFAULT_STORE_TIMEOUT_MS;
use aura_domain::{
    AuraError, Event, EventPatch, EventStatus, NewEvent, Result as DomainResult,
};
use chrono::{Local, NaiveDateTime, SubsecRound};
use rusqlite::types::Type;
use rusqlite::{
    params, Connection, ErrorCode, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use tokio::task;
use tracing::{debug, instrument, warn};

use super::columns::{timestamp_column, to_micros};
use super::manager::DbManager;
use super::sqlite_pool::SqliteConnection;
use crate::errors::InfraError;

const INSERT_EVENT_SQL: &str = "INSERT INTO events (
        title, description, start_time, end_time, location, importance, status, created_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

const SELECT_EVENT_SQL: &str = "SELECT id, title, description, start_time, end_time, location,
        importance, status, created_at
     FROM events WHERE id = ?1";

const UPDATE_EVENT_SQL: &str = "UPDATE events
     SET title = ?2, description = ?3, start_time = ?4, end_time = ?5,
         location = ?6, importance = ?7, status = ?8
     WHERE id = ?1";

const DELETE_EVENT_SQL: &str = "DELETE FROM events WHERE id = ?1";

const LIST_IN_RANGE_SQL: &str = "SELECT id, title, description, start_time, end_time, location,
        importance, status, created_at
     FROM events
     WHERE start_time < ?2 AND end_time > ?1
     ORDER BY start_time ASC, id ASC";

// Mirrors `aura_core::calendar::conflict::resolve_conflicts`.
const FIND_CONFLICTS_SQL: &str = "SELECT id, title, description, start_time, end_time, location,
        importance, status, created_at
     FROM events
     WHERE status = 'active'
       AND start_time < ?2 AND end_time > ?1
       AND (?3 IS NULL OR id != ?3)
     ORDER BY importance DESC, start_time ASC, id ASC";

const COUNT_EVENTS_SQL: &str = "SELECT COUNT(*) FROM events";

/// Write budget when none is configured: half the default store timeout.
pub const DEFAULT_WRITE_BUDGET: Duration = Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS / 2);

/// SQLite implementation of `EventRepository`
pub struct SqliteEventRepository {
    db: Arc<DbManager>,
    write_budget: Duration,
}

impl SqliteEventRepository {
    /// Create a new repository instance
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db, write_budget: DEFAULT_WRITE_BUDGET }
    }

    /// Time a write may take from call to commit. Keep it below any timeout
    /// the caller wraps around the call.
    #[must_use]
    pub fn with_write_budget(mut self, budget: Duration) -> Self {
        self.write_budget = budget;
        self
    }

    /// Run `work` on a pooled connection off the async runtime.
    async fn with_connection<T, F>(&self, work: F) -> DomainResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> DomainResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> DomainResult<T> {
            let mut conn = db.get_connection()?;
            work(&mut conn)
        })
        .await
        .map_err(map_join_error)?
    }

    /// Run `work` in an immediate transaction that commits only within the
    /// write budget.
    async fn with_write<T, F>(&self, operation: &'static str, work: F) -> DomainResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Transaction<'_>) -> DomainResult<T> + Send + 'static,
    {
        let deadline = WriteDeadline::after(self.write_budget);
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> DomainResult<T> {
            let mut conn = db.get_connection_within(deadline.remaining(operation)?)?;
            conn.busy_timeout(deadline.remaining(operation)?).map_err(map_sql_error)?;
            let result = write_within(&mut conn, &deadline, operation, work);
            if let Err(err) = conn.busy_timeout(db.busy_timeout()) {
                warn!(error = %err, "could not restore connection busy timeout");
            }
            result
        })
        .await
        .map_err(map_join_error)?
    }
}

/// Point in time after which a write must not commit.
#[derive(Debug, Clone, Copy)]
struct WriteDeadline {
    budget: Duration,
    /// `None` when the budget is too large to represent as an instant.
    at: Option<Instant>,
}

impl WriteDeadline {
    fn after(budget: Duration) -> Self {
        Self { budget, at: Instant::now().checked_add(budget) }
    }

    /// Time left, or a timeout error once none is.
    fn remaining(&self, operation: &str) -> DomainResult<Duration> {
        let Some(at) = self.at else {
            return Ok(self.budget);
        };
        match at.checked_duration_since(Instant::now()) {
            Some(left) if !left.is_zero() => Ok(left),
            _ => Err(self.expired(operation)),
        }
    }

    fn expired(&self, operation: &str) -> AuraError {
        AuraError::Timeout(format!(
            "event store {operation} exceeded its {}ms write budget; nothing was written",
            self.budget.as_millis()
        ))
    }
}

fn write_within<T, F>(
    conn: &mut Connection,
    deadline: &WriteDeadline,
    operation: &str,
    work: F,
) -> DomainResult<T>
where
    F: FnOnce(&Transaction<'_>) -> DomainResult<T>,
{
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|err| lock_wait_error(err, deadline, operation))?;
    let value = work(&tx)?;
    if deadline.remaining(operation).is_err() {
        tx.rollback().map_err(map_sql_error)?;
        warn!(
            operation,
            budget_ms = deadline.budget.as_millis() as u64,
            "write rolled back past its budget"
        );
        return Err(deadline.expired(operation));
    }
    tx.commit().map_err(map_sql_error)?;
    Ok(value)
}

/// A busy database at `BEGIN` means the lock wait ran out the budget.
fn lock_wait_error(err: rusqlite::Error, deadline: &WriteDeadline, operation: &str) -> AuraError {
    match err.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => deadline.expired(operation),
        _ => map_sql_error(err),
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepository {
    #[instrument(skip(self, event), fields(title = %event.title))]
    async fn insert(&self, event: NewEvent) -> DomainResult<Event> {
        event.validate()?;
        self.with_write("insert", move |tx| insert_event(tx, event)).await
    }

    #[instrument(skip(self))]
    async fn get(&self, id: i64) -> DomainResult<Option<Event>> {
        self.with_connection(move |conn| select_event(conn, id)).await
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, id: i64, patch: &EventPatch) -> DomainResult<bool> {
        let patch = patch.clone();
        self.with_write("update", move |tx| {
            let Some(current) = select_event(tx, id)? else {
                return Ok(false);
            };
            let merged = patch.apply_to(&current)?;
            write_event(tx, &merged)?;
            debug!(event_id = id, "event updated");
            Ok(true)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> DomainResult<bool> {
        self.with_write("delete", move |tx| {
            let deleted = tx.execute(DELETE_EVENT_SQL, params![id]).map_err(map_sql_error)?;
            debug!(event_id = id, deleted, "event delete executed");
            Ok(deleted > 0)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete_returning(&self, id: i64) -> DomainResult<Option<Event>> {
        self.with_write("delete_returning", move |tx| {
            let Some(existing) = select_event(tx, id)? else {
                return Ok(None);
            };
            tx.execute(DELETE_EVENT_SQL, params![id]).map_err(map_sql_error)?;
            debug!(event_id = id, "event deleted");
            Ok(Some(existing))
        })
        .await
    }

    #[instrument(skip(self))]
    async fn list_in_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> DomainResult<Vec<Event>> {
        if start > end {
            return Err(AuraError::validation("range start must not be after range end"));
        }
        self.with_connection(move |conn| {
            let mut stmt = conn.prepare(LIST_IN_RANGE_SQL).map_err(map_sql_error)?;
            let events = stmt
                .query_map(params![to_micros(start), to_micros(end)], map_event_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;
            debug!(count = events.len(), "listed events in range");
            Ok(events)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn find_conflicts(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        exclude_id: Option<i64>,
    ) -> DomainResult<Vec<Event>> {
        self.with_connection(move |conn| query_conflicts(conn, start, end, exclude_id)).await
    }

    #[instrument(skip(self, event), fields(title = %event.title))]
    async fn insert_if_free(&self, event: NewEvent) -> DomainResult<WriteOutcome> {
        event.validate()?;
        self.with_write("insert_if_free", move |tx| {
            let conflicts = query_conflicts(tx, event.start_time, event.end_time, None)?;
            if !conflicts.is_empty() {
                debug!(conflicts = conflicts.len(), "insert blocked by conflicts");
                return Ok(WriteOutcome::Conflicted(conflicts));
            }
            Ok(WriteOutcome::Applied(insert_event(tx, event)?))
        })
        .await
    }

    #[instrument(skip(self, patch))]
    async fn update_if_free(&self, id: i64, patch: &EventPatch) -> DomainResult<WriteOutcome> {
        let patch = patch.clone();
        self.with_write("update_if_free", move |tx| {
            let Some(current) = select_event(tx, id)? else {
                return Ok(WriteOutcome::NotFound);
            };
            let merged = patch.apply_to(&current)?;
            if patch.requires_conflict_check(&current) {
                let conflicts = query_conflicts(tx, merged.start_time, merged.end_time, Some(id))?;
                if !conflicts.is_empty() {
                    debug!(event_id = id, conflicts = conflicts.len(), "update blocked");
                    return Ok(WriteOutcome::Conflicted(conflicts));
                }
            }
            write_event(tx, &merged)?;
            Ok(WriteOutcome::Applied(merged))
        })
        .await
    }

    async fn count(&self) -> DomainResult<u64> {
        self.with_connection(|conn| {
            let count: i64 =
                conn.query_row(COUNT_EVENTS_SQL, [], |row| row.get(0)).map_err(map_sql_error)?;
            u64::try_from(count).map_err(|_| AuraError::Database("negative event count".into()))
        })
        .await
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn insert_event(conn: &Connection, event: NewEvent) -> DomainResult<Event> {
    let created_at = Local::now().naive_local().trunc_subsecs(6);
    conn.execute(
        INSERT_EVENT_SQL,
        params![
            event.title,
            event.description,
            to_micros(event.start_time),
            to_micros(event.end_time),
            event.location,
            event.importance,
            event.status.as_str(),
            to_micros(created_at),
        ],
    )
    .map_err(map_sql_error)?;

    let id = conn.last_insert_rowid();
    debug!(event_id = id, "event inserted");
    Ok(event.into_event(id, created_at))
}

fn select_event(conn: &Connection, id: i64) -> DomainResult<Option<Event>> {
    conn.query_row(SELECT_EVENT_SQL, params![id], map_event_row).optional().map_err(map_sql_error)
}

fn write_event(conn: &Connection, event: &Event) -> DomainResult<()> {
    conn.execute(
        UPDATE_EVENT_SQL,
        params![
            event.id,
            event.title,
            event.description,
            to_micros(event.start_time),
            to_micros(event.end_time),
            event.location,
            event.importance,
            event.status.as_str(),
        ],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

fn query_conflicts(
    conn: &Connection,
    start: NaiveDateTime,
    end: NaiveDateTime,
    exclude_id: Option<i64>,
) -> DomainResult<Vec<Event>> {
    let mut stmt = conn.prepare(FIND_CONFLICTS_SQL).map_err(map_sql_error)?;
    let conflicts = stmt
        .query_map(params![to_micros(start), to_micros(end), exclude_id], map_event_row)
        .map_err(map_sql_error)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(map_sql_error)?;
    Ok(conflicts)
}

/// Map a row to an Event
fn map_event_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    let importance: i64 = row.get(6)?;
    let status: String = row.get(7)?;

    Ok(Event {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        start_time: timestamp_column(row, 3)?,
        end_time: timestamp_column(row, 4)?,
        location: row.get(5)?,
        importance: u8::try_from(importance).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, Type::Integer, Box::new(e))
        })?,
        status: status.parse::<EventStatus>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, Type::Text, e.into())
        })?,
        created_at: timestamp_column(row, 8)?,
    })
}

// =============================================================================
// Error Mapping
// =============================================================================

fn map_sql_error(err: rusqlite::Error) -> AuraError {
    AuraError::from(InfraError::from(err))
}

fn map_join_error(err: task::JoinError) -> AuraError {
    AuraError::Internal(format!("Task join error: {err}"))
}

// =============================================================================
// Tests
// =============================================================================
