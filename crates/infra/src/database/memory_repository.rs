//! SQLite-backed implementation of the `MemoryRepository` port

use std::sync::Arc;

use async_trait::async_trait;
use aura_core::MemoryRepository;
use aura_domain::{AuraError, Memory, NewMemory, Result as DomainResult};
use rusqlite::types::Type;
use rusqlite::{params, Row};
use tokio::task;
use tracing::{debug, instrument};

use super::columns::{decode_embedding, encode_embedding, timestamp_column, to_micros};
use super::manager::DbManager;
use crate::errors::InfraError;

// A memory whose event is gone is still stored; the subquery turns a stale
// id into NULL instead of failing the foreign key.
const INSERT_MEMORY_SQL: &str = "INSERT INTO memory (event_id, content, embedding, created_at)
     VALUES ((SELECT id FROM events WHERE id = ?1), ?2, ?3, ?4)";

const SELECT_MEMORY_SQL: &str = "SELECT m.id, m.event_id, m.content, m.embedding, m.created_at, e.title
     FROM memory m LEFT JOIN events e ON e.id = m.event_id
     WHERE m.id = ?1";

const RECENT_MEMORIES_SQL: &str = "SELECT m.id, m.event_id, m.content, m.embedding, m.created_at, e.title
     FROM memory m LEFT JOIN events e ON e.id = m.event_id
     ORDER BY m.created_at DESC, m.id DESC
     LIMIT ?1";

/// SQLite implementation of `MemoryRepository`
pub struct SqliteMemoryRepository {
    db: Arc<DbManager>,
}

impl SqliteMemoryRepository {
    /// Create a new repository instance
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MemoryRepository for SqliteMemoryRepository {
    #[instrument(skip(self, memory), fields(event_id = ?memory.event_id))]
    async fn save(&self, memory: NewMemory) -> DomainResult<Memory> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Memory> {
            let conn = db.get_connection()?;
            conn.execute(
                INSERT_MEMORY_SQL,
                params![
                    memory.event_id,
                    memory.content,
                    encode_embedding(&memory.embedding),
                    to_micros(memory.created_at),
                ],
            )
            .map_err(map_sql_error)?;

            let id = conn.last_insert_rowid();
            debug!(memory_id = id, "memory saved");
            conn.query_row(SELECT_MEMORY_SQL, params![id], map_memory_row).map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self))]
    async fn recent(&self, limit: usize) -> DomainResult<Vec<Memory>> {
        let db = Arc::clone(&self.db);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        task::spawn_blocking(move || -> DomainResult<Vec<Memory>> {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(RECENT_MEMORIES_SQL).map_err(map_sql_error)?;
            let memories = stmt
                .query_map(params![limit], map_memory_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;
            Ok(memories)
        })
        .await
        .map_err(map_join_error)?
    }
}

/// Map a row to a Memory
fn map_memory_row(row: &Row<'_>) -> rusqlite::Result<Memory> {
    let blob: Vec<u8> = row.get(3)?;
    let embedding = decode_embedding(&blob).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            Type::Blob,
            format!("embedding blob of {} bytes is not a whole number of f32", blob.len()).into(),
        )
    })?;

    Ok(Memory {
        id: row.get(0)?,
        event_id: row.get(1)?,
        content: row.get(2)?,
        embedding,
        created_at: timestamp_column(row, 4)?,
        event_title: row.get(5)?,
    })
}

fn map_sql_error(err: rusqlite::Error) -> AuraError {
    AuraError::from(InfraError::from(err))
}

fn map_join_error(err: task::JoinError) -> AuraError {
    AuraError::Internal(format!("Task join error: {err}"))
}
