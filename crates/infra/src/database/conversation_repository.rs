//! SQLite-backed implementation of the `ConversationRepository` port

use std::sync::Arc;

use async_trait::async_trait;
use aura_core::ConversationRepository;
use aura_domain::{AuraError, ConversationTurn, Intent, NewConversationTurn, Result as DomainResult};
use rusqlite::{params, Row};
use tokio::task;
use tracing::{debug, instrument};

use super::columns::{timestamp_column, to_micros};
use super::manager::DbManager;
use crate::errors::InfraError;

// `related_event_id` is a weak reference decided at write time: an id that
// no longer exists is written as NULL.
const INSERT_TURN_SQL: &str = "INSERT INTO conversation_history (
        session_id, user_message, bot_response, intent, related_event_id, timestamp
    ) VALUES (?1, ?2, ?3, ?4, (SELECT id FROM events WHERE id = ?5), ?6)";

const RECENT_TURNS_SQL: &str = "SELECT id, session_id, user_message, bot_response, intent,
        related_event_id, timestamp
     FROM conversation_history
     WHERE session_id = ?1
     ORDER BY timestamp DESC, id DESC
     LIMIT ?2";

/// SQLite implementation of `ConversationRepository`
pub struct SqliteConversationRepository {
    db: Arc<DbManager>,
}

impl SqliteConversationRepository {
    /// Create a new repository instance
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ConversationRepository for SqliteConversationRepository {
    #[instrument(skip(self, turn), fields(session_id = %turn.session_id, intent = %turn.intent))]
    async fn append(&self, turn: &NewConversationTurn) -> DomainResult<i64> {
        let db = Arc::clone(&self.db);
        let turn = turn.clone();

        task::spawn_blocking(move || -> DomainResult<i64> {
            let conn = db.get_connection()?;
            conn.execute(
                INSERT_TURN_SQL,
                params![
                    turn.session_id,
                    turn.user_message,
                    turn.bot_response,
                    turn.intent.as_str(),
                    turn.related_event_id,
                    to_micros(turn.timestamp),
                ],
            )
            .map_err(map_sql_error)?;

            let id = conn.last_insert_rowid();
            debug!(turn_id = id, "conversation turn appended");
            Ok(id)
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self))]
    async fn recent(&self, session_id: &str, limit: usize) -> DomainResult<Vec<ConversationTurn>> {
        let db = Arc::clone(&self.db);
        let session_id = session_id.to_string();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        task::spawn_blocking(move || -> DomainResult<Vec<ConversationTurn>> {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(RECENT_TURNS_SQL).map_err(map_sql_error)?;
            let turns = stmt
                .query_map(params![session_id, limit], map_turn_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;
            Ok(turns)
        })
        .await
        .map_err(map_join_error)?
    }
}

/// Map a row to a ConversationTurn
fn map_turn_row(row: &Row<'_>) -> rusqlite::Result<ConversationTurn> {
    let intent: String = row.get(4)?;

    Ok(ConversationTurn {
        id: Some(row.get(0)?),
        session_id: row.get(1)?,
        user_message: row.get(2)?,
        bot_response: row.get(3)?,
        intent: Intent::from_label(&intent),
        related_event_id: row.get(5)?,
        timestamp: timestamp_column(row, 6)?,
    })
}

fn map_sql_error(err: rusqlite::Error) -> AuraError {
    AuraError::from(InfraError::from(err))
}

fn map_join_error(err: task::JoinError) -> AuraError {
    AuraError::Internal(format!("Task join error: {err}"))
}
