//! Conversation commands
//!
//! A message is processed under its session's lock, so turns of one
//! session are appended in order while different sessions run
//! concurrently. The first message of a session loads its persisted
//! turns into the fresh ledger.

use std::time::Instant;

use aura_domain::constants::DEFAULT_SESSION_ID;
use aura_domain::{ConversationTurn, Memory, MessageReply, Outcome, Result};
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

use super::run_logged;
use crate::context::AppContext;
use crate::utils::logging::log_command_execution;

fn normalize_session(session_id: &str) -> &str {
    let trimmed = session_id.trim();
    if trimmed.is_empty() {
        DEFAULT_SESSION_ID
    } else {
        trimmed
    }
}

/// Process one user message and return the reply
///
/// Never fails: store and collaborator failures surface as an `Error`
/// outcome with an apology in `response_text`.
pub async fn process_message(ctx: &AppContext, session_id: &str, text: &str) -> MessageReply {
    let session_id = normalize_session(session_id);
    let span = info_span!("process_message", request_id = %Uuid::new_v4(), session_id);

    async {
        let start = Instant::now();
        let handle = ctx.sessions.get_or_create(session_id);
        let mut state = handle.lock().await;

        if !state.hydrated {
            if let Err(err) = ctx.assistant.rehydrate(&mut state.ledger).await {
                warn!(error = %err, "could not load persisted history; starting empty");
            }
            state.hydrated = true;
        }

        let reply = ctx.assistant.process_message(&mut state.ledger, text).await;
        let success = !matches!(reply.outcome, Outcome::Error(_));
        log_command_execution("chat::process_message", start.elapsed(), success);
        reply
    }
    .instrument(span)
    .await
}

/// Forget a session's in-memory history. Persisted turns are kept.
///
/// Returns `false` when the session has no ledger yet.
pub async fn clear_history(ctx: &AppContext, session_id: &str) -> bool {
    let Some(handle) = ctx.sessions.get(normalize_session(session_id)) else {
        return false;
    };
    let mut state = handle.lock().await;
    ctx.assistant.clear_history(&mut state.ledger);
    tracing::info!(session_id = state.ledger.session_id(), "conversation history cleared");
    true
}

/// Persisted turns of a session, oldest first
pub async fn conversation_history(
    ctx: &AppContext,
    session_id: &str,
    limit: usize,
) -> Result<Vec<ConversationTurn>> {
    run_logged(
        "chat::conversation_history",
        ctx.assistant.conversation_history(normalize_session(session_id), limit),
    )
    .await
}

/// Most recent memories first
pub async fn recent_memories(ctx: &AppContext, limit: usize) -> Result<Vec<Memory>> {
    run_logged("chat::recent_memories", ctx.assistant.recent_memories(limit)).await
}
