//! Conversation turns recorded by the ledger

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::intent::Intent;

/// One processed message and the assistant's reply.
///
/// Turns are never mutated. `related_event_id` is decided when the turn is
/// written: it is absent for turns that deleted their event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Store-assigned id; absent when the turn could not be persisted.
    pub id: Option<i64>,
    pub session_id: String,
    pub user_message: String,
    pub bot_response: String,
    pub intent: Intent,
    pub related_event_id: Option<i64>,
    pub timestamp: NaiveDateTime,
}

/// Turn to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConversationTurn {
    pub session_id: String,
    pub user_message: String,
    pub bot_response: String,
    pub intent: Intent,
    pub related_event_id: Option<i64>,
    pub timestamp: NaiveDateTime,
}

impl NewConversationTurn {
    /// The in-memory turn, with the id the store assigned (if any).
    pub fn into_turn(self, id: Option<i64>) -> ConversationTurn {
        ConversationTurn {
            id,
            session_id: self.session_id,
            user_message: self.user_message,
            bot_response: self.bot_response,
            intent: self.intent,
            related_event_id: self.related_event_id,
            timestamp: self.timestamp,
        }
    }
}
