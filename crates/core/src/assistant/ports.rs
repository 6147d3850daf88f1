//! Port interfaces for the conversational assistant
//!
//! Classifiers and the response generator are remote collaborators and may
//! fail; the decorators in this module's siblings turn those failures into
//! the documented local defaults.

use async_trait::async_trait;
use aura_domain::{
    ConversationTurn, EventDraft, IntentResult, Memory, NewConversationTurn, NewMemory, Outcome,
    Result,
};

/// Maps a user message (plus recent history) to a classified intent
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, message: &str, history: &[ConversationTurn]) -> Result<IntentResult>;
}

/// Scores how important a new event is, in `1..=5`
#[async_trait]
pub trait ImportanceClassifier: Send + Sync {
    async fn classify(&self, event: &EventDraft, message: Option<&str>) -> Result<u8>;
}

/// Everything a response generator may draw on for one reply.
#[derive(Debug, Clone, Copy)]
pub struct ResponseContext<'a> {
    pub message: &'a str,
    pub outcome: &'a Outcome,
    pub history: &'a [ConversationTurn],
    pub memories: &'a [Memory],
}

/// Produces the assistant's reply text
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    async fn generate(&self, context: ResponseContext<'_>) -> Result<String>;
}

/// Trait for persisting memory annotations
#[async_trait]
pub trait MemoryRepository: Send + Sync {
    async fn save(&self, memory: NewMemory) -> Result<Memory>;

    /// Most recent first
    async fn recent(&self, limit: usize) -> Result<Vec<Memory>>;
}

/// Trait for persisting conversation turns
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Persist a turn, returning its id. A `related_event_id` that does not
    /// reference an existing event is stored as absent.
    async fn append(&self, turn: &NewConversationTurn) -> Result<i64>;

    /// The newest `limit` turns of a session, most recent first
    async fn recent(&self, session_id: &str, limit: usize) -> Result<Vec<ConversationTurn>>;
}
