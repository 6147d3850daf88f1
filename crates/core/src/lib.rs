//! # Aura Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Conflict resolution and query window rules
//! - Port interfaces (traits) for storage, classifiers and embeddings
//! - The intent-action dispatcher and conversation ledger
//! - Calendar and assistant services
//!
//! ## Architecture Principles
//! - Only depends on `aura-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod assistant;
pub mod calendar;
pub mod clock;
pub mod embedding;

// Re-export specific items to avoid ambiguity
pub use assistant::ports::{
    ConversationRepository, ImportanceClassifier, IntentClassifier, MemoryRepository,
    ResponseGenerator,
};
pub use assistant::{AssistantPorts, AssistantService, ConversationLedger, Dispatcher};
pub use calendar::ports::{EventRepository, WriteOutcome};
pub use calendar::CalendarService;
pub use clock::{Clock, FixedClock, SystemClock};
pub use embedding::{EmbeddingProvider, FailoverEmbedder, HashEmbeddingProvider};
