//! Application constants
//!
//! Centralized location for the domain-level defaults. Configuration values
//! in [`crate::config`] default to these.

// Event model
pub const MIN_IMPORTANCE: u8 = 1;
pub const MAX_IMPORTANCE: u8 = 5;
/// Importance stored when an event is created without one.
pub const DEFAULT_EVENT_IMPORTANCE: u8 = 5;
/// Importance used when the importance classifier is unavailable.
pub const FALLBACK_IMPORTANCE: u8 = 3;
pub const MAX_TITLE_LENGTH: usize = 200;
pub const DEFAULT_EVENT_DURATION_MINUTES: i64 = 60;

// Dispatcher windows
pub const FUZZY_LOOKBACK_DAYS: i64 = 30;
pub const FUZZY_LOOKAHEAD_DAYS: i64 = 365;
pub const DEFAULT_QUERY_WINDOW_DAYS: i64 = 7;

// Conversation
pub const DEFAULT_LEDGER_CAPACITY: usize = 50;
pub const CLASSIFIER_HISTORY_WINDOW: usize = 5;
pub const MEMORY_RECALL_LIMIT: usize = 5;
pub const DEFAULT_SESSION_ID: &str = "default";

// Embeddings
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1536;

// Store
pub const DEFAULT_POOL_SIZE: u32 = 8;
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_DB_PATH: &str = "aura.db";

// LLM collaborators
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LLM_MAX_ATTEMPTS: usize = 3;

/// Reply used when a message could not be processed.
pub const FALLBACK_ERROR_RESPONSE: &str = "I'm sorry, I encountered an issue processing your request. Could you try again or rephrase your message?";
