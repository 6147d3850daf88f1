//! Configuration structures
//!
//! Every section carries serde defaults so partial JSON/TOML files load.

use serde::{Deserialize, Serialize};

use crate::constants::{
    CLASSIFIER_HISTORY_WINDOW, DEFAULT_CHAT_MODEL, DEFAULT_DB_PATH, DEFAULT_EMBEDDING_DIMENSION,
    DEFAULT_EMBEDDING_MODEL, DEFAULT_EVENT_DURATION_MINUTES, DEFAULT_LEDGER_CAPACITY,
    DEFAULT_LLM_BASE_URL, DEFAULT_LLM_MAX_ATTEMPTS, DEFAULT_LLM_TIMEOUT_SECS, DEFAULT_POOL_SIZE,
    DEFAULT_QUERY_WINDOW_DAYS, DEFAULT_STORE_TIMEOUT_MS, FALLBACK_IMPORTANCE,
    FUZZY_LOOKAHEAD_DAYS, FUZZY_LOOKBACK_DAYS, MAX_IMPORTANCE, MEMORY_RECALL_LIMIT,
    MIN_IMPORTANCE,
};
use crate::errors::{AuraError, Result};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
    /// Upper bound for a single event store call.
    pub store_timeout_ms: u64,
}

/// OpenAI-compatible collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LlmConfig {
    pub enabled: bool,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub timeout_secs: u64,
    pub max_attempts: usize,
}

/// Dispatcher and conversation tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AssistantConfig {
    pub ledger_capacity: usize,
    pub history_window: usize,
    pub memory_recall_limit: usize,
    pub fallback_importance: u8,
    pub default_event_minutes: i64,
    pub fuzzy_lookback_days: i64,
    pub fuzzy_lookahead_days: i64,
    pub default_query_days: i64,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub dimension: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_DB_PATH.to_string(),
            pool_size: DEFAULT_POOL_SIZE,
            store_timeout_ms: DEFAULT_STORE_TIMEOUT_MS,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
            max_attempts: DEFAULT_LLM_MAX_ATTEMPTS,
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            ledger_capacity: DEFAULT_LEDGER_CAPACITY,
            history_window: CLASSIFIER_HISTORY_WINDOW,
            memory_recall_limit: MEMORY_RECALL_LIMIT,
            fallback_importance: FALLBACK_IMPORTANCE,
            default_event_minutes: DEFAULT_EVENT_DURATION_MINUTES,
            fuzzy_lookback_days: FUZZY_LOOKBACK_DAYS,
            fuzzy_lookahead_days: FUZZY_LOOKAHEAD_DAYS,
            default_query_days: DEFAULT_QUERY_WINDOW_DAYS,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { dimension: DEFAULT_EMBEDDING_DIMENSION }
    }
}

impl LlmConfig {
    /// Remote collaborators are used only when enabled and a key is present.
    pub fn is_usable(&self) -> bool {
        self.enabled && self.api_key.as_deref().is_some_and(|key| !key.trim().is_empty())
    }
}

impl Config {
    /// Reject values the services cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.database.pool_size == 0 {
            return Err(AuraError::Config("database.pool_size must be at least 1".into()));
        }
        if self.database.store_timeout_ms == 0 {
            return Err(AuraError::Config("database.store_timeout_ms must be positive".into()));
        }
        if self.embedding.dimension == 0 {
            return Err(AuraError::Config("embedding.dimension must be at least 1".into()));
        }
        if self.assistant.ledger_capacity == 0 {
            return Err(AuraError::Config("assistant.ledger_capacity must be at least 1".into()));
        }
        if !(MIN_IMPORTANCE..=MAX_IMPORTANCE).contains(&self.assistant.fallback_importance) {
            return Err(AuraError::Config(format!(
                "assistant.fallback_importance must be within {MIN_IMPORTANCE}..={MAX_IMPORTANCE}"
            )));
        }
        if self.assistant.default_event_minutes <= 0 {
            return Err(AuraError::Config(
                "assistant.default_event_minutes must be positive".into(),
            ));
        }
        Ok(())
    }
}
