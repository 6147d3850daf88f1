//! OpenAI-compatible integrations for the assistant
//!
//! One [`OpenAIClient`] is shared by four adapters, each implementing a
//! core port:
//!
//! - [`OpenAIIntentClassifier`]: `IntentClassifier`, JSON mode
//! - [`OpenAIImportanceClassifier`]: `ImportanceClassifier`, JSON mode
//! - [`OpenAIResponseGenerator`]: `ResponseGenerator`, free text
//! - [`OpenAIEmbeddingProvider`]: `EmbeddingProvider`
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use aura_core::SystemClock;
//! use aura_domain::LlmConfig;
//! use aura_infra::integrations::openai::{OpenAIClient, OpenAIIntentClassifier};
//! # fn example(config: &LlmConfig) -> Result<(), aura_domain::AuraError> {
//! let client = Arc::new(OpenAIClient::from_config(config)?);
//! let classifier = OpenAIIntentClassifier::new(client, Arc::new(SystemClock));
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! - **Network errors, 5xx and 429**: retried by `HttpClient` with backoff
//! - **Other client errors (4xx)**: not retried
//! - **Rate limits (429)**: surfaced as `OpenAIError::RateLimit` once retries
//!   run out
//!
//! Every failure maps into `AuraError`; the core decorators turn those into
//! local defaults.
pub mod client;
pub mod embedding;
pub mod importance;
pub mod intent;
pub mod responder;
pub mod types;

pub use client::{ChatOptions, OpenAIClient};
pub use embedding::OpenAIEmbeddingProvider;
pub use importance::OpenAIImportanceClassifier;
pub use intent::OpenAIIntentClassifier;
pub use responder::OpenAIResponseGenerator;
pub use types::{ChatMessage, OpenAIError};
