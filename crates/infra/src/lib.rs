//! # Aura Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite event, memory and conversation repositories
//! - HTTP client with retries
//! - OpenAI-compatible classifier, embedding and response adapters
//! - Configuration loading from environment and files
//!
//! ## Architecture
//! - Implements traits defined in `aura-core`
//! - Depends on `aura-domain` and `aura-core`
//! - Contains all "impure" code (I/O, network)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;

// Re-export commonly used items
pub use database::*;
pub use errors::InfraError;
pub use http::*;
pub use integrations::*;
