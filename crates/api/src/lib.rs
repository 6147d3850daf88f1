//! # Aura
//!
//! Application layer of the Aura calendar assistant - commands and the
//! context that wires them.
//!
//! This crate contains:
//! - Commands (the entry points a front end calls)
//! - Application context (dependency injection)
//! - The `aura` terminal binary
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires the SQLite store and, when a key is configured, the remote
//!   language-model adapters into the assistant

pub mod commands;
pub mod context;
pub mod utils;

// Re-export for convenience
pub use commands::*;
pub use context::*;
