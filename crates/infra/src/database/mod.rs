//! Database implementations

pub mod columns;
pub mod conversation_repository;
pub mod event_repository;
pub mod manager;
pub mod memory_repository;
pub mod sqlite_pool;

pub use conversation_repository::*;
pub use event_repository::*;
pub use manager::*;
pub use memory_repository::*;
pub use sqlite_pool::*;
