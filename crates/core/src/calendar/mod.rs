//! Calendar rules, storage port and service

pub mod conflict;
pub mod ports;
pub mod service;
pub mod window;

pub use conflict::{intervals_overlap, rank_conflicts, resolve_conflicts};
pub use ports::{EventRepository, WriteOutcome};
pub use service::CalendarService;
pub use window::{resolve_query_window, QueryWindow};
