//! Memory annotations attached to events

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Free-text summary of something that happened to an event, with its
/// embedding.
///
/// `event_id` is a weak reference: the store nulls it when the event is
/// deleted and never cascades the delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub id: i64,
    pub event_id: Option<i64>,
    pub content: String,
    /// Unit-normalized, fixed dimension.
    pub embedding: Vec<f32>,
    pub created_at: NaiveDateTime,
    /// Title of the linked event when it still exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_title: Option<String>,
}

/// Memory row to be written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMemory {
    pub event_id: Option<i64>,
    pub content: String,
    pub embedding: Vec<f32>,
    pub created_at: NaiveDateTime,
}
