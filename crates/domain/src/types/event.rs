//! Calendar event model
//!
//! `EventDraft` is what a client or classifier hands in, `NewEvent` is a
//! validated draft ready for the store, and `EventPatch` is the whitelist of
//! fields an update may touch.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_EVENT_IMPORTANCE, MAX_IMPORTANCE, MAX_TITLE_LENGTH, MIN_IMPORTANCE};
use crate::errors::{AuraError, Result};
use crate::impl_domain_status_conversions;

/// Lifecycle status of an event. Only active events block time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Active,
    Cancelled,
}

impl_domain_status_conversions!(EventStatus {
    Active => "active",
    Cancelled => "cancelled",
});

/// A stored calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Store-assigned, immutable.
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub location: Option<String>,
    /// 1 (lowest) to 5 (highest).
    pub importance: u8,
    pub status: EventStatus,
    pub created_at: NaiveDateTime,
}

impl Event {
    pub fn is_active(&self) -> bool {
        self.status == EventStatus::Active
    }

    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }
}

/// Event fields as received, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub location: Option<String>,
    pub importance: Option<u8>,
}

impl EventDraft {
    /// Convert into a [`NewEvent`], failing when a required field is missing
    /// or the interval is empty.
    pub fn into_new_event(self) -> Result<NewEvent> {
        let title = self.title.ok_or_else(|| AuraError::validation("title is required"))?;
        let start_time =
            self.start_time.ok_or_else(|| AuraError::validation("start_time is required"))?;
        let end_time =
            self.end_time.ok_or_else(|| AuraError::validation("end_time is required"))?;

        let event = NewEvent {
            title: title.trim().to_string(),
            description: normalize_optional(self.description),
            start_time,
            end_time,
            location: normalize_optional(self.location),
            importance: self.importance.unwrap_or(DEFAULT_EVENT_IMPORTANCE),
            status: EventStatus::Active,
        };
        event.validate()?;
        Ok(event)
    }
}

/// A validated event that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub location: Option<String>,
    pub importance: u8,
    pub status: EventStatus,
}

impl NewEvent {
    /// Minimal constructor used by tests and direct callers.
    pub fn new(title: impl Into<String>, start_time: NaiveDateTime, end_time: NaiveDateTime) -> Self {
        Self {
            title: title.into(),
            description: None,
            start_time,
            end_time,
            location: None,
            importance: DEFAULT_EVENT_IMPORTANCE,
            status: EventStatus::Active,
        }
    }

    #[must_use]
    pub fn with_importance(mut self, importance: u8) -> Self {
        self.importance = importance;
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Check the store invariants: non-empty bounded title, importance in
    /// range, `start_time < end_time`.
    pub fn validate(&self) -> Result<()> {
        validate_fields(&self.title, self.start_time, self.end_time, self.importance)
    }

    /// Materialize the stored row once the store has assigned an id.
    pub fn into_event(self, id: i64, created_at: NaiveDateTime) -> Event {
        Event {
            id,
            title: self.title,
            description: self.description,
            start_time: self.start_time,
            end_time: self.end_time,
            location: self.location,
            importance: self.importance,
            status: self.status,
            created_at,
        }
    }
}

/// Partial update. Only these fields are mutable after creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub location: Option<String>,
    pub importance: Option<u8>,
    pub status: Option<EventStatus>,
}

impl EventPatch {
    /// Patch that moves an event to a new interval and nothing else.
    pub const fn reschedule(start_time: NaiveDateTime, end_time: NaiveDateTime) -> Self {
        Self {
            title: None,
            description: None,
            start_time: Some(start_time),
            end_time: Some(end_time),
            location: None,
            importance: None,
            status: None,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.location.is_none()
            && self.importance.is_none()
            && self.status.is_none()
    }

    pub const fn touches_schedule(&self) -> bool {
        self.start_time.is_some() || self.end_time.is_some()
    }

    /// Whether applying this patch to `current` requires a conflict check:
    /// the result is active and either moved or was just reactivated.
    pub fn requires_conflict_check(&self, current: &Event) -> bool {
        let reactivates = current.status == EventStatus::Cancelled
            && self.status == Some(EventStatus::Active);
        let stays_active = self.status.unwrap_or(current.status) == EventStatus::Active;
        stays_active && (self.touches_schedule() || reactivates)
    }

    /// Merge onto `current`; unspecified fields (including an unspecified
    /// interval side) keep their current value. The result is validated.
    pub fn apply_to(&self, current: &Event) -> Result<Event> {
        let merged = Event {
            id: current.id,
            title: self.title.as_deref().map_or_else(|| current.title.clone(), |t| t.trim().to_string()),
            description: self.description.clone().or_else(|| current.description.clone()),
            start_time: self.start_time.unwrap_or(current.start_time),
            end_time: self.end_time.unwrap_or(current.end_time),
            location: self.location.clone().or_else(|| current.location.clone()),
            importance: self.importance.unwrap_or(current.importance),
            status: self.status.unwrap_or(current.status),
            created_at: current.created_at,
        };
        validate_fields(&merged.title, merged.start_time, merged.end_time, merged.importance)?;
        Ok(merged)
    }
}

fn validate_fields(
    title: &str,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
    importance: u8,
) -> Result<()> {
    if title.trim().is_empty() {
        return Err(AuraError::validation("title must not be empty"));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(AuraError::validation(format!(
            "title must be at most {MAX_TITLE_LENGTH} characters"
        )));
    }
    if start_time >= end_time {
        return Err(AuraError::validation(format!(
            "start_time ({start_time}) must be before end_time ({end_time})"
        )));
    }
    if !(MIN_IMPORTANCE..=MAX_IMPORTANCE).contains(&importance) {
        return Err(AuraError::validation(format!(
            "importance must be between {MIN_IMPORTANCE} and {MAX_IMPORTANCE}, got {importance}"
        )));
    }
    Ok(())
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
