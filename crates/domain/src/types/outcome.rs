//! Dispatch outcomes and the replies built from them

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::event::{Event, EventStatus};
use super::intent::Intent;
use crate::impl_domain_status_conversions;

/// Flat outcome label, as logged and reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeTag {
    Created,
    Updated,
    Deleted,
    Rescheduled,
    Conflict,
    Query,
    Error,
    NotFound,
    MultipleMatches,
    NeedsClarification,
    None,
}

impl_domain_status_conversions!(OutcomeTag {
    Created => "created",
    Updated => "updated",
    Deleted => "deleted",
    Rescheduled => "rescheduled",
    Conflict => "conflict",
    Query => "query",
    Error => "error",
    NotFound => "not_found",
    MultipleMatches => "multiple_matches",
    NeedsClarification => "needs_clarification",
    None => "none",
});

/// Events found for a resolved query window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub single_day: bool,
    pub events: Vec<Event>,
}

/// What a failed lookup was searching for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupKey {
    pub event_id: Option<i64>,
    pub title: Option<String>,
}

impl LookupKey {
    pub const fn id(event_id: i64) -> Self {
        Self { event_id: Some(event_id), title: None }
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self { event_id: None, title: Some(title.into()) }
    }
}

/// Result of dispatching one classified intent.
///
/// Every branch of the dispatcher ends in exactly one of these; faults are
/// folded into [`Outcome::Error`] rather than propagated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "payload", rename_all = "snake_case")]
pub enum Outcome {
    Created(Event),
    Updated(Event),
    /// The row as it was just before deletion.
    Deleted(Event),
    Rescheduled(Event),
    /// Blocking events, most important first.
    Conflict(Vec<Event>),
    Query(QueryResult),
    Error(String),
    NotFound(LookupKey),
    MultipleMatches(Vec<Event>),
    NeedsClarification(Option<String>),
    None,
}

impl Outcome {
    pub const fn tag(&self) -> OutcomeTag {
        match self {
            Self::Created(_) => OutcomeTag::Created,
            Self::Updated(_) => OutcomeTag::Updated,
            Self::Deleted(_) => OutcomeTag::Deleted,
            Self::Rescheduled(_) => OutcomeTag::Rescheduled,
            Self::Conflict(_) => OutcomeTag::Conflict,
            Self::Query(_) => OutcomeTag::Query,
            Self::Error(_) => OutcomeTag::Error,
            Self::NotFound(_) => OutcomeTag::NotFound,
            Self::MultipleMatches(_) => OutcomeTag::MultipleMatches,
            Self::NeedsClarification(_) => OutcomeTag::NeedsClarification,
            Self::None => OutcomeTag::None,
        }
    }

    pub fn clarify(question: impl Into<String>) -> Self {
        Self::NeedsClarification(Some(question.into()))
    }

    /// Event a conversation turn should point at.
    ///
    /// A deleted event is never referenced: the turn would otherwise hold a
    /// dangling id.
    pub const fn related_event_id(&self) -> Option<i64> {
        match self {
            Self::Created(event) | Self::Updated(event) | Self::Rescheduled(event) => Some(event.id),
            _ => None,
        }
    }

    /// True for outcomes that changed the calendar.
    pub const fn is_mutation(&self) -> bool {
        matches!(self, Self::Created(_) | Self::Updated(_) | Self::Deleted(_) | Self::Rescheduled(_))
    }
}

/// Event shape sent to clients; the id is exposed as `event_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEvent {
    pub event_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub location: Option<String>,
    pub importance: u8,
    pub status: EventStatus,
}

impl From<&Event> for ApiEvent {
    fn from(event: &Event) -> Self {
        Self {
            event_id: event.id,
            title: event.title.clone(),
            description: event.description.clone(),
            start_time: event.start_time,
            end_time: event.end_time,
            location: event.location.clone(),
            importance: event.importance,
            status: event.status,
        }
    }
}

/// Instruction for a calendar UI after a message was handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiAction {
    UpdateCalendar { event: ApiEvent },
    RemoveEvent { event_id: i64 },
}

impl UiAction {
    pub fn from_outcome(outcome: &Outcome) -> Option<Self> {
        match outcome {
            Outcome::Created(event) | Outcome::Updated(event) | Outcome::Rescheduled(event) => {
                Some(Self::UpdateCalendar { event: ApiEvent::from(event) })
            }
            Outcome::Deleted(event) => Some(Self::RemoveEvent { event_id: event.id }),
            _ => None,
        }
    }
}

/// Everything a client gets back for one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReply {
    pub intent: Intent,
    pub outcome: Outcome,
    pub response_text: String,
    pub ui_action: Option<UiAction>,
}
