//! Classified intents
//!
//! The classifier's output is modelled as a tagged variant: each intent
//! carries exactly the payload its handler needs.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::event::{EventDraft, EventPatch};

/// The fixed set of intents a message can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    CreateEvent,
    UpdateEvent,
    DeleteEvent,
    QueryEvent,
    CheckAvailability,
    RescheduleEvent,
    GeneralConversation,
}

impl Intent {
    pub const ALL: [Self; 7] = [
        Self::CreateEvent,
        Self::UpdateEvent,
        Self::DeleteEvent,
        Self::QueryEvent,
        Self::CheckAvailability,
        Self::RescheduleEvent,
        Self::GeneralConversation,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CreateEvent => "CREATE_EVENT",
            Self::UpdateEvent => "UPDATE_EVENT",
            Self::DeleteEvent => "DELETE_EVENT",
            Self::QueryEvent => "QUERY_EVENT",
            Self::CheckAvailability => "CHECK_AVAILABILITY",
            Self::RescheduleEvent => "RESCHEDULE_EVENT",
            Self::GeneralConversation => "GENERAL_CONVERSATION",
        }
    }

    /// Coerce a free-form label into the enum. Case, surrounding whitespace
    /// and `-`/space separators are ignored; anything unrecognized becomes
    /// [`Intent::GeneralConversation`].
    pub fn from_label(label: &str) -> Self {
        let normalized: String = label
            .trim()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c.to_ascii_uppercase() })
            .collect();
        Self::ALL
            .into_iter()
            .find(|intent| intent.as_str() == normalized)
            .unwrap_or(Self::GeneralConversation)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a delete request identifies its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EventSelector {
    ById(i64),
    /// Case-insensitive substring of the title.
    ByTitle(String),
    Unspecified,
}

/// Bounds extracted for a query or availability check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryRequest {
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    /// A calendar date given without a time of day.
    pub date: Option<NaiveDate>,
}

/// Intent plus its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", content = "details", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentAction {
    CreateEvent(EventDraft),
    UpdateEvent {
        event_id: Option<i64>,
        changes: EventPatch,
    },
    DeleteEvent(EventSelector),
    QueryEvent(QueryRequest),
    CheckAvailability(QueryRequest),
    RescheduleEvent {
        event_id: Option<i64>,
        start_time: Option<NaiveDateTime>,
        end_time: Option<NaiveDateTime>,
    },
    GeneralConversation,
}

impl IntentAction {
    pub const fn intent(&self) -> Intent {
        match self {
            Self::CreateEvent(_) => Intent::CreateEvent,
            Self::UpdateEvent { .. } => Intent::UpdateEvent,
            Self::DeleteEvent(_) => Intent::DeleteEvent,
            Self::QueryEvent(_) => Intent::QueryEvent,
            Self::CheckAvailability(_) => Intent::CheckAvailability,
            Self::RescheduleEvent { .. } => Intent::RescheduleEvent,
            Self::GeneralConversation => Intent::GeneralConversation,
        }
    }
}

/// Validated classifier output consumed by the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub action: IntentAction,
    /// Always within `[0, 1]`.
    pub confidence: f32,
    pub needs_clarification: bool,
    pub clarification_question: Option<String>,
}

impl IntentResult {
    pub const fn new(action: IntentAction) -> Self {
        Self { action, confidence: 1.0, needs_clarification: false, clarification_question: None }
    }

    /// Result used whenever classification is unavailable.
    pub const fn general() -> Self {
        Self::new(IntentAction::GeneralConversation)
    }

    pub const fn intent(&self) -> Intent {
        self.action.intent()
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = if confidence.is_finite() { confidence.clamp(0.0, 1.0) } else { 0.0 };
        self
    }

    #[must_use]
    pub fn with_clarification(mut self, question: impl Into<String>) -> Self {
        self.needs_clarification = true;
        self.clarification_question = Some(question.into());
        self
    }
}
