//! Intent-action dispatcher
//!
//! Maps a classified intent to calendar operations and always ends in an
//! [`Outcome`]. Conflicts, missing events and faults are all outcome data;
//! nothing escapes as an error. Every guarded write is a single atomic store
//! call, so an `error` outcome never follows a partial mutation.

use std::sync::Arc;

use aura_domain::constants::{DEFAULT_EVENT_DURATION_MINUTES, DEFAULT_QUERY_WINDOW_DAYS};
use aura_domain::{
    AuraError, EventDraft, EventPatch, EventSelector, IntentAction, IntentResult, LookupKey,
    Outcome, QueryRequest, QueryResult,
};
use chrono::{Duration, NaiveDateTime};
use tracing::{debug, instrument, warn};

use super::fallback::DegradingImportanceClassifier;
use crate::calendar::ports::WriteOutcome;
use crate::calendar::{resolve_query_window, CalendarService};
use crate::clock::Clock;

pub struct Dispatcher {
    calendar: CalendarService,
    importance: DegradingImportanceClassifier,
    clock: Arc<dyn Clock>,
    default_event_duration: Duration,
    default_query_days: i64,
}

impl Dispatcher {
    pub fn new(
        calendar: CalendarService,
        importance: DegradingImportanceClassifier,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            calendar,
            importance,
            clock,
            default_event_duration: Duration::minutes(DEFAULT_EVENT_DURATION_MINUTES),
            default_query_days: DEFAULT_QUERY_WINDOW_DAYS,
        }
    }

    #[must_use]
    pub fn with_defaults(mut self, event_minutes: i64, query_days: i64) -> Self {
        self.default_event_duration = Duration::minutes(event_minutes);
        self.default_query_days = query_days;
        self
    }

    pub fn calendar(&self) -> &CalendarService {
        &self.calendar
    }

    /// Execute `result` against the calendar. `message` is the user's text,
    /// used for importance scoring and relative date phrases.
    #[instrument(skip_all, fields(intent = %result.intent()))]
    pub async fn dispatch(&self, result: &IntentResult, message: &str) -> Outcome {
        let mutates = !matches!(
            result.action,
            IntentAction::QueryEvent(_)
                | IntentAction::CheckAvailability(_)
                | IntentAction::GeneralConversation
        );
        if mutates && result.needs_clarification {
            return Outcome::NeedsClarification(result.clarification_question.clone());
        }

        let outcome = match &result.action {
            IntentAction::CreateEvent(draft) => self.create(draft.clone(), message).await,
            IntentAction::UpdateEvent { event_id, changes } => {
                self.update(*event_id, changes.clone()).await
            }
            IntentAction::DeleteEvent(selector) => self.delete(selector).await,
            IntentAction::QueryEvent(request) | IntentAction::CheckAvailability(request) => {
                self.query(request, message).await
            }
            IntentAction::RescheduleEvent { event_id, start_time, end_time } => {
                self.reschedule(*event_id, *start_time, *end_time).await
            }
            IntentAction::GeneralConversation => Outcome::None,
        };
        debug!(outcome = %outcome.tag(), "dispatch finished");
        outcome
    }

    async fn create(&self, mut draft: EventDraft, message: &str) -> Outcome {
        let Some(start) = draft.start_time else {
            return Outcome::clarify("When should the event start?");
        };
        if draft.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
            return Outcome::clarify("What should I call the event?");
        }
        draft.end_time = draft.end_time.or(Some(start + self.default_event_duration));
        if draft.importance.is_none() {
            draft.importance = Some(self.importance.score(&draft, Some(message)).await);
        }

        match self.calendar.create_event(draft).await {
            Ok(WriteOutcome::Applied(event)) => Outcome::Created(event),
            Ok(WriteOutcome::Conflicted(conflicts)) => Outcome::Conflict(conflicts),
            Ok(WriteOutcome::NotFound) => Outcome::Error("event vanished during insert".into()),
            Err(err) => fold_error("create", err),
        }
    }

    async fn update(&self, event_id: Option<i64>, changes: EventPatch) -> Outcome {
        let Some(id) = event_id else {
            return Outcome::clarify("Which event should I update?");
        };
        if changes.is_empty() {
            return Outcome::clarify("What would you like to change about it?");
        }

        match self.calendar.update_event(id, changes).await {
            Ok(WriteOutcome::Applied(event)) => Outcome::Updated(event),
            Ok(WriteOutcome::Conflicted(conflicts)) => Outcome::Conflict(conflicts),
            Ok(WriteOutcome::NotFound) => Outcome::NotFound(LookupKey::id(id)),
            Err(err) => fold_error("update", err),
        }
    }

    async fn delete(&self, selector: &EventSelector) -> Outcome {
        match selector {
            EventSelector::ById(id) => self.delete_by_id(*id, LookupKey::id(*id)).await,
            EventSelector::ByTitle(title) => {
                let matches = match self.calendar.find_by_title(title, self.clock.now()).await {
                    Ok(matches) => matches,
                    Err(err) => return fold_error("find_by_title", err),
                };
                match matches.as_slice() {
                    [] => Outcome::NotFound(LookupKey::title(title.as_str())),
                    [only] => self.delete_by_id(only.id, LookupKey::title(title.as_str())).await,
                    _ => Outcome::MultipleMatches(matches),
                }
            }
            EventSelector::Unspecified => Outcome::clarify("Which event should I remove?"),
        }
    }

    async fn delete_by_id(&self, id: i64, key: LookupKey) -> Outcome {
        match self.calendar.delete_event(id).await {
            Ok(Some(event)) => Outcome::Deleted(event),
            Ok(None) => Outcome::NotFound(key),
            Err(err) => fold_error("delete", err),
        }
    }

    async fn query(&self, request: &QueryRequest, message: &str) -> Outcome {
        let window =
            resolve_query_window(message, request, self.clock.now(), self.default_query_days);
        match self.calendar.list_events(window.start, window.end).await {
            Ok(events) => Outcome::Query(QueryResult {
                start: window.start,
                end: window.end,
                single_day: window.single_day,
                events,
            }),
            Err(err) => fold_error("query", err),
        }
    }

    async fn reschedule(
        &self,
        event_id: Option<i64>,
        start_time: Option<NaiveDateTime>,
        end_time: Option<NaiveDateTime>,
    ) -> Outcome {
        let Some(id) = event_id else {
            return Outcome::clarify("Which event should I move?");
        };
        let (Some(start), Some(end)) = (start_time, end_time) else {
            return Outcome::clarify("When should it start and end?");
        };

        match self.calendar.reschedule_event(id, start, end).await {
            Ok(WriteOutcome::Applied(event)) => Outcome::Rescheduled(event),
            Ok(WriteOutcome::Conflicted(conflicts)) => Outcome::Conflict(conflicts),
            Ok(WriteOutcome::NotFound) => Outcome::NotFound(LookupKey::id(id)),
            Err(err) => fold_error("reschedule", err),
        }
    }
}

/// Validation problems can be fixed by rephrasing; everything else is a
/// fault.
fn fold_error(operation: &'static str, err: AuraError) -> Outcome {
    match err {
        AuraError::Validation(message) => Outcome::NeedsClarification(Some(message)),
        other => {
            warn!(operation, error = %other, "calendar operation failed");
            Outcome::Error(other.to_string())
        }
    }
}
