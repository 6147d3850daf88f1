//! Direct calendar commands
//!
//! These bypass classification entirely and go straight to the
//! `CalendarService`, with the same validation and conflict rules the
//! assistant applies.

use aura_core::WriteOutcome;
use aura_domain::{Event, EventDraft, EventPatch, Result};
use chrono::NaiveDateTime;
use tracing::instrument;

use super::run_logged;
use crate::context::AppContext;

/// Create an event unless an active event overlaps it
///
/// # Errors
/// `AuraError::Validation` when a required field is missing or the
/// interval is empty; the store is untouched.
#[instrument(skip(ctx, draft), fields(title = ?draft.title))]
pub async fn create_event(ctx: &AppContext, draft: EventDraft) -> Result<WriteOutcome> {
    run_logged("calendar::create_event", ctx.calendar().create_event(draft)).await
}

/// Apply a partial update; a schedule change is conflict-checked
#[instrument(skip(ctx, patch))]
pub async fn update_event(ctx: &AppContext, event_id: i64, patch: EventPatch) -> Result<WriteOutcome> {
    run_logged("calendar::update_event", ctx.calendar().update_event(event_id, patch)).await
}

/// Move an event to a new interval
#[instrument(skip(ctx))]
pub async fn reschedule_event(
    ctx: &AppContext,
    event_id: i64,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
) -> Result<WriteOutcome> {
    run_logged(
        "calendar::reschedule_event",
        ctx.calendar().reschedule_event(event_id, start_time, end_time),
    )
    .await
}

/// Delete an event, returning the row as it was, or `None` if it did not
/// exist
#[instrument(skip(ctx))]
pub async fn delete_event(ctx: &AppContext, event_id: i64) -> Result<Option<Event>> {
    run_logged("calendar::delete_event", ctx.calendar().delete_event(event_id)).await
}

#[instrument(skip(ctx))]
pub async fn get_event(ctx: &AppContext, event_id: i64) -> Result<Option<Event>> {
    run_logged("calendar::get_event", ctx.calendar().get_event(event_id)).await
}

/// Events of any status intersecting the window, by start time
#[instrument(skip(ctx))]
pub async fn list_events(
    ctx: &AppContext,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
) -> Result<Vec<Event>> {
    run_logged("calendar::list_events", ctx.calendar().list_events(start_time, end_time)).await
}

/// Active events that would block the window, most important first
#[instrument(skip(ctx))]
pub async fn check_conflicts(
    ctx: &AppContext,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
    exclude_id: Option<i64>,
) -> Result<Vec<Event>> {
    run_logged(
        "calendar::check_conflicts",
        ctx.calendar().check_conflicts(start_time, end_time, exclude_id),
    )
    .await
}
