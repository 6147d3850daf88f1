//! Conflict resolution
//!
//! Two intervals conflict iff `a.start < b.end && a.end > b.start`. Touching
//! intervals do not conflict, and only active events ever block.

use std::cmp::Ordering;

use aura_domain::Event;
use chrono::NaiveDateTime;

/// Strict half-open overlap test.
pub fn intervals_overlap(
    a_start: NaiveDateTime,
    a_end: NaiveDateTime,
    b_start: NaiveDateTime,
    b_end: NaiveDateTime,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Importance descending, then start ascending, then id ascending.
pub fn conflict_order(a: &Event, b: &Event) -> Ordering {
    b.importance
        .cmp(&a.importance)
        .then_with(|| a.start_time.cmp(&b.start_time))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn rank_conflicts(conflicts: &mut [Event]) {
    conflicts.sort_by(conflict_order);
}

/// Select the active candidates overlapping `[start, end)`, ranked.
pub fn resolve_conflicts<'a, I>(
    candidates: I,
    start: NaiveDateTime,
    end: NaiveDateTime,
    exclude_id: Option<i64>,
) -> Vec<Event>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut conflicts: Vec<Event> = candidates
        .into_iter()
        .filter(|event| event.is_active())
        .filter(|event| Some(event.id) != exclude_id)
        .filter(|event| intervals_overlap(start, end, event.start_time, event.end_time))
        .cloned()
        .collect();
    rank_conflicts(&mut conflicts);
    conflicts
}
