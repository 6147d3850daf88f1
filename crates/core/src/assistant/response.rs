//! Reply text generation
//!
//! [`TemplateResponder`] renders every outcome deterministically.
//! [`FallbackResponder`] prefers a remote generator and drops back to the
//! templates when it is missing or fails.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use aura_domain::constants::FALLBACK_ERROR_RESPONSE;
use aura_domain::{Event, LookupKey, Outcome, QueryResult, Result};
use tracing::warn;

use super::ports::{ResponseContext, ResponseGenerator};

const DATE_FORMAT: &str = "%A, %B %-d";
const TIME_FORMAT: &str = "%H:%M";

/// Deterministic replies, one template per outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateResponder;

impl TemplateResponder {
    pub fn render(&self, outcome: &Outcome) -> String {
        match outcome {
            Outcome::Created(event) => {
                format!("Done! I've added \"{}\" {}.", event.title, describe_slot(event))
            }
            Outcome::Updated(event) => {
                format!("I've updated \"{}\". It's now {}.", event.title, describe_slot(event))
            }
            Outcome::Rescheduled(event) => {
                format!("I've moved \"{}\" to {}.", event.title, describe_slot(event))
            }
            Outcome::Deleted(event) => {
                format!("I've removed \"{}\" from your calendar.", event.title)
            }
            Outcome::Conflict(conflicts) => render_conflicts(conflicts),
            Outcome::Query(result) => render_query(result),
            Outcome::Error(_) => FALLBACK_ERROR_RESPONSE.to_string(),
            Outcome::NotFound(key) => render_not_found(key),
            Outcome::MultipleMatches(events) => {
                let mut text =
                    String::from("I found more than one event that matches. Which one did you mean?");
                for event in events {
                    let _ = write!(text, "\n- {} ({})", event.title, describe_slot(event));
                }
                text
            }
            Outcome::NeedsClarification(question) => question
                .clone()
                .unwrap_or_else(|| "Could you give me a few more details?".to_string()),
            Outcome::None => {
                "I'm Aura, your calendar assistant. Tell me what you'd like to schedule or look up."
                    .to_string()
            }
        }
    }
}

#[async_trait]
impl ResponseGenerator for TemplateResponder {
    async fn generate(&self, context: ResponseContext<'_>) -> Result<String> {
        Ok(self.render(context.outcome))
    }
}

fn describe_slot(event: &Event) -> String {
    let start = event.start_time;
    let end = event.end_time;
    if start.date() == end.date() {
        format!(
            "on {} from {} to {}",
            start.format(DATE_FORMAT),
            start.format(TIME_FORMAT),
            end.format(TIME_FORMAT)
        )
    } else {
        format!(
            "from {} {} to {} {}",
            start.format(DATE_FORMAT),
            start.format(TIME_FORMAT),
            end.format(DATE_FORMAT),
            end.format(TIME_FORMAT)
        )
    }
}

fn render_conflicts(conflicts: &[Event]) -> String {
    let mut text = String::from("That time overlaps with:");
    for event in conflicts {
        let _ = write!(
            text,
            "\n- {} at {} (importance {})",
            event.title,
            event.start_time.format("%Y-%m-%d %H:%M"),
            event.importance
        );
    }
    text.push_str("\nWould you like to pick another time?");
    text
}

fn render_query(result: &QueryResult) -> String {
    let span = if result.single_day {
        format!("on {}", result.start.format(DATE_FORMAT))
    } else {
        format!(
            "between {} and {}",
            result.start.format(DATE_FORMAT),
            result.end.format(DATE_FORMAT)
        )
    };
    if result.events.is_empty() {
        return format!("You have nothing scheduled {span}.");
    }
    let mut text = format!("Here's what you have {span}:");
    for event in &result.events {
        let _ = write!(
            text,
            "\n- {} {}-{} {}",
            event.start_time.format("%a %b %-d"),
            event.start_time.format(TIME_FORMAT),
            event.end_time.format(TIME_FORMAT),
            event.title
        );
    }
    text
}

fn render_not_found(key: &LookupKey) -> String {
    match (&key.title, key.event_id) {
        (Some(title), _) => format!("I couldn't find any event matching \"{title}\"."),
        (None, Some(id)) => format!("I couldn't find an event with id {id}."),
        (None, None) => "I couldn't find that event.".to_string(),
    }
}

/// Remote generator with template fallback. Never fails.
///
/// The `error` outcome always gets the fixed apology, whatever the primary
/// would have said.
#[derive(Clone, Default)]
pub struct FallbackResponder {
    primary: Option<Arc<dyn ResponseGenerator>>,
    templates: TemplateResponder,
}

impl FallbackResponder {
    pub fn new(primary: Option<Arc<dyn ResponseGenerator>>) -> Self {
        Self { primary, templates: TemplateResponder }
    }

    pub async fn respond(&self, context: ResponseContext<'_>) -> String {
        if matches!(context.outcome, Outcome::Error(_)) {
            return FALLBACK_ERROR_RESPONSE.to_string();
        }
        if let Some(primary) = &self.primary {
            match primary.generate(context).await {
                Ok(text) if !text.trim().is_empty() => return text.trim().to_string(),
                Ok(_) => warn!("response generator returned empty text; using template"),
                Err(err) => warn!(error = %err, "response generation failed; using template"),
            }
        }
        self.templates.render(context.outcome)
    }
}

#[async_trait]
impl ResponseGenerator for FallbackResponder {
    async fn generate(&self, context: ResponseContext<'_>) -> Result<String> {
        Ok(self.respond(context).await)
    }
}
