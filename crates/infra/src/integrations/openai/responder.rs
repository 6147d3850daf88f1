//! Conversational replies over the Chat Completions API

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use aura_core::assistant::ports::ResponseContext;
use aura_core::{Clock, ResponseGenerator};
use aura_domain::{ApiEvent, Event, Intent, Memory, Outcome, Result};
use tracing::instrument;

use super::client::{ChatOptions, OpenAIClient};
use super::types::ChatMessage;

const MAX_MEMORIES_IN_PROMPT: usize = 5;

/// Reply generator speaking as the "Aura" persona.
pub struct OpenAIResponseGenerator {
    client: Arc<OpenAIClient>,
    clock: Arc<dyn Clock>,
}

impl OpenAIResponseGenerator {
    pub fn new(client: Arc<OpenAIClient>, clock: Arc<dyn Clock>) -> Self {
        Self { client, clock }
    }

    fn build_prompt(&self, context: &ResponseContext<'_>) -> String {
        let now = self.clock.now();
        let mut prompt = format!(
            "You are an AI assistant for a calendar app called Aura Calendar. Your name is Aura.\n\
             Your primary role is to help users manage their calendar events.\n\
             When responding to the user:\n\
             1. Be concise and helpful\n\
             2. If you've taken an action (created/updated/deleted an event), confirm it clearly\n\
             3. If there are scheduling conflicts, explain them and suggest alternatives\n\
             4. For general questions, be conversational and friendly\n\
             Current date: {}\n\
             Current time: {}\n\
             Intent detected: {}",
            now.format("%Y-%m-%d"),
            now.format("%H:%M"),
            intent_for(context.outcome),
        );

        if let Some((event, action)) = acted_on(context.outcome) {
            let details = serde_json::to_string(&ApiEvent::from(event)).unwrap_or_default();
            let _ = write!(prompt, "\n\nEvent details: {details}");
            let _ = write!(prompt, "\n\nAction: Event was {action}.");
        }

        match context.outcome {
            Outcome::Conflict(conflicts) => {
                prompt.push_str("\n\nConflicting events:\n");
                for event in conflicts {
                    let _ = writeln!(
                        prompt,
                        "- {} at {} (Importance: {})",
                        event.title,
                        event.start_time.format("%Y-%m-%d %H:%M"),
                        event.importance
                    );
                }
            }
            Outcome::Query(result) => {
                let _ = write!(
                    prompt,
                    "\n\nEvents between {} and {}:",
                    result.start.format("%Y-%m-%d %H:%M"),
                    result.end.format("%Y-%m-%d %H:%M")
                );
                if result.events.is_empty() {
                    prompt.push_str("\n(none)");
                }
                for event in &result.events {
                    let _ = write!(
                        prompt,
                        "\n- {} from {} to {} [{}]",
                        event.title,
                        event.start_time.format("%Y-%m-%d %H:%M"),
                        event.end_time.format("%H:%M"),
                        event.status
                    );
                }
            }
            Outcome::NotFound(_) => {
                prompt.push_str("\n\nNo matching event was found in the calendar.");
            }
            Outcome::MultipleMatches(events) => {
                prompt.push_str("\n\nSeveral events match; ask which one the user means:");
                for event in events {
                    let _ = write!(prompt, "\n- {} (id {})", event.title, event.id);
                }
            }
            Outcome::NeedsClarification(question) => {
                let _ = write!(
                    prompt,
                    "\n\nMore detail is needed before acting.{}",
                    question.as_deref().map(|q| format!(" Ask: {q}")).unwrap_or_default()
                );
            }
            _ => {}
        }

        append_memories(&mut prompt, context.memories);

        let _ = write!(prompt, "\n\nUser message: {}\n\nYour response:", context.message);
        prompt
    }
}

/// Coarse intent label for the prompt, derived from what actually happened.
fn intent_for(outcome: &Outcome) -> Intent {
    match outcome {
        Outcome::Created(_) | Outcome::Conflict(_) => Intent::CreateEvent,
        Outcome::Updated(_) => Intent::UpdateEvent,
        Outcome::Deleted(_) => Intent::DeleteEvent,
        Outcome::Rescheduled(_) => Intent::RescheduleEvent,
        Outcome::Query(_) => Intent::QueryEvent,
        _ => Intent::GeneralConversation,
    }
}

fn acted_on(outcome: &Outcome) -> Option<(&Event, &'static str)> {
    match outcome {
        Outcome::Created(event) => Some((event, "created")),
        Outcome::Updated(event) => Some((event, "updated")),
        Outcome::Rescheduled(event) => Some((event, "rescheduled")),
        Outcome::Deleted(event) => Some((event, "deleted")),
        _ => None,
    }
}

fn append_memories(prompt: &mut String, memories: &[Memory]) {
    if memories.is_empty() {
        return;
    }
    prompt.push_str("\n\nRecent calendar activity:");
    for memory in memories.iter().take(MAX_MEMORIES_IN_PROMPT) {
        let _ = write!(prompt, "\n- {}", memory.content);
    }
}

#[async_trait]
impl ResponseGenerator for OpenAIResponseGenerator {
    #[instrument(skip_all, fields(outcome = %context.outcome.tag()))]
    async fn generate(&self, context: ResponseContext<'_>) -> Result<String> {
        let mut messages = vec![ChatMessage::system(self.build_prompt(&context))];
        for turn in context.history {
            messages.push(ChatMessage::user(turn.user_message.clone()));
            messages.push(ChatMessage::assistant(turn.bot_response.clone()));
        }
        messages.push(ChatMessage::user(context.message));

        let reply = self.client.chat(messages, ChatOptions::text()).await?;
        Ok(reply.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use aura_core::FixedClock;
    use aura_domain::EventStatus;
    use chrono::{NaiveDate, NaiveDateTime};
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::integrations::openai::client::tests::{chat_body, test_client};

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap().and_hms_opt(hour, 0, 0).unwrap()
    }

    fn event(id: i64, title: &str, importance: u8) -> Event {
        Event {
            id,
            title: title.into(),
            description: None,
            start_time: at(14),
            end_time: at(15),
            location: None,
            importance,
            status: EventStatus::Active,
            created_at: at(8),
        }
    }

    fn generator(base_url: String) -> OpenAIResponseGenerator {
        OpenAIResponseGenerator::new(
            Arc::new(test_client(base_url)),
            Arc::new(FixedClock::new(at(10))),
        )
    }

    #[test]
    fn prompt_lists_conflicts_with_importance() {
        let generator = generator("http://localhost:1/v1".into());
        let outcome = Outcome::Conflict(vec![event(7, "Board review", 5)]);
        let context =
            ResponseContext { message: "book a call at 2", outcome: &outcome, history: &[], memories: &[] };

        let prompt = generator.build_prompt(&context);

        assert!(prompt.contains("Your name is Aura."));
        assert!(prompt.contains("Current date: 2024-06-03"));
        assert!(prompt.contains("Current time: 10:00"));
        assert!(prompt.contains("Intent detected: CREATE_EVENT"));
        assert!(prompt.contains("- Board review at 2024-06-03 14:00 (Importance: 5)"));
        assert!(prompt.ends_with("User message: book a call at 2\n\nYour response:"));
    }

    #[test]
    fn prompt_describes_action_taken() {
        let generator = generator("http://localhost:1/v1".into());
        let outcome = Outcome::Deleted(event(3, "Gym", 2));
        let context =
            ResponseContext { message: "cancel gym", outcome: &outcome, history: &[], memories: &[] };

        let prompt = generator.build_prompt(&context);

        assert!(prompt.contains("\"event_id\":3"));
        assert!(prompt.contains("Action: Event was deleted."));
    }

    #[tokio::test]
    async fn generate_returns_trimmed_reply() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("Intent detected: GENERAL_CONVERSATION"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("  Hi there!  ")))
            .mount(&mock_server)
            .await;

        let generator = generator(format!("{}/v1", mock_server.uri()));
        let outcome = Outcome::None;
        let context =
            ResponseContext { message: "hello", outcome: &outcome, history: &[], memories: &[] };

        assert_eq!(generator.generate(context).await.expect("reply"), "Hi there!");
    }
}
