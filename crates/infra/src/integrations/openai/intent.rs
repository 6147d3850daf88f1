//! Intent classification over the Chat Completions API

use std::sync::Arc;

use async_trait::async_trait;
use aura_core::assistant::parse_intent_response;
use aura_core::{Clock, IntentClassifier};
use aura_domain::{ConversationTurn, IntentResult, Result};
use chrono::NaiveDateTime;
use tracing::{debug, instrument};

use super::client::{ChatOptions, OpenAIClient};
use super::types::ChatMessage;

const INTENT_SYSTEM_PROMPT: &str = "You are an intent classifier for a calendar assistant. \
Classify the user's message into exactly one of: CREATE_EVENT, UPDATE_EVENT, DELETE_EVENT, \
QUERY_EVENT, CHECK_AVAILABILITY, RESCHEDULE_EVENT, GENERAL_CONVERSATION.

Respond with a single JSON object of this shape:
{
  \"intent\": \"<one of the intents above>\",
  \"confidence\": <number between 0 and 1>,
  \"event_details\": {
    \"event_id\": <number or null>,
    \"title\": <string or null>,
    \"description\": <string or null>,
    \"start_time\": <\"YYYY-MM-DDTHH:MM:SS\" or null>,
    \"end_time\": <\"YYYY-MM-DDTHH:MM:SS\" or null>,
    \"date\": <\"YYYY-MM-DD\" or null>,
    \"location\": <string or null>,
    \"importance\": <1-5 or null>
  },
  \"needs_clarification\": <true or false>,
  \"clarification_question\": <string or null>
}

Resolve relative dates (\"tomorrow\", \"next Friday\") against the current date. \
Use `date` only when the user names a day without a time. \
Set needs_clarification when a required detail is missing or ambiguous.";

/// Intent classifier backed by an OpenAI-compatible chat model.
pub struct OpenAIIntentClassifier {
    client: Arc<OpenAIClient>,
    clock: Arc<dyn Clock>,
}

impl OpenAIIntentClassifier {
    pub fn new(client: Arc<OpenAIClient>, clock: Arc<dyn Clock>) -> Self {
        Self { client, clock }
    }

    fn build_messages(&self, message: &str, history: &[ConversationTurn]) -> Vec<ChatMessage> {
        let now = self.clock.now();
        let mut messages = Vec::with_capacity(history.len() * 2 + 2);
        messages.push(ChatMessage::system(format!(
            "{INTENT_SYSTEM_PROMPT}\n\n{}",
            current_time_line(now)
        )));

        for turn in history {
            messages.push(ChatMessage::user(turn.user_message.clone()));
            messages.push(ChatMessage::assistant(turn.bot_response.clone()));
        }
        messages.push(ChatMessage::user(message));
        messages
    }
}

fn current_time_line(now: NaiveDateTime) -> String {
    format!("Current date and time: {} ({})", now.format("%Y-%m-%dT%H:%M:%S"), now.format("%A"))
}

#[async_trait]
impl IntentClassifier for OpenAIIntentClassifier {
    #[instrument(skip_all, fields(history = history.len()))]
    async fn classify(&self, message: &str, history: &[ConversationTurn]) -> Result<IntentResult> {
        let messages = self.build_messages(message, history);
        let raw = self.client.chat(messages, ChatOptions::json()).await?;
        let result = parse_intent_response(&raw)?;
        debug!(intent = %result.intent(), confidence = result.confidence, "message classified");
        Ok(result)
    }
}
