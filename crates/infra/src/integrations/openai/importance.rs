//! Importance scoring over the Chat Completions API

use std::sync::Arc;

use async_trait::async_trait;
use aura_core::assistant::parse_importance_response;
use aura_core::ImportanceClassifier;
use aura_domain::{AuraError, EventDraft, Result};
use tracing::{debug, instrument};

use super::client::{ChatOptions, OpenAIClient};
use super::types::ChatMessage;

const IMPORTANCE_SYSTEM_PROMPT: &str = "You assess how important calendar events are to the \
person who owns the calendar. Consider urgency, impact, emotional weight and time sensitivity.

Respond with a single JSON object:
{
  \"urgency\": \"<short assessment>\",
  \"impact\": \"<short assessment>\",
  \"emotional_weight\": \"<short assessment>\",
  \"time_sensitivity\": \"<short assessment>\",
  \"detailed_importance_level\": \"critical\" | \"high\" | \"medium\" | \"low\"
}";

/// Importance classifier backed by an OpenAI-compatible chat model.
pub struct OpenAIImportanceClassifier {
    client: Arc<OpenAIClient>,
}

impl OpenAIImportanceClassifier {
    pub fn new(client: Arc<OpenAIClient>) -> Self {
        Self { client }
    }
}

fn describe_event(event: &EventDraft, message: Option<&str>) -> String {
    let mut lines = vec![format!("Title: {}", event.title.as_deref().unwrap_or("(untitled)"))];
    if let Some(description) = &event.description {
        lines.push(format!("Description: {description}"));
    }
    if let Some(start) = event.start_time {
        lines.push(format!("Starts: {}", start.format("%Y-%m-%d %H:%M")));
    }
    if let Some(end) = event.end_time {
        lines.push(format!("Ends: {}", end.format("%Y-%m-%d %H:%M")));
    }
    if let Some(location) = &event.location {
        lines.push(format!("Location: {location}"));
    }
    if let Some(message) = message {
        lines.push(format!("The user said: \"{message}\""));
    }
    lines.join("\n")
}

#[async_trait]
impl ImportanceClassifier for OpenAIImportanceClassifier {
    #[instrument(skip_all)]
    async fn classify(&self, event: &EventDraft, message: Option<&str>) -> Result<u8> {
        let messages = vec![
            ChatMessage::system(IMPORTANCE_SYSTEM_PROMPT),
            ChatMessage::user(describe_event(event, message)),
        ];
        let raw = self.client.chat(messages, ChatOptions::json()).await?;
        let assessment = parse_importance_response(&raw)?;

        let score = assessment.score().ok_or_else(|| {
            AuraError::External("importance response carried no usable level".into())
        })?;
        debug!(score, level = ?assessment.detailed_importance_level, "importance assessed");
        Ok(score)
    }
}
