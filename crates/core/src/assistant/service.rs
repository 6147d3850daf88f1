//! Assistant service - one user message in, one reply out

use std::sync::Arc;

use aura_domain::{
    AssistantConfig, Config, ConversationTurn, Event, Intent, Memory, MessageReply,
    NewConversationTurn, NewMemory, Outcome, Result, UiAction,
};
use tracing::{debug, info, instrument, warn};

use super::dispatcher::Dispatcher;
use super::fallback::{DegradingImportanceClassifier, DegradingIntentClassifier};
use super::ledger::ConversationLedger;
use super::ports::{
    ConversationRepository, ImportanceClassifier, IntentClassifier, MemoryRepository,
    ResponseContext, ResponseGenerator,
};
use super::response::FallbackResponder;
use crate::calendar::CalendarService;
use crate::clock::Clock;
use crate::embedding::{EmbeddingProvider, FailoverEmbedder};

/// Remote collaborators. Each is optional; an absent one takes its local
/// fallback path.
#[derive(Clone, Default)]
pub struct AssistantPorts {
    pub intent_classifier: Option<Arc<dyn IntentClassifier>>,
    pub importance_classifier: Option<Arc<dyn ImportanceClassifier>>,
    pub response_generator: Option<Arc<dyn ResponseGenerator>>,
    pub embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
}

pub struct AssistantService {
    dispatcher: Dispatcher,
    intents: DegradingIntentClassifier,
    responder: FallbackResponder,
    embedder: FailoverEmbedder,
    memories: Arc<dyn MemoryRepository>,
    conversations: Arc<dyn ConversationRepository>,
    clock: Arc<dyn Clock>,
    settings: AssistantConfig,
}

impl AssistantService {
    pub fn new(
        calendar: CalendarService,
        memories: Arc<dyn MemoryRepository>,
        conversations: Arc<dyn ConversationRepository>,
        ports: AssistantPorts,
        config: &Config,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let settings = config.assistant.clone();
        let importance = DegradingImportanceClassifier::new(ports.importance_classifier)
            .with_fallback(settings.fallback_importance);
        let dispatcher = Dispatcher::new(calendar, importance, Arc::clone(&clock))
            .with_defaults(settings.default_event_minutes, settings.default_query_days);

        Self {
            dispatcher,
            intents: DegradingIntentClassifier::new(ports.intent_classifier),
            responder: FallbackResponder::new(ports.response_generator),
            embedder: FailoverEmbedder::new(ports.embedding_provider, config.embedding.dimension),
            memories,
            conversations,
            clock,
            settings,
        }
    }

    /// A fresh ledger sized from configuration.
    pub fn new_ledger(&self, session_id: impl Into<String>) -> ConversationLedger {
        ConversationLedger::new(session_id, self.settings.ledger_capacity)
    }

    pub fn calendar(&self) -> &CalendarService {
        self.dispatcher.calendar()
    }

    /// Classify, dispatch, reply, then record the turn in `ledger`.
    #[instrument(skip_all, fields(session = %ledger.session_id()))]
    pub async fn process_message(&self, ledger: &mut ConversationLedger, text: &str) -> MessageReply {
        let text = text.trim();
        if text.is_empty() {
            let outcome = Outcome::clarify("What would you like me to do?");
            let context =
                ResponseContext { message: text, outcome: &outcome, history: &[], memories: &[] };
            let response_text = self.responder.respond(context).await;
            return MessageReply {
                intent: Intent::GeneralConversation,
                outcome,
                response_text,
                ui_action: None,
            };
        }

        let history = ledger.recent(self.settings.history_window);
        let classified = self.intents.classify_or_general(text, &history).await;
        let intent = classified.intent();
        let outcome = self.dispatcher.dispatch(&classified, text).await;

        let memories = self.recall().await;
        let context = ResponseContext {
            message: text,
            outcome: &outcome,
            history: &history,
            memories: &memories,
        };
        let response_text = self.responder.respond(context).await;

        if let Some(event) = mutated_event(&outcome) {
            self.annotate(&outcome, event).await;
        }

        let turn = NewConversationTurn {
            session_id: ledger.session_id().to_string(),
            user_message: text.to_string(),
            bot_response: response_text.clone(),
            intent,
            related_event_id: outcome.related_event_id(),
            timestamp: self.clock.now(),
        };
        let turn_id = match self.conversations.append(&turn).await {
            Ok(id) => Some(id),
            Err(err) => {
                warn!(error = %err, "failed to persist conversation turn; keeping it in memory only");
                None
            }
        };
        ledger.push(turn.into_turn(turn_id));

        info!(%intent, outcome = %outcome.tag(), "message processed");
        let ui_action = UiAction::from_outcome(&outcome);
        MessageReply { intent, outcome, response_text, ui_action }
    }

    /// Load the newest persisted turns of the ledger's session into it.
    pub async fn rehydrate(&self, ledger: &mut ConversationLedger) -> Result<usize> {
        let turns = self.conversations.recent(ledger.session_id(), ledger.capacity()).await?;
        ledger.rehydrate(turns);
        debug!(session = ledger.session_id(), turns = ledger.len(), "ledger rehydrated");
        Ok(ledger.len())
    }

    /// Forget the in-memory history. Persisted turns stay.
    pub fn clear_history(&self, ledger: &mut ConversationLedger) {
        ledger.clear();
    }

    /// Most recent memories first.
    pub async fn recent_memories(&self, limit: usize) -> Result<Vec<Memory>> {
        self.memories.recent(limit).await
    }

    /// The persisted history of a session, oldest first.
    pub async fn conversation_history(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>> {
        let mut turns = self.conversations.recent(session_id, limit).await?;
        turns.reverse();
        Ok(turns)
    }

    async fn recall(&self) -> Vec<Memory> {
        match self.memories.recent(self.settings.memory_recall_limit).await {
            Ok(memories) => memories,
            Err(err) => {
                warn!(error = %err, "memory recall failed");
                Vec::new()
            }
        }
    }

    async fn annotate(&self, outcome: &Outcome, event: &Event) {
        let content = summarize(outcome, event);
        let embedding = match self.embedder.embed(&content).await {
            Ok(embedding) => embedding,
            Err(err) => {
                warn!(error = %err, "embedding failed; memory not recorded");
                return;
            }
        };
        let memory = NewMemory {
            event_id: outcome.related_event_id(),
            content,
            embedding,
            created_at: self.clock.now(),
        };
        if let Err(err) = self.memories.save(memory).await {
            warn!(error = %err, "failed to record memory");
        }
    }
}

fn mutated_event(outcome: &Outcome) -> Option<&Event> {
    match outcome {
        Outcome::Created(event)
        | Outcome::Updated(event)
        | Outcome::Rescheduled(event)
        | Outcome::Deleted(event) => Some(event),
        _ => None,
    }
}

fn summarize(outcome: &Outcome, event: &Event) -> String {
    format!(
        "{} event \"{}\" ({} to {}, importance {})",
        capitalize(outcome.tag().as_str()),
        event.title,
        event.start_time.format("%Y-%m-%d %H:%M"),
        event.end_time.format("%Y-%m-%d %H:%M"),
        event.importance
    )
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| first.to_uppercase().chain(chars).collect())
}
