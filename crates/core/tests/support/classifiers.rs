//! Scripted and failing collaborators

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use aura_core::assistant::ports::{
    ImportanceClassifier, IntentClassifier, ResponseContext, ResponseGenerator,
};
use aura_core::EmbeddingProvider;
use aura_domain::{AuraError, ConversationTurn, EventDraft, IntentResult, Result as DomainResult};

/// Returns queued results in order, then general conversation. Records how
/// much history each call received.
#[derive(Default)]
pub struct ScriptedIntentClassifier {
    script: Mutex<VecDeque<DomainResult<IntentResult>>>,
    history_seen: Mutex<Vec<Vec<String>>>,
}

impl ScriptedIntentClassifier {
    pub fn new(results: impl IntoIterator<Item = IntentResult>) -> Self {
        Self {
            script: Mutex::new(results.into_iter().map(Ok).collect()),
            history_seen: Mutex::default(),
        }
    }

    pub fn then_fail(self) -> Self {
        self.script.lock().unwrap().push_back(Err(AuraError::External("model timed out".into())));
        self
    }

    /// User messages of the history passed on each call.
    pub fn history_seen(&self) -> Vec<Vec<String>> {
        self.history_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl IntentClassifier for ScriptedIntentClassifier {
    async fn classify(
        &self,
        _message: &str,
        history: &[ConversationTurn],
    ) -> DomainResult<IntentResult> {
        self.history_seen
            .lock()
            .unwrap()
            .push(history.iter().map(|t| t.user_message.clone()).collect());
        self.script.lock().unwrap().pop_front().unwrap_or_else(|| Ok(IntentResult::general()))
    }
}

/// Always scores the same and counts calls.
pub struct FixedImportanceClassifier {
    score: u8,
    calls: AtomicUsize,
}

impl FixedImportanceClassifier {
    pub fn new(score: u8) -> Self {
        Self { score, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImportanceClassifier for FixedImportanceClassifier {
    async fn classify(&self, _event: &EventDraft, _message: Option<&str>) -> DomainResult<u8> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.score)
    }
}

/// Every collaborator call fails.
pub struct Unavailable;

#[async_trait]
impl IntentClassifier for Unavailable {
    async fn classify(&self, _: &str, _: &[ConversationTurn]) -> DomainResult<IntentResult> {
        Err(AuraError::Network("connection refused".into()))
    }
}

#[async_trait]
impl ImportanceClassifier for Unavailable {
    async fn classify(&self, _: &EventDraft, _: Option<&str>) -> DomainResult<u8> {
        Err(AuraError::Network("connection refused".into()))
    }
}

#[async_trait]
impl ResponseGenerator for Unavailable {
    async fn generate(&self, _: ResponseContext<'_>) -> DomainResult<String> {
        Err(AuraError::External("rate limited".into()))
    }
}

#[async_trait]
impl EmbeddingProvider for Unavailable {
    async fn embed(&self, _: &str) -> DomainResult<Vec<f32>> {
        Err(AuraError::External("embedding service down".into()))
    }

    fn model_id(&self) -> &str {
        "unavailable"
    }

    fn dimensions(&self) -> usize {
        1536
    }
}
