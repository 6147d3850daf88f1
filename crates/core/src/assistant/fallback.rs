//! Degrading decorators for the classifiers
//!
//! Both wrap an optional remote classifier. With no classifier configured,
//! or when it fails, they answer with the local default instead of an error.

use std::sync::Arc;

use async_trait::async_trait;
use aura_domain::constants::{FALLBACK_IMPORTANCE, MAX_IMPORTANCE, MIN_IMPORTANCE};
use aura_domain::{ConversationTurn, EventDraft, IntentResult, Result};
use tracing::warn;

use super::ports::{ImportanceClassifier, IntentClassifier};

/// Falls back to general conversation.
#[derive(Clone, Default)]
pub struct DegradingIntentClassifier {
    inner: Option<Arc<dyn IntentClassifier>>,
}

impl DegradingIntentClassifier {
    pub fn new(inner: Option<Arc<dyn IntentClassifier>>) -> Self {
        Self { inner }
    }

    pub async fn classify_or_general(
        &self,
        message: &str,
        history: &[ConversationTurn],
    ) -> IntentResult {
        let Some(inner) = &self.inner else {
            return IntentResult::general();
        };
        match inner.classify(message, history).await {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "intent classification failed; treating as general conversation");
                IntentResult::general()
            }
        }
    }
}

#[async_trait]
impl IntentClassifier for DegradingIntentClassifier {
    async fn classify(&self, message: &str, history: &[ConversationTurn]) -> Result<IntentResult> {
        Ok(self.classify_or_general(message, history).await)
    }
}

/// Falls back to a fixed score and clamps whatever the classifier returns.
#[derive(Clone)]
pub struct DegradingImportanceClassifier {
    inner: Option<Arc<dyn ImportanceClassifier>>,
    fallback: u8,
}

impl Default for DegradingImportanceClassifier {
    fn default() -> Self {
        Self::new(None)
    }
}

impl DegradingImportanceClassifier {
    pub fn new(inner: Option<Arc<dyn ImportanceClassifier>>) -> Self {
        Self { inner, fallback: FALLBACK_IMPORTANCE }
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: u8) -> Self {
        self.fallback = fallback.clamp(MIN_IMPORTANCE, MAX_IMPORTANCE);
        self
    }

    pub async fn score(&self, event: &EventDraft, message: Option<&str>) -> u8 {
        let Some(inner) = &self.inner else {
            return self.fallback;
        };
        match inner.classify(event, message).await {
            Ok(score) => score.clamp(MIN_IMPORTANCE, MAX_IMPORTANCE),
            Err(err) => {
                warn!(error = %err, fallback = self.fallback, "importance classification failed");
                self.fallback
            }
        }
    }
}

#[async_trait]
impl ImportanceClassifier for DegradingImportanceClassifier {
    async fn classify(&self, event: &EventDraft, message: Option<&str>) -> Result<u8> {
        Ok(self.score(event, message).await)
    }
}
