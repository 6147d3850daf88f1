#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use aura_core::{AssistantPorts, Clock, FixedClock, ImportanceClassifier, IntentClassifier};
use aura_domain::{Config, ConversationTurn, EventDraft, IntentResult, Result};
use aura_lib::AppContext;
use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;

/// Hands out queued results in order, then general conversation.
#[derive(Default)]
pub struct ScriptedIntents {
    queue: Mutex<VecDeque<IntentResult>>,
    seen_history: Mutex<Vec<usize>>,
}

impl ScriptedIntents {
    pub fn push(&self, result: IntentResult) {
        self.queue.lock().unwrap().push_back(result);
    }

    /// History lengths the classifier was called with, in call order.
    pub fn history_lengths(&self) -> Vec<usize> {
        self.seen_history.lock().unwrap().clone()
    }
}

#[async_trait]
impl IntentClassifier for ScriptedIntents {
    async fn classify(&self, _message: &str, history: &[ConversationTurn]) -> Result<IntentResult> {
        self.seen_history.lock().unwrap().push(history.len());
        Ok(self.queue.lock().unwrap().pop_front().unwrap_or_else(IntentResult::general))
    }
}

pub struct FixedImportance(pub u8);

#[async_trait]
impl ImportanceClassifier for FixedImportance {
    async fn classify(&self, _event: &EventDraft, _message: Option<&str>) -> Result<u8> {
        Ok(self.0)
    }
}

pub fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, day).unwrap().and_hms_opt(hour, minute, 0).unwrap()
}

/// Application context over a throwaway database, with scripted intents
/// and the clock pinned to Monday 2024-05-20 09:00.
pub struct TestContext {
    pub ctx: AppContext,
    pub intents: Arc<ScriptedIntents>,
    pub clock: FixedClock,
    pub temp_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        Self::in_dir(temp_dir)
    }

    /// A fresh context over the database of `temp_dir`.
    pub fn in_dir(temp_dir: TempDir) -> Self {
        let intents = Arc::new(ScriptedIntents::default());
        let clock = FixedClock::new(at(20, 9, 0));

        let ports = AssistantPorts {
            intent_classifier: Some(intents.clone() as Arc<dyn IntentClassifier>),
            importance_classifier: Some(Arc::new(FixedImportance(4))),
            ..AssistantPorts::default()
        };
        let ctx = AppContext::new_with_services(
            config_in(&temp_dir),
            ports,
            Arc::new(clock.clone()) as Arc<dyn Clock>,
        )
        .expect("failed to create test context");

        Self { ctx, intents, clock, temp_dir }
    }

    /// Drop the context and open a new one on the same database.
    pub fn reopen(self) -> Self {
        let Self { ctx, temp_dir, .. } = self;
        drop(ctx);
        Self::in_dir(temp_dir)
    }
}

pub fn config_in(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.database.path = dir.path().join("aura.db").to_string_lossy().to_string();
    config.database.pool_size = 4;
    config
}
