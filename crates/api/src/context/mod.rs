//! Application context - dependency injection container

mod sessions;

use std::sync::Arc;
use std::time::Duration;

use aura_core::{
    AssistantPorts, AssistantService, CalendarService, Clock, ConversationRepository,
    EventRepository, MemoryRepository, SystemClock,
};
use aura_domain::{AuraError, Config, Result};
use aura_infra::integrations::openai::{
    OpenAIClient, OpenAIEmbeddingProvider, OpenAIImportanceClassifier, OpenAIIntentClassifier,
    OpenAIResponseGenerator,
};
use aura_infra::{
    DbManager, SqliteConversationRepository, SqliteEventRepository, SqliteMemoryRepository,
    SqlitePoolConfig,
};
pub use sessions::{SessionHandle, SessionRegistry, SessionState};

use crate::utils::health::{ComponentHealth, HealthReport, LlmMode};

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub assistant: Arc<AssistantService>,
    pub sessions: SessionRegistry,
    pub clock: Arc<dyn Clock>,
    llm_mode: LlmMode,
}

impl AppContext {
    /// Create a context from the environment or a probed config file
    pub fn new() -> Result<Self> {
        Self::new_with_config(aura_infra::config::load()?)
    }

    /// Create a context from explicit configuration
    ///
    /// Remote collaborators are wired only when the LLM section is usable;
    /// otherwise every collaborator takes its local fallback path.
    pub fn new_with_config(config: Config) -> Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let ports = build_remote_ports(&config, &clock)?;
        Self::new_with_services(config, ports, clock)
    }

    /// Create a context with caller-supplied collaborators and clock
    ///
    /// Tests use this to script classifiers and pin the time.
    pub fn new_with_services(
        config: Config,
        ports: AssistantPorts,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let store_timeout = Duration::from_millis(config.database.store_timeout_ms);
        let write_budget = store_write_budget(store_timeout);
        let pool_config = SqlitePoolConfig {
            max_size: config.database.pool_size.max(1),
            busy_timeout: write_budget,
            ..SqlitePoolConfig::default()
        };
        let db = Arc::new(DbManager::with_config(&config.database.path, pool_config)?);
        db.run_migrations()?;

        let events: Arc<dyn EventRepository> =
            Arc::new(SqliteEventRepository::new(db.clone()).with_write_budget(write_budget));
        let memories: Arc<dyn MemoryRepository> =
            Arc::new(SqliteMemoryRepository::new(db.clone()));
        let conversations: Arc<dyn ConversationRepository> =
            Arc::new(SqliteConversationRepository::new(db.clone()));

        let calendar = CalendarService::new(events)
            .with_store_timeout(store_timeout)
            .with_fuzzy_window(
                config.assistant.fuzzy_lookback_days,
                config.assistant.fuzzy_lookahead_days,
            );

        let llm_mode =
            if ports.intent_classifier.is_some() { LlmMode::Online } else { LlmMode::Offline };

        let assistant = Arc::new(AssistantService::new(
            calendar,
            memories,
            conversations,
            ports,
            &config,
            Arc::clone(&clock),
        ));
        let sessions = SessionRegistry::new(config.assistant.ledger_capacity);

        tracing::info!(
            db_path = %db.path().display(),
            llm_mode = ?llm_mode,
            "application context initialized"
        );

        Ok(Self { config, db, assistant, sessions, clock, llm_mode })
    }

    pub fn calendar(&self) -> &CalendarService {
        self.assistant.calendar()
    }

    pub const fn llm_mode(&self) -> LlmMode {
        self.llm_mode
    }

    /// Check health of all application components
    ///
    /// The score is (healthy_components / total_components); the
    /// application is healthy at a score of 0.8 or more.
    pub async fn health_check(&self) -> HealthReport {
        let mut report = HealthReport::new();
        report.llm_mode = self.llm_mode;
        report.active_sessions = self.sessions.len();

        report = report.add_component(self.check_database_health().await);

        let db = Arc::clone(&self.db);
        match tokio::task::spawn_blocking(move || db.table_stats()).await {
            Ok(Ok(stats)) => {
                report.stats = Some(stats);
                report = report.add_component(ComponentHealth::healthy("schema"));
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "schema health check failed");
                report = report.add_component(ComponentHealth::unhealthy("schema", e.to_string()));
            }
            Err(e) => {
                tracing::error!(error = %e, "schema health check task panicked");
                report = report
                    .add_component(ComponentHealth::unhealthy("schema", format!("task panic: {e}")));
            }
        }

        report = report.add_component(match self.llm_mode {
            LlmMode::Online => ComponentHealth::healthy("llm"),
            LlmMode::Offline => ComponentHealth::healthy_with_note("llm", "offline: local fallbacks"),
        });

        report.calculate_score();
        report
    }

    /// Check database health by running a trivial query
    ///
    /// Uses spawn_blocking to avoid blocking the async runtime with synchronous
    /// database operations.
    async fn check_database_health(&self) -> ComponentHealth {
        let db = Arc::clone(&self.db);
        match tokio::task::spawn_blocking(move || db.health_check()).await {
            Ok(Ok(())) => ComponentHealth::healthy("database"),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "database health check failed");
                ComponentHealth::unhealthy("database", format!("query failed: {}", e))
            }
            Err(e) => {
                tracing::error!(error = %e, "database health check task panicked");
                ComponentHealth::unhealthy("database", format!("task panic: {}", e))
            }
        }
    }
}

/// OpenAI-compatible adapters for every port, or none when offline.
fn build_remote_ports(config: &Config, clock: &Arc<dyn Clock>) -> Result<AssistantPorts> {
    if !config.llm.is_usable() {
        tracing::info!("no usable LLM configuration; running offline");
        return Ok(AssistantPorts::default());
    }

    let client = Arc::new(OpenAIClient::from_config(&config.llm).map_err(|e| {
        tracing::error!(error = %e, "failed to construct OpenAI client");
        AuraError::Config(format!("failed to construct OpenAI client: {e}"))
    })?);

    Ok(AssistantPorts {
        intent_classifier: Some(Arc::new(OpenAIIntentClassifier::new(
            Arc::clone(&client),
            Arc::clone(clock),
        ))),
        importance_classifier: Some(Arc::new(OpenAIImportanceClassifier::new(Arc::clone(
            &client,
        )))),
        response_generator: Some(Arc::new(OpenAIResponseGenerator::new(
            Arc::clone(&client),
            Arc::clone(clock),
        ))),
        embedding_provider: Some(Arc::new(OpenAIEmbeddingProvider::new(
            client,
            config.embedding.dimension,
        ))),
    })
}

/// Budget the store gets for a write and for a lock wait: half the
/// caller-facing timeout, so the store gives up and rolls back first.
fn store_write_budget(store_timeout: Duration) -> Duration {
    store_timeout / 2
}
