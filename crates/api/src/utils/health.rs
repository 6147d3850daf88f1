//! Health report types for AppContext components
//!
//! Provides HealthReport and ComponentHealth types for monitoring application health.

use aura_infra::TableStats;
use serde::{Deserialize, Serialize};

/// Score at or above which the application counts as healthy.
const HEALTHY_THRESHOLD: f64 = 0.8;

/// Overall health of the application
///
/// # Example
/// ```
/// use aura_lib::utils::health::{ComponentHealth, HealthReport};
///
/// let mut report = HealthReport::new();
/// report = report.add_component(ComponentHealth::healthy("database"));
/// report = report.add_component(ComponentHealth::unhealthy("schema", "no such table"));
/// report.calculate_score();
///
/// assert_eq!(report.score, 0.5);
/// assert!(!report.is_healthy);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Overall health indicator
    pub is_healthy: bool,

    /// Health score from 0.0 (completely unhealthy) to 1.0 (fully healthy)
    ///
    /// Calculated as: (healthy_components / total_components)
    pub score: f64,

    /// Whether remote collaborators are configured, or all four run locally
    pub llm_mode: LlmMode,

    /// Row counts, when the schema could be read
    pub stats: Option<TableStats>,

    /// Sessions with an in-memory ledger
    pub active_sessions: usize,

    /// Individual component health checks
    pub components: Vec<ComponentHealth>,

    /// Unix timestamp when health check was performed
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmMode {
    Online,
    Offline,
}

impl HealthReport {
    /// Create a new report: healthy with score 1.0, no components
    pub fn new() -> Self {
        Self {
            is_healthy: true,
            score: 1.0,
            llm_mode: LlmMode::Offline,
            stats: None,
            active_sessions: 0,
            components: Vec::new(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    /// Add a component health check to the report
    ///
    /// Returns self for method chaining
    pub fn add_component(mut self, component: ComponentHealth) -> Self {
        self.components.push(component);
        self
    }

    /// Calculate overall health score based on component health
    ///
    /// Should be called after all components have been added.
    #[allow(clippy::cast_precision_loss)]
    pub fn calculate_score(&mut self) {
        if self.components.is_empty() {
            return;
        }

        let healthy_count = self.components.iter().filter(|c| c.is_healthy).count();

        self.score = healthy_count as f64 / self.components.len() as f64;
        self.is_healthy = self.score >= HEALTHY_THRESHOLD;
    }

    /// Names of the components that failed their check
    pub fn failing_components(&self) -> impl Iterator<Item = &str> {
        self.components.iter().filter(|c| !c.is_healthy).map(|c| c.name.as_str())
    }
}

impl Default for HealthReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Health status of an individual component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component identifier (e.g., "database", "schema")
    pub name: String,

    /// Whether the component is healthy
    pub is_healthy: bool,

    /// Optional message describing health state or error
    pub message: Option<String>,
}

impl ComponentHealth {
    /// Create a healthy component status
    pub fn healthy(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: true, message: None }
    }

    /// Healthy, with a note attached
    pub fn healthy_with_note(name: impl Into<String>, note: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: true, message: Some(note.into()) }
    }

    /// Create an unhealthy component status with a message
    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: false, message: Some(message.into()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_report_new() {
        let report = HealthReport::new();
        assert!(report.is_healthy);
        assert_eq!(report.score, 1.0);
        assert!(report.stats.is_none());
        assert!(report.components.is_empty());
    }

    #[test]
    fn test_calculate_score_all_healthy() {
        let mut report = HealthReport::new()
            .add_component(ComponentHealth::healthy("database"))
            .add_component(ComponentHealth::healthy_with_note("llm", "offline"));

        report.calculate_score();

        assert_eq!(report.score, 1.0);
        assert!(report.is_healthy);
        assert_eq!(report.failing_components().count(), 0);
    }

    #[test]
    fn test_calculate_score_below_threshold() {
        let mut report = HealthReport::new()
            .add_component(ComponentHealth::unhealthy("database", "locked"))
            .add_component(ComponentHealth::healthy("schema"))
            .add_component(ComponentHealth::healthy("llm"));

        report.calculate_score();

        assert!(report.score < 0.8);
        assert!(!report.is_healthy);
        assert_eq!(report.failing_components().collect::<Vec<_>>(), vec!["database"]);
    }

    #[test]
    fn test_calculate_score_threshold() {
        let mut report = HealthReport::new();
        for name in ["a", "b", "c", "d"] {
            report = report.add_component(ComponentHealth::healthy(name));
        }
        report = report.add_component(ComponentHealth::unhealthy("e", "error"));

        report.calculate_score();

        assert_eq!(report.score, 0.8);
        assert!(report.is_healthy);
    }

    #[test]
    fn test_report_serializes_mode_in_snake_case() {
        let mut report = HealthReport::new();
        report.llm_mode = LlmMode::Online;
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["llm_mode"], "online");
    }
}
