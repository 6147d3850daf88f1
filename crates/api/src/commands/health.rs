//! Health check command

use std::time::Instant;

use crate::context::AppContext;
use crate::utils::health::HealthReport;
use crate::utils::logging::log_command_execution;

/// Get application health
///
/// # Example Response
/// ```json
/// {
///   "is_healthy": true,
///   "score": 1.0,
///   "llm_mode": "offline",
///   "stats": { "events": 12, "memories": 9, "conversation_turns": 40 },
///   "active_sessions": 1,
///   "components": [
///     { "name": "database", "is_healthy": true, "message": null },
///     { "name": "schema", "is_healthy": true, "message": null },
///     { "name": "llm", "is_healthy": true, "message": "offline: local fallbacks" }
///   ],
///   "timestamp": 1698765432
/// }
/// ```
pub async fn health_check(ctx: &AppContext) -> HealthReport {
    let start = Instant::now();
    let report = ctx.health_check().await;
    log_command_execution("health::health_check", start.elapsed(), report.is_healthy);
    report
}
