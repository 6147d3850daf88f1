use std::time::Duration;

use aura_domain::AuraError;
use tracing::{info, warn};

/// Log the outcome of a command execution with structured fields.
///
/// # Parameters
/// * `command` - Logical command identifier (e.g. `"calendar::create_event"`).
/// * `elapsed` - Duration the command execution took.
/// * `success` - Whether the command completed successfully.
///
/// Callers must avoid forwarding message text or other user content in
/// `command`.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, success: bool) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    if success {
        info!(command, duration_ms, "command_execution_success");
    } else {
        warn!(command, duration_ms, "command_execution_failure");
    }
}

/// Log a failed command together with its error label.
#[inline]
pub fn log_command_error(command: &str, elapsed: Duration, error: &AuraError) {
    log_command_execution(command, elapsed, false);
    warn!(command, error_type = error_label(error), error = %error, "command_error");
}

/// Convert an `AuraError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &AuraError) -> &'static str {
    match error {
        AuraError::Validation(_) => "validation",
        AuraError::NotFound(_) => "not_found",
        AuraError::Database(_) => "database",
        AuraError::Timeout(_) => "timeout",
        AuraError::External(_) => "external",
        AuraError::Network(_) => "network",
        AuraError::Config(_) => "config",
        AuraError::Internal(_) => "internal",
    }
}
