//! Command functions - the application's entry points
//!
//! Every command logs its outcome through
//! [`log_command_execution`](crate::utils::logging::log_command_execution).

mod calendar;
mod chat;
mod health;

use std::future::Future;
use std::time::Instant;

use aura_domain::Result;

pub use calendar::*;
pub use chat::*;
pub use health::*;

use crate::utils::logging::{log_command_error, log_command_execution};

/// Await a fallible command body and log its outcome.
async fn run_logged<T, F>(command: &str, body: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let start = Instant::now();
    let result = body.await;
    match &result {
        Ok(_) => log_command_execution(command, start.elapsed(), true),
        Err(err) => log_command_error(command, start.elapsed(), err),
    }
    result
}
