//! Aura - conversational calendar assistant
//!
//! Terminal front end: one line in, one reply out. Logs go to stderr so the
//! conversation on stdout stays readable.

use anyhow::{Context, Result};
use aura_domain::constants::DEFAULT_SESSION_ID;
use aura_domain::Config;
use aura_lib::AppContext;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const HISTORY_LIMIT: usize = 10;

const HELP: &str = "commands: /history  /clear  /health  /quit";

fn init_tracing() {
    let filter = EnvFilter::try_from_env("AURA_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let json = std::env::var("AURA_LOG_FORMAT").is_ok_and(|format| format == "json");
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        registry.with(fmt::layer().with_target(false).with_writer(std::io::stderr)).init();
    }
}

/// Environment or config file; plain defaults when neither exists.
fn load_config() -> Result<Config> {
    match aura_infra::config::load() {
        Ok(config) => Ok(config),
        Err(err) if aura_infra::config::probe_config_paths().is_none() => {
            tracing::warn!(error = %err, "no configuration found; using defaults");
            let mut config = Config::default();
            config.llm.api_key = std::env::var("OPENAI_API_KEY").ok();
            config.validate()?;
            Ok(config)
        }
        Err(err) => Err(err).context("invalid configuration"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();
    init_tracing();
    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    let config = load_config()?;
    let ctx = AppContext::new_with_config(config).context("failed to start Aura")?;
    let session_id =
        std::env::var("AURA_SESSION").unwrap_or_else(|_| DEFAULT_SESSION_ID.to_string());

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout.write_all(format!("Aura is ready. {HELP}\n> ").as_bytes()).await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        let output = match input {
            "" => String::new(),
            "/quit" | "/exit" => break,
            "/help" => HELP.to_string(),
            "/clear" => {
                aura_lib::clear_history(&ctx, &session_id).await;
                "History cleared.".to_string()
            }
            "/history" => {
                let turns = aura_lib::conversation_history(&ctx, &session_id, HISTORY_LIMIT)
                    .await
                    .context("failed to read history")?;
                turns
                    .iter()
                    .map(|turn| {
                        format!(
                            "[{}] you: {}\n      aura: {}",
                            turn.timestamp.format("%Y-%m-%d %H:%M"),
                            turn.user_message,
                            turn.bot_response
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            "/health" => {
                let report = aura_lib::health_check(&ctx).await;
                serde_json::to_string_pretty(&report)?
            }
            message => aura_lib::process_message(&ctx, &session_id, message).await.response_text,
        };

        if !output.is_empty() {
            stdout.write_all(output.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
    }

    tracing::info!("Aura shutting down");
    Ok(())
}
