//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `AURA_DB_PATH` is missing, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Whatever the source, the result is validated before it is returned.
//!
//! ## Environment Variables
//! - `AURA_DB_PATH`: Database file path (required for the environment path)
//! - `AURA_DB_POOL_SIZE`: Connection pool size
//! - `AURA_STORE_TIMEOUT_MS`: Upper bound for one event store call
//! - `AURA_LLM_API_KEY`: API key (falls back to `OPENAI_API_KEY`)
//! - `AURA_LLM_ENABLED`: Whether remote collaborators are used (true/false)
//! - `AURA_LLM_BASE_URL`: OpenAI-compatible endpoint
//! - `AURA_LLM_MODEL`: Chat model
//! - `AURA_EMBEDDING_MODEL`: Embedding model
//! - `AURA_EMBEDDING_DIMENSION`: Embedding vector length
//! - `AURA_LEDGER_CAPACITY`: Turns kept in memory per session
//! - `AURA_HISTORY_WINDOW`: Turns passed to the intent classifier
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.{json,toml}` then `./aura.{json,toml}` (current working
//!    directory)
//! 2. `../config.{json,toml}` and `../../config.{json,toml}`
//! 3. The same names relative to the executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use aura_domain::{AuraError, Config, Result};

const CONFIG_FILE_NAMES: [&str; 8] = [
    "config.json",
    "config.toml",
    "aura.json",
    "aura.toml",
    "../config.json",
    "../config.toml",
    "../../config.json",
    "../../config.toml",
];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If that fails, falls
/// back to loading from a config file.
///
/// # Errors
/// Returns `AuraError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - A value fails validation
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `AURA_DB_PATH` is required; every other setting keeps its default
/// when its variable is unset.
///
/// # Errors
/// Returns `AuraError::Config` if the database path is missing or a value
/// cannot be parsed.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.database.path = env_var("AURA_DB_PATH")?;
    if let Some(pool_size) = env_parse("AURA_DB_POOL_SIZE", "pool size")? {
        config.database.pool_size = pool_size;
    }
    if let Some(timeout) = env_parse("AURA_STORE_TIMEOUT_MS", "store timeout")? {
        config.database.store_timeout_ms = timeout;
    }

    config.llm.api_key = env_optional("AURA_LLM_API_KEY").or_else(|| env_optional("OPENAI_API_KEY"));
    config.llm.enabled = env_bool("AURA_LLM_ENABLED", config.llm.enabled);
    if let Some(base_url) = env_optional("AURA_LLM_BASE_URL") {
        config.llm.base_url = base_url;
    }
    if let Some(model) = env_optional("AURA_LLM_MODEL") {
        config.llm.chat_model = model;
    }
    if let Some(model) = env_optional("AURA_EMBEDDING_MODEL") {
        config.llm.embedding_model = model;
    }

    if let Some(dimension) = env_parse("AURA_EMBEDDING_DIMENSION", "embedding dimension")? {
        config.embedding.dimension = dimension;
    }
    if let Some(capacity) = env_parse("AURA_LEDGER_CAPACITY", "ledger capacity")? {
        config.assistant.ledger_capacity = capacity;
    }
    if let Some(window) = env_parse("AURA_HISTORY_WINDOW", "history window")? {
        config.assistant.history_window = window;
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
/// The API key may live in the environment rather than the file.
///
/// # Errors
/// Returns `AuraError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - A value fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(AuraError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            AuraError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| AuraError::Config(format!("Failed to read config file: {}", e)))?;

    let mut config = parse_config(&contents, &config_path)?;
    if config.llm.api_key.is_none() {
        config.llm.api_key =
            env_optional("AURA_LLM_API_KEY").or_else(|| env_optional("OPENAI_API_KEY"));
    }

    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `AuraError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| AuraError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| AuraError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(AuraError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    probe_in(&roots)
}

fn probe_in(roots: &[PathBuf]) -> Option<PathBuf> {
    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `AuraError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| AuraError::Config(format!("Missing required environment variable: {}", key)))
}

/// Optional variable; blank values count as unset.
fn env_optional(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn env_parse<T>(key: &str, what: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_optional(key)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| AuraError::Config(format!("Invalid {}: {}", what, e)))
        })
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
///
/// # Returns
/// The parsed boolean value, or `default` if not set.
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::TempDir;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const AURA_VARS: [&str; 12] = [
        "AURA_DB_PATH",
        "AURA_DB_POOL_SIZE",
        "AURA_STORE_TIMEOUT_MS",
        "AURA_LLM_API_KEY",
        "OPENAI_API_KEY",
        "AURA_LLM_ENABLED",
        "AURA_LLM_BASE_URL",
        "AURA_LLM_MODEL",
        "AURA_EMBEDDING_MODEL",
        "AURA_EMBEDDING_DIMENSION",
        "AURA_LEDGER_CAPACITY",
        "AURA_HISTORY_WINDOW",
    ];

    fn clear_env() {
        for key in AURA_VARS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        for value in ["1", "true", "yes", "on", "TRUE"] {
            std::env::set_var("TEST_AURA_BOOL", value);
            assert!(env_bool("TEST_AURA_BOOL", false), "{value} should be true");
        }
        for value in ["0", "false", "no", "off"] {
            std::env::set_var("TEST_AURA_BOOL", value);
            assert!(!env_bool("TEST_AURA_BOOL", true), "{value} should be false");
        }

        std::env::remove_var("TEST_AURA_BOOL");
        assert!(env_bool("TEST_AURA_BOOL", true));
        assert!(!env_bool("TEST_AURA_BOOL", false));
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("AURA_DB_PATH", "/tmp/aura-test.db");
        std::env::set_var("AURA_DB_POOL_SIZE", "4");
        std::env::set_var("AURA_STORE_TIMEOUT_MS", "1500");
        std::env::set_var("AURA_LLM_API_KEY", "sk-aura");
        std::env::set_var("AURA_LLM_ENABLED", "on");
        std::env::set_var("AURA_LLM_BASE_URL", "http://localhost:8080/v1");
        std::env::set_var("AURA_LLM_MODEL", "local-chat");
        std::env::set_var("AURA_EMBEDDING_MODEL", "local-embed");
        std::env::set_var("AURA_EMBEDDING_DIMENSION", "384");
        std::env::set_var("AURA_LEDGER_CAPACITY", "20");
        std::env::set_var("AURA_HISTORY_WINDOW", "3");

        let result = load_from_env();
        clear_env();

        let config = result.expect("config from env");
        assert_eq!(config.database.path, "/tmp/aura-test.db");
        assert_eq!(config.database.pool_size, 4);
        assert_eq!(config.database.store_timeout_ms, 1500);
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-aura"));
        assert!(config.llm.is_usable());
        assert_eq!(config.llm.base_url, "http://localhost:8080/v1");
        assert_eq!(config.llm.chat_model, "local-chat");
        assert_eq!(config.llm.embedding_model, "local-embed");
        assert_eq!(config.embedding.dimension, 384);
        assert_eq!(config.assistant.ledger_capacity, 20);
        assert_eq!(config.assistant.history_window, 3);
    }

    #[test]
    fn test_load_from_env_uses_defaults_and_openai_key_fallback() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("AURA_DB_PATH", "aura.db");
        std::env::set_var("OPENAI_API_KEY", "sk-openai");

        let result = load_from_env();
        clear_env();

        let config = result.expect("config from env");
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-openai"));
        assert_eq!(config.database.pool_size, Config::default().database.pool_size);
        assert_eq!(config.embedding.dimension, 1536);
    }

    #[test]
    fn test_load_from_env_missing_db_path() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let result = load_from_env();
        assert!(matches!(result, Err(AuraError::Config(_))), "Should be a Config error");
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("AURA_DB_PATH", "/tmp/test.db");
        std::env::set_var("AURA_DB_POOL_SIZE", "not-a-number");

        let result = load_from_env();
        clear_env();

        assert!(matches!(result, Err(AuraError::Config(msg)) if msg.contains("pool size")));
    }

    #[test]
    fn test_load_from_env_rejects_zero_dimension() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("AURA_DB_PATH", "/tmp/test.db");
        std::env::set_var("AURA_EMBEDDING_DIMENSION", "0");

        let result = load_from_env();
        clear_env();

        assert!(matches!(result, Err(AuraError::Config(_))));
    }

    #[test]
    fn test_load_from_file_json() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("aura.json");
        std::fs::write(
            &path,
            r#"{
                "database": { "path": "test.db", "pool_size": 4 },
                "llm": { "enabled": false, "chat_model": "gpt-4o" },
                "assistant": { "ledger_capacity": 10 }
            }"#,
        )
        .unwrap();

        let config = load_from_file(Some(path)).expect("config from JSON");
        assert_eq!(config.database.path, "test.db");
        assert_eq!(config.database.pool_size, 4);
        assert!(!config.llm.enabled);
        assert_eq!(config.llm.chat_model, "gpt-4o");
        assert_eq!(config.assistant.ledger_capacity, 10);
        assert_eq!(config.assistant.history_window, 5);
    }

    #[test]
    fn test_load_from_file_toml_takes_key_from_env() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("AURA_LLM_API_KEY", "sk-from-env");

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[database]
path = "test.db"
pool_size = 6

[embedding]
dimension = 256
"#,
        )
        .unwrap();

        let result = load_from_file(Some(path));
        clear_env();

        let config = result.expect("config from TOML");
        assert_eq!(config.database.pool_size, 6);
        assert_eq!(config.embedding.dimension, 256);
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-from-env"));
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/config.json")));
        assert!(matches!(result, Err(AuraError::Config(_))), "Should be a Config error");
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "this is": "not valid json" "#).unwrap();

        let result = load_from_file(Some(path));
        assert!(matches!(result, Err(AuraError::Config(msg)) if msg.contains("JSON")));
    }

    #[test]
    fn test_probe_prefers_config_over_aura_name() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("aura.toml"), "").unwrap();
        assert_eq!(probe_in(&[dir.path().to_path_buf()]), Some(dir.path().join("aura.toml")));

        std::fs::write(dir.path().join("config.json"), "{}").unwrap();
        assert_eq!(probe_in(&[dir.path().to_path_buf()]), Some(dir.path().join("config.json")));
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("some content", &PathBuf::from("test.yaml"));
        assert!(result.is_err(), "Should fail with unsupported format");
    }
}
