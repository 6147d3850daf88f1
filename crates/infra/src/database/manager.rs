//! Database connection manager backed by the SQLite pool.

use std::path::{Path, PathBuf};
use std::time::Duration;

use aura_domain::{AuraError, Result};
use rusqlite::params;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::sqlite_pool::{create_sqlite_pool, SqliteConnection, SqlitePool, SqlitePoolConfig};
use crate::errors::InfraError;

const SCHEMA_VERSION: i32 = 1;
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Row counts of the persisted tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStats {
    pub events: u64,
    pub memories: u64,
    pub conversation_turns: u64,
}

/// Database manager that wraps an r2d2 [`SqlitePool`].
pub struct DbManager {
    pool: SqlitePool,
    path: PathBuf,
    busy_timeout: Duration,
}

impl DbManager {
    /// Create a new manager with the given pool size.
    pub fn new<P: AsRef<Path>>(db_path: P, pool_size: u32) -> Result<Self> {
        let config = SqlitePoolConfig { max_size: pool_size.max(1), ..SqlitePoolConfig::default() };
        Self::with_config(db_path, config)
    }

    /// Create a new manager with an explicit pool configuration.
    pub fn with_config<P: AsRef<Path>>(db_path: P, config: SqlitePoolConfig) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| {
                AuraError::Database(format!(
                    "cannot create database directory {}: {err}",
                    parent.display()
                ))
            })?;
        }

        let pool = create_sqlite_pool(&path, &config)?;

        info!(
            db_path = %path.display(),
            max_connections = pool.max_size(),
            busy_timeout_ms = config.busy_timeout.as_millis() as u64,
            "sqlite pool initialised"
        );

        Ok(Self { pool, path, busy_timeout: config.busy_timeout })
    }

    /// Acquire a connection from the pool.
    pub fn get_connection(&self) -> Result<SqliteConnection> {
        self.pool.get().map_err(|err| InfraError::from(err).into())
    }

    /// Acquire a connection, waiting at most `timeout` for one to free up.
    pub fn get_connection_within(&self, timeout: Duration) -> Result<SqliteConnection> {
        self.pool.get_timeout(timeout).map_err(|err| InfraError::from(err).into())
    }

    /// Busy timeout every pooled connection starts with.
    pub const fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }

    /// Ensure the full schema exists on the current database.
    #[instrument(skip(self), fields(db_path = %self.path.display()))]
    pub fn run_migrations(&self) -> Result<()> {
        let conn = self.get_connection()?;
        create_schema(&conn)?;
        info!(version = SCHEMA_VERSION, "schema ready");
        Ok(())
    }

    /// Return the configured database path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Perform a health check to verify database connectivity.
    ///
    /// This method acquires a connection from the pool and executes a simple
    /// query to verify the database is accessible and responding.
    pub fn health_check(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.query_row("SELECT 1", params![], |row| row.get::<_, i32>(0))
            .map_err(map_sql_error)?;
        Ok(())
    }

    /// Row counts for the events, memory and conversation tables.
    pub fn table_stats(&self) -> Result<TableStats> {
        let conn = self.get_connection()?;
        Ok(TableStats {
            events: count_rows(&conn, "events")?,
            memories: count_rows(&conn, "memory")?,
            conversation_turns: count_rows(&conn, "conversation_history")?,
        })
    }
}

fn create_schema(conn: &SqliteConnection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL).map_err(map_sql_error)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?, CAST(strftime('%s','now') AS INTEGER))",
        params![SCHEMA_VERSION],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

/// `table` is always one of the fixed names above.
fn count_rows(conn: &SqliteConnection, table: &str) -> Result<u64> {
    let count: i64 = conn
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), params![], |row| row.get(0))
        .map_err(map_sql_error)?;
    u64::try_from(count).map_err(|_| AuraError::Database(format!("negative row count for {table}")))
}

fn map_sql_error(err: rusqlite::Error) -> AuraError {
    AuraError::from(InfraError::from(err))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn migrations_create_schema_version() {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db_path = temp_dir.path().join("test.db");

        let manager = DbManager::new(&db_path, 4).expect("manager created");
        manager.run_migrations().expect("migrations run");

        let conn = manager.get_connection().expect("connection acquired");
        let version: i32 =
            conn.query_row("SELECT version FROM schema_version", [], |row| row.get(0)).unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn migrations_are_idempotent() {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db_path = temp_dir.path().join("test.db");

        let manager = DbManager::new(&db_path, 2).expect("manager created");
        manager.run_migrations().expect("first run");
        manager.run_migrations().expect("second run");

        let conn = manager.get_connection().expect("connection acquired");
        let rows: i64 =
            conn.query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0)).unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn health_check_succeeds_for_valid_database() {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db_path = temp_dir.path().join("test.db");

        let manager = DbManager::new(&db_path, 4).expect("manager created");
        manager.run_migrations().expect("migrations run");

        manager.health_check().expect("health check passed");
        assert_eq!(manager.path(), db_path.as_path());
    }

    #[test]
    fn pool_config_busy_timeout_reaches_connections() {
        let temp_dir = TempDir::new().expect("temp dir created");
        let config =
            SqlitePoolConfig { busy_timeout: Duration::from_millis(750), ..SqlitePoolConfig::default() };
        let manager =
            DbManager::with_config(temp_dir.path().join("test.db"), config).expect("manager created");

        let conn = manager.get_connection_within(Duration::from_secs(1)).expect("connection");
        let busy: i64 = conn.pragma_query_value(None, "busy_timeout", |row| row.get(0)).unwrap();
        assert_eq!(busy, 750);
        assert_eq!(manager.busy_timeout(), Duration::from_millis(750));
    }

    #[test]
    fn table_stats_start_at_zero() {
        let temp_dir = TempDir::new().expect("temp dir created");
        let manager = DbManager::new(temp_dir.path().join("test.db"), 2).expect("manager created");
        manager.run_migrations().expect("migrations run");

        assert_eq!(manager.table_stats().expect("stats"), TableStats::default());
    }

    #[test]
    fn table_stats_fail_before_migrations() {
        let temp_dir = TempDir::new().expect("temp dir created");
        let manager = DbManager::new(temp_dir.path().join("test.db"), 2).expect("manager created");

        assert!(matches!(manager.table_stats(), Err(AuraError::Database(_))));
    }

    #[test]
    fn schema_rejects_inverted_interval() {
        let temp_dir = TempDir::new().expect("temp dir created");
        let manager = DbManager::new(temp_dir.path().join("test.db"), 2).expect("manager created");
        manager.run_migrations().expect("migrations run");

        let conn = manager.get_connection().expect("connection acquired");
        let err = conn
            .execute(
                "INSERT INTO events (title, start_time, end_time, created_at) VALUES ('x', 10, 5, 0)",
                [],
            )
            .unwrap_err();
        assert!(matches!(map_sql_error(err), AuraError::Validation(_)));
    }
}
