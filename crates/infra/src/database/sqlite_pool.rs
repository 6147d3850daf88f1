//! SQLite connection pool
//!
//! r2d2 pool over `r2d2_sqlite`. Every connection handed out has the same
//! pragmas applied by the pool's init hook.

use std::path::Path;
use std::time::Duration;

use aura_domain::Result as DomainResult;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::{info, instrument, warn};

use crate::errors::InfraError;

/// Pool of SQLite connections
pub type SqlitePool = Pool<SqliteConnectionManager>;

/// Connection checked out of a [`SqlitePool`]
pub type SqliteConnection = PooledConnection<SqliteConnectionManager>;

/// SQLite pool configuration
#[derive(Debug, Clone)]
pub struct SqlitePoolConfig {
    /// Maximum number of connections in the pool
    pub max_size: u32,

    /// How long `get` waits for a free connection
    pub connection_timeout: Duration,

    /// Busy timeout for SQLite operations; keep it below the store timeout
    /// so a lock wait fails before the caller gives up
    pub busy_timeout: Duration,

    /// Enable WAL journal mode
    pub enable_wal: bool,

    /// Enable foreign key constraints
    pub enable_foreign_keys: bool,
}

impl Default for SqlitePoolConfig {
    fn default() -> Self {
        Self {
            max_size: 10,
            connection_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_millis(2500),
            enable_wal: true,
            enable_foreign_keys: true,
        }
    }
}

/// Build a pool for the database at `path`, creating the file if needed.
///
/// One connection is checked out before returning so a bad path fails here
/// rather than on first use.
#[instrument(fields(db_path = ?path, pool_size = config.max_size))]
pub fn create_sqlite_pool(path: &Path, config: &SqlitePoolConfig) -> DomainResult<SqlitePool> {
    let pragmas = config.clone();
    let manager = SqliteConnectionManager::file(path)
        .with_init(move |conn| apply_connection_pragmas(conn, &pragmas));

    let pool = Pool::builder()
        .max_size(config.max_size.max(1))
        .connection_timeout(config.connection_timeout)
        .build(manager)
        .map_err(|e| {
            warn!("Failed to create connection pool: {}", e);
            InfraError::from(e)
        })?;

    info!("SQLite pool created with {} connections", config.max_size.max(1));
    Ok(pool)
}

/// Apply connection-level pragmas
///
/// - WAL mode with automatic checkpoints
/// - NORMAL synchronous mode
/// - Foreign key constraints, which the weak event references rely on
/// - Busy timeout for lock contention between writers
pub fn apply_connection_pragmas(
    conn: &Connection,
    config: &SqlitePoolConfig,
) -> rusqlite::Result<()> {
    let mut pragma_sql = String::new();

    if config.enable_wal {
        pragma_sql.push_str("PRAGMA journal_mode=WAL;\n");
        pragma_sql.push_str("PRAGMA wal_autocheckpoint=1000;\n");
    }

    pragma_sql.push_str("PRAGMA synchronous=NORMAL;\n");

    if config.enable_foreign_keys {
        pragma_sql.push_str("PRAGMA foreign_keys=ON;\n");
    }

    conn.execute_batch(&pragma_sql)?;
    conn.busy_timeout(config.busy_timeout)
}
