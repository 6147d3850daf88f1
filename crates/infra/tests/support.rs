use std::sync::Arc;

use aura_infra::database::{
    DbManager, SqliteConversationRepository, SqliteEventRepository, SqliteMemoryRepository,
};
use tempfile::TempDir;

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    /// Create a new temporary database with the schema applied.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("infra-integration.db");

        let manager = DbManager::new(&db_path, 4).expect("db manager should be created");
        manager.run_migrations().expect("schema migrations should apply");

        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }

    pub fn events(&self) -> SqliteEventRepository {
        SqliteEventRepository::new(Arc::clone(&self.manager))
    }

    pub fn memories(&self) -> SqliteMemoryRepository {
        SqliteMemoryRepository::new(Arc::clone(&self.manager))
    }

    pub fn conversations(&self) -> SqliteConversationRepository {
        SqliteConversationRepository::new(Arc::clone(&self.manager))
    }

    /// Execute a single-value query against the database.
    pub fn query_i64(&self, sql: &str) -> Option<i64> {
        let conn = self.manager.get_connection().expect("connection should be available");
        conn.query_row(sql, [], |row| row.get(0)).expect("query should succeed")
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}
