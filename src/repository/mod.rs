//! Repository layer for database persistence.
//!
//! All catalog access uses Diesel with compile-time query checking; the
//! dynamically provisioned dataset storage tables go through the schema
//! registry, which generates its SQL with sea-query.

pub mod analysis;
pub mod crawl_config;
pub mod dataset;
pub mod migrations;
pub mod pool;
pub mod records;
pub mod registry;
pub mod source;
pub mod task;

pub use analysis::AnalysisRepository;
pub use crawl_config::CrawlConfigRepository;
pub use dataset::DatasetRepository;
pub use pool::{DbPool, DieselError};
pub use registry::{SchemaRegistry, TableHandle, WriteOutcome};
pub use source::SourceRepository;
pub use task::TaskRepository;

use chrono::{DateTime, Utc};

// SQLite rowid of the most recent insert on this connection. Used to read
// back generated primary keys inside a transaction.
diesel::define_sql_function! {
    fn last_insert_rowid() -> diesel::sql_types::Integer;
}

/// Bundled repository access for all database operations.
///
/// Constructed via [`crate::config::Settings::repositories()`] to eliminate
/// repetitive pool plumbing in CLI commands.
pub struct Repositories {
    pub sources: SourceRepository,
    pub datasets: DatasetRepository,
    pub configs: CrawlConfigRepository,
    pub tasks: TaskRepository,
    pub analysis: AnalysisRepository,
    pub registry: SchemaRegistry,
    pool: DbPool,
}

impl Repositories {
    pub fn new(pool: DbPool) -> Self {
        Self {
            sources: SourceRepository::new(pool.clone()),
            datasets: DatasetRepository::new(pool.clone()),
            configs: CrawlConfigRepository::new(pool.clone()),
            tasks: TaskRepository::new(pool.clone()),
            analysis: AnalysisRepository::new(pool.clone()),
            registry: SchemaRegistry::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Parse a datetime string from the database, defaulting to Unix epoch on error.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Parse an optional datetime string from the database.
pub fn parse_datetime_opt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::pool::DbPool;
    use tempfile::TempDir;

    /// Create a migrated scratch database in a temp directory.
    pub async fn setup_test_db() -> (DbPool, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite:{}", db_path.display());
        super::migrations::run_migrations(&url).await.unwrap();
        (DbPool::from_path(&db_path), dir)
    }
}
