//! Database connection pool.
//!
//! SQLite via diesel-async's `SyncConnectionWrapper`. The pool is
//! lightweight: connections are established on demand, which is the right
//! tradeoff for a file-backed database.

use std::path::Path;

use diesel::sqlite::SqliteConnection;
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;
use diesel_async::AsyncConnection;

/// Diesel error type alias.
pub type DieselError = diesel::result::Error;

/// Async SQLite connection type.
pub type SqliteConn = SyncConnectionWrapper<SqliteConnection>;

/// Connection pool (creates connections on demand).
#[derive(Clone)]
pub struct DbPool {
    database_url: String,
}

impl DbPool {
    /// Create a pool from a database URL.
    pub fn from_url(database_url: &str) -> Self {
        // Strip sqlite: prefix if present
        let url = database_url.strip_prefix("sqlite:").unwrap_or(database_url);
        Self {
            database_url: url.to_string(),
        }
    }

    /// Create a pool from a file path.
    pub fn from_path(path: &Path) -> Self {
        Self::from_url(&path.display().to_string())
    }

    /// Get a connection.
    pub async fn get(&self) -> Result<SqliteConn, DieselError> {
        let mut conn = SqliteConn::establish(&self.database_url)
            .await
            .map_err(to_diesel_error)?;

        // Independent row inserts from competing workers share this file;
        // give writers a grace period instead of failing on SQLITE_BUSY.
        use diesel_async::RunQueryDsl;
        diesel::sql_query("PRAGMA busy_timeout = 5000")
            .execute(&mut conn)
            .await?;

        Ok(conn)
    }

    /// Get the database URL.
    pub fn database_url(&self) -> &str {
        &self.database_url
    }
}

/// Convert a connection error into a Diesel error.
fn to_diesel_error<E: std::error::Error>(e: E) -> DieselError {
    DieselError::DatabaseError(
        diesel::result::DatabaseErrorKind::Unknown,
        Box::new(e.to_string()),
    )
}

/// Macro for running database operations on a pooled connection.
///
/// # Example
/// ```ignore
/// with_conn!(self.pool, conn, {
///     sources::table.load::<SourceRecord>(&mut conn).await
/// })
/// ```
#[macro_export]
macro_rules! with_conn {
    ($pool:expr, $conn:ident, $body:expr) => {{
        let mut $conn = $pool.get().await?;
        $body
    }};
}

#[allow(unused_imports)]
pub use with_conn;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_stripping() {
        assert_eq!(
            DbPool::from_url("sqlite:/path/to/db").database_url(),
            "/path/to/db"
        );
        assert_eq!(
            DbPool::from_url("/path/to/db.sqlite").database_url(),
            "/path/to/db.sqlite"
        );
    }
}
