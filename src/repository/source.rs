//! Data source repository.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::pool::{DbPool, DieselError};
use super::records::{NewSourceRecord, SourceRecord};
use super::{last_insert_rowid, parse_datetime};
use crate::models::source::NewDataSource;
use crate::models::DataSource;
use crate::schema::sources;
use crate::with_conn;

impl From<SourceRecord> for DataSource {
    fn from(record: SourceRecord) -> Self {
        DataSource {
            id: record.id,
            name: record.name,
            url: record.url,
            description: record.description,
            created_at: parse_datetime(&record.created_at),
        }
    }
}

/// Diesel-based source repository.
#[derive(Clone)]
pub struct SourceRepository {
    pool: DbPool,
}

impl SourceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a source by ID.
    pub async fn get(&self, id: i32) -> Result<Option<DataSource>, DieselError> {
        with_conn!(self.pool, conn, {
            sources::table
                .find(id)
                .first::<SourceRecord>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(DataSource::from))
        })
    }

    /// Get all sources, newest first.
    pub async fn get_all(&self) -> Result<Vec<DataSource>, DieselError> {
        with_conn!(self.pool, conn, {
            sources::table
                .order(sources::id.desc())
                .load::<SourceRecord>(&mut conn)
                .await
                .map(|records| records.into_iter().map(DataSource::from).collect())
        })
    }

    /// Insert a new source, returning it with its generated id.
    pub async fn create(&self, source: &NewDataSource) -> Result<DataSource, DieselError> {
        let created_at = Utc::now().to_rfc3339();
        let id = with_conn!(self.pool, conn, {
            diesel::insert_into(sources::table)
                .values(NewSourceRecord {
                    name: &source.name,
                    url: &source.url,
                    description: source.description.as_deref(),
                    created_at: &created_at,
                })
                .execute(&mut conn)
                .await?;
            diesel::select(last_insert_rowid())
                .get_result::<i32>(&mut conn)
                .await?
        });

        Ok(DataSource {
            id,
            name: source.name.clone(),
            url: source.url.clone(),
            description: source.description.clone(),
            created_at: parse_datetime(&created_at),
        })
    }

    /// Delete a source. Historical configs referencing it are left in place
    /// (they become inert, never cascaded).
    pub async fn delete(&self, id: i32) -> Result<bool, DieselError> {
        let rows = with_conn!(self.pool, conn, {
            diesel::delete(sources::table.find(id))
                .execute(&mut conn)
                .await?
        });
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::setup_test_db;

    #[tokio::test]
    async fn test_source_crud() {
        let (pool, _dir) = setup_test_db().await;
        let repo = SourceRepository::new(pool);

        assert!(repo.get_all().await.unwrap().is_empty());

        let created = repo
            .create(&NewDataSource::new("Example Shop", "https://shop.example.com"))
            .await
            .unwrap();
        assert!(created.id > 0);

        let fetched = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Example Shop");
        assert_eq!(fetched.url, "https://shop.example.com");

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get(created.id).await.unwrap().is_none());
        assert!(!repo.delete(created.id).await.unwrap());
    }
}
