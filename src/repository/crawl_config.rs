//! Versioned crawl config repository.
//!
//! The "at most one active config per (source, dataset)" invariant is
//! enforced by the standardizer's deactivate-then-insert transaction; this
//! repository provides the lookups used by the dispatcher and the worker.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::pool::{DbPool, DieselError};
use super::records::CrawlConfigRecord;
use super::parse_datetime;
use crate::models::{ConfigStatus, CrawlConfig, FieldSelectors};
use crate::schema::crawl_configs;
use crate::with_conn;

impl TryFrom<CrawlConfigRecord> for CrawlConfig {
    type Error = DieselError;

    fn try_from(record: CrawlConfigRecord) -> Result<Self, Self::Error> {
        let field_selectors: FieldSelectors = serde_json::from_str(&record.field_selectors)
            .map_err(|e| DieselError::DeserializationError(Box::new(e)))?;

        Ok(CrawlConfig {
            id: record.id,
            data_source_id: record.data_source_id,
            standard_dataset_id: record.standard_dataset_id,
            version: record.version,
            status: ConfigStatus::from_str(&record.status).unwrap_or(ConfigStatus::Inactive),
            list_item_selector: record.list_item_selector,
            detail_link_selector: record.detail_link_selector,
            field_selectors,
            created_at: parse_datetime(&record.created_at),
        })
    }
}

#[derive(Clone)]
pub struct CrawlConfigRepository {
    pool: DbPool,
}

impl CrawlConfigRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a config by ID.
    pub async fn get(&self, id: i32) -> Result<Option<CrawlConfig>, DieselError> {
        let record: Option<CrawlConfigRecord> = with_conn!(self.pool, conn, {
            crawl_configs::table
                .find(id)
                .first::<CrawlConfigRecord>(&mut conn)
                .await
                .optional()?
        });
        record.map(CrawlConfig::try_from).transpose()
    }

    /// Get the single active config for a (source, dataset) pair.
    ///
    /// Ordered by version descending as a defensive tie-break: the
    /// standardizer's transaction should make two active versions
    /// impossible, but if it ever happens the newest wins.
    pub async fn get_active(
        &self,
        data_source_id: i32,
        standard_dataset_id: i32,
    ) -> Result<Option<CrawlConfig>, DieselError> {
        let record: Option<CrawlConfigRecord> = with_conn!(self.pool, conn, {
            crawl_configs::table
                .filter(crawl_configs::data_source_id.eq(data_source_id))
                .filter(crawl_configs::standard_dataset_id.eq(standard_dataset_id))
                .filter(crawl_configs::status.eq(ConfigStatus::Active.as_str()))
                .order(crawl_configs::version.desc())
                .first::<CrawlConfigRecord>(&mut conn)
                .await
                .optional()?
        });
        record.map(CrawlConfig::try_from).transpose()
    }

    /// Get every config version for a (source, dataset) pair, newest first.
    pub async fn history(
        &self,
        data_source_id: i32,
        standard_dataset_id: i32,
    ) -> Result<Vec<CrawlConfig>, DieselError> {
        let records: Vec<CrawlConfigRecord> = with_conn!(self.pool, conn, {
            crawl_configs::table
                .filter(crawl_configs::data_source_id.eq(data_source_id))
                .filter(crawl_configs::standard_dataset_id.eq(standard_dataset_id))
                .order(crawl_configs::version.desc())
                .load::<CrawlConfigRecord>(&mut conn)
                .await?
        });
        records.into_iter().map(CrawlConfig::try_from).collect()
    }
}
