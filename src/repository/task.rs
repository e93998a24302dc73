//! Crawl task repository.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::pool::{DbPool, DieselError};
use super::records::{CrawlTaskRecord, NewCrawlTaskRecord};
use super::{last_insert_rowid, parse_datetime};
use crate::models::{CrawlTask, TaskStatus};
use crate::schema::crawl_tasks;
use crate::with_conn;

impl TryFrom<CrawlTaskRecord> for CrawlTask {
    type Error = DieselError;

    fn try_from(record: CrawlTaskRecord) -> Result<Self, Self::Error> {
        // Source ids are stored as a JSON integer array.
        let data_source_ids: Vec<i32> = serde_json::from_str(&record.data_source_ids)
            .map_err(|e| DieselError::DeserializationError(Box::new(e)))?;

        Ok(CrawlTask {
            id: record.id,
            name: record.name,
            standard_dataset_id: record.standard_dataset_id,
            data_source_ids,
            schedule_cron: record.schedule_cron,
            status: TaskStatus::from_str(&record.status).unwrap_or(TaskStatus::Pending),
            created_at: parse_datetime(&record.created_at),
        })
    }
}

#[derive(Clone)]
pub struct TaskRepository {
    pool: DbPool,
}

impl TaskRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a task by ID.
    pub async fn get(&self, id: i32) -> Result<Option<CrawlTask>, DieselError> {
        let record: Option<CrawlTaskRecord> = with_conn!(self.pool, conn, {
            crawl_tasks::table
                .find(id)
                .first::<CrawlTaskRecord>(&mut conn)
                .await
                .optional()?
        });
        record.map(CrawlTask::try_from).transpose()
    }

    /// Get all tasks, newest first.
    pub async fn get_all(&self) -> Result<Vec<CrawlTask>, DieselError> {
        let records: Vec<CrawlTaskRecord> = with_conn!(self.pool, conn, {
            crawl_tasks::table
                .order(crawl_tasks::id.desc())
                .load::<CrawlTaskRecord>(&mut conn)
                .await?
        });
        records.into_iter().map(CrawlTask::try_from).collect()
    }

    /// Insert a new task in `pending` state, returning it with its id.
    pub async fn create(
        &self,
        name: &str,
        standard_dataset_id: i32,
        data_source_ids: &[i32],
        schedule_cron: Option<&str>,
    ) -> Result<CrawlTask, DieselError> {
        let ids_json = serde_json::to_string(data_source_ids)
            .map_err(|e| DieselError::SerializationError(Box::new(e)))?;
        let created_at = Utc::now().to_rfc3339();

        let id = with_conn!(self.pool, conn, {
            diesel::insert_into(crawl_tasks::table)
                .values(NewCrawlTaskRecord {
                    name,
                    standard_dataset_id,
                    data_source_ids: &ids_json,
                    schedule_cron,
                    status: TaskStatus::Pending.as_str(),
                    created_at: &created_at,
                })
                .execute(&mut conn)
                .await?;
            diesel::select(last_insert_rowid())
                .get_result::<i32>(&mut conn)
                .await?
        });

        Ok(CrawlTask {
            id,
            name: name.to_string(),
            standard_dataset_id,
            data_source_ids: data_source_ids.to_vec(),
            schedule_cron: schedule_cron.map(String::from),
            status: TaskStatus::Pending,
            created_at: parse_datetime(&created_at),
        })
    }

    /// Update a task's status.
    pub async fn update_status(&self, id: i32, status: TaskStatus) -> Result<(), DieselError> {
        with_conn!(self.pool, conn, {
            diesel::update(crawl_tasks::table.find(id))
                .set(crawl_tasks::status.eq(status.as_str()))
                .execute(&mut conn)
                .await?;
            Ok(())
        })
    }
}
