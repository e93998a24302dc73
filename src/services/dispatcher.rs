//! Task dispatcher - fans a crawl task out onto the work queue.
//!
//! One durable message per (source, active config) pair. A source without
//! an active config is a gap, not an error: it is logged and skipped so the
//! rest of the batch still dispatches. Dispatch is not transactional across
//! sources; only each message's durable publish is guaranteed.

use thiserror::Error;
use tracing::{info, warn};

use crate::models::{CrawlTask, TaskStatus};
use crate::queue::{QueueError, WorkItem, WorkPublisher};
use crate::repository::pool::DieselError;
use crate::repository::{CrawlConfigRepository, TaskRepository};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Database error: {0}")]
    Db(#[from] DieselError),
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}

/// What one dispatch call actually enqueued.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub task_id: i32,
    /// (source id, config id) pairs with a message on the queue.
    pub enqueued: Vec<(i32, i32)>,
    /// Source ids skipped for lack of an active config.
    pub skipped: Vec<i32>,
}

pub struct TaskDispatcher {
    configs: CrawlConfigRepository,
    tasks: TaskRepository,
}

impl TaskDispatcher {
    pub fn new(configs: CrawlConfigRepository, tasks: TaskRepository) -> Self {
        Self { configs, tasks }
    }

    /// Dispatch a task: resolve the active config per source and publish one
    /// work item per resolved pair.
    ///
    /// The task moves to `in_progress` once every source has been processed,
    /// even when all of them were skipped for lack of a config. A publish
    /// failure before anything was enqueued leaves the status at `pending`
    /// so the caller can retry; a failure mid-loop leaves the
    /// already-enqueued messages in place (not rolled back) and the task
    /// `in_progress`.
    pub async fn dispatch(
        &self,
        task: &CrawlTask,
        publisher: &dyn WorkPublisher,
    ) -> Result<DispatchReport, DispatchError> {
        let mut report = DispatchReport {
            task_id: task.id,
            enqueued: Vec::new(),
            skipped: Vec::new(),
        };

        let mut publish_error = None;
        for &source_id in &task.data_source_ids {
            let config = self
                .configs
                .get_active(source_id, task.standard_dataset_id)
                .await?;
            let Some(config) = config else {
                warn!(
                    task_id = task.id,
                    data_source_id = source_id,
                    standard_dataset_id = task.standard_dataset_id,
                    "no active config for source; skipping"
                );
                report.skipped.push(source_id);
                continue;
            };

            match publisher.publish(WorkItem::new(config.id)).await {
                Ok(()) => report.enqueued.push((source_id, config.id)),
                Err(e) => {
                    // Broker trouble affects every remaining publish too;
                    // stop the loop rather than hammering a dead connection.
                    publish_error = Some(e);
                    break;
                }
            }
        }

        // Processed-to-completion (gaps included) or partially enqueued:
        // either way the task has left `pending`. Only a publish failure
        // with nothing on the queue leaves it retryable.
        if publish_error.is_none() || !report.enqueued.is_empty() {
            self.tasks
                .update_status(task.id, TaskStatus::InProgress)
                .await?;
        }

        if let Some(e) = publish_error {
            return Err(e.into());
        }

        info!(
            task_id = task.id,
            enqueued = report.enqueued.len(),
            skipped = report.skipped.len(),
            "dispatched task"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewDataSource;
    use crate::repository::test_support::setup_test_db;
    use crate::repository::{DatasetRepository, DbPool, SourceRepository};
    use crate::services::standardizer::{
        NamedMapping, ProposedFieldSpec, SourceConfigRequest, StandardizeRequest,
        ThemeStandardizer,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPublisher {
        items: Mutex<Vec<WorkItem>>,
        fail: bool,
    }

    #[async_trait]
    impl WorkPublisher for RecordingPublisher {
        async fn publish(&self, item: WorkItem) -> Result<(), QueueError> {
            if self.fail {
                return Err(QueueError::Unconfirmed);
            }
            self.items.lock().unwrap().push(item);
            Ok(())
        }
    }

    async fn seed_sources(pool: &DbPool, count: usize) -> Vec<i32> {
        let repo = SourceRepository::new(pool.clone());
        let mut ids = Vec::new();
        for i in 0..count {
            let source = repo
                .create(&NewDataSource::new(
                    format!("Source {i}"),
                    format!("https://example-{i}.com"),
                ))
                .await
                .unwrap();
            ids.push(source.id);
        }
        ids
    }

    /// Standardize "Articles" with a title mapping for the given sources.
    async fn standardize_for(pool: &DbPool, source_ids: &[i32]) -> i32 {
        let standardizer = ThemeStandardizer::new(pool.clone());
        standardizer
            .standardize(&StandardizeRequest {
                theme_name: "Articles".to_string(),
                description: None,
                fields: vec![ProposedFieldSpec {
                    field_name: "title".to_string(),
                    data_type: Default::default(),
                    description: None,
                }],
                source_configs: source_ids
                    .iter()
                    .map(|&id| SourceConfigRequest {
                        data_source_id: id,
                        field_mappings: vec![NamedMapping {
                            field_name: "title".to_string(),
                            selector: "h1".to_string(),
                        }],
                        extra_fields: vec![],
                        list_item_selector: None,
                        detail_link_selector: None,
                    })
                    .collect(),
            })
            .await
            .unwrap();
        DatasetRepository::new(pool.clone())
            .get_by_name("Articles")
            .await
            .unwrap()
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_gaps_skipped_task_still_dispatches() {
        let (pool, _dir) = setup_test_db().await;
        let sources = seed_sources(&pool, 3).await;
        // Only the first two sources get active configs
        let dataset_id = standardize_for(&pool, &sources[..2]).await;

        let tasks = TaskRepository::new(pool.clone());
        let task = tasks
            .create("articles run", dataset_id, &sources, None)
            .await
            .unwrap();

        let publisher = RecordingPublisher::default();
        let dispatcher =
            TaskDispatcher::new(CrawlConfigRepository::new(pool.clone()), tasks.clone());
        let report = dispatcher.dispatch(&task, &publisher).await.unwrap();

        assert_eq!(report.enqueued.len(), 2);
        assert_eq!(report.skipped, vec![sources[2]]);
        assert_eq!(publisher.items.lock().unwrap().len(), 2);

        let task = tasks.get(task.id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
    }

    #[tokio::test]
    async fn test_all_sources_without_configs_still_transitions() {
        let (pool, _dir) = setup_test_db().await;
        let sources = seed_sources(&pool, 2).await;
        // Dataset exists but no source has an active config for it
        let dataset_id = standardize_for(&pool, &[]).await;

        let tasks = TaskRepository::new(pool.clone());
        let task = tasks
            .create("articles run", dataset_id, &sources, None)
            .await
            .unwrap();

        let publisher = RecordingPublisher::default();
        let dispatcher =
            TaskDispatcher::new(CrawlConfigRepository::new(pool.clone()), tasks.clone());
        let report = dispatcher.dispatch(&task, &publisher).await.unwrap();

        assert!(report.enqueued.is_empty());
        assert_eq!(report.skipped, sources);
        assert!(publisher.items.lock().unwrap().is_empty());

        // Every source was processed, so the task is no longer pending
        let task = tasks.get(task.id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
    }

    #[tokio::test]
    async fn test_broker_failure_leaves_task_pending() {
        let (pool, _dir) = setup_test_db().await;
        let sources = seed_sources(&pool, 1).await;
        let dataset_id = standardize_for(&pool, &sources).await;

        let tasks = TaskRepository::new(pool.clone());
        let task = tasks
            .create("articles run", dataset_id, &sources, None)
            .await
            .unwrap();

        let publisher = RecordingPublisher {
            fail: true,
            ..Default::default()
        };
        let dispatcher =
            TaskDispatcher::new(CrawlConfigRepository::new(pool.clone()), tasks.clone());
        assert!(dispatcher.dispatch(&task, &publisher).await.is_err());

        // Nothing reached the queue, so the caller may retry later
        let task = tasks.get(task.id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
    }
}
