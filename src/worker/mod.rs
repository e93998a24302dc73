//! Extraction worker - a competing consumer on the durable work queue.
//!
//! Per message: parse the payload, resolve the config and its dataset and
//! source, render the source URL, evaluate the configured selectors and
//! persist the record through the schema registry. The message is
//! acknowledged only after the write succeeds; any failure before that
//! rejects it without requeue, since a permanently bad message would loop
//! forever otherwise.

use std::collections::HashMap;

use futures::StreamExt;
use thiserror::Error;
use tracing::{info, warn};

use crate::extract::extract_record;
use crate::queue::{AmqpQueue, QueueError, WorkItem};
use crate::render::{PageRenderer, RenderError};
use crate::repository::pool::DieselError;
use crate::repository::{
    CrawlConfigRepository, DatasetRepository, SchemaRegistry, SourceRepository, WriteOutcome,
};

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Malformed payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("Unknown crawl config id {0}")]
    UnknownConfig(i32),
    #[error("Config {config_id} references missing dataset {dataset_id}")]
    MissingDataset { config_id: i32, dataset_id: i32 },
    #[error("Config {config_id} references missing source {source_id}")]
    MissingSource { config_id: i32, source_id: i32 },
    #[error("Render failed: {0}")]
    Render(#[from] RenderError),
    #[error("Database error: {0}")]
    Db(#[from] DieselError),
}

pub struct ExtractionWorker {
    configs: CrawlConfigRepository,
    datasets: DatasetRepository,
    sources: SourceRepository,
    registry: SchemaRegistry,
    renderer: Box<dyn PageRenderer>,
}

impl ExtractionWorker {
    pub fn new(
        configs: CrawlConfigRepository,
        datasets: DatasetRepository,
        sources: SourceRepository,
        registry: SchemaRegistry,
        renderer: Box<dyn PageRenderer>,
    ) -> Self {
        Self {
            configs,
            datasets,
            sources,
            registry,
            renderer,
        }
    }

    /// Process one raw message payload end to end.
    ///
    /// Selector failures are isolated per field inside `extract_record`;
    /// everything else here is terminal for the message.
    pub async fn handle_payload(&self, payload: &[u8]) -> Result<WriteOutcome, WorkerError> {
        let item = WorkItem::from_payload(payload)?;

        let config = self
            .configs
            .get(item.crawl_config_id)
            .await?
            .ok_or(WorkerError::UnknownConfig(item.crawl_config_id))?;
        let dataset = self
            .datasets
            .get(config.standard_dataset_id)
            .await?
            .ok_or(WorkerError::MissingDataset {
                config_id: config.id,
                dataset_id: config.standard_dataset_id,
            })?;
        let source = self
            .sources
            .get(config.data_source_id)
            .await?
            .ok_or(WorkerError::MissingSource {
                config_id: config.id,
                source_id: config.data_source_id,
            })?;
        let fields = self.datasets.fields(dataset.id).await?;

        info!(
            config_id = config.id,
            version = config.version,
            source = %source.url,
            dataset = %dataset.name,
            "rendering source"
        );
        let html = self.renderer.render(&source.url).await?;

        let columns_by_field_id: HashMap<i32, String> = fields
            .iter()
            .map(|f| (f.id, f.column_name.clone()))
            .collect();
        let record = extract_record(&html, &config.field_selectors, &columns_by_field_id);

        let handle = self.registry.ensure_table(&dataset, &fields).await?;
        let outcome = self
            .registry
            .write(&handle, &record.columns, &record.extra)
            .await?;

        info!(
            config_id = config.id,
            table = handle.table_name(),
            fields = record.columns.len(),
            extras = record.extra.len(),
            "persisted extraction result"
        );
        Ok(outcome)
    }

    /// Consume the queue until the broker closes the stream.
    ///
    /// Prefetch is one unacknowledged message; manual ack after a
    /// successful write, nack without requeue on any processing error.
    pub async fn run(&self, queue: &AmqpQueue, consumer_tag: &str) -> Result<(), QueueError> {
        let mut consumer = queue.consume(consumer_tag).await?;
        info!(consumer_tag, "worker consuming");

        while let Some(delivery) = consumer.next().await {
            let delivery = delivery?;
            match self.handle_payload(&delivery.data).await {
                Ok(_) => queue.ack(&delivery).await?,
                Err(e) => {
                    warn!("rejecting message: {}", e);
                    queue.reject(&delivery).await?;
                }
            }
        }

        info!(consumer_tag, "consumer stream closed");
        Ok(())
    }
}
