//! Durable work queue for extraction work items.
//!
//! One queue message represents "extract using this configuration". The
//! queue is a competing-consumer channel: any number of workers drain it,
//! each message delivered to exactly one. Publishing uses persistent
//! delivery; consumers use manual acknowledgment with a prefetch of one.

pub mod amqp;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use amqp::{AmqpPublisher, AmqpQueue};

/// Wire shape of one extraction work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub crawl_config_id: i32,
}

impl WorkItem {
    pub fn new(crawl_config_id: i32) -> Self {
        Self { crawl_config_id }
    }

    pub fn to_payload(&self) -> Vec<u8> {
        // Serializing a struct of plain integers cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn from_payload(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Broker error: {0}")]
    Broker(#[from] lapin::Error),
    #[error("Malformed payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("Publish was not confirmed by the broker")]
    Unconfirmed,
}

/// Publish side of the work queue.
///
/// A trait seam so the dispatcher can be exercised without a live broker.
#[async_trait]
pub trait WorkPublisher: Send + Sync {
    /// Durably publish one work item. Returns only after the broker has
    /// confirmed the message.
    async fn publish(&self, item: WorkItem) -> Result<(), QueueError>;
}
