//! Crawl task model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a crawl task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created but not yet accepted by the work queue.
    Pending,
    /// Dispatch has been accepted by the queue.
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// A user-initiated crawl job over one dataset and a set of sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlTask {
    pub id: i32,
    pub name: String,
    pub standard_dataset_id: i32,
    /// Sources this task fans out to.
    pub data_source_ids: Vec<i32>,
    /// Optional CRON expression for recurring execution (stored; scheduling
    /// itself is handled externally).
    pub schedule_cron: Option<String>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}
