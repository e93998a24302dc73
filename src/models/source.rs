//! Data source model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A data source - typically a website that records are extracted from.
///
/// Sources are referenced by crawl configs and tasks. Deleting a source
/// never cascades into historical configs; orphaned configs become inert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    /// Unique identifier for this source.
    pub id: i32,
    /// Human-readable name.
    pub name: String,
    /// Root URL for the source.
    pub url: String,
    /// Free-form notes about the source.
    pub description: Option<String>,
    /// When the source was added.
    pub created_at: DateTime<Utc>,
}

/// Fields for a source that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewDataSource {
    pub name: String,
    pub url: String,
    pub description: Option<String>,
}

impl NewDataSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            description: None,
        }
    }
}
