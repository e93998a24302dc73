//! Versioned per-source crawl configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a crawl config.
///
/// At most one config is `Active` per (source, dataset) pair at any time;
/// publishing a new version atomically deactivates the prior one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigStatus {
    Active,
    Inactive,
}

impl ConfigStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

/// A selector bound to a field in the dataset's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub standard_field_id: i32,
    pub selector: String,
}

/// A free-form selector not bound to the catalog.
///
/// Extracted values land in the record's `extra_data` bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraField {
    pub field_name: String,
    pub selector: String,
}

/// The persisted field-selector mapping of a crawl config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelectors {
    #[serde(default)]
    pub mappings: Vec<FieldMapping>,
    #[serde(default)]
    pub extra_fields: Vec<ExtraField>,
}

impl FieldSelectors {
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty() && self.extra_fields.is_empty()
    }
}

/// A versioned crawl configuration for one (source, dataset) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    pub id: i32,
    pub data_source_id: i32,
    pub standard_dataset_id: i32,
    pub version: i32,
    pub status: ConfigStatus,
    /// Optional selector for list-page items (stored, not interpreted by
    /// the extraction worker).
    pub list_item_selector: Option<String>,
    /// Optional selector for detail-page links within a list item.
    pub detail_link_selector: Option<String>,
    pub field_selectors: FieldSelectors,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_selectors_wire_shape() {
        let json = r#"{
            "mappings": [{"standard_field_id": 3, "selector": "h1.title"}],
            "extra_fields": [{"field_name": "rating", "selector": ".rating"}]
        }"#;
        let parsed: FieldSelectors = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.mappings.len(), 1);
        assert_eq!(parsed.mappings[0].standard_field_id, 3);
        assert_eq!(parsed.extra_fields[0].field_name, "rating");

        // Either list may be absent entirely
        let parsed: FieldSelectors = serde_json::from_str("{}").unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_config_status_roundtrip() {
        assert_eq!(ConfigStatus::from_str("active"), Some(ConfigStatus::Active));
        assert_eq!(
            ConfigStatus::from_str("inactive"),
            Some(ConfigStatus::Inactive)
        );
        assert_eq!(ConfigStatus::from_str("bogus"), None);
    }
}
