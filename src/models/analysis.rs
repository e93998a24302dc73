//! Raw analysis result model - one row per (source, theme) analysis attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State machine of an analysis attempt: `processing` is written before the
/// analyzer call, then exactly one transition to `completed` or `failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Processing,
    Completed,
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// One field proposed by the external analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldProposal {
    pub field_name: String,
    pub selector: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// The analyzer's raw proposal payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProposedFields {
    #[serde(default)]
    pub fields: Vec<FieldProposal>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
}

/// A persisted analysis attempt for one (source, theme) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAnalysisResult {
    pub id: i32,
    pub data_source_id: i32,
    pub theme_name: String,
    /// Optional detailed instructions the analysis followed.
    pub analysis_instructions: Option<String>,
    pub status: AnalysisStatus,
    /// Raw proposal from the analyzer; present only for completed attempts.
    pub raw_fields: Option<ProposedFields>,
    /// Error detail; present only for failed attempts.
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proposal_wire_shape() {
        let json = r#"{
            "fields": [
                {"field_name": "title", "selector": "h1", "description": "page title"},
                {"field_name": "price", "selector": ".price"}
            ],
            "confidence_score": 0.82
        }"#;
        let parsed: ProposedFields = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.fields.len(), 2);
        assert_eq!(parsed.fields[1].description, None);
        assert_eq!(parsed.confidence_score, Some(0.82));
    }
}
