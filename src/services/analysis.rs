//! Analysis trigger - asks the external field-discovery analyzer to look at
//! a source for a theme.
//!
//! The call site is fire-and-forget: the outcome lands in the attempt's
//! `RawAnalysisResult` row, never in the caller's control flow. The analyzer
//! itself reports its proposal back separately; acceptance of the request is
//! all this service waits for.

use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::repository::pool::DieselError;
use crate::repository::AnalysisRepository;

/// Maximum attempts to hand the request to the analyzer.
const MAX_ATTEMPTS: u32 = 3;

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    data_source_id: i32,
    theme_name: &'a str,
}

pub struct AnalysisTrigger {
    repo: AnalysisRepository,
    client: reqwest::Client,
    analyzer_url: String,
    backoff: Duration,
}

impl AnalysisTrigger {
    pub fn new(repo: AnalysisRepository, analyzer_url: impl Into<String>) -> Self {
        Self {
            repo,
            client: reqwest::Client::new(),
            analyzer_url: analyzer_url.into(),
            backoff: Duration::from_secs(1),
        }
    }

    /// Override the base backoff interval (tests use zero).
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Trigger an analysis attempt for (source, theme).
    ///
    /// Creates the attempt row in `processing` state first, then posts to
    /// the analyzer with bounded retries and exponential backoff. Exhausting
    /// the retries marks the row `failed` and logs the error; it is not
    /// re-raised. Returns the attempt row's id either way.
    pub async fn trigger(
        &self,
        data_source_id: i32,
        theme_name: &str,
        instructions: Option<&str>,
    ) -> Result<i32, DieselError> {
        let attempt_id = self
            .repo
            .create_processing(data_source_id, theme_name, instructions)
            .await?;

        let request = AnalyzeRequest {
            data_source_id,
            theme_name,
        };

        let mut last_error = String::new();
        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                tokio::time::sleep(self.backoff * 2u32.pow(attempt - 1)).await;
            }
            match self.client.post(&self.analyzer_url).json(&request).send().await {
                Ok(response) if response.status().is_success() => {
                    info!(
                        attempt_id,
                        data_source_id,
                        theme = theme_name,
                        "analyzer accepted the request"
                    );
                    return Ok(attempt_id);
                }
                Ok(response) => {
                    last_error = format!("analyzer returned HTTP {}", response.status());
                }
                Err(e) => {
                    last_error = e.to_string();
                }
            }
            warn!(
                attempt_id,
                attempt = attempt + 1,
                error = %last_error,
                "analyzer request failed"
            );
        }

        self.repo.record_failure(attempt_id, &last_error).await?;
        warn!(
            attempt_id,
            data_source_id,
            theme = theme_name,
            "analysis attempt exhausted its retries"
        );
        Ok(attempt_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisStatus, NewDataSource};
    use crate::repository::test_support::setup_test_db;
    use crate::repository::SourceRepository;

    #[tokio::test]
    async fn test_unreachable_analyzer_marks_attempt_failed() {
        let (pool, _dir) = setup_test_db().await;
        let source = SourceRepository::new(pool.clone())
            .create(&NewDataSource::new(
                "Gazette".to_string(),
                "https://gazette.example.com".to_string(),
            ))
            .await
            .unwrap();
        let repo = AnalysisRepository::new(pool);

        // Port 9 (discard) refuses connections on localhost
        let trigger = AnalysisTrigger::new(repo.clone(), "http://127.0.0.1:9/discover")
            .with_backoff(Duration::ZERO);

        let attempt_id = trigger.trigger(source.id, "Articles", None).await.unwrap();

        let statuses = repo.status_for_theme("Articles").await.unwrap();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].id, attempt_id);
        assert_eq!(statuses[0].status, AnalysisStatus::Failed);
        assert!(statuses[0].error_message.is_some());
    }
}
