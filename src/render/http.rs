//! Plain HTTP renderer for static pages.

use std::time::Duration;

use async_trait::async_trait;

use super::{PageRenderer, RenderError};

/// Fetches the page body over HTTP without executing scripts.
///
/// Sufficient for server-rendered sources; JS-heavy sites need the browser
/// renderer instead.
pub struct HttpRenderer {
    client: reqwest::Client,
}

impl HttpRenderer {
    pub fn new(user_agent: &str, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(&self, url: &str) -> Result<String, RenderError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}
