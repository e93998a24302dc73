//! Browser-based renderer for JS-heavy sites (chromiumoxide).

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use tracing::{debug, warn};

use super::{PageRenderer, RenderError};

/// JavaScript to wait for page ready state.
const WAIT_FOR_READY_SCRIPT: &str = r#"
    new Promise((resolve) => {
        if (document.readyState === 'complete' || document.readyState === 'interactive') {
            resolve(document.readyState);
        } else {
            document.addEventListener('DOMContentLoaded', () => resolve(document.readyState));
            setTimeout(() => resolve('timeout'), 10000);
        }
    })
"#;

/// Renders pages in a headless browser so scripted content settles before
/// extraction.
pub struct BrowserRenderer {
    browser: Browser,
    wait_secs: u64,
}

impl BrowserRenderer {
    /// Launch a headless browser. The handler loop runs until the renderer
    /// is dropped.
    pub async fn launch(wait_secs: u64) -> Result<Self, RenderError> {
        let config = BrowserConfig::builder()
            .build()
            .map_err(RenderError::Browser)?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Browser(e.to_string()))?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("browser handler event error: {}", e);
                }
            }
        });

        Ok(Self { browser, wait_secs })
    }

    async fn wait_for_ready(&self, page: &chromiumoxide::Page) {
        let timeout = Duration::from_secs(self.wait_secs);
        match tokio::time::timeout(timeout, page.evaluate(WAIT_FOR_READY_SCRIPT.to_string())).await
        {
            Ok(Ok(result)) => {
                let state: String = result
                    .into_value()
                    .unwrap_or_else(|_| "unknown".to_string());
                debug!("page ready state: {}", state);
            }
            Ok(Err(e)) => {
                debug!("could not check ready state (possibly non-HTML page): {}", e);
            }
            Err(_) => {
                warn!("timeout waiting for page ready state");
            }
        }
    }
}

#[async_trait]
impl PageRenderer for BrowserRenderer {
    async fn render(&self, url: &str) -> Result<String, RenderError> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| RenderError::Browser(e.to_string()))?;

        self.wait_for_ready(&page).await;

        let html = page
            .content()
            .await
            .map_err(|e| RenderError::Browser(e.to_string()))?;

        if let Err(e) = page.close().await {
            debug!("failed to close page: {}", e);
        }

        Ok(html)
    }
}
