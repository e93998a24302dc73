//! Page rendering - turns a source URL into a DOM-queryable document.
//!
//! Rendering is a capability behind the [`PageRenderer`] trait: the worker
//! only needs "render URL, return HTML once the page has settled". The
//! plain HTTP renderer covers static pages; the browser renderer (behind
//! the `browser` feature) covers JS-heavy sites.

#[cfg(feature = "browser")]
pub mod browser;
pub mod http;

use async_trait::async_trait;
use thiserror::Error;

pub use http::HttpRenderer;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("Browser error: {0}")]
    Browser(String),
}

/// Render a URL to settled HTML.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<String, RenderError>;
}
