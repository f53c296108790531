// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::CrawlerConfig;

/// Create a configured asynchronous HTTP client.
///
/// The configured timeout applies to every request made by the client.
pub fn create_async_client(config: &CrawlerConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Whether a `Content-Type` header value denotes an HTML document.
pub fn is_html(content_type: Option<&str>) -> bool {
    match content_type {
        Some(value) => {
            let value = value.to_ascii_lowercase();
            value.contains("text/html") || value.contains("application/xhtml")
        }
        // Servers that omit the header are usually serving HTML
        None => true,
    }
}
