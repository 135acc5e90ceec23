//! HTTP fetcher
//!
//! Handles HTTP/HTTPS locators with a plain GET request. Any non-success
//! status or transport failure is returned as an error.

use crate::error::InlineError;
use crate::fetchers::Fetcher;
use crate::locator::Locator;
use crate::pack::PackOptions;
use crate::DEFAULT_USER_AGENT;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use tracing::{debug, error};

/// HTTP fetcher
///
/// Issues one GET per locator. No retries and no caching.
pub struct HttpFetcher;

impl HttpFetcher {
    /// Create a new HTTP fetcher
    pub fn new() -> Self {
        Self
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    fn matches(&self, locator: &Locator) -> bool {
        locator.is_remote()
    }

    async fn fetch(
        &self,
        locator: &Locator,
        options: &PackOptions,
    ) -> Result<Bytes, InlineError> {
        let Locator::Remote(url) = locator else {
            return Err(InlineError::FetcherError(format!(
                "Not an HTTP locator: {locator}"
            )));
        };

        let mut headers = HeaderMap::new();
        let user_agent = options.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(options.timeout)
            .timeout(options.timeout)
            .build()
            .map_err(InlineError::ClientBuildError)?;

        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(InlineError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            error!(url = %url, status = status.as_u16(), "Request failed");
            return Err(InlineError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = read_body(response).await?;
        debug!(url = %url, size = body.len(), "Fetched remote resource");
        Ok(body)
    }
}

/// Buffer the full response body
async fn read_body(response: reqwest::Response) -> Result<Bytes, InlineError> {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let bytes = chunk.map_err(InlineError::from_reqwest)?;
        body.extend_from_slice(&bytes);
    }

    Ok(Bytes::from(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use url::Url;

    #[test]
    fn test_http_fetcher_matches_remote_only() {
        let fetcher = HttpFetcher::new();
        let remote = Locator::Remote(Url::parse("https://example.com/a.css").unwrap());
        assert!(fetcher.matches(&remote));

        let local = Locator::Local(PathBuf::from("a.css"));
        assert!(!fetcher.matches(&local));
    }

    #[tokio::test]
    async fn test_http_fetcher_rejects_local_locator() {
        let fetcher = HttpFetcher::new();
        let local = Locator::Local(PathBuf::from("a.css"));
        let result = fetcher.fetch(&local, &PackOptions::default()).await;
        assert!(matches!(result, Err(InlineError::FetcherError(_))));
    }
}
