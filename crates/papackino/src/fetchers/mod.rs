//! Fetcher system for resource transport
//!
//! Design: Each fetcher handles one family of locators (files, HTTP).
//! FetcherRegistry dispatches to the first matching fetcher.

mod file;
mod http;

pub use file::FileFetcher;
pub use http::HttpFetcher;

use crate::error::InlineError;
use crate::locator::Locator;
use crate::pack::PackOptions;
use async_trait::async_trait;
use bytes::Bytes;

/// Trait for resource transports
///
/// Implement this trait to load resources from a new kind of location.
/// Each fetcher declares what locators it can handle via `matches()` and
/// returns the raw bytes via `fetch()`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Unique identifier for this fetcher (for logging/debugging)
    fn name(&self) -> &'static str;

    /// Returns true if this fetcher can handle the given locator
    fn matches(&self, locator: &Locator) -> bool;

    /// Load the raw bytes behind the locator
    ///
    /// Called only if `matches()` returned true.
    async fn fetch(&self, locator: &Locator, options: &PackOptions)
        -> Result<Bytes, InlineError>;
}

/// Registry of fetchers that dispatches to the appropriate transport
///
/// Maintains an ordered list of fetchers. When fetching, iterates
/// through fetchers and uses the first one that matches.
pub struct FetcherRegistry {
    fetchers: Vec<Box<dyn Fetcher>>,
}

impl Default for FetcherRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FetcherRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            fetchers: Vec::new(),
        }
    }

    /// Create a registry with default fetchers pre-registered
    ///
    /// Includes (in order of priority):
    /// 1. HttpFetcher - handles HTTP/HTTPS URLs
    /// 2. FileFetcher - handles local paths
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(HttpFetcher::new()));
        registry.register(Box::new(FileFetcher::new()));
        registry
    }

    /// Register a fetcher
    ///
    /// Fetchers are checked in registration order.
    pub fn register(&mut self, fetcher: Box<dyn Fetcher>) {
        self.fetchers.push(fetcher);
    }

    /// Fetch a locator using the first matching fetcher
    pub async fn fetch(
        &self,
        locator: &Locator,
        options: &PackOptions,
    ) -> Result<Bytes, InlineError> {
        for fetcher in &self.fetchers {
            if fetcher.matches(locator) {
                tracing::debug!(fetcher = fetcher.name(), locator = %locator, "Using fetcher");
                return fetcher.fetch(locator, options).await;
            }
        }

        Err(InlineError::FetcherError(format!(
            "No fetcher available for {locator}"
        )))
    }
}
