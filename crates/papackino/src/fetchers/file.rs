//! Local file fetcher

use crate::error::InlineError;
use crate::fetchers::Fetcher;
use crate::locator::Locator;
use crate::pack::PackOptions;
use async_trait::async_trait;
use bytes::Bytes;

/// Reads locators that point at the local filesystem
pub struct FileFetcher;

impl FileFetcher {
    /// Create a new file fetcher
    pub fn new() -> Self {
        Self
    }
}

impl Default for FileFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for FileFetcher {
    fn name(&self) -> &'static str {
        "file"
    }

    fn matches(&self, locator: &Locator) -> bool {
        matches!(locator, Locator::Local(_))
    }

    async fn fetch(
        &self,
        locator: &Locator,
        _options: &PackOptions,
    ) -> Result<Bytes, InlineError> {
        let Locator::Local(path) = locator else {
            return Err(InlineError::FetcherError(format!(
                "Not a local locator: {locator}"
            )));
        };

        let contents = tokio::fs::read(path)
            .await
            .map_err(|e| InlineError::io(path, e))?;
        Ok(Bytes::from(contents))
    }
}
