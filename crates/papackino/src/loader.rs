//! Resource fetching with format selection
//!
//! Wraps a [`FetcherRegistry`] and turns raw bytes into either UTF-8 text or
//! base64 text. UTF-8 content classified as a stylesheet is passed through the
//! CSS URL rewriter before it is returned.

use crate::css::rewrite_css;
use crate::error::InlineError;
use crate::fetchers::FetcherRegistry;
use crate::locator::Locator;
use crate::pack::PackOptions;
use crate::types::{Format, PackReport};
use base64::Engine;
use tracing::debug;

/// Fetches locators through a registry
pub struct ResourceLoader<'a> {
    registry: &'a FetcherRegistry,
    options: &'a PackOptions,
}

impl<'a> ResourceLoader<'a> {
    pub fn new(registry: &'a FetcherRegistry, options: &'a PackOptions) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> &PackOptions {
        self.options
    }

    /// Fetch a locator in the requested format
    ///
    /// Stylesheets requested as UTF-8 come back with their `url(...)`
    /// references inlined. Nothing is cached.
    pub async fn fetch(
        &self,
        locator: &Locator,
        format: Format,
        report: &mut PackReport,
    ) -> Result<String, InlineError> {
        match format {
            Format::Base64 => self.fetch_base64(locator).await,
            Format::Utf8 if locator.is_stylesheet() => {
                self.fetch_stylesheet(locator, report).await
            }
            Format::Utf8 => self.fetch_text(locator).await,
        }
    }

    /// Fetch a stylesheet and inline its `url(...)` references
    pub async fn fetch_stylesheet(
        &self,
        locator: &Locator,
        report: &mut PackReport,
    ) -> Result<String, InlineError> {
        let css = self.fetch_text(locator).await?;
        rewrite_css(self, &css, &locator.base(), report).await
    }

    /// Fetch raw bytes and encode them as standard base64
    pub async fn fetch_base64(&self, locator: &Locator) -> Result<String, InlineError> {
        let bytes = self.registry.fetch(locator, self.options).await?;
        debug!(locator = %locator, size = bytes.len(), "Encoding resource as base64");
        Ok(base64::engine::general_purpose::STANDARD.encode(&bytes))
    }

    pub(crate) async fn fetch_text(&self, locator: &Locator) -> Result<String, InlineError> {
        let bytes = self.registry.fetch(locator, self.options).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
