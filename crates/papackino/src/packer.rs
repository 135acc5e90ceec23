//! Packer builder and configured entry point

use crate::error::InlineError;
use crate::fetchers::{Fetcher, FetcherRegistry, FileFetcher, HttpFetcher};
use crate::locator::Base;
use crate::pack::{pack_file_with_registry, pack_with_registry, PackOptions, DEFAULT_TIMEOUT};
use crate::types::{OnError, PackReport, PackedDocument};
use std::path::Path;
use std::time::Duration;

/// Builder for configuring a [`Packer`]
#[derive(Default)]
pub struct PackerBuilder {
    /// Custom User-Agent
    user_agent: Option<String>,
    /// Remote fetch timeout
    timeout: Option<Duration>,
    /// Per-resource failure policy
    on_error: OnError,
    /// Skip the head shim
    no_shim: bool,
    /// Fetchers consulted before the built-in ones
    fetchers: Vec<Box<dyn Fetcher>>,
}

impl PackerBuilder {
    /// Create a new packer builder with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom User-Agent
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set connect and request timeout for remote resources
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the failure policy
    pub fn on_error(mut self, on_error: OnError) -> Self {
        self.on_error = on_error;
        self
    }

    /// Enable or disable the runtime shim in `<head>`
    pub fn inject_shim(mut self, inject: bool) -> Self {
        self.no_shim = !inject;
        self
    }

    /// Register a fetcher ahead of the built-in HTTP and file fetchers
    pub fn fetcher(mut self, fetcher: Box<dyn Fetcher>) -> Self {
        self.fetchers.push(fetcher);
        self
    }

    /// Build the packer
    pub fn build(self) -> Packer {
        let mut registry = FetcherRegistry::new();
        for fetcher in self.fetchers {
            registry.register(fetcher);
        }
        registry.register(Box::new(HttpFetcher::new()));
        registry.register(Box::new(FileFetcher::new()));

        Packer {
            options: PackOptions {
                user_agent: self.user_agent,
                timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
                on_error: self.on_error,
                inject_shim: !self.no_shim,
            },
            registry,
        }
    }
}

/// Configured packer
pub struct Packer {
    options: PackOptions,
    registry: FetcherRegistry,
}

impl Default for Packer {
    fn default() -> Self {
        PackerBuilder::new().build()
    }
}

impl Packer {
    /// Create a new packer builder
    pub fn builder() -> PackerBuilder {
        PackerBuilder::new()
    }

    /// Options this packer was built with
    pub fn options(&self) -> &PackOptions {
        &self.options
    }

    /// Pack HTML text, resolving relative references against `base`
    pub async fn pack_str(&self, html: &str, base: &Base) -> Result<PackedDocument, InlineError> {
        pack_with_registry(&self.registry, html, base, &self.options).await
    }

    /// Pack the document at `input` into `output`
    pub async fn pack_file(&self, input: &Path, output: &Path) -> Result<PackReport, InlineError> {
        pack_file_with_registry(&self.registry, input, output, &self.options).await
    }
}
