//! Packing entry points
//!
//! This module provides the free functions for packing a document with the
//! default fetchers. The document walk itself lives in the `walker` module.

use crate::error::InlineError;
use crate::fetchers::FetcherRegistry;
use crate::loader::ResourceLoader;
use crate::locator::Base;
use crate::types::{OnError, PackReport, PackedDocument};
use crate::walker;
use scraper::Html;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Default connect and request timeout for remote resources
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Pack options that can be configured via the packer builder
#[derive(Debug, Clone)]
pub struct PackOptions {
    /// Custom User-Agent for remote fetches
    pub user_agent: Option<String>,
    /// Connect and request timeout for remote fetches
    pub timeout: Duration,
    /// Behaviour when a single resource fails
    pub on_error: OnError,
    /// Inject the runtime shim script at the end of `<head>`
    pub inject_shim: bool,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout: DEFAULT_TIMEOUT,
            on_error: OnError::Abort,
            inject_shim: true,
        }
    }
}

/// Pack HTML text, resolving relative references against `base`
///
/// Uses the default fetcher registry and default options.
/// For custom options, use [`pack_str_with_options`].
pub async fn pack_str(html: &str, base: &Base) -> Result<PackedDocument, InlineError> {
    pack_str_with_options(html, base, PackOptions::default()).await
}

/// Pack HTML text with custom options
pub async fn pack_str_with_options(
    html: &str,
    base: &Base,
    options: PackOptions,
) -> Result<PackedDocument, InlineError> {
    let registry = FetcherRegistry::with_defaults();
    pack_with_registry(&registry, html, base, &options).await
}

/// Pack the document at `input` and write the result to `output`
///
/// Relative references are resolved against the directory of `input`.
pub async fn pack_file(input: &Path, output: &Path) -> Result<PackReport, InlineError> {
    pack_file_with_options(input, output, PackOptions::default()).await
}

/// Pack a file with custom options
pub async fn pack_file_with_options(
    input: &Path,
    output: &Path,
    options: PackOptions,
) -> Result<PackReport, InlineError> {
    let registry = FetcherRegistry::with_defaults();
    pack_file_with_registry(&registry, input, output, &options).await
}

pub(crate) async fn pack_with_registry(
    registry: &FetcherRegistry,
    html: &str,
    base: &Base,
    options: &PackOptions,
) -> Result<PackedDocument, InlineError> {
    let document = Html::parse_document(html);
    let loader = ResourceLoader::new(registry, options);
    walker::walk(&document, &loader, base).await
}

pub(crate) async fn pack_file_with_registry(
    registry: &FetcherRegistry,
    input: &Path,
    output: &Path,
    options: &PackOptions,
) -> Result<PackReport, InlineError> {
    if !input.is_file() {
        return Err(InlineError::InputNotFound(input.to_path_buf()));
    }
    info!("packing from {} to {}", input.display(), output.display());

    let source = tokio::fs::read(input)
        .await
        .map_err(|e| InlineError::io(input, e))?;
    let html = String::from_utf8_lossy(&source);

    let packed =
        pack_with_registry(registry, &html, &Base::for_document(input), options).await?;

    // Written only after the walk succeeds, so a failed run leaves no partial file
    tokio::fs::write(output, packed.html.as_bytes())
        .await
        .map_err(|e| InlineError::io(output, e))?;

    Ok(packed.report)
}
