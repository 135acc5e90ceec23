//! Papackino - pack an HTML document into a single self-contained file
//!
//! This crate rewrites an HTML document by inlining its external
//! dependencies: stylesheets become `<style>` blocks, scripts become inline
//! `<script>` blocks, icons and the fonts/images referenced from CSS
//! `url(...)` become base64 `data:` URIs. References may be local paths
//! (relative to the document) or HTTP(S) URLs.
//!
//! ## Fetcher System
//!
//! Resources are loaded through a pluggable fetcher system. The
//! [`FetcherRegistry`] dispatches each [`Locator`] to the first fetcher
//! that matches it.
//!
//! Built-in fetchers:
//! - [`HttpFetcher`] - HTTP/HTTPS URLs
//! - [`FileFetcher`] - local files
//!
//! ## Example
//!
//! ```no_run
//! # async fn run() -> Result<(), papackino::InlineError> {
//! let packer = papackino::Packer::builder().inject_shim(false).build();
//! let report = packer
//!     .pack_file("site/index.html".as_ref(), "dist/index.html".as_ref())
//!     .await?;
//! println!("inlined {} resources", report.inlined());
//! # Ok(())
//! # }
//! ```

pub mod css;
mod error;
pub mod fetchers;
mod loader;
pub mod locator;
pub mod media;
pub mod pack;
mod packer;
mod types;
mod walker;

pub use error::InlineError;
pub use fetchers::{FetcherRegistry, FileFetcher, Fetcher, HttpFetcher};
pub use loader::ResourceLoader;
pub use locator::{is_stylesheet_reference, Base, Locator};
pub use pack::{
    pack_file, pack_file_with_options, pack_str, pack_str_with_options, PackOptions,
    DEFAULT_TIMEOUT,
};
pub use packer::{Packer, PackerBuilder};
pub use types::{
    Format, OnError, PackReport, PackedDocument, ResourceKind, SkippedResource,
};

/// Default User-Agent string
pub const DEFAULT_USER_AGENT: &str = "Papackino/1.0";

/// Script injected at the end of `<head>`
///
/// Stubs a module loader returning an event channel whose `on`/`send` do
/// nothing, so packed pages that reach for a host bridge still load.
pub const RUNTIME_SHIM: &str = r#"<script>
function require(){
    return {
        ipcRenderer: {
            on: function(){},
            send: function(){}
        }
    }
}
</script>"#;
