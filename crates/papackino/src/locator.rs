//! Reference resolution
//!
//! A raw `href`/`src`/`url(...)` value is resolved against the [`Base`] it
//! appears under into a typed [`Locator`]. Local references are relative to
//! the document (or stylesheet) directory, remote references are HTTP(S) URLs.

use crate::error::InlineError;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Resolved location of a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// File on the local filesystem, query string already stripped
    Local(PathBuf),
    /// HTTP or HTTPS URL, query string kept
    Remote(Url),
}

/// What relative references are resolved against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Base {
    /// Directory of the document or stylesheet on disk
    Directory(PathBuf),
    /// URL of a remote stylesheet
    Url(Url),
}

impl Base {
    /// Base for a document stored at `path`: its parent directory
    pub fn for_document(path: &Path) -> Self {
        Base::Directory(path.parent().map(Path::to_path_buf).unwrap_or_default())
    }
}

impl Locator {
    /// Resolve a raw reference against a base
    ///
    /// References starting with `http://` or `https://` are remote regardless
    /// of the base. A leading `/` on a local reference is taken relative to the
    /// base directory.
    pub fn resolve(reference: &str, base: &Base) -> Result<Self, InlineError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(InlineError::InvalidReference(
                "empty reference".to_string(),
            ));
        }

        if is_remote_reference(reference) {
            return parse_url(reference);
        }

        match base {
            Base::Url(url) => url
                .join(reference)
                .map(Locator::Remote)
                .map_err(|e| InlineError::InvalidReference(format!("{reference}: {e}"))),
            Base::Directory(dir) => {
                if let Some(rest) = reference.strip_prefix("//") {
                    return parse_url(&format!("https://{rest}"));
                }
                let path = strip_query(reference).trim_start_matches('/');
                if path.is_empty() {
                    return Err(InlineError::InvalidReference(reference.to_string()));
                }
                Ok(Locator::Local(dir.join(path)))
            }
        }
    }

    /// Lowercased extension of the resource path including the dot, e.g. `.woff`
    pub fn extension(&self) -> Option<String> {
        let name = match self {
            Locator::Local(path) => path.file_name()?.to_str()?.to_string(),
            Locator::Remote(url) => url.path_segments()?.next_back()?.to_string(),
        };
        let dot = name.rfind('.')?;
        if dot == 0 || dot + 1 == name.len() {
            return None;
        }
        Some(name[dot..].to_ascii_lowercase())
    }

    /// Base for references found inside this resource
    pub fn base(&self) -> Base {
        match self {
            Locator::Local(path) => Base::for_document(path),
            Locator::Remote(url) => Base::Url(url.clone()),
        }
    }

    /// True if this locator should be treated as a stylesheet
    pub fn is_stylesheet(&self) -> bool {
        is_stylesheet_reference(&self.to_string())
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Locator::Remote(_))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Local(path) => write!(f, "{}", path.display()),
            Locator::Remote(url) => write!(f, "{url}"),
        }
    }
}

/// Stylesheet classification policy
///
/// A reference is a stylesheet if its query-stripped form ends in `.css`, or if
/// the raw reference contains `css?` (e.g. `https://fonts.googleapis.com/css?family=Roboto`).
pub fn is_stylesheet_reference(reference: &str) -> bool {
    strip_query(reference).ends_with(".css") || reference.contains("css?")
}

/// Strip a trailing query string or fragment
pub fn strip_query(reference: &str) -> &str {
    match reference.find(['?', '#']) {
        Some(pos) => &reference[..pos],
        None => reference,
    }
}

fn is_remote_reference(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

fn parse_url(reference: &str) -> Result<Locator, InlineError> {
    Url::parse(reference)
        .map(Locator::Remote)
        .map_err(|e| InlineError::InvalidReference(format!("{reference}: {e}")))
}
