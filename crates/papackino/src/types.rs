//! Core types for Papackino

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Encoding requested for fetched content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// Content decoded as UTF-8 text
    #[default]
    Utf8,
    /// Raw bytes encoded as standard base64
    Base64,
}

/// Kind of reference being inlined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// `<link rel="icon">`
    Icon,
    /// `<link rel="stylesheet">`
    Stylesheet,
    /// `<script src>`
    Script,
    /// `url(...)` inside a stylesheet
    CssUrl,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Icon => write!(f, "icon"),
            ResourceKind::Stylesheet => write!(f, "stylesheet"),
            ResourceKind::Script => write!(f, "script"),
            ResourceKind::CssUrl => write!(f, "css-url"),
        }
    }
}

/// What to do when a single resource cannot be inlined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnError {
    /// Stop the run and return the error
    #[default]
    Abort,
    /// Log the failure and keep the original reference in the output
    Skip,
}

impl FromStr for OnError {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abort" => Ok(OnError::Abort),
            "skip" => Ok(OnError::Skip),
            _ => Err("Invalid error policy: must be abort or skip".to_string()),
        }
    }
}

/// A resource left in place because it could not be inlined
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedResource {
    pub kind: ResourceKind,
    pub reference: String,
    pub error: String,
}

/// Summary of one packing run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackReport {
    /// Icons inlined as data URIs
    pub icons: usize,
    /// Stylesheets inlined as `<style>` blocks
    pub stylesheets: usize,
    /// Scripts inlined as `<script>` blocks
    pub scripts: usize,
    /// `url(...)` references inlined as data URIs
    pub css_urls: usize,
    /// `<link>` elements removed (preload and unhandled rel values)
    pub dropped_links: usize,
    /// Failures tolerated under [`OnError::Skip`]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedResource>,
}

impl PackReport {
    pub(crate) fn record_inlined(&mut self, kind: ResourceKind) {
        match kind {
            ResourceKind::Icon => self.icons += 1,
            ResourceKind::Stylesheet => self.stylesheets += 1,
            ResourceKind::Script => self.scripts += 1,
            ResourceKind::CssUrl => self.css_urls += 1,
        }
    }

    pub(crate) fn record_skipped(
        &mut self,
        kind: ResourceKind,
        reference: impl Into<String>,
        error: &crate::InlineError,
    ) {
        self.skipped.push(SkippedResource {
            kind,
            reference: reference.into(),
            error: error.to_string(),
        });
    }

    /// Total number of resources inlined
    pub fn inlined(&self) -> usize {
        self.icons + self.stylesheets + self.scripts + self.css_urls
    }
}

/// Packed output together with its report
#[derive(Debug, Clone)]
pub struct PackedDocument {
    pub html: String,
    pub report: PackReport,
}
