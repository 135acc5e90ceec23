//! CSS `url(...)` rewriting
//!
//! Every `url(...)` in a stylesheet that is not already a `data:` URI (or a
//! fragment reference) is fetched as base64 and replaced with
//! `url("data:<mime>; charset=utf-8; base64,<content>")`. Text outside the
//! matches is copied unchanged.
//!
//! A reference that is itself a stylesheet (`@import url(b.css)`) is rewritten
//! first, against its own location, and embedded as `data:text/css`.

use crate::error::InlineError;
use crate::loader::ResourceLoader;
use crate::locator::{Base, Locator};
use crate::media::media_type_for;
use crate::types::{OnError, PackReport, ResourceKind};
use base64::Engine;
use futures::future::{BoxFuture, FutureExt};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;
use tracing::{debug, warn};

// Commas and parentheses end a reference, so data URIs with commas never match.
static CSS_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"url\((.[^,()]*)\)")
        .expect("BUG: hardcoded url() pattern is invalid - this is a compile-time bug")
});

/// Media type of stylesheets embedded through `url(...)`
const STYLESHEET_MEDIA_TYPE: &str = "text/css";

/// Import chains deeper than this are treated as cycles
const MAX_STYLESHEET_DEPTH: usize = 16;

/// One `url(...)` occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssUrl {
    /// Byte range of the whole `url(...)` token
    pub span: Range<usize>,
    /// Reference with surrounding whitespace and quotes removed
    pub reference: String,
}

/// Find all `url(...)` occurrences, left to right, non-overlapping
pub fn find_css_urls(css: &str) -> Vec<CssUrl> {
    CSS_URL_PATTERN
        .captures_iter(css)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            let inner = captures.get(1)?;
            Some(CssUrl {
                span: whole.range(),
                reference: unquote(inner.as_str()).to_string(),
            })
        })
        .collect()
}

/// Inline every fetchable `url(...)` in `css`
///
/// References are resolved against `base`. Fetches run one at a time in
/// source order.
pub async fn rewrite_css(
    loader: &ResourceLoader<'_>,
    css: &str,
    base: &Base,
    report: &mut PackReport,
) -> Result<String, InlineError> {
    rewrite_nested(loader, css, base, report, 0).await
}

// Boxed because nested stylesheets recurse back into the rewriter.
fn rewrite_nested<'a>(
    loader: &'a ResourceLoader<'_>,
    css: &'a str,
    base: &'a Base,
    report: &'a mut PackReport,
    depth: usize,
) -> BoxFuture<'a, Result<String, InlineError>> {
    async move {
        let mut output = String::with_capacity(css.len());
        let mut pos = 0;

        for css_url in find_css_urls(css) {
            if !is_inlinable(&css_url.reference) {
                continue;
            }

            output.push_str(&css[pos..css_url.span.start]);
            match inline_url(loader, &css_url.reference, base, report, depth).await {
                Ok(data_url) => {
                    debug!(reference = %css_url.reference, "Embedded CSS url");
                    output.push_str(&data_url);
                    report.record_inlined(ResourceKind::CssUrl);
                }
                Err(e) if loader.options().on_error == OnError::Skip => {
                    warn!(reference = %css_url.reference, error = %e, "Keeping CSS url");
                    report.record_skipped(ResourceKind::CssUrl, css_url.reference.as_str(), &e);
                    output.push_str(&css[css_url.span.clone()]);
                }
                Err(e) => return Err(e),
            }
            pos = css_url.span.end;
        }

        output.push_str(&css[pos..]);
        Ok(output)
    }
    .boxed()
}

async fn inline_url(
    loader: &ResourceLoader<'_>,
    reference: &str,
    base: &Base,
    report: &mut PackReport,
    depth: usize,
) -> Result<String, InlineError> {
    let locator = Locator::resolve(reference, base)?;

    if locator.is_stylesheet() {
        if depth >= MAX_STYLESHEET_DEPTH {
            return Err(InlineError::InvalidReference(format!(
                "{reference}: stylesheet imports nested deeper than {MAX_STYLESHEET_DEPTH}"
            )));
        }
        let text = loader.fetch_text(&locator).await?;
        let css = rewrite_nested(loader, &text, &locator.base(), report, depth + 1).await?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(css.as_bytes());
        return Ok(format!(
            "url(\"data:{STYLESHEET_MEDIA_TYPE}; charset=utf-8; base64,{encoded}\")"
        ));
    }

    let extension = locator.extension().unwrap_or_default();
    let media_type =
        media_type_for(&extension).ok_or_else(|| InlineError::UnsupportedMediaType {
            reference: reference.to_string(),
            extension,
        })?;

    let encoded = loader.fetch_base64(&locator).await?;
    Ok(format!(
        "url(\"data:{media_type}; charset=utf-8; base64,{encoded}\")"
    ))
}

fn is_inlinable(reference: &str) -> bool {
    !reference.is_empty() && !reference.starts_with("data:") && !reference.starts_with('#')
}

fn unquote(raw: &str) -> &str {
    let trimmed = raw.trim();
    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return trimmed[1..trimmed.len() - 1].trim();
        }
    }
    trimmed
}
