//! Document walker
//!
//! Depth-first traversal of the parsed document that writes each node to the
//! output and replaces `<link>` and `<script src>` references with inlined
//! content. Every fetch is awaited before the next node is visited, so the
//! output follows document order exactly.

use crate::error::InlineError;
use crate::loader::ResourceLoader;
use crate::locator::{Base, Locator};
use crate::media::ICON_MEDIA_TYPE;
use crate::types::{Format, OnError, PackReport, PackedDocument, ResourceKind};
use crate::RUNTIME_SHIM;
use ego_tree::NodeRef;
use scraper::node::Element;
use scraper::{ElementRef, Html, Node};
use tracing::{debug, info, warn};

/// Elements that never have a close tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "meta", "param",
    "source", "track", "wbr",
];

/// Raw-text and foreign-content elements, written with the parser's serializer
const VERBATIM_ELEMENTS: &[&str] = &[
    "style", "script", "textarea", "title", "template", "noscript", "iframe", "noembed",
    "noframes", "xmp", "plaintext", "svg", "math",
];

/// Elements whose first newline is dropped by the parser and must be restored
const LEADING_NEWLINE_ELEMENTS: &[&str] = &["pre", "listing"];

/// How a `<link>` element is handled, decided by its `rel` tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkRel {
    Stylesheet,
    Icon,
    Preload,
    Other,
}

impl LinkRel {
    fn classify(rel: Option<&str>) -> Self {
        let tokens: Vec<String> = rel
            .unwrap_or_default()
            .split_ascii_whitespace()
            .map(str::to_ascii_lowercase)
            .collect();
        let has = |token: &str| tokens.iter().any(|t| t == token);

        // Alternate stylesheets are disabled until chosen, so they are not inlined
        if has("stylesheet") && !has("alternate") {
            LinkRel::Stylesheet
        } else if has("icon") {
            LinkRel::Icon
        } else if has("preload") {
            LinkRel::Preload
        } else {
            LinkRel::Other
        }
    }
}

enum Step<'d> {
    Visit(NodeRef<'d, Node>),
    Close(&'d str),
}

struct Walker<'w, 'a> {
    loader: &'w ResourceLoader<'a>,
    base: &'w Base,
    out: String,
    report: PackReport,
}

/// Walk `document` and return the packed HTML
pub(crate) async fn walk(
    document: &Html,
    loader: &ResourceLoader<'_>,
    base: &Base,
) -> Result<PackedDocument, InlineError> {
    let mut walker = Walker {
        loader,
        base,
        out: String::new(),
        report: PackReport::default(),
    };

    let mut stack: Vec<Step<'_>> = document
        .tree
        .root()
        .children()
        .rev()
        .map(Step::Visit)
        .collect();

    while let Some(step) = stack.pop() {
        match step {
            Step::Close(name) => walker.write_end_tag(name),
            Step::Visit(node) => {
                if let Some(name) = walker.visit(node).await? {
                    stack.push(Step::Close(name));
                    stack.extend(node.children().rev().map(Step::Visit));
                }
            }
        }
    }

    Ok(PackedDocument {
        html: walker.out,
        report: walker.report,
    })
}

impl Walker<'_, '_> {
    /// Write one node. Returns the tag name if its children still need walking.
    async fn visit<'d>(&mut self, node: NodeRef<'d, Node>) -> Result<Option<&'d str>, InlineError> {
        match node.value() {
            Node::Doctype(doctype) => {
                self.out.push_str("<!DOCTYPE ");
                self.out.push_str(doctype.name());
                let (public_id, system_id) = (doctype.public_id(), doctype.system_id());
                if !public_id.is_empty() {
                    self.out.push_str(&format!(" PUBLIC \"{public_id}\""));
                    if !system_id.is_empty() {
                        self.out.push_str(&format!(" \"{system_id}\""));
                    }
                } else if !system_id.is_empty() {
                    self.out.push_str(&format!(" SYSTEM \"{system_id}\""));
                }
                self.out.push('>');
            }
            Node::Comment(comment) => {
                self.out.push_str("<!--");
                self.out.push_str(comment);
                self.out.push_str("-->");
            }
            Node::Text(text) => {
                self.out.push_str(&html_escape::encode_text(&**text));
            }
            Node::Element(element) => {
                let name = element.name();
                match name {
                    "link" => self.inline_link(node, element).await?,
                    "script" if element.attr("src").is_some() => {
                        self.inline_script(node, element).await?
                    }
                    _ if VERBATIM_ELEMENTS.contains(&name) => self.write_verbatim(node),
                    _ => {
                        self.write_start_tag(element);
                        if LEADING_NEWLINE_ELEMENTS.contains(&name) && starts_with_newline(node) {
                            self.out.push('\n');
                        }
                        if !VOID_ELEMENTS.contains(&name) {
                            return Ok(Some(name));
                        }
                    }
                }
            }
            _ => {}
        }
        Ok(None)
    }

    async fn inline_link(
        &mut self,
        node: NodeRef<'_, Node>,
        element: &Element,
    ) -> Result<(), InlineError> {
        let href = element.attr("href").unwrap_or_default();
        match LinkRel::classify(element.attr("rel")) {
            LinkRel::Icon => {
                info!(href, "embed icon link");
                let result = self.render_icon(href).await;
                self.finish(node, ResourceKind::Icon, href, result)
            }
            LinkRel::Stylesheet => {
                info!(href, "embed style link");
                let result = self.render_stylesheet(href).await;
                self.finish(node, ResourceKind::Stylesheet, href, result)
            }
            LinkRel::Preload => {
                info!(href, "remove preload link");
                self.report.dropped_links += 1;
                Ok(())
            }
            LinkRel::Other => {
                debug!(rel = element.attr("rel").unwrap_or_default(), href, "remove link");
                self.report.dropped_links += 1;
                Ok(())
            }
        }
    }

    async fn inline_script(
        &mut self,
        node: NodeRef<'_, Node>,
        element: &Element,
    ) -> Result<(), InlineError> {
        let src = element.attr("src").unwrap_or_default();
        info!(src, "embed script");
        let result = self.render_script(src).await;
        self.finish(node, ResourceKind::Script, src, result)
    }

    async fn render_icon(&mut self, href: &str) -> Result<String, InlineError> {
        let locator = Locator::resolve(href, self.base)?;
        let encoded = self.loader.fetch_base64(&locator).await?;
        Ok(format!(
            "<link rel=\"icon\" href=\"data:{ICON_MEDIA_TYPE};base64,{encoded}\">"
        ))
    }

    async fn render_stylesheet(&mut self, href: &str) -> Result<String, InlineError> {
        let locator = Locator::resolve(href, self.base)?;
        let css = self
            .loader
            .fetch_stylesheet(&locator, &mut self.report)
            .await?;
        warn_if_closes_early(&css, "style", href);
        Ok(format!("<style>\n{css}\n</style>"))
    }

    async fn render_script(&mut self, src: &str) -> Result<String, InlineError> {
        let locator = Locator::resolve(src, self.base)?;
        let text = self
            .loader
            .fetch(&locator, Format::Utf8, &mut self.report)
            .await?;
        warn_if_closes_early(&text, "script", src);
        Ok(format!("<script>\n{text}\n</script>"))
    }

    /// Write the inlined replacement, or apply the error policy
    fn finish(
        &mut self,
        node: NodeRef<'_, Node>,
        kind: ResourceKind,
        reference: &str,
        result: Result<String, InlineError>,
    ) -> Result<(), InlineError> {
        match result {
            Ok(html) => {
                self.out.push_str(&html);
                self.report.record_inlined(kind);
                Ok(())
            }
            Err(e) if self.loader.options().on_error == OnError::Skip => {
                warn!(%kind, reference, error = %e, "Keeping original element");
                self.report.record_skipped(kind, reference, &e);
                self.write_verbatim(node);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn write_start_tag(&mut self, element: &Element) {
        self.out.push('<');
        self.out.push_str(element.name());
        for (name, value) in element.attrs() {
            self.out.push(' ');
            self.out.push_str(name);
            self.out.push_str("=\"");
            self.out
                .push_str(&html_escape::encode_double_quoted_attribute(value));
            self.out.push('"');
        }
        self.out.push('>');
    }

    fn write_end_tag(&mut self, name: &str) {
        if name == "head" && self.loader.options().inject_shim {
            self.out.push_str(RUNTIME_SHIM);
        }
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
    }

    fn write_verbatim(&mut self, node: NodeRef<'_, Node>) {
        if let Some(element) = ElementRef::wrap(node) {
            self.out.push_str(&element.html());
        }
    }
}

fn starts_with_newline(node: NodeRef<'_, Node>) -> bool {
    node.first_child()
        .and_then(|child| child.value().as_text().map(|text| text.starts_with('\n')))
        .unwrap_or(false)
}

/// True if `content` contains `</tag`, which would end the inlined block early
fn closes_early(content: &str, tag: &str) -> bool {
    let needle = format!("</{tag}");
    content.to_ascii_lowercase().contains(&needle)
}

fn warn_if_closes_early(content: &str, tag: &str, reference: &str) {
    if closes_early(content, tag) {
        warn!(reference, tag, "Inlined content contains a closing tag and will end the block early");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetchers::FetcherRegistry;
    use crate::pack::PackOptions;
    use std::fs;
    use std::path::Path;

    async fn pack_in(dir: &Path, html: &str, options: PackOptions) -> PackedDocument {
        try_pack_in(dir, html, options).await.unwrap()
    }

    async fn try_pack_in(
        dir: &Path,
        html: &str,
        options: PackOptions,
    ) -> Result<PackedDocument, InlineError> {
        let registry = FetcherRegistry::with_defaults();
        let loader = ResourceLoader::new(&registry, &options);
        let document = Html::parse_document(html);
        walk(&document, &loader, &Base::Directory(dir.to_path_buf())).await
    }

    fn no_shim() -> PackOptions {
        PackOptions {
            inject_shim: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_link_rel_classify() {
        assert_eq!(LinkRel::classify(Some("stylesheet")), LinkRel::Stylesheet);
        assert_eq!(
            LinkRel::classify(Some("alternate stylesheet")),
            LinkRel::Other
        );
        assert_eq!(
            LinkRel::classify(Some("Stylesheet Alternate")),
            LinkRel::Other
        );
        assert_eq!(LinkRel::classify(Some("icon")), LinkRel::Icon);
        assert_eq!(LinkRel::classify(Some("Shortcut Icon")), LinkRel::Icon);
        assert_eq!(LinkRel::classify(Some("preload")), LinkRel::Preload);
        assert_eq!(LinkRel::classify(Some("manifest")), LinkRel::Other);
        assert_eq!(LinkRel::classify(None), LinkRel::Other);
    }

    #[tokio::test]
    async fn test_plain_document_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let html = r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8"><title>T &amp; U</title></head><body class="main"><!-- note --><p id="x">a &lt; b<br>c</p></body></html>"#;

        let packed = pack_in(dir.path(), html, no_shim()).await;
        assert_eq!(packed.html, html);
        assert_eq!(packed.report, PackReport::default());
    }

    #[test]
    fn test_closes_early() {
        assert!(closes_early("a{}</style>b{}", "style"));
        assert!(closes_early("x = '</SCRIPT>';", "script"));
        assert!(!closes_early("x = '<\\/script>';", "script"));
        assert!(!closes_early("a{}", "style"));
    }

    #[tokio::test]
    async fn test_doctype_identifiers_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let html = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd"><html><head></head><body></body></html>"#;

        let packed = pack_in(dir.path(), html, no_shim()).await;
        assert_eq!(packed.html, html);
    }

    #[tokio::test]
    async fn test_doctype_system_only() {
        let dir = tempfile::tempdir().unwrap();
        let html = r#"<!DOCTYPE html SYSTEM "about:legacy-compat"><html><head></head><body></body></html>"#;

        let packed = pack_in(dir.path(), html, no_shim()).await;
        assert_eq!(packed.html, html);
    }

    #[tokio::test]
    async fn test_pre_leading_newlines_survive_repacking() {
        let dir = tempfile::tempdir().unwrap();
        let html = "<html><head></head><body><pre>\n\nx</pre><listing>\ny</listing><pre>z</pre></body></html>";

        let first = pack_in(dir.path(), html, no_shim()).await;
        assert_eq!(
            first.html,
            "<html><head></head><body><pre>\n\nx</pre><listing>y</listing><pre>z</pre></body></html>"
        );
        let second = pack_in(dir.path(), &first.html, no_shim()).await;
        assert_eq!(second.html, first.html);
    }

    #[tokio::test]
    async fn test_alternate_stylesheet_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("dark.css"), "body{background:black}").unwrap();
        let html = r#"<html><head><link rel="alternate stylesheet" title="dark" href="dark.css"></head><body></body></html>"#;

        let packed = pack_in(dir.path(), html, no_shim()).await;
        assert_eq!(packed.html, "<html><head></head><body></body></html>");
        assert_eq!(packed.report.stylesheets, 0);
        assert_eq!(packed.report.dropped_links, 1);
    }

    #[tokio::test]
    async fn test_shim_injected_at_end_of_head() {
        let dir = tempfile::tempdir().unwrap();
        let html = "<html><head><title>x</title></head><body></body></html>";

        let packed = pack_in(dir.path(), html, PackOptions::default()).await;
        assert_eq!(
            packed.html,
            format!("<html><head><title>x</title>{RUNTIME_SHIM}</head><body></body></html>")
        );
    }

    #[tokio::test]
    async fn test_icon_is_inlined() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("x.ico"), [0u8, 0, 1, 0]).unwrap();
        let html = r#"<html><head><link rel="icon" href="x.ico"></head><body></body></html>"#;

        let packed = pack_in(dir.path(), html, no_shim()).await;
        assert_eq!(
            packed.html,
            r#"<html><head><link rel="icon" href="data:image/x-icon;base64,AAABAA=="></head><body></body></html>"#
        );
        assert_eq!(packed.report.icons, 1);
    }

    #[tokio::test]
    async fn test_preload_and_unknown_links_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let html = r#"<html><head><link rel="preload" href="a.woff" as="font"><link rel="manifest" href="m.json"><meta name="a"></head><body></body></html>"#;

        let packed = pack_in(dir.path(), html, no_shim()).await;
        assert_eq!(
            packed.html,
            r#"<html><head><meta name="a"></head><body></body></html>"#
        );
        assert_eq!(packed.report.dropped_links, 2);
    }

    #[tokio::test]
    async fn test_stylesheet_is_inlined_with_fonts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("font.woff"), b"FONT").unwrap();
        fs::write(
            dir.path().join("a.css"),
            "@font-face{src:url(font.woff)}",
        )
        .unwrap();
        let html = r#"<html><head><link rel="stylesheet" href="a.css"></head><body></body></html>"#;

        let packed = pack_in(dir.path(), html, no_shim()).await;
        assert_eq!(
            packed.html,
            "<html><head><style>\n@font-face{src:url(\"data:application/font-woff; charset=utf-8; base64,Rk9OVA==\")}\n</style></head><body></body></html>"
        );
        assert_eq!(packed.report.stylesheets, 1);
        assert_eq!(packed.report.css_urls, 1);
    }

    #[tokio::test]
    async fn test_script_src_is_inlined_and_inline_script_kept() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.js"), "console.log(1);").unwrap();
        let html = r#"<html><head></head><body><script src="app.js" defer></script><script>var a = 1 < 2;</script></body></html>"#;

        let packed = pack_in(dir.path(), html, no_shim()).await;
        assert_eq!(
            packed.html,
            "<html><head></head><body><script>\nconsole.log(1);\n</script><script>var a = 1 < 2;</script></body></html>"
        );
        assert_eq!(packed.report.scripts, 1);
    }

    #[tokio::test]
    async fn test_nested_script_is_inlined() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("w.js"), "w();").unwrap();
        let html = r#"<html><head></head><body><div id="app"><script src="w.js"></script></div></body></html>"#;

        let packed = pack_in(dir.path(), html, no_shim()).await;
        assert_eq!(
            packed.html,
            "<html><head></head><body><div id=\"app\"><script>\nw();\n</script></div></body></html>"
        );
    }

    #[tokio::test]
    async fn test_document_order_is_preserved() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("1.js"), "one").unwrap();
        fs::write(dir.path().join("2.css"), "two").unwrap();
        fs::write(dir.path().join("3.js"), "three").unwrap();
        let html = r#"<html><head><script src="1.js"></script><link rel="stylesheet" href="2.css"><script src="3.js"></script></head><body></body></html>"#;

        let packed = pack_in(dir.path(), html, no_shim()).await;
        let one = packed.html.find("one").unwrap();
        let two = packed.html.find("two").unwrap();
        let three = packed.html.find("three").unwrap();
        assert!(one < two && two < three);
    }

    #[tokio::test]
    async fn test_missing_script_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let html = r#"<html><head><script src="missing.js"></script></head></html>"#;

        let result = try_pack_in(dir.path(), html, no_shim()).await;
        assert!(matches!(result, Err(InlineError::Io { .. })));
    }

    #[tokio::test]
    async fn test_missing_script_skipped_keeps_element() {
        let dir = tempfile::tempdir().unwrap();
        let html = r#"<html><head><script src="missing.js"></script></head><body></body></html>"#;
        let options = PackOptions {
            on_error: OnError::Skip,
            inject_shim: false,
            ..Default::default()
        };

        let packed = pack_in(dir.path(), html, options).await;
        assert_eq!(
            packed.html,
            r#"<html><head><script src="missing.js"></script></head><body></body></html>"#
        );
        assert_eq!(packed.report.scripts, 0);
        assert_eq!(packed.report.skipped.len(), 1);
        assert_eq!(packed.report.skipped[0].kind, ResourceKind::Script);
        assert_eq!(packed.report.skipped[0].reference, "missing.js");
    }

    #[tokio::test]
    async fn test_stylesheet_without_href_fails() {
        let dir = tempfile::tempdir().unwrap();
        let html = r#"<html><head><link rel="stylesheet"></head></html>"#;

        let result = try_pack_in(dir.path(), html, no_shim()).await;
        assert!(matches!(result, Err(InlineError::InvalidReference(_))));
    }
}
