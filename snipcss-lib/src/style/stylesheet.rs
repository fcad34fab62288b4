use crate::dom::dom_tree::{Document, NodeId};
use crate::error::SheetError;
use crate::style::owned_css::{OwnedRule, OwnedStyleRule};
use lightningcss::printer::PrinterOptions;
use lightningcss::rules::{style::StyleRule, CssRule, CssRuleList};
use lightningcss::stylesheet::{ParserOptions, StyleSheet as LightningStyleSheet};
use lightningcss::traits::ToCss;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// A stylesheet reachable from a page.
///
/// Whether its rules can be read is decided when the sheet is loaded; an
/// unreadable sheet still occupies its slot in document order.
#[derive(Debug)]
pub struct StyleSheet {
    href: Option<String>,
    rules: Result<Vec<OwnedRule>, SheetError>,
}

impl StyleSheet {
    /// Parses CSS text. Invalid rules are dropped the way browsers drop them;
    /// a sheet that cannot be parsed at all becomes unreadable.
    pub fn parse(css_text: &str, href: Option<String>) -> Self {
        let name = href.clone().unwrap_or_else(|| "<style>".to_string());
        let rules = parse_and_own_css(css_text, &name)
            .map_err(|message| SheetError::Parse { href: name, message });
        StyleSheet { href, rules }
    }

    pub fn unreadable(href: Option<String>, error: SheetError) -> Self {
        StyleSheet {
            href,
            rules: Err(error),
        }
    }

    /// Reads and parses a stylesheet file.
    pub fn from_file(path: &Path, href: Option<String>) -> Self {
        let href = href.unwrap_or_else(|| path.display().to_string());
        match fs::read_to_string(path) {
            Ok(css_text) => StyleSheet::parse(&css_text, Some(href)),
            Err(source) => StyleSheet::unreadable(
                Some(href.clone()),
                SheetError::Io { href, source },
            ),
        }
    }

    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    /// The sheet's top-level rules, or why they cannot be read.
    pub fn rules(&self) -> Result<&[OwnedRule], &SheetError> {
        self.rules.as_deref()
    }
}

/// Parse a raw CSS string (LightningCSS) and convert it to fully-owned rules.
fn parse_and_own_css(css_text: &str, filename: &str) -> Result<Vec<OwnedRule>, String> {
    let parser_opts = ParserOptions {
        filename: filename.to_string(),
        error_recovery: true,
        ..ParserOptions::default()
    };
    let sheet = LightningStyleSheet::parse(css_text, parser_opts).map_err(|e| e.to_string())?;

    let mut owned_rules = Vec::with_capacity(sheet.rules.0.len());
    for rule in &sheet.rules.0 {
        let owned = match rule {
            CssRule::Style(style_rule) => match convert_style_rule(style_rule) {
                Some(owned) => OwnedRule::Style(owned),
                None => continue,
            },
            other => OwnedRule::Other {
                kind: rule_kind(other),
            },
        };
        owned_rules.push(owned);
    }
    Ok(owned_rules)
}

/// Helper to serialize a single StyleRule's selectors, declarations and nested
/// rules into an OwnedStyleRule.
fn convert_style_rule(style_rule: &StyleRule<'_>) -> Option<OwnedStyleRule> {
    let selector_text = match style_rule
        .selectors
        .to_css_string(PrinterOptions::default())
    {
        Ok(text) => text,
        Err(err) => {
            warn!("dropping style rule with unprintable selector: {}", err);
            return None;
        }
    };

    let block = &style_rule.declarations;
    let normal = block.declarations.iter().map(|p| (p, false));
    let important = block.important_declarations.iter().map(|p| (p, true));

    let mut declarations = Vec::new();
    for (property, is_important) in normal.chain(important) {
        match property.to_css_string(is_important, PrinterOptions::default()) {
            Ok(text) => declarations.push(text),
            Err(err) => debug!("skipping declaration in {}: {}", selector_text, err),
        }
    }

    let nested = serialize_nested_rules(&style_rule.rules);
    Some(OwnedStyleRule::new(selector_text, &declarations, &nested))
}

/// Rules nested in a style rule, each on one line. Nested style rules use the
/// same form as top-level ones; nested at-rules are printed minified.
fn serialize_nested_rules(rules: &CssRuleList<'_>) -> Vec<String> {
    let mut nested = Vec::with_capacity(rules.0.len());
    for rule in &rules.0 {
        match rule {
            CssRule::Style(style_rule) => {
                if let Some(owned) = convert_style_rule(style_rule) {
                    nested.push(owned.css_text);
                }
            }
            other => {
                let options = PrinterOptions {
                    minify: true,
                    ..PrinterOptions::default()
                };
                match other.to_css_string(options) {
                    Ok(text) if !text.is_empty() => nested.push(text),
                    Ok(_) => {}
                    Err(err) => debug!("skipping nested {} rule: {}", rule_kind(other), err),
                }
            }
        }
    }
    nested
}

fn rule_kind(rule: &CssRule<'_>) -> &'static str {
    match rule {
        CssRule::Style(_) => "style",
        CssRule::Media(_) => "media",
        CssRule::Import(_) => "import",
        CssRule::Supports(_) => "supports",
        CssRule::Keyframes(_) => "keyframes",
        CssRule::FontFace(_) => "font-face",
        CssRule::Page(_) => "page",
        CssRule::Namespace(_) => "namespace",
        _ => "other",
    }
}

/// Collects every stylesheet the document references, in document order:
/// `<style>` elements and `<link rel="stylesheet" href>` elements.
///
/// Relative hrefs resolve against `base_dir`. Remote hrefs are treated as
/// cross-origin and are unreadable.
pub fn document_style_sheets(document: &Document, base_dir: Option<&Path>) -> Vec<StyleSheet> {
    let mut sheets = Vec::new();
    for node in document.descendants(document.root()) {
        let Some(elem) = document.element(node) else {
            continue;
        };
        if elem.tag.eq_ignore_ascii_case("style") {
            sheets.push(StyleSheet::parse(&document.text_content(node), None));
        } else if elem.tag.eq_ignore_ascii_case("link") {
            if let Some(href) = stylesheet_link(document, node) {
                sheets.push(load_linked_sheet(href, base_dir));
            }
        }
    }
    debug!("document references {} stylesheet(s)", sheets.len());
    sheets
}

fn stylesheet_link(document: &Document, node: NodeId) -> Option<&str> {
    let elem = document.element(node)?;
    let is_stylesheet = elem
        .attr("rel")
        .map(|rel| {
            rel.split_ascii_whitespace()
                .any(|token| token.eq_ignore_ascii_case("stylesheet"))
        })
        .unwrap_or(false);
    let href = elem.attr("href")?.trim();
    (is_stylesheet && !href.is_empty()).then_some(href)
}

fn load_linked_sheet(href: &str, base_dir: Option<&Path>) -> StyleSheet {
    if is_cross_origin(href) {
        return StyleSheet::unreadable(
            Some(href.to_string()),
            SheetError::CrossOrigin {
                href: href.to_string(),
            },
        );
    }
    let local = href.strip_prefix("file://").unwrap_or(href);
    let local = local.split(['?', '#']).next().unwrap_or(local);
    let path = match base_dir {
        Some(dir) if Path::new(local).is_relative() => dir.join(local),
        _ => PathBuf::from(local),
    };
    StyleSheet::from_file(&path, Some(href.to_string()))
}

/// True for protocol-relative and absolute non-`file:` URLs.
fn is_cross_origin(href: &str) -> bool {
    if href.starts_with("//") {
        return true;
    }
    match href.split_once(':') {
        // Single letters are Windows drive prefixes, not schemes.
        Some((scheme, _)) if scheme.len() > 1 => {
            scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
                && !scheme.eq_ignore_ascii_case("file")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::html::create_dom_tree;
    use pretty_assertions::assert_eq;

    fn css_texts(sheet: &StyleSheet) -> Vec<String> {
        sheet
            .rules()
            .unwrap()
            .iter()
            .filter_map(OwnedRule::as_style)
            .map(|r| r.css_text.clone())
            .collect()
    }

    #[test]
    fn test_parse_serializes_like_css_text() {
        let sheet = StyleSheet::parse(".card { color: red; }", None);
        assert_eq!(css_texts(&sheet), vec![".card { color: red; }"]);
    }

    #[test]
    fn test_at_rules_are_kept_as_other() {
        let sheet = StyleSheet::parse(
            "@media (min-width: 10px) { .a { color: red } } .b { color: blue }",
            None,
        );
        let rules = sheet.rules().unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0], OwnedRule::Other { kind: "media" });
        assert_eq!(rules[1].as_style().unwrap().selector_text, ".b");
    }

    #[test]
    fn test_selector_list_text() {
        let sheet = StyleSheet::parse(".a, .b:hover { color: red }", None);
        let rules = sheet.rules().unwrap();
        assert_eq!(rules[0].as_style().unwrap().selector_text, ".a, .b:hover");
    }

    #[test]
    fn test_important_is_kept() {
        let sheet = StyleSheet::parse("p { color: red !important }", None);
        assert_eq!(css_texts(&sheet), vec!["p { color: red !important; }"]);
    }

    #[test]
    fn test_nested_rules_are_serialized_inline() {
        let sheet = StyleSheet::parse(".a { color: red; &:hover { margin: 1px; } }", None);
        let rules = sheet.rules().unwrap();
        let rule = rules[0].as_style().unwrap();
        assert_eq!(rule.selector_text, ".a");
        assert_eq!(rule.css_text, ".a { color: red; &:hover { margin: 1px; } }");

        let sheet = StyleSheet::parse(".a { color: red; .b { padding: 2px; } }", None);
        let css_text = &css_texts(&sheet)[0];
        assert!(css_text.starts_with(".a { color: red; "));
        assert!(css_text.ends_with(".b { padding: 2px; } }"));
    }

    #[test]
    fn test_values_are_printed_normalized() {
        let sheet = StyleSheet::parse(
            "p::first-line { margin: 0px 0px 0px 0px; background-image: url(x.png); }",
            None,
        );
        assert_eq!(
            css_texts(&sheet),
            vec![r#"p:first-line { margin: 0; background-image: url("x.png"); }"#]
        );
    }

    #[test]
    fn test_cross_origin_detection() {
        assert!(is_cross_origin("https://cdn.example.com/a.css"));
        assert!(is_cross_origin("//cdn.example.com/a.css"));
        assert!(!is_cross_origin("css/site.css"));
        assert!(!is_cross_origin("file:///tmp/a.css"));
        assert!(!is_cross_origin("C:/styles/a.css"));
    }

    #[test]
    fn test_document_sheets_in_order() {
        let doc = create_dom_tree(
            r#"<html><head>
                <link rel="stylesheet" href="https://cdn.example.com/x.css">
                <style>.a { color: red }</style>
                <link rel="icon" href="favicon.ico">
                <link rel="stylesheet" href="missing-file-for-test.css">
            </head><body></body></html>"#,
        );
        let sheets = document_style_sheets(&doc, Some(Path::new("/nonexistent-dir")));
        assert_eq!(sheets.len(), 3);
        assert!(matches!(
            sheets[0].rules(),
            Err(SheetError::CrossOrigin { .. })
        ));
        assert_eq!(css_texts(&sheets[1]), vec![".a { color: red; }"]);
        assert!(matches!(sheets[2].rules(), Err(SheetError::Io { .. })));
        assert_eq!(sheets[2].href(), Some("missing-file-for-test.css"));
    }
}
