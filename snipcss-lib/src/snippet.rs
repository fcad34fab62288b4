use crate::dom::dom_tree::NodeId;
use crate::page::Page;
use crate::parser::serialize::{document_html, outer_html};
use log::{debug, trace};

/// Component roots a picked element snaps to, checked in this order.
pub const DEFAULT_COMPONENT_SELECTORS: &[&str] = &[
    ".btn",
    ".alert",
    ".badge",
    ".card",
    ".form-control",
    ".form-select",
    ".form-check",
    ".dropdown",
    ".modal",
    ".offcanvas",
    "table",
    "nav",
    "header",
    "footer",
];

/// Settings for turning a picked element into a snippet.
#[derive(Debug, Clone)]
pub struct SnipConfig {
    pub component_selectors: Vec<String>,
    /// Replace the picked element with its enclosing component, if any.
    pub snap_to_component: bool,
}

impl Default for SnipConfig {
    fn default() -> Self {
        SnipConfig {
            component_selectors: DEFAULT_COMPONENT_SELECTORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            snap_to_component: true,
        }
    }
}

impl SnipConfig {
    /// The element a snippet is taken from when `picked` was clicked.
    pub fn target_for(&self, page: &Page, picked: NodeId) -> NodeId {
        if self.snap_to_component {
            snap_to_component(page, picked, &self.component_selectors)
        } else {
            picked
        }
    }
}

/// Finds the enclosing component of `picked`: for the first selector in
/// `selectors` with a match among `picked` and its ancestors, the nearest
/// such element. Falls back to `picked`.
pub fn snap_to_component<S: AsRef<str>>(page: &Page, picked: NodeId, selectors: &[S]) -> NodeId {
    for selector in selectors {
        match page.closest(picked, selector.as_ref()) {
            Ok(Some(component)) => {
                debug!("snapped to component {:?}", selector.as_ref());
                return component;
            }
            Ok(None) => {}
            Err(err) => trace!("component selector {:?} ignored: {}", selector.as_ref(), err),
        }
    }
    picked
}

pub mod snippet_text {
    use super::*;

    /// The element's markup.
    pub fn html_only(page: &Page, node: NodeId) -> String {
        outer_html(page.document(), node)
    }

    /// Used CSS followed by the element's markup.
    pub fn html_and_css(page: &Page, node: NodeId) -> String {
        let css = page.extract_used_css(node);
        let html = outer_html(page.document(), node);
        format!("/* --- CSS --- */\n{}\n\n<!-- --- HTML --- -->\n{}", css, html)
    }

    /// The whole document's markup.
    pub fn whole_page(page: &Page) -> String {
        document_html(page.document())
    }
}

#[cfg(test)]
mod tests {
    use super::snippet_text::*;
    use super::*;
    use crate::style::used_css::NO_RULES_FOUND;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<style>
.card { padding: 4px; }
.card .title { font-weight: bold; }
.unused { color: green; }
</style>
</head>
<body><nav><div class="card"><span class="title">Hi</span></div></nav></body>
</html>"#;

    #[test]
    fn test_html_and_css_format() {
        let page = Page::parse(PAGE, None);
        let card = page.select(".card").unwrap();
        assert_eq!(
            html_and_css(&page, card),
            "/* --- CSS --- */\n.card { padding: 4px; }\n.card .title { font-weight: bold; }\n\n<!-- --- HTML --- -->\n<div class=\"card\"><span class=\"title\">Hi</span></div>"
        );
    }

    #[test]
    fn test_html_and_css_without_rules() {
        let page = Page::parse("<p>plain</p>", None);
        let p = page.select("p").unwrap();
        assert!(html_and_css(&page, p).starts_with(&format!("/* --- CSS --- */\n{}", NO_RULES_FOUND)));
        assert_eq!(html_only(&page, p), "<p>plain</p>");
    }

    #[test]
    fn test_snap_uses_first_listed_selector() {
        let page = Page::parse(PAGE, None);
        let title = page.select(".title").unwrap();
        let card = page.select(".card").unwrap();
        let nav = page.select("nav").unwrap();

        // `.card` is listed before `nav`, so the card wins even though both enclose the title.
        assert_eq!(SnipConfig::default().target_for(&page, title), card);
        assert_eq!(snap_to_component(&page, title, &["nav", ".card"]), nav);
        assert_eq!(snap_to_component(&page, title, &["footer", "a:hover"]), title);

        let config = SnipConfig {
            snap_to_component: false,
            ..SnipConfig::default()
        };
        assert_eq!(config.target_for(&page, title), title);
    }

    #[test]
    fn test_whole_page() {
        let page = Page::parse("<!doctype html><title>x</title>", None);
        assert_eq!(
            whole_page(&page),
            "<!DOCTYPE html><html><head><title>x</title></head><body></body></html>"
        );
    }
}
