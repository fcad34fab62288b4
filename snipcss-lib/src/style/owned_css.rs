// src/style/owned_css.rs: fully-owned rule types, detached from the lightningcss parse lifetime.
use std::fmt;

/// One top-level rule of a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnedRule {
    /// A selector list plus a declaration block.
    Style(OwnedStyleRule),
    /// Any at-rule (`@media`, `@font-face`, `@import`, ...). Only its kind is kept.
    Other { kind: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedStyleRule {
    /// Comma-separated selector list, e.g. ".btn, .btn:hover".
    pub selector_text: String,
    /// The serialized rule, e.g. ".btn { color: red; }".
    pub css_text: String,
}

impl OwnedRule {
    pub fn as_style(&self) -> Option<&OwnedStyleRule> {
        match self {
            OwnedRule::Style(rule) => Some(rule),
            OwnedRule::Other { .. } => None,
        }
    }
}

impl OwnedStyleRule {
    /// Builds a rule from its selector text, already-serialized declarations
    /// (`"color: red"`, `"margin: 0 !important"`) and already-serialized nested
    /// rules (`"&:hover { color: red; }"`).
    pub fn new(selector_text: String, declarations: &[String], nested: &[String]) -> Self {
        let mut items = Vec::with_capacity(declarations.len() + nested.len());
        items.extend(declarations.iter().map(|decl| format!("{};", decl)));
        items.extend(nested.iter().cloned());
        let css_text = if items.is_empty() {
            format!("{} {{ }}", selector_text)
        } else {
            format!("{} {{ {} }}", selector_text, items.join(" "))
        };
        OwnedStyleRule {
            selector_text,
            css_text,
        }
    }
}

impl fmt::Display for OwnedStyleRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.css_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_text_format() {
        let rule = OwnedStyleRule::new(
            ".a, .b".to_string(),
            &["color: red".to_string(), "margin: 0 !important".to_string()],
            &[],
        );
        assert_eq!(rule.css_text, ".a, .b { color: red; margin: 0 !important; }");
        assert_eq!(OwnedStyleRule::new("p".into(), &[], &[]).to_string(), "p { }");

        let nested = OwnedStyleRule::new(
            ".a".to_string(),
            &["color: red".to_string()],
            &["&:hover { color: red; }".to_string()],
        );
        assert_eq!(nested.css_text, ".a { color: red; &:hover { color: red; } }");
    }
}
