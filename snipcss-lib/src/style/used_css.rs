//! Used-CSS extraction: the style rules, drawn from every readable
//! stylesheet, whose selectors match an element or any of its descendants.

use crate::dom::dom_tree::{Document, NodeId};
use crate::error::{EnumerationError, SelectorError};
use crate::style::owned_css::{OwnedRule, OwnedStyleRule};
use crate::style::selector::{
    matches_complex_selector, parse_selector, split_selector_list, test_selector,
};
use crate::style::stylesheet::StyleSheet;
use log::{debug, info, trace, warn};
use rayon::prelude::*;
use std::collections::HashSet;

/// Returned when no rule matches the subtree.
pub const NO_RULES_FOUND: &str =
    "/* No specific CSS rules found (using Tailwind utility classes?) */";

/// Enumerates the stylesheets of a document, in document order.
pub trait StyleSheetSource: Sync {
    fn style_sheets(&self) -> Result<Vec<&StyleSheet>, EnumerationError>;
}

/// The host's element capabilities: subtree enumeration and selector matching.
pub trait ElementMatcher: Sync {
    type Element: Copy + Send + Sync;

    /// `root` followed by all of its descendant elements.
    fn subtree(&self, root: Self::Element) -> Vec<Self::Element>;

    /// Whether any of `elements` matches `selector`. Fails on selector text
    /// the matcher cannot evaluate.
    fn any_matches(&self, elements: &[Self::Element], selector: &str)
        -> Result<bool, SelectorError>;
}

impl StyleSheetSource for [StyleSheet] {
    fn style_sheets(&self) -> Result<Vec<&StyleSheet>, EnumerationError> {
        Ok(self.iter().collect())
    }
}

impl ElementMatcher for Document {
    type Element = NodeId;

    fn subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut elements = vec![root];
        elements.extend(self.descendants(root));
        elements
    }

    fn any_matches(&self, elements: &[NodeId], selector: &str) -> Result<bool, SelectorError> {
        let complex = parse_selector(selector)?;
        Ok(elements
            .iter()
            .any(|element| matches_complex_selector(self, *element, &complex)))
    }
}

/// Distinct rule texts in the order they were first added.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UsedRuleSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl UsedRuleSet {
    /// Adds `css_text` unless an identical text is already present.
    pub fn insert(&mut self, css_text: &str) -> bool {
        if self.seen.contains(css_text) {
            return false;
        }
        self.seen.insert(css_text.to_string());
        self.order.push(css_text.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn join(&self, separator: &str) -> String {
        self.order.join(separator)
    }
}

/// Extracts the CSS used by `root` and its descendants.
///
/// Never fails: an empty result yields [`NO_RULES_FOUND`], and a failure to
/// enumerate the stylesheets yields a `/* Error extracting CSS: ... */` comment.
pub fn extract_used_css<S, M>(sheets: &S, matcher: &M, root: M::Element) -> String
where
    S: StyleSheetSource + ?Sized,
    M: ElementMatcher + ?Sized,
{
    match collect_used_rules(sheets, matcher, root) {
        Ok(used) if used.is_empty() => NO_RULES_FOUND.to_string(),
        Ok(used) => {
            info!("extracted {} used rule(s)", used.len());
            used.join("\n")
        }
        Err(err) => {
            warn!("stylesheet enumeration failed: {}", err);
            format!("/* Error extracting CSS: {} */", err)
        }
    }
}

/// Collects the used-rule set. Sheets are scanned in parallel and merged in
/// stylesheet order, so the result matches a sequential pass.
pub fn collect_used_rules<S, M>(
    sheets: &S,
    matcher: &M,
    root: M::Element,
) -> Result<UsedRuleSet, EnumerationError>
where
    S: StyleSheetSource + ?Sized,
    M: ElementMatcher + ?Sized,
{
    let elements = matcher.subtree(root);
    let sheets = sheets.style_sheets()?;
    debug!(
        "testing {} stylesheet(s) against {} element(s)",
        sheets.len(),
        elements.len()
    );

    let per_sheet: Vec<Vec<&str>> = sheets
        .par_iter()
        .map(|&sheet| used_rules_in_sheet(sheet, matcher, &elements))
        .collect();

    let mut used = UsedRuleSet::default();
    for css_text in per_sheet.into_iter().flatten() {
        used.insert(css_text);
    }
    Ok(used)
}

fn used_rules_in_sheet<'s, M>(
    sheet: &'s StyleSheet,
    matcher: &M,
    elements: &[M::Element],
) -> Vec<&'s str>
where
    M: ElementMatcher + ?Sized,
{
    let rules = match sheet.rules() {
        Ok(rules) => rules,
        Err(err) => {
            debug!("skipping unreadable stylesheet: {}", err);
            return Vec::new();
        }
    };
    rules
        .iter()
        .filter_map(OwnedRule::as_style)
        .filter(|rule| rule_is_used(rule, matcher, elements))
        .map(|rule| rule.css_text.as_str())
        .collect()
}

/// True once any selector of the rule matches any of `elements`. Later
/// selectors are not tested after the first hit.
pub fn rule_is_used<M>(rule: &OwnedStyleRule, matcher: &M, elements: &[M::Element]) -> bool
where
    M: ElementMatcher + ?Sized,
{
    split_selector_list(&rule.selector_text)
        .into_iter()
        .any(|selector| {
            let Some(test) = test_selector(selector) else {
                trace!("{:?} is pseudo-only, skipped", selector);
                return false;
            };
            match matcher.any_matches(elements, &test) {
                Ok(matched) => matched,
                Err(err) => {
                    trace!("{:?} treated as non-matching: {}", test, err);
                    false
                }
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SheetError;
    use crate::parser::html::create_dom_tree;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingSource;

    impl StyleSheetSource for FailingSource {
        fn style_sheets(&self) -> Result<Vec<&StyleSheet>, EnumerationError> {
            Err(EnumerationError("document is detached".to_string()))
        }
    }

    /// Counts match calls so short-circuiting is observable.
    struct CountingMatcher<'d> {
        document: &'d Document,
        calls: AtomicUsize,
    }

    impl ElementMatcher for CountingMatcher<'_> {
        type Element = NodeId;

        fn subtree(&self, root: NodeId) -> Vec<NodeId> {
            self.document.subtree(root)
        }

        fn any_matches(&self, elements: &[NodeId], selector: &str) -> Result<bool, SelectorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.document.any_matches(elements, selector)
        }
    }

    #[test]
    fn test_enumeration_failure_becomes_comment() {
        let doc = create_dom_tree("<div></div>");
        let root = doc.query_selector("div").unwrap().unwrap();
        assert_eq!(
            extract_used_css(&FailingSource, &doc, root),
            "/* Error extracting CSS: document is detached */"
        );
    }

    #[test]
    fn test_short_circuits_after_first_matching_selector() {
        let doc = create_dom_tree(r#"<div class="a"></div>"#);
        let root = doc.query_selector("div").unwrap().unwrap();
        let sheets = vec![StyleSheet::parse(".a, .b, .c { color: red }", None)];
        let matcher = CountingMatcher {
            document: &doc,
            calls: AtomicUsize::new(0),
        };
        let used = collect_used_rules(sheets.as_slice(), &matcher, root).unwrap();
        assert_eq!(used.len(), 1);
        assert_eq!(matcher.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalid_selector_does_not_abort_rule() {
        let doc = create_dom_tree(r#"<p class="x"></p>"#);
        let root = doc.query_selector("p").unwrap().unwrap();
        let rule = OwnedStyleRule::new("p > > .y, .x".to_string(), &[], &[]);
        let elements = doc.subtree(root);
        assert!(rule_is_used(&rule, &doc, &elements));
    }

    #[test]
    fn test_unreadable_sheet_is_skipped() {
        let doc = create_dom_tree(r#"<p class="x"></p>"#);
        let root = doc.query_selector("p").unwrap().unwrap();
        let sheets = vec![
            StyleSheet::unreadable(
                Some("https://cdn.test/a.css".to_string()),
                SheetError::CrossOrigin {
                    href: "https://cdn.test/a.css".to_string(),
                },
            ),
            StyleSheet::parse(".x { color: red }", None),
        ];
        assert_eq!(
            extract_used_css(sheets.as_slice(), &doc, root),
            ".x { color: red; }"
        );
    }

    #[test]
    fn test_used_rule_set_keeps_first_position() {
        let mut set = UsedRuleSet::default();
        assert!(set.insert("a { }"));
        assert!(set.insert("b { }"));
        assert!(!set.insert("a { }"));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["a { }", "b { }"]);
    }
}
