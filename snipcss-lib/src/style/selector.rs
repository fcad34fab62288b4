use crate::dom::dom_tree::{Document, ElementNode, NodeId};
use crate::error::SelectorError;
use std::borrow::Cow;
use std::iter::Peekable;
use std::str::CharIndices;

/// ------------------------------
/// 1. Selector Parsing
/// ------------------------------

/// Supported attribute selector operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOperator {
    /// [attr="value"]
    Exact,
    /// [attr~="value"]
    Includes,
    /// [attr|="value"]
    DashMatch,
    /// [attr^="value"]
    Prefix,
    /// [attr$="value"]
    Suffix,
    /// [attr*="value"]
    Substring,
}

/// Represents one attribute condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    pub name: String,
    /// `None` with `value: None` means only an existence check.
    pub operator: Option<AttributeOperator>,
    pub value: Option<String>,
    /// Set by the `i` flag: `[type="a" i]`.
    pub case_insensitive: bool,
}

/// A compound selector: an optional tag, id, classes and attribute conditions.
/// `*` and an omitted tag both leave `tag` empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundSelector {
    pub tag: Option<String>,
    pub ids: Vec<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<AttributeSelector>,
}

/// A complex selector composed of a key compound selector and a list of ancestor parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub key: CompoundSelector,
    /// Ancestors with their combinators, in right-to-left order.
    pub ancestors: Vec<(Combinator, CompoundSelector)>,
}

/// Supported combinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Descendant combinator (a space).
    Descendant,
    /// Child combinator (`>`).
    Child,
    /// Adjacent sibling combinator (`+`).
    AdjacentSibling,
    /// General sibling combinator (`~`).
    GeneralSibling,
}

/// Parse one complex selector, e.g. `div.red > p#header + span[data-x~="y"]`.
///
/// Pseudo-classes, pseudo-elements, named or empty namespace prefixes and
/// selector lists are not part of the supported grammar and yield an error.
/// The any-namespace prefix `*|` is accepted.
pub fn parse_selector(selector: &str) -> Result<ComplexSelector, SelectorError> {
    SelectorParser::new(selector).parse()
}

struct SelectorParser<'a> {
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> SelectorParser<'a> {
    fn new(input: &'a str) -> Self {
        SelectorParser {
            chars: input.char_indices().peekable(),
        }
    }

    fn parse(mut self) -> Result<ComplexSelector, SelectorError> {
        self.skip_whitespace();
        if self.chars.peek().is_none() {
            return Err(SelectorError::Empty);
        }

        // Parsed left to right, stored right to left.
        let mut key = self.parse_compound()?;
        let mut ancestors = Vec::new();
        loop {
            let had_space = self.skip_whitespace();
            let combinator = match self.chars.peek() {
                None => break,
                Some(&(_, '>')) => Combinator::Child,
                Some(&(_, '+')) => Combinator::AdjacentSibling,
                Some(&(_, '~')) => Combinator::GeneralSibling,
                Some(_) if had_space => Combinator::Descendant,
                Some(&(offset, found)) => return Err(SelectorError::Unexpected { found, offset }),
            };
            if combinator != Combinator::Descendant {
                self.chars.next();
                self.skip_whitespace();
            }
            let next = self.parse_compound()?;
            ancestors.push((combinator, std::mem::replace(&mut key, next)));
        }
        ancestors.reverse();
        Ok(ComplexSelector { key, ancestors })
    }

    fn parse_compound(&mut self) -> Result<CompoundSelector, SelectorError> {
        let mut compound = CompoundSelector::default();
        let mut empty = true;

        match self.chars.peek() {
            Some(&(_, '*')) => {
                self.chars.next();
                empty = false;
                // `*|` is the any-namespace prefix; every element satisfies it.
                if let Some(&(_, '|')) = self.chars.peek() {
                    self.chars.next();
                    compound.tag = self.parse_type_selector()?;
                }
            }
            Some(&(_, ch)) if starts_ident(ch) => {
                compound.tag = self.parse_type_selector()?;
                empty = false;
            }
            _ => {}
        }

        while let Some(&(offset, ch)) = self.chars.peek() {
            match ch {
                '#' => {
                    self.chars.next();
                    compound.ids.push(self.parse_ident()?);
                }
                '.' => {
                    self.chars.next();
                    compound.classes.push(self.parse_ident()?);
                }
                '[' => {
                    self.chars.next();
                    compound.attributes.push(self.parse_attribute()?);
                }
                '|' => {
                    return Err(SelectorError::Unsupported(
                        "namespace prefixes".to_string(),
                    ))
                }
                c if c.is_whitespace() || matches!(c, '>' | '+' | '~') => break,
                found => return Err(SelectorError::Unexpected { found, offset }),
            }
            empty = false;
        }

        if empty {
            return match self.chars.peek() {
                Some(&(offset, found)) => Err(SelectorError::Unexpected { found, offset }),
                None => Err(SelectorError::Unterminated("combinator")),
            };
        }
        Ok(compound)
    }

    /// A type selector: `*` (no constraint) or a tag name.
    fn parse_type_selector(&mut self) -> Result<Option<String>, SelectorError> {
        if let Some(&(_, '*')) = self.chars.peek() {
            self.chars.next();
            return Ok(None);
        }
        Ok(Some(self.parse_ident()?.to_ascii_lowercase()))
    }

    fn parse_attribute(&mut self) -> Result<AttributeSelector, SelectorError> {
        self.skip_whitespace();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_whitespace();

        let operator = match self.chars.next() {
            Some((_, ']')) => {
                return Ok(AttributeSelector {
                    name,
                    operator: None,
                    value: None,
                    case_insensitive: false,
                })
            }
            Some((_, '=')) => AttributeOperator::Exact,
            Some((offset, prefix)) => {
                let operator = match prefix {
                    '~' => AttributeOperator::Includes,
                    '|' => AttributeOperator::DashMatch,
                    '^' => AttributeOperator::Prefix,
                    '$' => AttributeOperator::Suffix,
                    '*' => AttributeOperator::Substring,
                    found => return Err(SelectorError::Unexpected { found, offset }),
                };
                match self.chars.next() {
                    Some((_, '=')) => operator,
                    Some((offset, found)) => {
                        return Err(SelectorError::Unexpected { found, offset })
                    }
                    None => return Err(SelectorError::Unterminated("attribute selector")),
                }
            }
            None => return Err(SelectorError::Unterminated("attribute selector")),
        };

        self.skip_whitespace();
        let value = match self.chars.peek() {
            Some(&(_, quote)) if quote == '"' || quote == '\'' => {
                self.chars.next();
                self.parse_string(quote)?
            }
            _ => self.parse_ident()?,
        };
        self.skip_whitespace();

        let mut case_insensitive = false;
        if let Some(&(_, flag)) = self.chars.peek() {
            if matches!(flag, 'i' | 'I' | 's' | 'S') {
                self.chars.next();
                case_insensitive = flag.eq_ignore_ascii_case(&'i');
                self.skip_whitespace();
            }
        }

        match self.chars.next() {
            Some((_, ']')) => Ok(AttributeSelector {
                name,
                operator: Some(operator),
                value: Some(value),
                case_insensitive,
            }),
            Some((offset, found)) => Err(SelectorError::Unexpected { found, offset }),
            None => Err(SelectorError::Unterminated("attribute selector")),
        }
    }

    fn parse_ident(&mut self) -> Result<String, SelectorError> {
        let mut ident = String::new();
        while let Some(&(_, ch)) = self.chars.peek() {
            if ch == '\\' {
                self.chars.next();
                ident.push(self.parse_escape()?);
            } else if is_ident_char(ch) {
                ident.push(ch);
                self.chars.next();
            } else {
                break;
            }
        }
        if ident.is_empty() {
            return match self.chars.peek() {
                Some(&(offset, found)) => Err(SelectorError::Unexpected { found, offset }),
                None => Err(SelectorError::Unterminated("identifier")),
            };
        }
        Ok(ident)
    }

    fn parse_string(&mut self, quote: char) -> Result<String, SelectorError> {
        let mut value = String::new();
        loop {
            match self.chars.next() {
                Some((_, ch)) if ch == quote => return Ok(value),
                Some((_, '\\')) => {
                    // An escaped newline is a line continuation.
                    if let Some(&(_, '\n')) = self.chars.peek() {
                        self.chars.next();
                    } else {
                        value.push(self.parse_escape()?);
                    }
                }
                Some((_, ch)) => value.push(ch),
                None => return Err(SelectorError::Unterminated("string")),
            }
        }
    }

    /// Decodes the escape after a backslash: up to six hex digits plus one
    /// optional whitespace, or a single literal character.
    fn parse_escape(&mut self) -> Result<char, SelectorError> {
        let mut hex = String::new();
        while hex.len() < 6 {
            match self.chars.peek() {
                Some(&(_, ch)) if ch.is_ascii_hexdigit() => {
                    hex.push(ch);
                    self.chars.next();
                }
                _ => break,
            }
        }
        if hex.is_empty() {
            return match self.chars.next() {
                Some((_, ch)) => Ok(ch),
                None => Err(SelectorError::Unterminated("escape")),
            };
        }
        if let Some(&(_, ch)) = self.chars.peek() {
            if ch.is_whitespace() {
                self.chars.next();
            }
        }
        let code = u32::from_str_radix(&hex, 16).unwrap_or(0);
        Ok(match char::from_u32(code) {
            Some(ch) if code != 0 => ch,
            _ => char::REPLACEMENT_CHARACTER,
        })
    }

    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while let Some(&(_, ch)) = self.chars.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.chars.next();
            skipped = true;
        }
        skipped
    }
}

fn starts_ident(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '-' || ch == '\\' || !ch.is_ascii()
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' || !ch.is_ascii()
}

/// ------------------------------
/// 2. Selector Text Utilities
/// ------------------------------

/// Tracks whether a scan position sits inside a string, brackets or parentheses.
#[derive(Default)]
struct Nesting {
    quote: Option<char>,
    brackets: usize,
    parens: usize,
}

impl Nesting {
    /// Feeds one unescaped character; returns true if it sits at top level.
    fn feed(&mut self, ch: char) -> bool {
        if let Some(quote) = self.quote {
            if ch == quote {
                self.quote = None;
            }
            return false;
        }
        match ch {
            '"' | '\'' => self.quote = Some(ch),
            '[' => self.brackets += 1,
            ']' => self.brackets = self.brackets.saturating_sub(1),
            '(' => self.parens += 1,
            ')' => self.parens = self.parens.saturating_sub(1),
            _ => return self.brackets == 0 && self.parens == 0,
        }
        false
    }
}

/// Splits a selector list on its top-level commas and trims each part.
///
/// Commas inside strings, attribute brackets, functional pseudo arguments or
/// escapes do not split.
pub fn split_selector_list(selector_text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut nesting = Nesting::default();
    let mut start = 0;
    let mut chars = selector_text.char_indices();
    while let Some((i, ch)) = chars.next() {
        if ch == '\\' {
            chars.next();
            continue;
        }
        if nesting.feed(ch) && ch == ',' {
            parts.push(selector_text[start..i].trim());
            start = i + 1;
        }
    }
    parts.push(selector_text[start..].trim());
    parts
}

/// True if the selector contains a pseudo-class or pseudo-element marker: an
/// unescaped `:` outside attribute brackets and strings.
pub fn has_pseudo_marker(selector: &str) -> bool {
    let mut nesting = Nesting::default();
    let mut chars = selector.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            chars.next();
            continue;
        }
        if nesting.feed(ch) && ch == ':' {
            return true;
        }
    }
    false
}

/// Removes every pseudo-class and pseudo-element token (`:hover`,
/// `::before`, `:nth-child(2n + 1)`) from `selector`, leaving the base
/// selector that real elements can be tested against.
///
/// A colon not followed by an identifier is left in place.
pub fn strip_pseudo_tokens(selector: &str) -> String {
    let mut out = String::with_capacity(selector.len());
    let mut nesting = Nesting::default();
    let mut chars = selector.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            out.push(ch);
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
            continue;
        }
        if !(nesting.feed(ch) && ch == ':') {
            out.push(ch);
            continue;
        }

        let mut token = String::from(":");
        if chars.peek() == Some(&':') {
            token.push(':');
            chars.next();
        }
        let mut name_len = 0;
        while let Some(&next) = chars.peek() {
            if next.is_ascii_alphanumeric() || next == '-' || next == '_' {
                token.push(next);
                chars.next();
                name_len += 1;
            } else {
                break;
            }
        }
        if name_len == 0 {
            out.push_str(&token);
            continue;
        }
        if chars.peek() == Some(&'(') {
            skip_balanced_parens(&mut chars);
        }
    }
    out
}

fn skip_balanced_parens(chars: &mut Peekable<std::str::Chars<'_>>) {
    let mut nesting = Nesting::default();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            chars.next();
            continue;
        }
        nesting.feed(ch);
        if nesting.parens == 0 && nesting.quote.is_none() && nesting.brackets == 0 {
            return;
        }
    }
}

/// The selector to test against real elements for one entry of a selector
/// list: the entry itself, or its base selector when it carries pseudo
/// tokens. `None` when nothing testable remains (`::before` alone).
pub fn test_selector(selector: &str) -> Option<Cow<'_, str>> {
    if !has_pseudo_marker(selector) {
        return Some(Cow::Borrowed(selector));
    }
    let base = strip_pseudo_tokens(selector);
    let base = base.trim();
    if base.is_empty() {
        None
    } else {
        Some(Cow::Owned(base.to_string()))
    }
}

/// ------------------------------
/// 3. Selector Matching
/// ------------------------------

/// Returns true if the given ElementNode matches the CompoundSelector.
/// Checks tag, ids, classes, and attribute conditions.
pub fn matches_compound(elem: &ElementNode, compound: &CompoundSelector) -> bool {
    if let Some(tag) = &compound.tag {
        if !elem.tag.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if !compound.ids.iter().all(|id| elem.id() == Some(id.as_str())) {
        return false;
    }
    if !compound.classes.iter().all(|class| elem.has_class(class)) {
        return false;
    }
    compound
        .attributes
        .iter()
        .all(|attr_sel| matches_attribute(elem, attr_sel))
}

fn matches_attribute(elem: &ElementNode, attr_sel: &AttributeSelector) -> bool {
    let Some(actual) = elem.attr(&attr_sel.name) else {
        return false;
    };
    let (Some(operator), Some(expected)) = (attr_sel.operator, attr_sel.value.as_deref()) else {
        return true;
    };

    let (actual, expected): (Cow<'_, str>, Cow<'_, str>) = if attr_sel.case_insensitive {
        (
            Cow::Owned(actual.to_ascii_lowercase()),
            Cow::Owned(expected.to_ascii_lowercase()),
        )
    } else {
        (Cow::Borrowed(actual), Cow::Borrowed(expected))
    };
    let (actual, expected) = (actual.as_ref(), expected.as_ref());

    match operator {
        AttributeOperator::Exact => actual == expected,
        AttributeOperator::Includes => {
            !expected.is_empty() && actual.split_ascii_whitespace().any(|word| word == expected)
        }
        AttributeOperator::DashMatch => {
            actual == expected
                || actual
                    .strip_prefix(expected)
                    .map(|rest| rest.starts_with('-'))
                    .unwrap_or(false)
        }
        // Empty values never match for the substring operators.
        AttributeOperator::Prefix => !expected.is_empty() && actual.starts_with(expected),
        AttributeOperator::Suffix => !expected.is_empty() && actual.ends_with(expected),
        AttributeOperator::Substring => !expected.is_empty() && actual.contains(expected),
    }
}

/// Matches a ComplexSelector against a candidate element.
/// The matching proceeds right-to-left, backtracking over ancestors and siblings.
pub fn matches_complex_selector(document: &Document, candidate: NodeId, complex: &ComplexSelector) -> bool {
    match document.element(candidate) {
        Some(elem) if matches_compound(elem, &complex.key) => {
            matches_ancestors(document, candidate, &complex.ancestors)
        }
        _ => false,
    }
}

fn matches_ancestors(
    document: &Document,
    current: NodeId,
    ancestors: &[(Combinator, CompoundSelector)],
) -> bool {
    let Some(((combinator, compound), rest)) = ancestors.split_first() else {
        return true;
    };
    let matches_here = |node: NodeId| {
        document
            .element(node)
            .map(|elem| matches_compound(elem, compound))
            .unwrap_or(false)
            && matches_ancestors(document, node, rest)
    };

    match combinator {
        Combinator::Child => document.parent_element(current).map_or(false, matches_here),
        Combinator::AdjacentSibling => document
            .prev_element_sibling(current)
            .map_or(false, matches_here),
        Combinator::Descendant => {
            std::iter::successors(document.parent_element(current), |n| {
                document.parent_element(*n)
            })
            .any(matches_here)
        }
        Combinator::GeneralSibling => {
            std::iter::successors(document.prev_element_sibling(current), |n| {
                document.prev_element_sibling(*n)
            })
            .any(matches_here)
        }
    }
}

impl Document {
    /// Does `node` match `selector`? Mirrors `Element.matches`.
    pub fn matches(&self, node: NodeId, selector: &str) -> Result<bool, SelectorError> {
        let complex = parse_selector(selector)?;
        Ok(matches_complex_selector(self, node, &complex))
    }

    /// Nearest ancestor-or-self of `node` matching `selector`. Mirrors `Element.closest`.
    pub fn closest(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        let complex = parse_selector(selector)?;
        Ok(self
            .ancestors_or_self(node)
            .find(|n| matches_complex_selector(self, *n, &complex)))
    }

    /// First element in document order matching `selector`. Mirrors `querySelector`.
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        let complex = parse_selector(selector)?;
        Ok(self
            .descendants(self.root())
            .into_iter()
            .find(|n| matches_complex_selector(self, *n, &complex)))
    }
}
