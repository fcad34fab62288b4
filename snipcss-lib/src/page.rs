use crate::dom::dom_tree::{Document, NodeId};
use crate::error::{EnumerationError, SelectorError, SnipError};
use crate::parser::html::create_dom_tree;
use crate::style::stylesheet::{document_style_sheets, StyleSheet};
use crate::style::used_css::{extract_used_css, StyleSheetSource};
use std::path::Path;

/// A parsed document together with the stylesheets it can see.
#[derive(Debug)]
pub struct Page {
    document: Document,
    sheets: Vec<StyleSheet>,
}

impl Page {
    /// Parses `html` and loads its `<style>` and `<link rel="stylesheet">`
    /// sheets. Relative links resolve against `base_dir`.
    pub fn parse(html: &str, base_dir: Option<&Path>) -> Self {
        let document = create_dom_tree(html);
        let sheets = document_style_sheets(&document, base_dir);
        Page { document, sheets }
    }

    pub fn from_parts(document: Document, sheets: Vec<StyleSheet>) -> Self {
        Page { document, sheets }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn style_sheets(&self) -> &[StyleSheet] {
        &self.sheets
    }

    /// Appends a sheet after the ones the document references.
    pub fn add_style_sheet(&mut self, sheet: StyleSheet) {
        self.sheets.push(sheet);
    }

    /// First element matching `selector`, or an error naming the selector.
    pub fn select(&self, selector: &str) -> Result<NodeId, SnipError> {
        self.document
            .query_selector(selector)?
            .ok_or_else(|| SnipError::NoMatch(selector.to_string()))
    }

    /// `<body>` when present, else the document element.
    pub fn default_target(&self) -> Result<NodeId, SnipError> {
        match self.document.query_selector("body") {
            Ok(Some(body)) => Ok(body),
            _ => self
                .document
                .document_element()
                .ok_or(SnipError::EmptyDocument),
        }
    }

    /// CSS used by `root` and its descendants; see [`extract_used_css`].
    pub fn extract_used_css(&self, root: NodeId) -> String {
        extract_used_css(self, &self.document, root)
    }

    pub fn closest(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        self.document.closest(node, selector)
    }
}

impl StyleSheetSource for Page {
    fn style_sheets(&self) -> Result<Vec<&StyleSheet>, EnumerationError> {
        Ok(self.sheets.iter().collect())
    }
}
