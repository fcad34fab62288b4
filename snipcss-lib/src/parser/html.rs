//! This module contains functions and types for parsing HTML into the arena DOM.
//!
//! It uses html5ever as the HTML parser and builds a DOM tree defined in the
//! `crate::dom::dom_tree` module.

use crate::dom::dom_tree::{self, Document, ElementNode, NodeData, NodeId};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{
    interface::{ElemName, ElementFlags, NodeOrText, QuirksMode, TreeSink},
    Attribute, LocalName, Namespace, QualName,
};
use log::trace;
use std::borrow::Cow;
use std::cell::RefCell;

/// Creates a DOM tree from the provided HTML content.
///
/// # Arguments
///
/// * `html_content` - A string slice containing the HTML to parse.
///
/// # Returns
///
/// A `dom_tree::Document` representing the parsed HTML. html5ever recovers
/// from every malformed input, so this never fails.
pub fn create_dom_tree(html_content: &str) -> Document {
    let tree_sink = SnipTreeSink::new();
    html5ever::parse_document(tree_sink, Default::default()).one(html_content)
}

/// A custom TreeSink for building the arena DOM.
///
/// html5ever only hands out `&self`, so the document being built sits behind a `RefCell`.
pub struct SnipTreeSink {
    document: RefCell<Document>,
}

impl SnipTreeSink {
    /// Creates a new `SnipTreeSink` with an empty document.
    pub fn new() -> Self {
        Self {
            document: RefCell::new(dom_tree::new_document()),
        }
    }

    fn new_node(&self, data: NodeData) -> NodeId {
        self.document.borrow_mut().push(data)
    }

    /// Returns the text node directly before `sibling`, or the last child of `parent`.
    fn adjacent_text(&self, parent: NodeId, sibling: Option<NodeId>) -> Option<NodeId> {
        let doc = self.document.borrow();
        let children = &doc.node(parent).children;
        let candidate = match sibling {
            Some(sibling) => {
                let pos = children.iter().position(|c| *c == sibling)?;
                pos.checked_sub(1).map(|p| children[p])
            }
            None => children.last().copied(),
        }?;
        matches!(doc.node(candidate).data, NodeData::Text(_)).then_some(candidate)
    }

    fn push_text(&self, target: NodeId, text: &str) {
        if let NodeData::Text(existing) = &mut self.document.borrow_mut().node_mut(target).data {
            existing.push_str(text);
        }
    }
}

impl Default for SnipTreeSink {
    fn default() -> Self {
        Self::new()
    }
}

/// An owned implementation of the `ElemName` trait for our elements.
#[derive(Debug)]
pub struct SnipElemName {
    ns: Namespace,
    local: LocalName,
}

impl ElemName for SnipElemName {
    fn local_name(&self) -> &LocalName {
        &self.local
    }

    fn ns(&self) -> &Namespace {
        &self.ns
    }
}

impl TreeSink for SnipTreeSink {
    type Handle = NodeId;
    type Output = Document;
    type ElemName<'a>
        = SnipElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self.document.into_inner()
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        trace!("html parse error: {}", msg);
    }

    fn get_document(&self) -> Self::Handle {
        self.document.borrow().root()
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        let doc = self.document.borrow();
        match doc.element(*target) {
            Some(elem) => SnipElemName {
                ns: elem.qual_name.ns.clone(),
                local: elem.qual_name.local.clone(),
            },
            // html5ever only asks for names of elements it created.
            None => SnipElemName {
                ns: Namespace::from(""),
                local: LocalName::from(""),
            },
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        flags: ElementFlags,
    ) -> Self::Handle {
        let mut element = ElementNode::new(name.local.to_string(), name);
        element.attributes = attrs
            .into_iter()
            .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
            .collect();
        if flags.template {
            element.template_contents = Some(self.new_node(NodeData::DocumentFragment));
        }
        self.new_node(NodeData::Element(element))
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        self.new_node(NodeData::Comment(text.to_string()))
    }

    /// Processing instructions only occur in XML; keep them as comments.
    fn create_pi(&self, target: StrTendril, data: StrTendril) -> Self::Handle {
        self.new_node(NodeData::Comment(format!("?{} {}?", target, data)))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        match child {
            NodeOrText::AppendNode(node) => {
                self.document.borrow_mut().append_child(*parent, node);
            }
            NodeOrText::AppendText(text) => {
                if let Some(last) = self.adjacent_text(*parent, None) {
                    self.push_text(last, &text);
                } else {
                    let node = self.new_node(NodeData::Text(text.to_string()));
                    self.document.borrow_mut().append_child(*parent, node);
                }
            }
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let has_parent = self.document.borrow().node(*element).parent.is_some();
        if has_parent {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        self.document.borrow_mut().doctype = Some(dom_tree::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        });
    }

    /// Template contents go into the template's detached fragment.
    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        self.document
            .borrow()
            .element(*target)
            .and_then(|elem| elem.template_contents)
            .unwrap_or(*target)
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        trace!("quirks mode: {:?}", mode);
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let Some(parent) = self.document.borrow().node(*sibling).parent else {
            return;
        };
        match child {
            NodeOrText::AppendNode(node) => {
                self.document.borrow_mut().insert_before(*sibling, node);
            }
            NodeOrText::AppendText(text) => {
                if let Some(prev) = self.adjacent_text(parent, Some(*sibling)) {
                    self.push_text(prev, &text);
                } else {
                    let node = self.new_node(NodeData::Text(text.to_string()));
                    self.document.borrow_mut().insert_before(*sibling, node);
                }
            }
        }
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let mut doc = self.document.borrow_mut();
        if let NodeData::Element(elem) = &mut doc.node_mut(*target).data {
            for attr in attrs {
                let key = attr.name.local.to_string();
                if elem.attr(&key).is_none() {
                    elem.attributes.push((key, attr.value.to_string()));
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        self.document.borrow_mut().detach(*target);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let mut doc = self.document.borrow_mut();
        let children = std::mem::take(&mut doc.node_mut(*node).children);
        for child in children {
            doc.node_mut(child).parent = None;
            doc.append_child(*new_parent, child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tags(doc: &Document, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| doc.element(*id))
            .map(|e| e.tag.clone())
            .collect()
    }

    #[test]
    fn test_basic_structure() {
        let doc = create_dom_tree(
            "<!DOCTYPE html><html><head><title>T</title></head><body><h1>Hi</h1><p>World</p></body></html>",
        );
        let html = doc.document_element().unwrap();
        assert_eq!(
            tags(&doc, &doc.descendants(html)),
            vec!["head", "title", "body", "h1", "p"]
        );
        assert_eq!(doc.doctype.as_ref().unwrap().name, "html");
    }

    #[test]
    fn test_adjacent_text_is_merged() {
        let doc = create_dom_tree("<p>one &amp; two</p>");
        let p = doc
            .descendants(doc.root())
            .into_iter()
            .find(|id| doc.element(*id).map(|e| e.tag == "p").unwrap_or(false))
            .unwrap();
        assert_eq!(doc.node(p).children.len(), 1);
        assert_eq!(doc.text_content(p), "one & two");
    }

    #[test]
    fn test_table_autocorrection() {
        let doc = create_dom_tree("<table><td>Cell</td></table>");
        let html = doc.document_element().unwrap();
        assert_eq!(
            tags(&doc, &doc.descendants(html)),
            vec!["head", "body", "table", "tbody", "tr", "td"]
        );
    }

    #[test]
    fn test_template_contents_are_detached() {
        let doc = create_dom_tree(
            r#"<div><template><style>.x { color: red }</style><span class="inner"></span></template></div>"#,
        );
        let html = doc.document_element().unwrap();
        assert_eq!(
            tags(&doc, &doc.descendants(html)),
            vec!["head", "body", "div", "template"]
        );

        let template = doc
            .descendants(html)
            .into_iter()
            .find(|id| doc.element(*id).map(|e| e.tag == "template").unwrap_or(false))
            .unwrap();
        let fragment = doc.element(template).unwrap().template_contents.unwrap();
        assert!(doc.node(template).children.is_empty());
        assert!(doc.node(fragment).parent.is_none());
        assert_eq!(tags(&doc, &doc.descendants(fragment)), vec!["style", "span"]);
    }

    #[test]
    fn test_misnested_formatting_is_reparented() {
        // Adoption agency: <b> is split around the <p>.
        let doc = create_dom_tree("<b>1<p>2</b>3</p>");
        let html = doc.document_element().unwrap();
        assert_eq!(
            tags(&doc, &doc.descendants(html)),
            vec!["head", "body", "b", "p", "b"]
        );
        assert_eq!(doc.text_content(html), "123");
    }
}
