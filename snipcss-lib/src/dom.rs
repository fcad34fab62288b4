use html5ever::QualName;

pub mod dom_tree {
    use super::*;

    /// Index of a node inside its owning [`Document`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct NodeId(pub(crate) usize);

    #[derive(Debug, Clone)]
    pub enum NodeData {
        DocumentRoot,
        /// Holds the contents of a `<template>`. It has no parent, so its nodes
        /// are outside the document tree.
        DocumentFragment,
        Element(ElementNode),
        Text(String),
        Comment(String),
    }

    #[derive(Debug, Clone)]
    pub struct Node {
        pub data: NodeData,
        pub parent: Option<NodeId>,
        pub children: Vec<NodeId>,
    }

    #[derive(Debug, Clone)]
    pub struct ElementNode {
        pub tag: String,
        pub qual_name: QualName,
        /// Attributes in source order.
        pub attributes: Vec<(String, String)>,
        /// The detached fragment holding a `<template>`'s contents.
        pub template_contents: Option<NodeId>,
    }

    /// A parsed document. Nodes live in an arena and refer to each other by
    /// [`NodeId`]; the tree is immutable once the parser hands it over.
    #[derive(Debug, Clone)]
    pub struct Document {
        pub(crate) nodes: Vec<Node>,
        pub doctype: Option<Doctype>,
    }

    #[derive(Debug, Clone)]
    pub struct Doctype {
        pub name: String,
        pub public_id: String,
        pub system_id: String,
    }

    impl ElementNode {
        pub fn new(tag: String, qual_name: QualName) -> Self {
            ElementNode {
                tag,
                qual_name,
                attributes: Vec::new(),
                template_contents: None,
            }
        }

        /// Attribute lookup; HTML attribute names are ASCII case-insensitive.
        pub fn attr(&self, name: &str) -> Option<&str> {
            self.attributes
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }

        pub fn id(&self) -> Option<&str> {
            self.attr("id")
        }

        pub fn has_class(&self, class_name: &str) -> bool {
            self.attr("class")
                .map(|classes| classes.split_ascii_whitespace().any(|c| c == class_name))
                .unwrap_or(false)
        }
    }

    impl Document {
        pub fn root(&self) -> NodeId {
            NodeId(0)
        }

        pub fn node(&self, id: NodeId) -> &Node {
            &self.nodes[id.0]
        }

        pub fn len(&self) -> usize {
            self.nodes.len()
        }

        pub fn is_empty(&self) -> bool {
            self.nodes.len() <= 1
        }

        pub fn element(&self, id: NodeId) -> Option<&ElementNode> {
            match &self.node(id).data {
                NodeData::Element(elem) => Some(elem),
                _ => None,
            }
        }

        /// The `<html>` element, if the document has one.
        pub fn document_element(&self) -> Option<NodeId> {
            self.element_children(self.root()).next()
        }

        pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
            self.node(id)
                .parent
                .filter(|parent| self.element(*parent).is_some())
        }

        pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
            self.node(id)
                .children
                .iter()
                .copied()
                .filter(move |child| self.element(*child).is_some())
        }

        /// The element sibling immediately before `id`, skipping text and comments.
        pub fn prev_element_sibling(&self, id: NodeId) -> Option<NodeId> {
            let parent = self.node(id).parent?;
            let siblings = &self.node(parent).children;
            let pos = siblings.iter().position(|s| *s == id)?;
            siblings[..pos]
                .iter()
                .rev()
                .copied()
                .find(|s| self.element(*s).is_some())
        }

        /// All descendant elements of `id` in document order, excluding `id`.
        pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
            let mut out = Vec::new();
            let mut stack: Vec<NodeId> = self.node(id).children.iter().rev().copied().collect();
            while let Some(next) = stack.pop() {
                if self.element(next).is_some() {
                    out.push(next);
                }
                stack.extend(self.node(next).children.iter().rev().copied());
            }
            out
        }

        /// Element ancestors of `id`, starting with `id` itself when it is an element.
        pub fn ancestors_or_self(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
            let start = self.element(id).map(|_| id).or_else(|| self.parent_element(id));
            std::iter::successors(start, move |current| self.parent_element(*current))
        }

        /// Concatenated text of every text node below `id`.
        pub fn text_content(&self, id: NodeId) -> String {
            let mut out = String::new();
            self.collect_text(id, &mut out);
            out
        }

        fn collect_text(&self, id: NodeId, out: &mut String) {
            match &self.node(id).data {
                NodeData::Text(text) => out.push_str(text),
                _ => {
                    for child in &self.node(id).children {
                        self.collect_text(*child, out);
                    }
                }
            }
        }

        pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
            &mut self.nodes[id.0]
        }

        pub(crate) fn push(&mut self, data: NodeData) -> NodeId {
            let id = NodeId(self.nodes.len());
            self.nodes.push(Node {
                data,
                parent: None,
                children: Vec::new(),
            });
            id
        }

        pub(crate) fn detach(&mut self, child: NodeId) {
            if let Some(parent) = self.node_mut(child).parent.take() {
                self.node_mut(parent).children.retain(|c| *c != child);
            }
        }

        pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) {
            self.detach(child);
            self.node_mut(child).parent = Some(parent);
            self.node_mut(parent).children.push(child);
        }

        pub(crate) fn insert_before(&mut self, sibling: NodeId, child: NodeId) {
            let Some(parent) = self.node(sibling).parent else {
                return;
            };
            self.detach(child);
            let pos = self
                .node(parent)
                .children
                .iter()
                .position(|c| *c == sibling)
                .unwrap_or(self.node(parent).children.len());
            self.node_mut(child).parent = Some(parent);
            self.node_mut(parent).children.insert(pos, child);
        }
    }

    pub fn new_document() -> Document {
        Document {
            nodes: vec![Node {
                data: NodeData::DocumentRoot,
                parent: None,
                children: Vec::new(),
            }],
            doctype: None,
        }
    }
}
