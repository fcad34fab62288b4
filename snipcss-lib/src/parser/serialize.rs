//! HTML serialisation of DOM subtrees (the `outerHTML` of an element).

use crate::dom::dom_tree::{Document, NodeData, NodeId};

/// A list of void (self-closing) elements in HTML.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose text children are emitted verbatim.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

/// Serialises `node` and its subtree the way `Element.outerHTML` does.
pub fn outer_html(document: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(document, node, &mut out);
    out
}

/// Serialises the whole document, doctype included.
pub fn document_html(document: &Document) -> String {
    let mut out = String::new();
    if let Some(doctype) = &document.doctype {
        out.push_str(&format!("<!DOCTYPE {}>", doctype.name));
    }
    for child in &document.node(document.root()).children {
        write_node(document, *child, &mut out);
    }
    out
}

fn write_node(document: &Document, node: NodeId, out: &mut String) {
    match &document.node(node).data {
        NodeData::DocumentRoot | NodeData::DocumentFragment => {
            for child in &document.node(node).children {
                write_node(document, *child, out);
            }
        }
        NodeData::Element(elem) => {
            out.push('<');
            out.push_str(&elem.tag);
            for (name, value) in &elem.attributes {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_into(value, true, out);
                out.push('"');
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&elem.tag.as_str()) {
                return;
            }

            let raw = RAW_TEXT_ELEMENTS.contains(&elem.tag.as_str());
            // A template serialises its contents fragment.
            let content = elem.template_contents.unwrap_or(node);
            for child in &document.node(content).children {
                match &document.node(*child).data {
                    NodeData::Text(text) if raw => out.push_str(text),
                    _ => write_node(document, *child, out),
                }
            }

            out.push_str("</");
            out.push_str(&elem.tag);
            out.push('>');
        }
        NodeData::Text(text) => escape_into(text, false, out),
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::html::create_dom_tree;
    use pretty_assertions::assert_eq;

    fn first(doc: &Document, tag: &str) -> NodeId {
        doc.descendants(doc.root())
            .into_iter()
            .find(|id| doc.element(*id).map(|e| e.tag == tag).unwrap_or(false))
            .unwrap()
    }

    #[test]
    fn test_outer_html_void_and_text() {
        let doc = create_dom_tree(r#"<div class="card" title="a &quot;b&quot;">x &lt; y<br><img src=a.png></div>"#);
        assert_eq!(
            outer_html(&doc, first(&doc, "div")),
            r#"<div class="card" title="a &quot;b&quot;">x &lt; y<br><img src="a.png"></div>"#
        );
    }

    #[test]
    fn test_outer_html_raw_text_and_comment() {
        let doc = create_dom_tree("<section><!-- c --><style>a > b { color: red }</style></section>");
        assert_eq!(
            outer_html(&doc, first(&doc, "section")),
            "<section><!-- c --><style>a > b { color: red }</style></section>"
        );
    }

    #[test]
    fn test_outer_html_includes_template_contents() {
        let doc = create_dom_tree(r#"<div><template><b class="t">x</b></template></div>"#);
        assert_eq!(
            outer_html(&doc, first(&doc, "div")),
            r#"<div><template><b class="t">x</b></template></div>"#
        );
    }

    #[test]
    fn test_document_html_keeps_doctype() {
        let doc = create_dom_tree("<!doctype html><p>hi</p>");
        assert_eq!(
            document_html(&doc),
            "<!DOCTYPE html><html><head></head><body><p>hi</p></body></html>"
        );
    }
}
