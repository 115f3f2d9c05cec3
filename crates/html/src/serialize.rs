use crate::dom::Document;
use crate::entities::{escape_attribute, escape_text};
use crate::traverse::Edge;
use crate::types::{Id, NodeData, is_rawtext_element, is_void_element};

/// Serializes `id` and its subtree as HTML (`outerHTML` for elements).
///
/// Children of void elements are not written; they would re-parse as
/// siblings.
pub(crate) fn serialize_node(doc: &Document, id: Id, out: &mut String) {
    let mut void_open: Option<Id> = None;
    for edge in doc.traverse(id) {
        match (edge, void_open) {
            (Edge::Close(n), Some(v)) if n == v => void_open = None,
            (_, Some(_)) => {}
            (Edge::Open(n), None) => {
                open(doc, n, out);
                if doc.element(n).is_some_and(|el| is_void_element(&el.name)) {
                    void_open = Some(n);
                }
            }
            (Edge::Close(n), None) => close(doc, n, out),
        }
    }
}

fn open(doc: &Document, id: Id, out: &mut String) {
    match doc.node(id) {
        Some(NodeData::Document { doctype }) => {
            if let Some(dt) = doctype {
                out.push_str("<!");
                out.push_str(dt);
                out.push('>');
            }
        }
        Some(NodeData::Element(el)) => {
            out.push('<');
            out.push_str(&el.name);
            for (k, v) in &el.attributes {
                out.push(' ');
                out.push_str(k);
                if let Some(v) = v {
                    out.push_str("=\"");
                    escape_attribute(v, out);
                    out.push('"');
                }
            }
            out.push('>');
        }
        Some(NodeData::Text(text)) => {
            let raw_parent = doc
                .parent(id)
                .and_then(|p| doc.element(p))
                .is_some_and(|p| is_rawtext_element(&p.name));
            if raw_parent {
                out.push_str(text);
            } else {
                escape_text(text, out);
            }
        }
        Some(NodeData::Comment(text)) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        None => {}
    }
}

fn close(doc: &Document, id: Id, out: &mut String) {
    if let Some(el) = doc.element(id)
        && !is_void_element(&el.name)
    {
        out.push_str("</");
        out.push_str(&el.name);
        out.push('>');
    }
}

#[cfg(test)]
mod tests {
    use crate::Document;

    #[test]
    fn serializes_attributes_and_void_elements() {
        let doc = Document::parse(r#"<p class="a" hidden title='say "hi"'>x<br>y</p>"#);
        let p = doc.first_element_child(doc.root()).unwrap();
        assert_eq!(
            doc.outer_html(p).unwrap(),
            r#"<p class="a" hidden title="say &quot;hi&quot;">x<br>y</p>"#
        );
    }

    #[test]
    fn escapes_text_but_not_script_bodies() {
        let doc = Document::parse("<div>1 &lt; 2</div><script>if (a < b) {}</script>");
        assert_eq!(
            doc.inner_html(doc.root()).unwrap(),
            "<div>1 &lt; 2</div><script>if (a < b) {}</script>"
        );
    }

    #[test]
    fn void_elements_drop_their_children() {
        let mut doc = Document::parse(r#"<p><input id="i">after</p>"#);
        let input = doc.get_element_by_id("i").unwrap();
        doc.set_inner_html(input, "<b>x</b>").unwrap();
        assert_eq!(doc.children(input).len(), 1);
        assert_eq!(doc.outer_html(input).unwrap(), r#"<input id="i">"#);
        let p = doc.parent(input).unwrap();
        assert_eq!(doc.inner_html(p).unwrap(), r#"<input id="i">after"#);
    }

    #[test]
    fn keeps_comments_and_doctype() {
        let doc = Document::parse("<!DOCTYPE html><!--c--><p></p>");
        assert_eq!(
            doc.outer_html(doc.root()).unwrap(),
            "<!DOCTYPE html><!--c--><p></p>"
        );
    }
}
