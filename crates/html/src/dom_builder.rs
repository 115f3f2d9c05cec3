use crate::dom::Document;
use crate::element::ElementData;
use crate::types::{Id, Token};

/// Appends the nodes described by `tokens` to `parent`.
///
/// Tree construction is deliberately simple: end tags pop the open-element
/// stack down to the matching element (stray end tags are ignored), and a few
/// elements close an open sibling of the same kind (`li`, `option`, `p`,
/// `dt`/`dd`).
pub(crate) fn build_into(doc: &mut Document, parent: Id, tokens: &[Token]) {
    let mut open_elements: Vec<(Id, String)> = Vec::new();

    for token in tokens {
        let current = open_elements.last().map_or(parent, |(id, _)| *id);
        match token {
            Token::Doctype(s) => {
                if parent == doc.root() && open_elements.is_empty() {
                    doc.set_doctype(s.clone());
                }
            }
            Token::Comment(c) => {
                let id = doc.create_comment(c);
                attach(doc, current, id);
            }
            Token::Text(txt) => {
                if !txt.is_empty() {
                    let id = doc.create_text(txt);
                    attach(doc, current, id);
                }
            }
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                if let Some((_, open_name)) = open_elements.last()
                    && closes_open_sibling(name, open_name)
                {
                    log::trace!(target: "html.dom_builder", "<{name}> implies </{open_name}>");
                    open_elements.pop();
                }
                let current = open_elements.last().map_or(parent, |(id, _)| *id);
                let id = doc.create_element_with(ElementData::with_attributes(
                    name,
                    attributes.clone(),
                ));
                attach(doc, current, id);
                if !*self_closing {
                    open_elements.push((id, name.clone()));
                }
            }
            Token::EndTag(name) => {
                let Some(pos) = open_elements.iter().rposition(|(_, n)| n == name) else {
                    log::trace!(target: "html.dom_builder", "ignoring stray </{name}>");
                    continue;
                };
                open_elements.truncate(pos);
            }
        }
    }
}

fn attach(doc: &mut Document, parent: Id, child: Id) {
    // `parent` is always the build target or an element created above, and
    // `child` is fresh, so insertion cannot fail.
    let result = doc.append_child(parent, child);
    debug_assert!(result.is_ok(), "dom builder insertion failed: {result:?}");
}

fn closes_open_sibling(new: &str, open: &str) -> bool {
    match new {
        "li" => open == "li",
        "option" => open == "option",
        "dt" | "dd" => open == "dt" || open == "dd",
        "p" | "div" | "ul" | "ol" | "table" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            open == "p"
        }
        _ => false,
    }
}
