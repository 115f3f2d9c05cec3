use crate::dom::Document;
use crate::traverse::Edge;
use crate::types::{Id, NodeData};

pub fn first_styles(style: &str) -> String {
    crate::style::parse_declarations(style)
        .iter()
        .take(3)
        .map(|d| format!("{}: {};", d.name, d.value))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Indented one-line-per-node outline of the subtree at `root`, at most `cap`
/// lines long.
pub fn outline(doc: &Document, root: Id, cap: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    for edge in doc.traverse(root) {
        let id = match edge {
            Edge::Open(id) => id,
            Edge::Close(_) => {
                depth = depth.saturating_sub(1);
                continue;
            }
        };
        let indent = "  ".repeat(depth);
        depth += 1;
        if out.len() >= cap {
            continue;
        }
        match doc.node(id) {
            Some(NodeData::Document { doctype }) => match doctype {
                Some(dt) => out.push(format!("{indent}<!{dt}>")),
                None => out.push(format!("{indent}#document")),
            },
            Some(NodeData::Element(el)) => {
                let mut line = format!("{indent}<{}", el.name);
                if let Some(id) = el.id() {
                    line.push_str(&format!(r#" id="{id}""#));
                }
                let class = el.attribute("class").unwrap_or("");
                if !class.is_empty() {
                    line.push_str(&format!(r#" class="{class}""#));
                }
                line.push('>');
                let styl = first_styles(el.attribute("style").unwrap_or(""));
                if !styl.is_empty() {
                    line.push_str(&format!("  /* {styl} */"));
                }
                out.push(line);
            }
            Some(NodeData::Text(text)) => {
                let t = text.replace('\n', " ").trim().to_string();
                if !t.is_empty() {
                    out.push(format!("{indent}\"{}\"", shorten(&t)));
                }
            }
            Some(NodeData::Comment(text)) => {
                out.push(format!("{indent}<!-- {} -->", shorten(&text.replace('\n', " "))));
            }
            None => {}
        }
    }
    out
}

fn shorten(s: &str) -> String {
    match s.char_indices().nth(40) {
        Some((cut, _)) => format!("{}…", &s[..cut]),
        None => s.to_string(),
    }
}
