// A single CSS property: "color: red"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
}

// input: "color: red; background: url('a;b.png')"
// output: [color: red, background: url('a;b.png')]
//
// Semicolons inside quotes or parentheses do not split declarations.
pub fn parse_declarations(input: &str) -> Vec<Declaration> {
    let mut out = Vec::new();
    let bytes = input.as_bytes();
    let mut start = 0usize;
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = 0usize;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(_) if b == b'\\' => {
                i += 2;
                continue;
            }
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'\'' | b'"' => quote = Some(b),
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                b';' if depth == 0 => {
                    push_declaration(&input[start..i], &mut out);
                    start = i + 1;
                }
                _ => {}
            },
        }
        i += 1;
    }
    if start < input.len() {
        push_declaration(&input[start..], &mut out);
    }
    out
}

fn push_declaration(raw: &str, out: &mut Vec<Declaration>) {
    let Some((n, v)) = raw.split_once(':') else {
        return;
    };
    let name = n.trim().to_ascii_lowercase();
    let value = v.trim();
    if name.is_empty() || value.is_empty() {
        return;
    }
    // later declarations of the same property win
    out.retain(|d: &Declaration| d.name != name);
    out.push(Declaration {
        name,
        value: value.to_string(),
    });
}

pub fn serialize_declarations(decls: &[Declaration]) -> String {
    decls
        .iter()
        .map(|d| format!("{}: {};", d.name, d.value))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Maps a scripting-style property name (`backgroundColor`) to its CSS name
/// (`background-color`). Names already in CSS form pass through lowercased.
pub fn css_property_name(prop: &str) -> String {
    let prop = prop.trim();
    let mut out = String::with_capacity(prop.len() + 4);
    for ch in prop.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
