//! Simplified HTML tokenizer with a constrained, practical tag-name character set.
//!
//! Supported tag-name characters (ASCII only): `[A-Za-z0-9:_-]`.
//! Attribute names additionally accept `.` and `@`, so framework-style markup survives.
//!
//! Known limitations:
//! - Not an HTML5 state machine (no parse-error recovery beyond skipping bytes).
//! - Raw-text close-tag scanning accepts only ASCII whitespace before `>`.
//! - A `<` that does not start a tag name is kept as text.
use crate::entities::decode_entities;
use crate::types::{Token, is_rawtext_element, is_void_element};
use memchr::memchr;

const HTML_COMMENT_START: &str = "<!--";
const HTML_COMMENT_END: &str = "-->";

fn starts_with_ignore_ascii_case_at(haystack: &[u8], start: usize, needle: &[u8]) -> bool {
    haystack.len() >= start + needle.len()
        && haystack[start..start + needle.len()].eq_ignore_ascii_case(needle)
}

fn is_tag_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'-' || c == b'_' || c == b':'
}

fn is_attribute_name_char(c: u8) -> bool {
    is_tag_name_char(c) || c == b'.' || c == b'@'
}

// Returns (start, end) of `</name\s*>` relative to `haystack`.
// `<` cannot appear inside a UTF-8 continuation byte, so byte scanning is safe.
fn find_rawtext_close_tag(haystack: &str, name: &str) -> Option<(usize, usize)> {
    let bytes = haystack.as_bytes();
    let len = bytes.len();
    let n = name.len() + 2;
    let mut i = 0;
    while i + n <= len {
        let rel = memchr(b'<', &bytes[i..])?;
        i += rel;
        if i + n > len {
            return None;
        }
        if bytes[i + 1] == b'/' && bytes[i + 2..i + n].eq_ignore_ascii_case(name.as_bytes()) {
            let mut k = i + n;
            while k < len && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if k < len && bytes[k] == b'>' {
                return Some((i, k + 1));
            }
        }
        i += 1;
    }
    None
}

pub fn tokenize(input: &str) -> Vec<Token> {
    let mut out = Vec::new();
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut i = 0;
    // Slices are only cut at ASCII structural bytes, so every endpoint is a
    // UTF-8 char boundary.
    while i < len {
        if bytes[i] != b'<' {
            let start = i;
            i = memchr(b'<', &bytes[i..]).map_or(len, |rel| i + rel);
            push_text(&mut out, &input[start..i]);
            continue;
        }

        if input[i..].starts_with(HTML_COMMENT_START) {
            let body_start = i + HTML_COMMENT_START.len();
            match input[body_start..].find(HTML_COMMENT_END) {
                Some(end) => {
                    out.push(Token::Comment(input[body_start..body_start + end].to_string()));
                    i = body_start + end + HTML_COMMENT_END.len();
                    continue;
                }
                None => {
                    out.push(Token::Comment(input[body_start..].to_string()));
                    break;
                }
            }
        }

        if starts_with_ignore_ascii_case_at(bytes, i, b"<!doctype") {
            let rest = &input[i + 2..];
            match rest.find('>') {
                Some(end) => {
                    out.push(Token::Doctype(rest[..end].trim().to_string()));
                    i += 2 + end + 1;
                    continue;
                }
                None => break,
            }
        }

        // end tag
        if i + 1 < len && bytes[i + 1] == b'/' {
            let start = i + 2;
            if start >= len || !bytes[start].is_ascii_alphabetic() {
                // `</>` or `</ ...`: not a tag, drop up to the next '>'
                i = memchr(b'>', &bytes[start.min(len)..]).map_or(len, |rel| start + rel + 1);
                continue;
            }
            let mut j = start;
            while j < len && is_tag_name_char(bytes[j]) {
                j += 1;
            }
            let name = input[start..j].to_ascii_lowercase();
            i = memchr(b'>', &bytes[j..]).map_or(len, |rel| j + rel + 1);
            out.push(Token::EndTag(name));
            continue;
        }

        // start tag
        let start = i + 1;
        if start >= len || !bytes[start].is_ascii_alphabetic() {
            push_text(&mut out, "<");
            i += 1;
            continue;
        }
        let mut j = start;
        while j < len && is_tag_name_char(bytes[j]) {
            j += 1;
        }
        let name = input[start..j].to_ascii_lowercase();
        let (attributes, mut self_closing, after) = scan_attributes(input, j);
        if is_void_element(&name) {
            self_closing = true;
        }
        log::trace!(target: "html.tokenizer", "start tag <{name}> ({} attrs)", attributes.len());
        out.push(Token::StartTag {
            name: name.clone(),
            attributes,
            self_closing,
        });
        i = after;

        if is_rawtext_element(&name) && !self_closing {
            match find_rawtext_close_tag(&input[i..], &name) {
                Some((rel_start, rel_end)) => {
                    let raw = &input[i..i + rel_start];
                    if !raw.is_empty() {
                        out.push(Token::Text(raw.to_string()));
                    }
                    out.push(Token::EndTag(name));
                    i += rel_end;
                }
                None => {
                    // Missing close tag: the remainder is raw text.
                    let raw = &input[i..];
                    if !raw.is_empty() {
                        out.push(Token::Text(raw.to_string()));
                    }
                    out.push(Token::EndTag(name));
                    break;
                }
            }
        }
    }
    out
}

fn push_text(out: &mut Vec<Token>, raw: &str) {
    if raw.is_empty() {
        return;
    }
    let decoded = decode_entities(raw);
    // Merge adjacent runs (e.g. text around a stray '<').
    if let Some(Token::Text(prev)) = out.last_mut() {
        prev.push_str(&decoded);
    } else {
        out.push(Token::Text(decoded));
    }
}

type Attributes = Vec<(String, Option<String>)>;

/// Scans attributes starting right after the tag name. Returns the attributes,
/// whether the tag was written self-closing and the index after `>`.
fn scan_attributes(input: &str, mut k: usize) -> (Attributes, bool, usize) {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut attributes: Attributes = Vec::new();
    let mut self_closing = false;

    let skip_whitespace = |k: &mut usize| {
        while *k < len && bytes[*k].is_ascii_whitespace() {
            *k += 1;
        }
    };

    loop {
        skip_whitespace(&mut k);
        if k >= len {
            break;
        }
        if bytes[k] == b'>' {
            k += 1;
            break;
        }
        if bytes[k] == b'/' {
            if k + 1 < len && bytes[k + 1] == b'>' {
                self_closing = true;
                k += 2;
                break;
            }
            k += 1;
            continue;
        }
        let name_start = k;
        while k < len && is_attribute_name_char(bytes[k]) {
            k += 1;
        }
        if name_start == k {
            // Unsupported byte in attribute position; skip it. Advance by a
            // whole char so the next slice still starts on a boundary.
            k += input[k..].chars().next().map_or(1, char::len_utf8);
            continue;
        }
        let attribute_name = input[name_start..k].to_ascii_lowercase();

        skip_whitespace(&mut k);
        let value = if k < len && bytes[k] == b'=' {
            k += 1;
            skip_whitespace(&mut k);
            if k < len && (bytes[k] == b'"' || bytes[k] == b'\'') {
                let quote = bytes[k];
                k += 1;
                let vstart = k;
                k = memchr(quote, &bytes[k..]).map_or(len, |rel| k + rel);
                let raw = &input[vstart..k];
                if k < len {
                    k += 1;
                }
                Some(decode_entities(raw))
            } else {
                let vstart = k;
                while k < len && !bytes[k].is_ascii_whitespace() && bytes[k] != b'>' {
                    if bytes[k] == b'/' && k + 1 < len && bytes[k + 1] == b'>' {
                        break;
                    }
                    k += 1;
                }
                Some(decode_entities(&input[vstart..k]))
            }
        } else {
            None
        };
        // First occurrence of an attribute wins.
        if !attributes.iter().any(|(n, _)| *n == attribute_name) {
            attributes.push((attribute_name, value));
        }
    }
    (attributes, self_closing, k)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(name: &str, attributes: &[(&str, Option<&str>)], self_closing: bool) -> Token {
        Token::StartTag {
            name: name.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
                .collect(),
            self_closing,
        }
    }

    #[test]
    fn tokenize_basic_element_with_attributes() {
        let tokens = tokenize(r#"<DIV id="a" class='x y' hidden data-n=3>hi</div>"#);
        assert_eq!(
            tokens,
            vec![
                start(
                    "div",
                    &[
                        ("id", Some("a")),
                        ("class", Some("x y")),
                        ("hidden", None),
                        ("data-n", Some("3")),
                    ],
                    false
                ),
                Token::Text("hi".into()),
                Token::EndTag("div".into()),
            ]
        );
    }

    #[test]
    fn tokenize_preserves_utf8_text_nodes() {
        let tokens = tokenize("<p>120×32 café 😊</p>");
        assert!(
            tokens
                .iter()
                .any(|t| matches!(t, Token::Text(s) if s == "120×32 café 😊")),
            "expected UTF-8 text token, got: {tokens:?}"
        );
    }

    #[test]
    fn tokenize_handles_mixed_case_doctype_and_comments() {
        let tokens = tokenize("<!DoCtYpE html><!-- note --><p>x</p>");
        assert_eq!(tokens[0], Token::Doctype("DoCtYpE html".into()));
        assert_eq!(tokens[1], Token::Comment(" note ".into()));
    }

    #[test]
    fn tokenize_marks_void_elements_self_closing() {
        let tokens = tokenize(r#"<input value="a &amp; b"><br/>"#);
        assert_eq!(
            tokens,
            vec![
                start("input", &[("value", Some("a & b"))], true),
                start("br", &[], true),
            ]
        );
    }

    #[test]
    fn tokenize_finds_script_end_tag_case_insensitive() {
        let tokens = tokenize("<script>if (a < b) {}</ScRiPt >after");
        assert_eq!(
            tokens,
            vec![
                start("script", &[], false),
                Token::Text("if (a < b) {}".into()),
                Token::EndTag("script".into()),
                Token::Text("after".into()),
            ]
        );
    }

    #[test]
    fn tokenize_unterminated_style_is_rawtext() {
        let tokens = tokenize("<style>p { color: red }");
        assert_eq!(
            tokens,
            vec![
                start("style", &[], false),
                Token::Text("p { color: red }".into()),
                Token::EndTag("style".into()),
            ]
        );
    }

    #[test]
    fn tokenize_keeps_stray_less_than_as_text() {
        let tokens = tokenize("a < b <3");
        assert_eq!(tokens, vec![Token::Text("a < b <3".into())]);
    }

    #[test]
    fn tokenize_first_duplicate_attribute_wins() {
        let tokens = tokenize(r#"<a href="1" href="2">"#);
        assert_eq!(tokens, vec![start("a", &[("href", Some("1"))], false)]);
    }

    #[test]
    fn tokenize_skips_non_ascii_in_attribute_position() {
        let tokens = tokenize("<p é x=1>");
        assert_eq!(tokens, vec![start("p", &[("x", Some("1"))], false)]);
    }
}
