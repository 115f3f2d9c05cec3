//! CSS selector subset used by `querySelector`.
//!
//! Supported: selector lists (`a, b`), the descendant, child (`>`), adjacent
//! (`+`) and general sibling (`~`) combinators, type and universal selectors,
//! `#id`, `.class`, attribute conditions (`[a]`, `=`, `~=`, `|=`, `^=`, `$=`,
//! `*=`, optionally quoted) and the pseudo-classes `:first-child`,
//! `:last-child`, `:only-child`, `:empty` and `:not(<compound>)`.
//!
//! Type and attribute names match ASCII case-insensitively; ids, classes and
//! attribute values match exactly.

use crate::dom::Document;
use crate::element::ElementData;
use crate::types::{Id, NodeData};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    Empty,
    Syntax { selector: String, position: usize },
    Unsupported { selector: String, feature: String },
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorError::Empty => write!(f, "empty selector"),
            SelectorError::Syntax { selector, position } => {
                write!(f, "invalid selector {selector:?} at offset {position}")
            }
            SelectorError::Unsupported { selector, feature } => {
                write!(f, "unsupported selector feature {feature:?} in {selector:?}")
            }
        }
    }
}

impl std::error::Error for SelectorError {}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Includes(String),
    DashMatch(String),
    Prefix(String),
    Suffix(String),
    Substring(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pseudo {
    FirstChild,
    LastChild,
    OnlyChild,
    Empty,
    Not(Box<Compound>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, AttrOp)>,
    pseudos: Vec<Pseudo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    Adjacent,
    General,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
    // combinators[i] sits between compounds[i] and compounds[i + 1]
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<Complex>,
}

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        if input.trim().is_empty() {
            return Err(SelectorError::Empty);
        }
        let mut parser = Parser::new(input);
        let mut selectors = vec![parser.complex()?];
        loop {
            parser.skip_ws();
            match parser.peek() {
                None => break,
                Some(',') => {
                    parser.bump();
                    selectors.push(parser.complex()?);
                }
                Some(_) => return Err(parser.syntax()),
            }
        }
        Ok(Self { selectors })
    }

    pub fn matches(&self, doc: &Document, node: Id) -> bool {
        doc.is_element(node)
            && self
                .selectors
                .iter()
                .any(|c| match_complex(doc, c, c.compounds.len() - 1, node))
    }
}

fn match_complex(doc: &Document, complex: &Complex, idx: usize, node: Id) -> bool {
    let Some(el) = doc.element(node) else {
        return false;
    };
    if !match_compound(doc, &complex.compounds[idx], el, node) {
        return false;
    }
    if idx == 0 {
        return true;
    }
    let next = idx - 1;
    match complex.combinators[next] {
        Combinator::Child => doc
            .parent(node)
            .is_some_and(|p| match_complex(doc, complex, next, p)),
        Combinator::Descendant => doc
            .ancestors(node)
            .any(|a| match_complex(doc, complex, next, a)),
        Combinator::Adjacent => previous_element_siblings(doc, node)
            .next()
            .is_some_and(|s| match_complex(doc, complex, next, s)),
        Combinator::General => {
            previous_element_siblings(doc, node).any(|s| match_complex(doc, complex, next, s))
        }
    }
}

fn previous_element_siblings(doc: &Document, node: Id) -> impl Iterator<Item = Id> + '_ {
    let siblings = doc.parent(node).map_or(&[][..], |p| doc.children(p));
    let pos = siblings.iter().position(|s| *s == node).unwrap_or(0);
    siblings[..pos]
        .iter()
        .rev()
        .copied()
        .filter(|s| doc.is_element(*s))
}

fn match_compound(doc: &Document, c: &Compound, el: &ElementData, node: Id) -> bool {
    if let Some(tag) = &c.tag
        && !el.name.eq_ignore_ascii_case(tag)
    {
        return false;
    }
    if let Some(id) = &c.id
        && el.attribute("id") != Some(id.as_str())
    {
        return false;
    }
    if !c.classes.iter().all(|cls| el.has_class(cls)) {
        return false;
    }
    if !c.attrs.iter().all(|(name, op)| match_attr(el, name, op)) {
        return false;
    }
    c.pseudos.iter().all(|p| match_pseudo(doc, p, el, node))
}

fn match_attr(el: &ElementData, name: &str, op: &AttrOp) -> bool {
    let Some(value) = el.attribute(name) else {
        return false;
    };
    match op {
        AttrOp::Exists => true,
        AttrOp::Equals(v) => value == v,
        AttrOp::Includes(v) => !v.is_empty() && value.split_ascii_whitespace().any(|t| t == v),
        AttrOp::DashMatch(v) => {
            value == v
                || value
                    .strip_prefix(v.as_str())
                    .is_some_and(|r| r.starts_with('-'))
        }
        AttrOp::Prefix(v) => !v.is_empty() && value.starts_with(v.as_str()),
        AttrOp::Suffix(v) => !v.is_empty() && value.ends_with(v.as_str()),
        AttrOp::Substring(v) => !v.is_empty() && value.contains(v.as_str()),
    }
}

fn match_pseudo(doc: &Document, p: &Pseudo, el: &ElementData, node: Id) -> bool {
    let element_siblings = || {
        doc.parent(node)
            .map(|parent| doc.element_children(parent).collect::<Vec<_>>())
            .unwrap_or_default()
    };
    match p {
        Pseudo::FirstChild => element_siblings().first() == Some(&node),
        Pseudo::LastChild => element_siblings().last() == Some(&node),
        Pseudo::OnlyChild => element_siblings() == [node],
        Pseudo::Empty => doc.children(node).iter().all(|c| match doc.node(*c) {
            Some(NodeData::Text(t)) => t.is_empty(),
            Some(NodeData::Comment(_)) => true,
            _ => false,
        }),
        Pseudo::Not(inner) => !match_compound(doc, inner, el, node),
    }
}

struct Parser<'a> {
    input: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn offset(&self) -> usize {
        self.chars.get(self.pos).map_or(self.input.len(), |(i, _)| *i)
    }

    fn syntax(&self) -> SelectorError {
        SelectorError::Syntax {
            selector: self.input.to_string(),
            position: self.offset(),
        }
    }

    fn unsupported(&self, feature: &str) -> SelectorError {
        SelectorError::Unsupported {
            selector: self.input.to_string(),
            feature: feature.to_string(),
        }
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos != start
    }

    fn complex(&mut self) -> Result<Complex, SelectorError> {
        self.skip_ws();
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                None | Some(',') | Some(')') => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::Adjacent,
                Some('~') => Combinator::General,
                Some(_) if had_ws => Combinator::Descendant,
                Some(_) => return Err(self.syntax()),
            };
            if combinator != Combinator::Descendant {
                self.bump();
                self.skip_ws();
            }
            combinators.push(combinator);
            compounds.push(self.compound()?);
        }
        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let mut c = Compound::default();
        let mut any = false;
        match self.peek() {
            Some('*') => {
                self.bump();
                any = true;
            }
            Some(ch) if is_ident_start(ch) => {
                c.tag = Some(self.ident()?.to_ascii_lowercase());
                any = true;
            }
            _ => {}
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    c.id = Some(self.ident()?);
                }
                Some('.') => {
                    self.bump();
                    c.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.bump();
                    c.attrs.push(self.attribute()?);
                }
                Some(':') => {
                    self.bump();
                    c.pseudos.push(self.pseudo()?);
                }
                _ => break,
            }
            any = true;
        }
        if !any {
            return Err(self.syntax());
        }
        Ok(c)
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let mut out = String::new();
        while let Some(ch) = self.peek() {
            if is_ident_char(ch) {
                out.push(ch);
                self.pos += 1;
            } else if ch == '\\' {
                self.pos += 1;
                out.push(self.bump().ok_or_else(|| self.syntax())?);
            } else {
                break;
            }
        }
        if out.is_empty() {
            return Err(self.syntax());
        }
        Ok(out)
    }

    fn attribute(&mut self) -> Result<(String, AttrOp), SelectorError> {
        self.skip_ws();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_ws();
        let op = match self.bump() {
            Some(']') => return Ok((name, AttrOp::Exists)),
            Some('=') => '=',
            Some(op @ ('~' | '|' | '^' | '$' | '*')) => {
                if self.bump() != Some('=') {
                    return Err(self.syntax());
                }
                op
            }
            _ => return Err(self.syntax()),
        };
        self.skip_ws();
        let value = match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.bump();
                let mut v = String::new();
                loop {
                    match self.bump() {
                        Some(ch) if ch == q => break,
                        Some('\\') => v.push(self.bump().ok_or_else(|| self.syntax())?),
                        Some(ch) => v.push(ch),
                        None => return Err(self.syntax()),
                    }
                }
                v
            }
            _ => self.ident()?,
        };
        self.skip_ws();
        if self.bump() != Some(']') {
            return Err(self.syntax());
        }
        let op = match op {
            '=' => AttrOp::Equals(value),
            '~' => AttrOp::Includes(value),
            '|' => AttrOp::DashMatch(value),
            '^' => AttrOp::Prefix(value),
            '$' => AttrOp::Suffix(value),
            _ => AttrOp::Substring(value),
        };
        Ok((name, op))
    }

    fn pseudo(&mut self) -> Result<Pseudo, SelectorError> {
        if self.peek() == Some(':') {
            return Err(self.unsupported("::pseudo-element"));
        }
        let name = self.ident()?.to_ascii_lowercase();
        match name.as_str() {
            "first-child" => Ok(Pseudo::FirstChild),
            "last-child" => Ok(Pseudo::LastChild),
            "only-child" => Ok(Pseudo::OnlyChild),
            "empty" => Ok(Pseudo::Empty),
            "not" => {
                if self.bump() != Some('(') {
                    return Err(self.syntax());
                }
                self.skip_ws();
                let inner = self.compound()?;
                self.skip_ws();
                if self.bump() != Some(')') {
                    return Err(self.syntax());
                }
                Ok(Pseudo::Not(Box::new(inner)))
            }
            other => Err(self.unsupported(&format!(":{other}"))),
        }
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '-' || !ch.is_ascii()
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' || !ch.is_ascii()
}
