//! Iterative tree walks over a [`Document`](crate::Document).
//!
//! Nothing here recurses, so arbitrarily deep trees are safe to walk.

use crate::dom::Document;
use crate::types::Id;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Open(Id),
    Close(Id),
}

/// Pre/post-order walk of the subtree rooted at `root`, root included.
pub struct Traverse<'a> {
    doc: &'a Document,
    stack: Vec<(Id, bool)>,
}

impl<'a> Traverse<'a> {
    pub(crate) fn new(doc: &'a Document, root: Id) -> Self {
        Self {
            doc,
            stack: vec![(root, false)],
        }
    }
}

impl Iterator for Traverse<'_> {
    type Item = Edge;

    fn next(&mut self) -> Option<Edge> {
        let (id, opened) = self.stack.pop()?;
        if opened {
            return Some(Edge::Close(id));
        }
        self.stack.push((id, true));
        for &child in self.doc.children(id).iter().rev() {
            self.stack.push((child, false));
        }
        Some(Edge::Open(id))
    }
}

/// Descendants of `root` in document order, root excluded.
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<Id>,
}

impl<'a> Descendants<'a> {
    pub(crate) fn new(doc: &'a Document, root: Id) -> Self {
        let stack = doc.children(root).iter().rev().copied().collect();
        Self { doc, stack }
    }
}

impl Iterator for Descendants<'_> {
    type Item = Id;

    fn next(&mut self) -> Option<Id> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(id).iter().rev().copied());
        Some(id)
    }
}

/// Strict ancestors of a node, nearest first.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<Id>,
}

impl<'a> Ancestors<'a> {
    pub(crate) fn new(doc: &'a Document, node: Id) -> Self {
        Self {
            doc,
            next: doc.parent(node),
        }
    }
}

impl Iterator for Ancestors<'_> {
    type Item = Id;

    fn next(&mut self) -> Option<Id> {
        let id = self.next?;
        self.next = self.doc.parent(id);
        Some(id)
    }
}
