use crate::element::ElementData;
use crate::selector::{SelectorError, SelectorList};
use crate::traverse::{Ancestors, Descendants, Traverse};
use crate::types::{Id, NodeData};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    UnknownNode(Id),
    NotAnElement(Id),
    NotAContainer(Id),
    /// The child is the parent itself or one of its ancestors, or is the document.
    HierarchyRequest { parent: Id, child: Id },
    NotAChild { parent: Id, child: Id },
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomError::UnknownNode(id) => write!(f, "unknown node {id}"),
            DomError::NotAnElement(id) => write!(f, "node {id} is not an element"),
            DomError::NotAContainer(id) => write!(f, "node {id} cannot have children"),
            DomError::HierarchyRequest { parent, child } => {
                write!(f, "cannot insert {child} into {parent}")
            }
            DomError::NotAChild { parent, child } => {
                write!(f, "node {child} is not a child of {parent}")
            }
        }
    }
}

impl std::error::Error for DomError {}

#[derive(Debug, Clone)]
struct Slot {
    parent: Option<Id>,
    children: Vec<Id>,
    data: NodeData,
}

/// Arena-backed DOM tree.
///
/// Node ids are stable for the lifetime of the document. Removing a node only
/// detaches it; detached subtrees stay addressable and can be re-inserted.
///
/// Slots are never reclaimed, so the arena only grows: replacing content
/// (`set_inner_html`, `set_text_content`) leaves the old children allocated
/// but detached. `len` counts every slot ever created.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Slot>,
    /// Reused container for `create_from_html`.
    scratch: Option<Id>,
}

const ROOT: Id = Id(0);

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Slot {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document { doctype: None },
            }],
            scratch: None,
        }
    }

    /// Parses a full document.
    pub fn parse(html: &str) -> Self {
        let mut doc = Self::new();
        let tokens = crate::tokenizer::tokenize(html);
        crate::dom_builder::build_into(&mut doc, ROOT, &tokens);
        doc
    }

    pub fn root(&self) -> Id {
        ROOT
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes[ROOT.index()].children.is_empty()
    }

    pub fn contains(&self, id: Id) -> bool {
        id.index() < self.nodes.len()
    }

    fn slot(&self, id: Id) -> Result<&Slot, DomError> {
        self.nodes.get(id.index()).ok_or(DomError::UnknownNode(id))
    }

    pub fn node(&self, id: Id) -> Option<&NodeData> {
        self.nodes.get(id.index()).map(|s| &s.data)
    }

    pub fn doctype(&self) -> Option<&str> {
        match &self.nodes[ROOT.index()].data {
            NodeData::Document { doctype } => doctype.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn set_doctype(&mut self, value: String) {
        if let NodeData::Document { doctype } = &mut self.nodes[ROOT.index()].data {
            *doctype = Some(value);
        }
    }

    pub fn element(&self, id: Id) -> Option<&ElementData> {
        match self.node(id)? {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: Id) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(id.index())?.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn is_element(&self, id: Id) -> bool {
        self.element(id).is_some()
    }

    pub fn parent(&self, id: Id) -> Option<Id> {
        self.nodes.get(id.index()).and_then(|s| s.parent)
    }

    pub fn children(&self, id: Id) -> &[Id] {
        self.nodes
            .get(id.index())
            .map_or(&[], |s| s.children.as_slice())
    }

    pub fn element_children(&self, id: Id) -> impl Iterator<Item = Id> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.is_element(*c))
    }

    pub fn first_element_child(&self, id: Id) -> Option<Id> {
        self.element_children(id).next()
    }

    pub fn ancestors(&self, id: Id) -> Ancestors<'_> {
        Ancestors::new(self, id)
    }

    pub fn descendants(&self, id: Id) -> Descendants<'_> {
        Descendants::new(self, id)
    }

    pub fn traverse(&self, id: Id) -> Traverse<'_> {
        Traverse::new(self, id)
    }

    /// True when `node` is `ancestor` or lies inside it.
    pub fn is_inclusive_ancestor(&self, ancestor: Id, node: Id) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// True when the node is reachable from the document root.
    pub fn is_connected(&self, id: Id) -> bool {
        self.is_inclusive_ancestor(ROOT, id)
    }

    pub fn document_element(&self) -> Option<Id> {
        self.first_element_child(ROOT)
    }

    pub fn body(&self) -> Option<Id> {
        let html = self.document_element()?;
        self.element_children(html)
            .find(|c| self.element(*c).is_some_and(|el| el.is("body")))
    }

    // --- construction ---

    fn push(&mut self, data: NodeData) -> Id {
        let id = Id(self.nodes.len() as u32);
        self.nodes.push(Slot {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    pub fn create_element(&mut self, name: &str) -> Id {
        self.push(NodeData::Element(ElementData::new(name)))
    }

    pub fn create_element_with(&mut self, element: ElementData) -> Id {
        self.push(NodeData::Element(element))
    }

    pub fn create_text(&mut self, text: &str) -> Id {
        self.push(NodeData::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> Id {
        self.push(NodeData::Comment(text.to_string()))
    }

    // --- mutation ---

    /// Appends `child` as the last child of `parent`, moving it out of its
    /// current parent first.
    pub fn append_child(&mut self, parent: Id, child: Id) -> Result<(), DomError> {
        if !self.slot(parent)?.data.is_container() {
            return Err(DomError::NotAContainer(parent));
        }
        let childless = self.slot(child)?.children.is_empty();
        // A childless node can only be an inclusive ancestor of `parent` by being it.
        let cycle = if childless {
            child == parent
        } else {
            self.is_inclusive_ancestor(child, parent)
        };
        if child == ROOT || cycle {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        self.detach(child);
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
        Ok(())
    }

    pub fn remove_child(&mut self, parent: Id, child: Id) -> Result<(), DomError> {
        if self.slot(child)?.parent != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.detach(child);
        Ok(())
    }

    /// Removes the node from its parent, if any.
    pub fn detach(&mut self, id: Id) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        self.nodes[parent.index()].children.retain(|c| *c != id);
        self.nodes[id.index()].parent = None;
    }

    fn clear_children(&mut self, id: Id) {
        let old = std::mem::take(&mut self.nodes[id.index()].children);
        for child in old {
            self.nodes[child.index()].parent = None;
        }
    }

    // --- queries ---

    /// First connected element whose `id` attribute equals `value`.
    pub fn get_element_by_id(&self, value: &str) -> Option<Id> {
        self.descendants(ROOT)
            .find(|n| self.element(*n).and_then(ElementData::id) == Some(value))
    }

    pub fn query_selector(&self, scope: Id, selector: &str) -> Result<Option<Id>, SelectorError> {
        let list = SelectorList::parse(selector)?;
        Ok(self.descendants(scope).find(|n| list.matches(self, *n)))
    }

    pub fn query_selector_all(&self, scope: Id, selector: &str) -> Result<Vec<Id>, SelectorError> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .descendants(scope)
            .filter(|n| list.matches(self, *n))
            .collect())
    }

    // --- text ---

    /// Concatenated text of all descendant text nodes (`textContent`).
    pub fn text_content(&self, id: Id) -> String {
        match self.node(id) {
            Some(NodeData::Text(t)) | Some(NodeData::Comment(t)) => t.clone(),
            Some(_) => {
                let mut out = String::new();
                for n in self.descendants(id) {
                    if let Some(NodeData::Text(t)) = self.node(n) {
                        out.push_str(t);
                    }
                }
                out
            }
            None => String::new(),
        }
    }

    /// Replaces all children with a single text node (none for empty text).
    pub fn set_text_content(&mut self, id: Id, text: &str) -> Result<(), DomError> {
        match &mut self.slot_mut(id)?.data {
            NodeData::Text(t) | NodeData::Comment(t) => {
                *t = text.to_string();
                return Ok(());
            }
            NodeData::Document { .. } => return Err(DomError::NotAnElement(id)),
            NodeData::Element(_) => {}
        }
        self.clear_children(id);
        if !text.is_empty() {
            let t = self.create_text(text);
            self.append_child(id, t)?;
        }
        Ok(())
    }

    fn slot_mut(&mut self, id: Id) -> Result<&mut Slot, DomError> {
        self.nodes.get_mut(id.index()).ok_or(DomError::UnknownNode(id))
    }

    // --- markup ---

    pub fn inner_html(&self, id: Id) -> Result<String, DomError> {
        if !self.slot(id)?.data.is_container() {
            return Err(DomError::NotAContainer(id));
        }
        let mut out = String::new();
        for &child in self.children(id) {
            crate::serialize::serialize_node(self, child, &mut out);
        }
        Ok(out)
    }

    pub fn outer_html(&self, id: Id) -> Result<String, DomError> {
        self.slot(id)?;
        let mut out = String::new();
        crate::serialize::serialize_node(self, id, &mut out);
        Ok(out)
    }

    /// Replaces the children of `id` with the parsed fragment.
    pub fn set_inner_html(&mut self, id: Id, html: &str) -> Result<(), DomError> {
        if !self.is_element(id) {
            self.slot(id)?;
            return Err(DomError::NotAnElement(id));
        }
        self.clear_children(id);
        let tokens = crate::tokenizer::tokenize(html);
        crate::dom_builder::build_into(self, id, &tokens);
        Ok(())
    }

    /// Parses `html` into a fresh detached `<div>` and returns the container.
    pub fn parse_fragment(&mut self, html: &str) -> Id {
        let container = self.create_element("div");
        let tokens = crate::tokenizer::tokenize(html);
        crate::dom_builder::build_into(self, container, &tokens);
        container
    }

    /// Parses `html` and returns its first element, detached. The rest of
    /// the fragment is dropped. `None` when the markup holds no element.
    ///
    /// Unlike `parse_fragment`, no container is allocated per call.
    pub fn create_from_html(&mut self, html: &str) -> Option<Id> {
        let scratch = match self.scratch {
            Some(id) => id,
            None => {
                let id = self.create_element("div");
                self.scratch = Some(id);
                id
            }
        };
        let tokens = crate::tokenizer::tokenize(html);
        crate::dom_builder::build_into(self, scratch, &tokens);
        let first = self.first_element_child(scratch);
        self.clear_children(scratch);
        first
    }

    // --- form values ---

    /// The element's form value, following `HTMLInputElement.value`,
    /// `HTMLTextAreaElement.value` and `HTMLSelectElement.value`. Other
    /// elements only have a value once one was written.
    pub fn value(&self, id: Id) -> Option<String> {
        let el = self.element(id)?;
        if let Some(v) = &el.dirty_value {
            return Some(v.clone());
        }
        match el.name.as_str() {
            "input" | "option" | "button" => match el.attribute("value") {
                Some(v) => Some(v.to_string()),
                None if el.is("option") => Some(collapse_whitespace(&self.text_content(id))),
                None => Some(String::new()),
            },
            "textarea" => Some(self.text_content(id)),
            "select" => {
                let options: Vec<Id> = self
                    .descendants(id)
                    .filter(|n| self.element(*n).is_some_and(|e| e.is("option")))
                    .collect();
                let chosen = options
                    .iter()
                    .find(|o| self.element(**o).is_some_and(|e| e.has_attribute("selected")))
                    .or(options.first());
                Some(chosen.and_then(|o| self.value(*o)).unwrap_or_default())
            }
            _ => None,
        }
    }

    pub fn set_value(&mut self, id: Id, value: &str) -> Result<(), DomError> {
        if !self.is_element(id) {
            self.slot(id)?;
            return Err(DomError::NotAnElement(id));
        }
        let is_select = self.element(id).is_some_and(|e| e.is("select"));
        if is_select {
            let options: Vec<Id> = self
                .descendants(id)
                .filter(|n| self.element(*n).is_some_and(|e| e.is("option")))
                .collect();
            let mut matched = false;
            for option in options {
                let hit = !matched && self.value(option).as_deref() == Some(value);
                matched |= hit;
                if let Some(el) = self.element_mut(option) {
                    if hit {
                        el.set_attribute("selected", "");
                    } else {
                        el.remove_attribute("selected");
                    }
                }
            }
            if let Some(el) = self.element_mut(id) {
                el.dirty_value = Some(if matched { value.to_string() } else { String::new() });
            }
            return Ok(());
        }
        if let Some(el) = self.element_mut(id) {
            el.dirty_value = Some(value.to_string());
        }
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_ascii_whitespace().collect::<Vec<_>>().join(" ")
}
