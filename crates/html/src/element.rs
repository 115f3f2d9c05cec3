//! Per-element state: attributes plus the `classList`, `dataset` and inline
//! `style` views layered over them.
//!
//! All three views are derived from attributes (`class`, `data-*`, `style`),
//! so serialization and selector matching always see the current state.

use crate::style::{css_property_name, parse_declarations, serialize_declarations};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub name: String,
    pub attributes: Vec<(String, Option<String>)>,
    /// Form value written through `value`; overrides the markup default once set.
    pub(crate) dirty_value: Option<String>,
}

impl ElementData {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attributes: Vec::new(),
            dirty_value: None,
        }
    }

    pub fn with_attributes(name: &str, attributes: Vec<(String, Option<String>)>) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attributes,
            dirty_value: None,
        }
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    // --- attributes ---

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_deref().unwrap_or(""))
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = Some(value.to_string()),
            None => self.attributes.push((name, Some(value.to_string()))),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        before != self.attributes.len()
    }

    pub fn id(&self) -> Option<&str> {
        self.attribute("id").filter(|id| !id.is_empty())
    }

    // --- classList ---

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attribute("class")
            .unwrap_or("")
            .split_ascii_whitespace()
    }

    pub fn has_class(&self, class_name: &str) -> bool {
        self.classes().any(|c| c == class_name)
    }

    pub fn add_class(&mut self, class_name: &str) {
        if class_name.is_empty() || self.has_class(class_name) {
            return;
        }
        let mut classes: Vec<String> = self.classes().map(str::to_string).collect();
        classes.push(class_name.to_string());
        self.write_classes(&classes);
    }

    pub fn remove_class(&mut self, class_name: &str) {
        if !self.has_class(class_name) {
            return;
        }
        let classes: Vec<String> = self
            .classes()
            .filter(|c| *c != class_name)
            .map(str::to_string)
            .collect();
        self.write_classes(&classes);
    }

    /// Returns whether the class is present after the toggle.
    pub fn toggle_class(&mut self, class_name: &str) -> bool {
        if self.has_class(class_name) {
            self.remove_class(class_name);
            false
        } else {
            self.add_class(class_name);
            true
        }
    }

    fn write_classes(&mut self, classes: &[String]) {
        // classList keeps the attribute around (possibly empty) once it exists.
        self.set_attribute("class", &classes.join(" "));
    }

    // --- dataset ---

    pub fn data(&self, key: &str) -> Option<&str> {
        self.attribute(&dataset_key_to_attr_name(key))
    }

    pub fn set_data(&mut self, key: &str, value: &str) {
        let name = dataset_key_to_attr_name(key);
        self.set_attribute(&name, value);
    }

    pub fn dataset(&self) -> Vec<(String, String)> {
        self.attributes
            .iter()
            .filter_map(|(k, v)| {
                let key = attr_name_to_dataset_key(k)?;
                Some((key, v.clone().unwrap_or_default()))
            })
            .collect()
    }

    // --- inline style ---

    pub fn style(&self, property: &str) -> Option<String> {
        let name = css_property_name(property);
        parse_declarations(self.attribute("style").unwrap_or(""))
            .into_iter()
            .find(|d| d.name == name)
            .map(|d| d.value)
    }

    /// Sets one inline style property. An empty value removes it, and the
    /// `style` attribute disappears once no declarations remain. A value that
    /// does not parse as exactly one declaration of `property` is ignored.
    pub fn set_style(&mut self, property: &str, value: &str) {
        let name = css_property_name(property);
        if name.is_empty() {
            return;
        }
        let value = value.trim();
        if !value.is_empty() && !is_single_declaration(&name, value) {
            log::debug!(target: "html.style", "ignoring invalid value {value:?} for {name}");
            return;
        }
        let mut decls = parse_declarations(self.attribute("style").unwrap_or(""));
        match decls.iter().position(|d| d.name == name) {
            Some(pos) if value.is_empty() => {
                decls.remove(pos);
            }
            Some(pos) => decls[pos].value = value.to_string(),
            None if value.is_empty() => {}
            None => decls.push(crate::style::Declaration {
                name,
                value: value.to_string(),
            }),
        }
        if decls.is_empty() {
            self.remove_attribute("style");
        } else {
            self.set_attribute("style", &serialize_declarations(&decls));
        }
    }
}

fn is_single_declaration(name: &str, value: &str) -> bool {
    if value.ends_with(';') {
        return false;
    }
    match parse_declarations(&format!("{name}: {value}")).as_slice() {
        [decl] => decl.name == name && decl.value == value,
        _ => false,
    }
}

/// `fooBar` -> `data-foo-bar`
pub fn dataset_key_to_attr_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 5);
    out.push_str("data-");
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// `data-foo-bar` -> `fooBar`; `None` for attributes outside the dataset.
pub fn attr_name_to_dataset_key(name: &str) -> Option<String> {
    let rest = name.strip_prefix("data-")?;
    let mut out = String::with_capacity(rest.len());
    let mut upper_next = false;
    for ch in rest.chars() {
        if ch == '-' {
            upper_next = true;
            continue;
        }
        if upper_next && ch.is_ascii_lowercase() {
            out.push(ch.to_ascii_uppercase());
        } else {
            if upper_next {
                out.push('-');
            }
            out.push(ch);
        }
        upper_next = false;
    }
    if upper_next {
        out.push('-');
    }
    Some(out)
}
