//! Arena DOM for the page host: a simplified HTML tokenizer and tree builder,
//! a serializer, a CSS selector engine and the element views scripting code
//! relies on (`classList`, `dataset`, inline `style`, form `value`).

pub mod dom_utils;
pub mod style;
pub mod traverse;

mod dom;
mod dom_builder;
mod element;
mod entities;
mod selector;
mod serialize;
mod tokenizer;
mod types;

/// True for `text/html` and XHTML content types.
pub fn is_html(content_type: Option<&str>) -> bool {
    let Some(value) = content_type else {
        return false;
    };
    let essence = value
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    essence == "text/html" || essence.starts_with("application/xhtml")
}

pub use crate::dom::{Document, DomError};
pub use crate::element::{ElementData, attr_name_to_dataset_key, dataset_key_to_attr_name};
pub use crate::selector::{SelectorError, SelectorList};
pub use crate::tokenizer::tokenize;
pub use crate::types::{Id, NodeData, NodeId, Token};
