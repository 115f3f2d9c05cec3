use html::Id;

use crate::ElementWrapper;

/// What a wrapper can be built from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    /// Resolved with `querySelector`: first match in document order.
    Css(String),
    /// Used as-is. The document node selects the document wrapper.
    Node(Id),
    Document,
}

impl From<&str> for Selector {
    fn from(css: &str) -> Self {
        Selector::Css(css.to_string())
    }
}

impl From<String> for Selector {
    fn from(css: String) -> Self {
        Selector::Css(css)
    }
}

impl From<Id> for Selector {
    fn from(id: Id) -> Self {
        Selector::Node(id)
    }
}

impl From<&ElementWrapper> for Selector {
    fn from(wrapper: &ElementWrapper) -> Self {
        Selector::Node(wrapper.node())
    }
}
