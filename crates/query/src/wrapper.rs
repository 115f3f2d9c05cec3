use std::cell::Cell;

use browser::{Event, Page, ReadyState};
use html::{Document, ElementData, Id};

use crate::ajax::{AjaxOptions, build_request};
use crate::{Query, QueryError};

/// Result of [`Query::wrap`].
#[derive(Clone)]
pub enum Wrapper {
    Document(DocumentWrapper),
    Element(ElementWrapper),
}

impl Wrapper {
    pub fn into_element(self) -> Option<ElementWrapper> {
        match self {
            Wrapper::Element(el) => Some(el),
            Wrapper::Document(_) => None,
        }
    }

    pub fn into_document(self) -> Option<DocumentWrapper> {
        match self {
            Wrapper::Document(doc) => Some(doc),
            Wrapper::Element(_) => None,
        }
    }
}

/// The reduced wrapper for the document itself.
#[derive(Clone)]
pub struct DocumentWrapper {
    page: Page,
}

impl DocumentWrapper {
    pub(crate) fn new(page: Page) -> Self {
        Self { page }
    }

    /// Runs `callback` once, when the page dispatches `DOMContentLoaded`.
    /// Registering after that has happened does nothing.
    pub fn ready(&self, callback: impl FnOnce(&Query) + 'static) -> &Self {
        if self.page.ready_state() != ReadyState::Loading {
            log::debug!(
                target: "query",
                "ready callback registered while {}; it will not run",
                self.page.ready_state().as_str()
            );
            return self;
        }
        let root = self.page.document().root();
        let callback = Cell::new(Some(callback));
        self.page
            .add_event_listener_once(root, "DOMContentLoaded", move |page, _| {
                if let Some(callback) = callback.take() {
                    callback(&Query::new(page.clone()));
                }
            });
        self
    }
}

/// One element of a page plus the helpers operating on it.
///
/// Holds no state of its own: every read goes to the document, so two
/// wrappers of the same node always agree.
#[derive(Clone)]
pub struct ElementWrapper {
    page: Page,
    node: Id,
    selector: Option<String>,
}

impl std::fmt::Debug for ElementWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementWrapper")
            .field("node", &self.node)
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

impl From<&ElementWrapper> for Id {
    fn from(wrapper: &ElementWrapper) -> Self {
        wrapper.node
    }
}

impl ElementWrapper {
    pub(crate) fn new(page: Page, node: Id, selector: Option<String>) -> Self {
        Self {
            page,
            node,
            selector,
        }
    }

    pub fn node(&self) -> Id {
        self.node
    }

    /// The CSS selector this wrapper was resolved from, if any.
    pub fn selector(&self) -> Option<&str> {
        self.selector.as_deref()
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    fn read<T>(&self, f: impl FnOnce(&ElementData) -> T) -> Option<T> {
        self.page.document().element(self.node).map(f)
    }

    fn write(&self, f: impl FnOnce(&mut ElementData)) {
        let mut doc = self.page.document_mut();
        match doc.element_mut(self.node) {
            Some(el) => f(el),
            None => log::debug!(target: "query", "{} is no longer an element", self.node),
        }
    }

    fn with_document<T>(&self, f: impl FnOnce(&mut Document, Id) -> T) -> T {
        f(&mut *self.page.document_mut(), self.node)
    }

    // --- events ---

    /// Registers `callback` for `name` events reaching this element. The
    /// callback gets a wrapper of the element it was registered on.
    pub fn on(&self, name: &str, callback: impl Fn(&ElementWrapper, &Event) + 'static) -> &Self {
        let selector = self.selector.clone();
        self.page
            .add_event_listener(self.node, name, move |page, event| {
                let node = event.current_target();
                let this = ElementWrapper::new(page.clone(), node, selector.clone());
                callback(&this, event);
            });
        self
    }

    pub fn click(&self, callback: impl Fn(&ElementWrapper, &Event) + 'static) -> &Self {
        self.on("click", callback)
    }

    // --- dataset ---

    pub fn data(&self, key: &str) -> Option<String> {
        self.read(|el| el.data(key).map(str::to_string)).flatten()
    }

    pub fn set_data(&self, key: &str, value: &str) -> &Self {
        self.write(|el| el.set_data(key, value));
        self
    }

    pub fn dataset(&self) -> Vec<(String, String)> {
        self.read(ElementData::dataset).unwrap_or_default()
    }

    // --- classes ---

    pub fn add<I, S>(&self, classes: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.write(|el| {
            for class in classes {
                el.add_class(class.as_ref());
            }
        });
        self
    }

    pub fn remove<I, S>(&self, classes: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.write(|el| {
            for class in classes {
                el.remove_class(class.as_ref());
            }
        });
        self
    }

    pub fn toggle_class(&self, class: &str) -> &Self {
        self.write(|el| {
            el.toggle_class(class);
        });
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.read(|el| el.has_class(class)).unwrap_or(false)
    }

    // --- tree ---

    /// Appends `child` to this element, moving it if it already has a parent.
    pub fn append(&self, child: impl Into<Id>) -> Result<&Self, QueryError> {
        let child = child.into();
        self.with_document(|doc, receiver| doc.append_child(receiver, child))?;
        Ok(self)
    }

    /// Appends this element to `parent`.
    pub fn append_to(&self, parent: impl Into<Id>) -> Result<&Self, QueryError> {
        let parent = parent.into();
        self.with_document(|doc, node| doc.append_child(parent, node))?;
        Ok(self)
    }

    // --- content ---

    pub fn text(&self) -> String {
        self.page.document().text_content(self.node)
    }

    /// Replaces the content with `text` and returns the text read back.
    pub fn set_text(&self, text: &str) -> String {
        if let Err(err) = self.with_document(|doc, node| doc.set_text_content(node, text)) {
            log::debug!(target: "query", "set_text on {}: {err}", self.node);
        }
        self.text()
    }

    pub fn html(&self) -> String {
        self.page
            .document()
            .inner_html(self.node)
            .unwrap_or_default()
    }

    /// Replaces the content with the parsed `markup` and returns the markup
    /// read back. An empty string leaves the content alone.
    pub fn set_html(&self, markup: &str) -> String {
        if !markup.is_empty()
            && let Err(err) = self.with_document(|doc, node| doc.set_inner_html(node, markup))
        {
            log::debug!(target: "query", "set_html on {}: {err}", self.node);
        }
        self.html()
    }

    // --- style ---

    /// Sets one inline style property; `key` may be camelCase
    /// (`backgroundColor`) or a CSS name. An empty value removes it.
    pub fn css(&self, key: &str, value: &str) -> &Self {
        self.write(|el| el.set_style(key, value));
        self
    }

    pub fn css_map<I, K, V>(&self, styles: I) -> &Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.write(|el| {
            for (key, value) in styles {
                el.set_style(key.as_ref(), value.as_ref());
            }
        });
        self
    }

    pub fn style(&self, key: &str) -> Option<String> {
        self.read(|el| el.style(key)).flatten()
    }

    // --- visibility ---

    pub fn hide(&self) -> &Self {
        self.css("display", "none")
    }

    pub fn show(&self) -> &Self {
        self.css("display", "")
    }

    pub fn is_hidden(&self) -> bool {
        self.style("display")
            .is_some_and(|display| display.eq_ignore_ascii_case("none"))
    }

    /// Shows a hidden element and hides a shown one. Returns whether the
    /// element is shown afterwards.
    pub fn toggle(&self) -> bool {
        if self.is_hidden() {
            self.show();
            true
        } else {
            self.hide();
            false
        }
    }

    // --- forms ---

    pub fn value(&self) -> Option<String> {
        self.page.document().value(self.node)
    }

    /// Writes the form value and returns the value read back.
    pub fn set_value(&self, value: &str) -> Option<String> {
        if let Err(err) = self.with_document(|doc, node| doc.set_value(node, value)) {
            log::debug!(target: "query", "set_value on {}: {err}", self.node);
        }
        self.value()
    }

    // --- network ---

    /// Starts an HTTP request and returns at once. `before_send` runs before
    /// this returns; exactly one of `success` and `error` runs later, from
    /// the page's event loop.
    pub fn ajax(&self, url: &str, options: AjaxOptions) -> &Self {
        let AjaxOptions {
            data,
            method,
            before_send,
            success,
            error,
        } = options;

        let request = match build_request(&self.page, url, &method, &data) {
            Ok(request) => request,
            Err(err) => {
                log::warn!(target: "query", "ajax {method} {url}: {err}");
                self.page.queue_task(move |_| error(String::new()));
                return self;
            }
        };

        before_send();
        self.page.fetch(request, move |_, result| match result {
            Ok(response) if response.is_success() => success(response.body),
            Ok(response) => error(response.body),
            Err(err) => {
                log::warn!(target: "query", "ajax request failed: {err}");
                error(String::new());
            }
        });
        self
    }
}
