use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use browser::Page;
use core_types::RequestId;
use futures::FutureExt;
use futures::channel::oneshot;
use html::Id;
use net::Request;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::ajax::Transport;
use crate::{DocumentWrapper, ElementWrapper, QueryError, Selector, Wrapper};

/// Entry point of the library, bound to one page.
///
/// Wraps elements or the document, and carries the static helpers `wait`,
/// `get`, `post` and `create`.
#[derive(Clone)]
pub struct Query {
    page: Page,
}

impl Query {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Builds the wrapper for `selector`. A CSS selector must match at least
    /// one element; the first match in document order is used.
    pub fn wrap(&self, selector: impl Into<Selector>) -> Result<Wrapper, QueryError> {
        match selector.into() {
            Selector::Document => Ok(Wrapper::Document(self.document())),
            Selector::Css(css) => self.select(&css).map(Wrapper::Element),
            Selector::Node(id) if id == self.page.document().root() => {
                Ok(Wrapper::Document(self.document()))
            }
            Selector::Node(id) => self.element(id).map(Wrapper::Element),
        }
    }

    pub fn select(&self, css: &str) -> Result<ElementWrapper, QueryError> {
        let found = {
            let doc = self.page.document();
            doc.query_selector(doc.root(), css)?
        };
        match found {
            Some(node) => Ok(ElementWrapper::new(
                self.page.clone(),
                node,
                Some(css.to_string()),
            )),
            None => Err(QueryError::NoMatch(css.to_string())),
        }
    }

    pub fn element(&self, id: Id) -> Result<ElementWrapper, QueryError> {
        if !self.page.document().is_element(id) {
            return Err(QueryError::NotAnElement(id));
        }
        Ok(ElementWrapper::new(self.page.clone(), id, None))
    }

    pub fn document(&self) -> DocumentWrapper {
        DocumentWrapper::new(self.page.clone())
    }

    /// Resolves once, no earlier than `milliseconds` from now. Driven by the
    /// page's event loop (`Page::block_on`, `Page::spawn_local`).
    pub fn wait(&self, milliseconds: u64) -> Wait {
        let (tx, rx) = oneshot::channel();
        self.page
            .set_timeout(Duration::from_millis(milliseconds), move |_| {
                let _ = tx.send(());
            });
        Wait { rx }
    }

    /// GETs `url` and hands the response text to `callback`, whatever the
    /// status. Transport failures are logged and `callback` does not run.
    pub fn get(
        &self,
        url: &str,
        callback: impl FnOnce(String) + 'static,
    ) -> Result<RequestId, QueryError> {
        let url = self.resolve(url)?;
        let request = Request::get(url.as_str());
        Ok(self.page.fetch(request, move |_, result| match result {
            Ok(response) => callback(response.body),
            Err(err) => log::warn!(target: "query", "GET {url} failed: {err}"),
        }))
    }

    /// POSTs `data` as JSON to `url`. `callback` gets the parsed JSON
    /// response, the status and the finished transport. Transport failures
    /// and responses that are not JSON are logged and `callback` does not
    /// run.
    pub fn post<T>(
        &self,
        url: &str,
        data: &T,
        callback: impl FnOnce(Value, u16, &Transport) + 'static,
    ) -> Result<RequestId, QueryError>
    where
        T: Serialize + ?Sized,
    {
        let url = self.resolve(url)?;
        let body = serde_json::to_vec(data)?;
        let request = Request::post(url.as_str(), "application/json", body);
        Ok(self.page.fetch(request, move |_, result| {
            let response = match result {
                Ok(response) => response,
                Err(err) => {
                    log::warn!(target: "query", "POST {url} failed: {err}");
                    return;
                }
            };
            match serde_json::from_str::<Value>(&response.body) {
                Ok(value) => {
                    let status = response.status;
                    let transport = Transport::from_response("POST", response);
                    callback(value, status, &transport);
                }
                Err(err) => {
                    log::warn!(target: "query", "POST {url}: response is not JSON: {err}");
                }
            }
        }))
    }

    /// Parses `html` as the content of a detached container and returns its
    /// first element child, detached. `None` when the markup holds no
    /// element.
    pub fn create(&self, html: &str) -> Option<Id> {
        self.page.document_mut().create_from_html(html)
    }

    fn resolve(&self, url: &str) -> Result<Url, QueryError> {
        self.page.resolve_url(url).map_err(|error| QueryError::Url {
            url: url.to_string(),
            error,
        })
    }
}

/// Future returned by [`Query::wait`].
#[must_use = "futures do nothing unless awaited"]
#[derive(Debug)]
pub struct Wait {
    rx: oneshot::Receiver<()>,
}

impl Future for Wait {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        // a dropped page cancels the timer; treat it as elapsed
        self.rx.poll_unpin(cx).map(|_| ())
    }
}
