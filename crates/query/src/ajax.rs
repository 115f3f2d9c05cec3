use std::fmt;

use browser::Page;
use net::{Request, Response};

use crate::QueryError;

/// Options for [`ElementWrapper::ajax`](crate::ElementWrapper::ajax).
///
/// `data` becomes the query string for `GET` and `HEAD`, and an
/// `application/x-www-form-urlencoded` body for every other method.
pub struct AjaxOptions {
    pub(crate) data: Vec<(String, String)>,
    pub(crate) method: String,
    pub(crate) before_send: Box<dyn FnOnce()>,
    pub(crate) success: Box<dyn FnOnce(String)>,
    pub(crate) error: Box<dyn FnOnce(String)>,
}

impl Default for AjaxOptions {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            method: "GET".to_string(),
            before_send: Box::new(|| {}),
            success: Box::new(|_| {}),
            error: Box::new(|_| {}),
        }
    }
}

impl fmt::Debug for AjaxOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AjaxOptions")
            .field("data", &self.data)
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

impl AjaxOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: &str) -> Self {
        self.method = method.to_ascii_uppercase();
        self
    }

    pub fn data(mut self, key: &str, value: &str) -> Self {
        self.data.push((key.to_string(), value.to_string()));
        self
    }

    /// Runs synchronously, right before the request is handed to the network.
    pub fn before_send(mut self, callback: impl FnOnce() + 'static) -> Self {
        self.before_send = Box::new(callback);
        self
    }

    /// Receives the response body of a 2xx response.
    pub fn success(mut self, callback: impl FnOnce(String) + 'static) -> Self {
        self.success = Box::new(callback);
        self
    }

    /// Receives the response body of any other response, or an empty string
    /// when no response arrived.
    pub fn error(mut self, callback: impl FnOnce(String) + 'static) -> Self {
        self.error = Box::new(callback);
        self
    }
}

pub(crate) fn build_request(
    page: &Page,
    url: &str,
    method: &str,
    data: &[(String, String)],
) -> Result<Request, QueryError> {
    let mut resolved = page.resolve_url(url).map_err(|error| QueryError::Url {
        url: url.to_string(),
        error,
    })?;
    if matches!(method, "GET" | "HEAD") {
        if !data.is_empty() {
            resolved.query_pairs_mut().extend_pairs(data);
        }
        return Ok(Request::new(method, resolved.as_str()));
    }
    let request = Request::new(method, resolved.as_str());
    if data.is_empty() {
        return Ok(request);
    }
    let body = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(data)
        .finish();
    Ok(request
        .with_header("Content-Type", "application/x-www-form-urlencoded")
        .with_body(body.into_bytes()))
}

/// The finished request handed to [`Query::post`](crate::Query::post)
/// callbacks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transport {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub response_text: String,
}

impl Transport {
    pub(crate) fn from_response(method: &str, response: Response) -> Self {
        Self {
            method: method.to_string(),
            url: response.url,
            status: response.status,
            content_type: response.content_type,
            response_text: response.body,
        }
    }
}
