use std::fmt;

use html::{DomError, Id, SelectorError};

#[derive(Debug)]
pub enum QueryError {
    /// A CSS selector matched no element.
    NoMatch(String),
    Selector(SelectorError),
    NotAnElement(Id),
    Dom(DomError),
    Url { url: String, error: url::ParseError },
    Json(serde_json::Error),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::NoMatch(selector) => write!(f, "no element matches {selector:?}"),
            QueryError::Selector(err) => write!(f, "{err}"),
            QueryError::NotAnElement(id) => write!(f, "node {id} is not an element"),
            QueryError::Dom(err) => write!(f, "{err}"),
            QueryError::Url { url, error } => write!(f, "invalid url {url:?}: {error}"),
            QueryError::Json(err) => write!(f, "json error: {err}"),
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QueryError::Selector(err) => Some(err),
            QueryError::Dom(err) => Some(err),
            QueryError::Url { error, .. } => Some(error),
            QueryError::Json(err) => Some(err),
            QueryError::NoMatch(_) | QueryError::NotAnElement(_) => None,
        }
    }
}

impl From<SelectorError> for QueryError {
    fn from(err: SelectorError) -> Self {
        QueryError::Selector(err)
    }
}

impl From<DomError> for QueryError {
    fn from(err: DomError) -> Self {
        QueryError::Dom(err)
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        QueryError::Json(err)
    }
}
