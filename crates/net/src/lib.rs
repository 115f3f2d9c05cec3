//! Blocking HTTP transport over `ureq`, plus a thread-spawning helper that
//! reports the outcome through a callback.

use std::fmt;
use std::io::Read;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

mod tls;

#[derive(Clone, Debug)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub user_agent: String,
    /// Response bodies are truncated to this many bytes.
    pub max_body_bytes: usize,
    /// Trust the platform certificate store instead of the bundled roots.
    pub native_roots: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: "myquery/0.1".to_string(),
            max_body_bytes: 8 * 1024 * 1024,
            native_roots: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn new(method: &str, url: impl Into<String>) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn post(url: impl Into<String>, content_type: &str, body: Vec<u8>) -> Self {
        Self::new("POST", url)
            .with_header("Content-Type", content_type)
            .with_body(body)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Clone, Debug)]
pub struct Response {
    pub url: String,           // final URL after redirects
    pub requested_url: String, // what we asked for
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
    pub truncated: bool,
    pub duration_ms: u128,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NetError {
    /// The HTTP client could not be configured.
    Client(String),
    /// The request URL could not be used.
    Url { url: String, reason: String },
    /// DNS, connect, TLS, timeout or protocol failure.
    Transport { url: String, reason: String },
    /// The response body could not be read.
    Body { url: String, reason: String },
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetError::Client(reason) => write!(f, "http client error: {reason}"),
            NetError::Url { url, reason } => write!(f, "invalid url {url:?}: {reason}"),
            NetError::Transport { url, reason } => write!(f, "request to {url} failed: {reason}"),
            NetError::Body { url, reason } => {
                write!(f, "reading response from {url} failed: {reason}")
            }
        }
    }
}

impl std::error::Error for NetError {}

/// Shareable HTTP client. Cloning is cheap; clones share one connection pool.
#[derive(Clone)]
pub struct Client {
    agent: ureq::Agent,
    max_body_bytes: usize,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("max_body_bytes", &self.max_body_bytes)
            .finish_non_exhaustive()
    }
}

impl Client {
    pub fn new(config: &HttpConfig) -> Result<Self, NetError> {
        let mut builder = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent);
        if config.native_roots
            && let Some(tls) = tls::native_client_config()?
        {
            builder = builder.tls_config(tls);
        }
        Ok(Self {
            agent: builder.build(),
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Performs `request` on the calling thread. Non-2xx statuses are
    /// returned as responses.
    pub fn fetch(&self, request: &Request) -> Result<Response, NetError> {
        let start = Instant::now();
        log::debug!(target: "net", "{} {}", request.method, request.url);

        let mut call = self.agent.request(&request.method, &request.url);
        for (name, value) in &request.headers {
            call = call.set(name, value);
        }
        let outcome = match &request.body {
            Some(body) => call.send_bytes(body),
            None => call.call(),
        };
        let resp = match outcome {
            Ok(resp) => resp,
            Err(ureq::Error::Status(_, resp)) => resp,
            Err(ureq::Error::Transport(t)) => {
                let reason = t.to_string();
                return Err(match t.kind() {
                    ureq::ErrorKind::InvalidUrl | ureq::ErrorKind::UnknownScheme => {
                        NetError::Url {
                            url: request.url.clone(),
                            reason,
                        }
                    }
                    _ => NetError::Transport {
                        url: request.url.clone(),
                        reason,
                    },
                });
            }
        };

        let status = resp.status();
        let final_url = resp.get_url().to_string();
        let content_type = resp.header("content-type").map(str::to_string);

        let mut limited = resp.into_reader().take(self.max_body_bytes as u64 + 1);
        let mut buf = Vec::new();
        limited
            .read_to_end(&mut buf)
            .map_err(|e| NetError::Body {
                url: final_url.clone(),
                reason: e.to_string(),
            })?;
        let truncated = buf.len() > self.max_body_bytes;
        if truncated {
            buf.truncate(self.max_body_bytes);
            log::warn!(
                target: "net",
                "response from {final_url} truncated to {} bytes",
                self.max_body_bytes
            );
        }

        let duration_ms = start.elapsed().as_millis();
        log::debug!(target: "net", "{status} {final_url} ({} bytes, {duration_ms} ms)", buf.len());
        Ok(Response {
            url: final_url,
            requested_url: request.url.clone(),
            status,
            content_type,
            body: String::from_utf8_lossy(&buf).into_owned(),
            truncated,
            duration_ms,
        })
    }
}

pub type FetchCallback = Arc<dyn Fn(Result<Response, NetError>) + Send + Sync>;

/// Runs `request` on a new thread and hands the outcome to `cb` there.
pub fn fetch_async(client: Client, request: Request, cb: FetchCallback) -> thread::JoinHandle<()> {
    thread::spawn(move || cb(client.fetch(&request)))
}
