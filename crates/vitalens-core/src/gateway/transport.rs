//! HTTP transport seam
//!
//! Gateways describe requests as plain [`HttpRequest`] values and hand them
//! to a [`Transport`]. Production code uses [`ReqwestTransport`]; tests swap
//! in a recording double.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use thiserror::Error;

use super::multipart::MultipartForm;

/// HTTP request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Callback receiving `(bytes_sent, total_bytes)` while a body is written
pub type ByteProgress = Arc<dyn Fn(u64, u64) + Send + Sync>;

// ============================================================================
// Error Types
// ============================================================================

/// Failure below the HTTP layer: no usable response was received
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    /// Status line arrived but the body could not be read
    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

// ============================================================================
// Request / Response
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

/// A fully built outbound request
#[derive(Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    /// `multipart/form-data` parts; the transport picks the boundary
    pub form: Option<MultipartForm>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            headers: vec![("Accept".to_string(), "application/json".to_string())],
            body: None,
            form: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: Url) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach `Authorization: Bearer <token>`
    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {}", token))
    }

    pub fn json<T: Serialize>(self, body: &T) -> Result<Self, serde_json::Error> {
        let bytes = serde_json::to_vec(body)?;
        Ok(self.body("application/json", bytes))
    }

    pub fn body(mut self, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.headers
            .push(("Content-Type".to_string(), content_type.into()));
        self.body = Some(bytes);
        self
    }

    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.form = Some(form);
        self
    }

    /// First header value with the given name, case-insensitively
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Bytes progress is reported against: the raw body or the form's files
    pub fn body_len(&self) -> u64 {
        match (&self.body, &self.form) {
            (Some(body), _) => body.len() as u64,
            (None, Some(form)) => form.upload_len(),
            (None, None) => 0,
        }
    }
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(k, v)| {
                if k.eq_ignore_ascii_case("authorization") {
                    (k.as_str(), "****")
                } else {
                    (k.as_str(), v.as_str())
                }
            })
            .collect();
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &headers)
            .field("body_len", &self.body_len())
            .field("form", &self.form)
            .finish()
    }
}

/// Status and raw body of a received response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// First bytes of the body as text, for logs
    pub fn body_preview(&self) -> String {
        let text = String::from_utf8_lossy(&self.body);
        text.chars().take(200).collect()
    }
}

// ============================================================================
// Transport Trait
// ============================================================================

/// Sends one request and returns whatever status the server produced
///
/// Non-2xx statuses are *not* errors at this layer; only a missing or
/// unreadable response is.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Send while reporting how much of the body has been written
    ///
    /// The default reports nothing in between: zero before sending and the
    /// full length once a response arrived.
    async fn send_with_progress(
        &self,
        request: HttpRequest,
        progress: ByteProgress,
    ) -> Result<HttpResponse, TransportError> {
        let total = request.body_len();
        progress(0, total);
        let response = self.send(request).await?;
        progress(total, total);
        Ok(response)
    }
}

// ============================================================================
// ReqwestTransport
// ============================================================================

/// [`Transport`] backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("VitaLens/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self { client }
    }

    fn builder(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };

        request
            .headers
            .iter()
            .fold(self.client.request(method, request.url.clone()), |b, (k, v)| {
                b.header(k.as_str(), v.as_str())
            })
    }

    /// Attach the raw body or the encoded form
    fn with_body(
        &self,
        request: HttpRequest,
        progress: Option<ByteProgress>,
    ) -> Result<reqwest::RequestBuilder, TransportError> {
        let builder = self.builder(&request);
        match (request.body, request.form) {
            (Some(body), _) => Ok(builder.body(body)),
            (None, Some(form)) => {
                let form = form.into_reqwest(progress).map_err(|e| {
                    log::warn!("[http] Invalid multipart part: {}", e);
                    TransportError::Other(e.to_string())
                })?;
                Ok(builder.multipart(form))
            }
            (None, None) => Ok(builder),
        }
    }

    async fn execute(
        builder: reqwest::RequestBuilder,
        method: HttpMethod,
        url: &Url,
    ) -> Result<HttpResponse, TransportError> {
        let response = builder.send().await.map_err(|e| {
            log::warn!("[http] {} {} failed: {}", method, url.path(), e);
            TransportError::from(e)
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        log::debug!("[http] {} {} -> {}", method, url.path(), status);
        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let (method, url) = (request.method, request.url.clone());
        let builder = self.with_body(request, None)?;
        Self::execute(builder, method, &url).await
    }

    async fn send_with_progress(
        &self,
        request: HttpRequest,
        progress: ByteProgress,
    ) -> Result<HttpResponse, TransportError> {
        let (method, url) = (request.method, request.url.clone());
        let total = request.body_len();
        // Form files report as the connection pulls them; a raw body is
        // written in one go
        let streamed = request.body.is_none() && request.form.is_some();
        progress(0, total);

        let builder = self.with_body(request, Some(progress.clone()))?;
        let response = Self::execute(builder, method, &url).await?;

        if !streamed {
            progress(total, total);
        }
        Ok(response)
    }
}
