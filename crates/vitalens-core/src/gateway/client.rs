//! Shared request pipeline
//!
//! Every gateway goes through [`ApiClient`]: build the endpoint URL, read the
//! access token, send through the [`Transport`], classify the status.

use std::sync::Arc;

use reqwest::Url;
use serde::de::DeserializeOwned;

use super::transport::{
    ByteProgress, HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError,
};
use crate::config::{parse_base_url, ClientConfig};
use crate::error::{Error, Result};
use crate::store::{CredentialStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

/// Base URL, transport and credential store shared by all gateways
#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("store", &self.store.backend_name())
            .finish()
    }
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            transport,
            store,
        })
    }

    /// Client talking HTTP through `reqwest` with the configured timeout
    pub fn from_config(config: &ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::with_timeout(config.request_timeout));
        Self::new(&config.base_url, transport, store)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    // ========================================================================
    // URL / Credentials
    // ========================================================================

    /// Base URL joined with `path`, plus query pairs when any are given
    ///
    /// Segments are appended to whatever path the base URL already has, so a
    /// base of `https://host/api` yields `https://host/api/auth/login`.
    pub fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| Error::invalid_url(format!("{} cannot be a base", self.base_url)))?;
            segments
                .pop_if_empty()
                .extend(path.split('/').filter(|s| !s.is_empty()));
        }

        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }

        Ok(url)
    }

    /// Stored access token; absent or unreadable both yield `None`
    pub fn access_token(&self) -> Option<String> {
        self.read_token(ACCESS_TOKEN_KEY)
    }

    /// Stored refresh token; absent or unreadable both yield `None`
    pub fn refresh_token(&self) -> Option<String> {
        self.read_token(REFRESH_TOKEN_KEY)
    }

    fn read_token(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(token) => Some(token),
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                log::warn!(
                    "[http] Failed to read '{}' from {} store: {}",
                    key,
                    self.store.backend_name(),
                    e
                );
                None
            }
        }
    }

    /// Access token required for an authenticated call
    pub fn bearer_token(&self) -> Result<String> {
        self.access_token().ok_or(Error::Unauthorized)
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.transport
            .send(request)
            .await
            .map_err(map_transport_error)
    }

    pub async fn send_with_progress(
        &self,
        request: HttpRequest,
        progress: ByteProgress,
    ) -> Result<HttpResponse> {
        self.transport
            .send_with_progress(request, progress)
            .await
            .map_err(map_transport_error)
    }

    /// `GET` with a bearer token and resource classification
    pub async fn authorized_get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.endpoint(path, query)?;
        let token = self.bearer_token()?;
        let response = self.send(HttpRequest::get(url).bearer(&token)).await?;
        classify_resource(response)
    }
}

// ============================================================================
// Classification
// ============================================================================

fn map_transport_error(err: TransportError) -> Error {
    match err {
        TransportError::Body(msg) => {
            log::warn!("[http] Unreadable response: {}", msg);
            Error::InvalidResponse
        }
        other => Error::Network(other),
    }
}

/// `Http` error for a non-2xx response, message from `{"detail": "..."}`
pub fn server_error(response: &HttpResponse) -> Error {
    let detail = serde_json::from_slice::<serde_json::Value>(&response.body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string));

    if detail.is_none() {
        log::debug!(
            "[http] No detail in {} response: {}",
            response.status,
            response.body_preview()
        );
    }

    Error::Http {
        status_code: response.status,
        message: detail.unwrap_or_else(|| format!("Server error (status {})", response.status)),
    }
}

/// Decode a 2xx body
pub fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    serde_json::from_slice(&response.body).map_err(|e| {
        log::warn!("[http] Failed to decode response: {}", e);
        Error::decoding(e.to_string())
    })
}

/// 2xx decodes, anything else becomes [`server_error`]
pub fn classify<T: DeserializeOwned>(response: HttpResponse) -> Result<T> {
    if response.is_success() {
        decode(&response)
    } else {
        Err(server_error(&response))
    }
}

/// Same as [`classify`] except 401 is always [`Error::Unauthorized`]
pub fn classify_resource<T: DeserializeOwned>(response: HttpResponse) -> Result<T> {
    if response.status == 401 {
        return Err(Error::Unauthorized);
    }
    classify(response)
}
