//! Client configuration
//!
//! Defaults suit a backend running locally. Every value can be overridden
//! through the environment:
//!
//! | Variable                | Meaning                               | Default                 |
//! |-------------------------|---------------------------------------|-------------------------|
//! | `VITALENS_API_URL`      | Backend base URL                      | `http://localhost:8000` |
//! | `VITALENS_TIMEOUT_SECS` | Per-request timeout in seconds        | `30`                    |
//! | `VITALENS_STORE`        | Credential backend (keyring/file/memory) | `keyring`            |

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;

use crate::error::{Error, Result};
use crate::store::{CredentialStore, FileStore, KeyringStore, MemoryStore, StoreError};

// ============================================================================
// Constants
// ============================================================================

/// Backend used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// HTTP request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Namespace for credential store entries
pub const CREDENTIAL_SERVICE: &str = "com.vitalens.app";

pub const ENV_API_URL: &str = "VITALENS_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "VITALENS_TIMEOUT_SECS";
pub const ENV_STORE: &str = "VITALENS_STORE";

// ============================================================================
// Store Backend
// ============================================================================

/// Where credentials are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// OS credential store (Keychain, Credential Manager, kernel keyring)
    #[default]
    Keyring,
    /// Owner-only JSON file in the local data directory
    File,
    /// Process memory; nothing survives exit
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keyring" | "keychain" => Ok(StoreBackend::Keyring),
            "file" => Ok(StoreBackend::File),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!(
                "Invalid store: {}. Use 'keyring', 'file' or 'memory'",
                s
            )),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Keyring => write!(f, "keyring"),
            StoreBackend::File => write!(f, "file"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

impl StoreBackend {
    /// Open the credential store for `service`
    pub fn open(&self, service: &str) -> std::result::Result<Arc<dyn CredentialStore>, StoreError> {
        let store: Arc<dyn CredentialStore> = match self {
            StoreBackend::Keyring => Arc::new(KeyringStore::new(service)),
            StoreBackend::File => Arc::new(FileStore::for_service(service)?),
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
        };
        log::debug!("[store] Opened {} credential store", store.backend_name());
        Ok(store)
    }
}

// ============================================================================
// ClientConfig
// ============================================================================

/// Configuration for talking to the backend
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub credential_service: String,
    pub store_backend: StoreBackend,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            credential_service: CREDENTIAL_SERVICE.to_string(),
            store_backend: StoreBackend::default(),
        }
    }
}

impl ClientConfig {
    /// Build the configuration from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    ///
    /// Unparseable values are logged and replaced by defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => log::warn!(
                    "Ignoring {}={:?}, using {}s",
                    ENV_TIMEOUT_SECS,
                    raw,
                    DEFAULT_TIMEOUT_SECS
                ),
            }
        }

        if let Some(raw) = lookup(ENV_STORE) {
            match raw.parse::<StoreBackend>() {
                Ok(backend) => config.store_backend = backend,
                Err(e) => log::warn!("{}, using {}", e, config.store_backend),
            }
        }

        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_store_backend(mut self, backend: StoreBackend) -> Self {
        self.store_backend = backend;
        self
    }

    /// Parse and validate the base URL
    pub fn parsed_base_url(&self) -> Result<Url> {
        parse_base_url(&self.base_url)
    }

    /// Open the configured credential store
    pub fn open_store(&self) -> Result<Arc<dyn CredentialStore>> {
        Ok(self.store_backend.open(&self.credential_service)?)
    }
}

/// Parse a backend base URL, rejecting anything that cannot carry paths
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| Error::invalid_url(format!("{}: {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::invalid_url(format!(
            "{}: unsupported scheme '{}'",
            raw,
            url.scheme()
        )));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(Error::invalid_url(format!("{}: missing host", raw)));
    }

    Ok(url)
}
