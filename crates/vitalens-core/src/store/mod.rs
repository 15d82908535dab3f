//! Credential storage
//!
//! Durable key/value storage for the access and refresh tokens, scoped to a
//! fixed service namespace. Entries never leave the device: the OS-backed
//! store uses local, non-synchronized items and the file store keeps an
//! owner-only file in the local (non-roaming) data directory.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ trait CredentialStore                                   │
//! │   - save() / get() / delete() / delete_all()            │
//! │   - save_credential()  (both entries or neither)        │
//! │   - load_credential()                                   │
//! └─────────────────────────────────────────────────────────┘
//!          │
//!     ┌────┼──────────┐
//!     ▼    ▼          ▼
//! ┌───────┐ ┌──────┐ ┌────────┐
//! │Keyring│ │ File │ │ Memory │
//! └───────┘ └──────┘ └────────┘
//! ```

mod file;
mod keychain;
mod memory;

use std::fmt;

use thiserror::Error;

pub use file::FileStore;
pub use keychain::KeyringStore;
pub use memory::MemoryStore;

/// Key of the access token entry
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Key of the refresh token entry
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Every key the session writes
pub const CREDENTIAL_KEYS: [&str; 2] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY];

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised by a credential store
#[derive(Error, Debug)]
pub enum StoreError {
    /// No entry exists for the key
    #[error("No stored value for '{0}'")]
    NotFound(String),

    /// The backing store refused or could not be reached
    #[error("Credential store unavailable: {0}")]
    Unavailable(String),

    /// Stored data could not be read back
    #[error("Corrupt credential data: {0}")]
    Corrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

// ============================================================================
// Credential
// ============================================================================

/// Access/refresh token pair representing an authenticated session
///
/// Tokens are opaque; `Debug` never prints them.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"****")
            .field("refresh_token", &"****")
            .finish()
    }
}

// ============================================================================
// Store Trait
// ============================================================================

/// Key/value storage for credential entries
///
/// `save` overwrites, `get` reports a missing key as [`StoreError::NotFound`],
/// and `delete`/`delete_all` succeed when there is nothing to remove.
pub trait CredentialStore: Send + Sync {
    /// Short backend name used in logs and status output
    fn backend_name(&self) -> &'static str;

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn get(&self, key: &str) -> Result<String, StoreError>;

    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Remove every entry under this store's namespace
    fn delete_all(&self) -> Result<(), StoreError>;

    /// Persist both tokens, or neither
    ///
    /// If the second write fails the first is rolled back, so a reader never
    /// observes an access token without its refresh token.
    fn save_credential(&self, credential: &Credential) -> Result<(), StoreError> {
        self.save(ACCESS_TOKEN_KEY, &credential.access_token)?;

        if let Err(e) = self.save(REFRESH_TOKEN_KEY, &credential.refresh_token) {
            log::warn!("[store] Refresh token write failed, rolling back: {}", e);
            if let Err(rollback) = self.delete_all() {
                log::error!("[store] Rollback after partial write failed: {}", rollback);
            }
            return Err(e);
        }

        Ok(())
    }

    /// Read both tokens; `Ok(None)` when either is missing
    fn load_credential(&self) -> Result<Option<Credential>, StoreError> {
        let access_token = match self.get(ACCESS_TOKEN_KEY) {
            Ok(token) => token,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };
        let refresh_token = match self.get(REFRESH_TOKEN_KEY) {
            Ok(token) => token,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(Some(Credential {
            access_token,
            refresh_token,
        }))
    }

    /// Whether a complete credential resolves right now
    fn has_credential(&self) -> Result<bool, StoreError> {
        Ok(self.load_credential()?.is_some())
    }
}
