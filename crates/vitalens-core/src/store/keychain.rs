//! OS credential store
//!
//! Backed by the platform keyring through the `keyring` crate:
//!
//! - **macOS / iOS**: Keychain generic passwords
//! - **Windows**: Credential Manager generic credentials
//! - **Linux**: kernel keyutils, persisted through the Secret Service so
//!   entries survive logout and reboot
//!
//! Entries are addressed by service (the app namespace) and account (the
//! key). None of these backends sync across devices.

use keyring::credential::{CredentialBuilderApi, CredentialPersistence};
use keyring::Entry;

use super::{CredentialStore, StoreError, CREDENTIAL_KEYS};

/// Credential store backed by the platform keyring
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        if !Self::is_durable() {
            log::warn!("[store:keyring] Platform keyring does not keep entries on disk");
        }
        Self {
            service: service.into(),
        }
    }

    /// Whether entries outlive the process, the login session and reboots
    pub fn is_durable() -> bool {
        matches!(
            keyring::default::default_credential_builder().persistence(),
            CredentialPersistence::UntilDelete
        )
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, key: &str) -> Result<Entry, StoreError> {
        Entry::new(&self.service, key).map_err(|e| map_keyring_error(key, e))
    }
}

impl CredentialStore for KeyringStore {
    fn backend_name(&self) -> &'static str {
        "keyring"
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let entry = self.entry(key)?;

        // Delete-then-add: the net effect is overwrite-or-create
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {}
            Err(e) => return Err(map_keyring_error(key, e)),
        }

        entry
            .set_password(value)
            .map_err(|e| map_keyring_error(key, e))?;
        log::debug!("[store:keyring] Saved '{}'", key);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<String, StoreError> {
        self.entry(key)?
            .get_password()
            .map_err(|e| map_keyring_error(key, e))
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(map_keyring_error(key, e)),
        }
    }

    /// Keyring backends cannot enumerate a service, so this removes every
    /// key the client ever writes.
    fn delete_all(&self) -> Result<(), StoreError> {
        for key in CREDENTIAL_KEYS {
            self.delete(key)?;
        }
        log::debug!("[store:keyring] Cleared service '{}'", self.service);
        Ok(())
    }
}

fn map_keyring_error(key: &str, err: keyring::Error) -> StoreError {
    match err {
        keyring::Error::NoEntry => StoreError::NotFound(key.to_string()),
        keyring::Error::BadEncoding(_) => {
            StoreError::Corrupt(format!("value for '{}' is not valid UTF-8", key))
        }
        other => {
            log::warn!("[store:keyring] Access to '{}' failed: {}", key, other);
            StoreError::Unavailable(other.to_string())
        }
    }
}
