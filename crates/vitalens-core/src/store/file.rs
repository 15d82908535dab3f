//! File-backed credential store
//!
//! Used where no OS keyring is reachable (headless Linux, containers). The
//! store is a JSON object of key → value, rewritten through a temporary file
//! and an atomic rename. On Unix the file is created with mode `0600`.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{CredentialStore, StoreError};

/// Credential store persisted to a single owner-only JSON file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store for `service` in the per-user local data directory
    ///
    /// e.g. `~/.local/share/vitalens/com.vitalens.app.json` on Linux
    pub fn for_service(service: &str) -> Result<Self, StoreError> {
        let dir = dirs::data_local_dir().ok_or_else(|| {
            StoreError::Unavailable("no local data directory for this user".to_string())
        })?;
        Ok(Self::new(dir.join("vitalens").join(format!("{}.json", service))))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            log::error!("[store:file] Failed to parse {:?}: {}", self.path, e);
            StoreError::Corrupt(e.to_string())
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut file = open_private(&tmp_path)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn update<F>(&self, mutate: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut entries = self.read_entries()?;
        mutate(&mut entries);
        self.write_entries(&entries)
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

impl CredentialStore for FileStore {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })?;
        log::debug!("[store:file] Saved '{}'", key);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<String, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        self.read_entries()?
            .remove(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }

    fn delete_all(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        match fs::remove_file(&self.path) {
            Ok(()) => {
                log::debug!("[store:file] Removed {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Credential, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
    use tempfile::TempDir;

    fn create_test_store() -> (FileStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::new(temp_dir.path().join("nested").join("credentials.json"));
        (store, temp_dir)
    }

    #[test]
    fn test_round_trip_survives_reopen() {
        let (store, _temp_dir) = create_test_store();
        store.save(ACCESS_TOKEN_KEY, "access-1").unwrap();

        let reopened = FileStore::new(store.path());
        assert_eq!(reopened.get(ACCESS_TOKEN_KEY).unwrap(), "access-1");
    }

    #[test]
    fn test_save_overwrites() {
        let (store, _temp_dir) = create_test_store();
        store.save(ACCESS_TOKEN_KEY, "old").unwrap();
        store.save(ACCESS_TOKEN_KEY, "new").unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), "new");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let (store, _temp_dir) = create_test_store();
        assert!(store.get(ACCESS_TOKEN_KEY).unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_keeps_other_entries() {
        let (store, _temp_dir) = create_test_store();
        store
            .save_credential(&Credential::new("access-1", "refresh-1"))
            .unwrap();
        store.delete(ACCESS_TOKEN_KEY).unwrap();

        assert!(store.get(ACCESS_TOKEN_KEY).unwrap_err().is_not_found());
        assert_eq!(store.get(REFRESH_TOKEN_KEY).unwrap(), "refresh-1");
    }

    #[test]
    fn test_delete_all_is_idempotent() {
        let (store, _temp_dir) = create_test_store();
        store
            .save_credential(&Credential::new("access-1", "refresh-1"))
            .unwrap();

        store.delete_all().unwrap();
        assert!(!store.path().exists());
        assert!(store.get(REFRESH_TOKEN_KEY).unwrap_err().is_not_found());

        store.delete_all().unwrap();
    }

    #[test]
    fn test_corrupt_file() {
        let (store, _temp_dir) = create_test_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{not json").unwrap();

        assert!(matches!(
            store.get(ACCESS_TOKEN_KEY),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let (store, _temp_dir) = create_test_store();
        store.save(ACCESS_TOKEN_KEY, "access-1").unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
