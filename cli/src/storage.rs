//! Session storage persisted as a flat JSON object on disk.
//!
//! Every write rewrites the whole file; the session holds a handful of keys.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use transit_core::{ApiError, SessionStorage};

pub const SESSION_FILE_VAR: &str = "TRANSIT_SESSION_FILE";

/// `TRANSIT_SESSION_FILE`, else `<data dir>/transit/session.json`.
pub fn default_session_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(SESSION_FILE_VAR) {
        return Some(PathBuf::from(path));
    }
    dirs::data_dir().map(|dir| dir.join("transit").join("session.json"))
}

#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStorage {
    /// Load the file at `path`. A missing file is an empty session; an
    /// unreadable one is discarded with a warning.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ApiError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Ignoring corrupt session file {}: {e}", path.display());
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(ApiError::Storage(format!("{}: {e}", path.display()))),
        };
        debug!("Session file {} holds {} keys", path.display(), entries.len());
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), ApiError> {
        let storage_error = |e: std::io::Error| ApiError::Storage(format!("{}: {e}", self.path.display()));
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(storage_error)?;
        }
        let raw = serde_json::to_string_pretty(&self.entries).map_err(|e| ApiError::Storage(e.to_string()))?;
        fs::write(&self.path, raw).map_err(storage_error)
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ApiError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), ApiError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transit_core::storage::keys;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("transit-cli-{}-{name}", std::process::id()))
            .join("session.json")
    }

    #[test]
    fn values_survive_reopen() {
        let path = temp_path("reopen");
        let mut storage = FileStorage::open(&path).unwrap();
        storage.set(keys::USER_ID, "7").unwrap();
        storage.set(keys::AUTH_TOKEN, "user_7").unwrap();

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get(keys::USER_ID).as_deref(), Some("7"));
        assert_eq!(reopened.get(keys::AUTH_TOKEN).as_deref(), Some("user_7"));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn missing_file_is_an_empty_session() {
        let storage = FileStorage::open(temp_path("missing")).unwrap();
        assert!(storage.get(keys::USER_ID).is_none());
    }

    #[test]
    fn corrupt_file_is_discarded() {
        let path = temp_path("corrupt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();

        let storage = FileStorage::open(&path).unwrap();

        assert!(storage.get(keys::USER).is_none());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
