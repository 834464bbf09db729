//! Session storage: a small string key/value store for the login session.
//!
//! The stored values are a cache of what the server said at login. Nothing
//! here is authoritative.

use std::collections::HashMap;

use crate::error::ApiError;

/// Keys written on login and removed on logout.
pub mod keys {
    pub const AUTH_TOKEN: &str = "authToken";
    pub const USER_ID: &str = "userId";
    pub const USER_NAME: &str = "userName";
    pub const USER_EMAIL: &str = "userEmail";
    pub const ACCOUNT_TYPE: &str = "accountType";
    /// JSON-serialized `User`, read by the tracking page.
    pub const USER: &str = "user";

    pub const SESSION: [&str; 6] = [AUTH_TOKEN, USER_ID, USER_NAME, USER_EMAIL, ACCOUNT_TYPE, USER];
}

pub trait SessionStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), ApiError>;
    fn remove(&mut self, key: &str) -> Result<(), ApiError>;
}

/// In-memory storage for tests and short-lived sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ApiError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), ApiError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let mut storage = MemoryStorage::new();
        storage.set(keys::USER_ID, "7").unwrap();
        assert_eq!(storage.get(keys::USER_ID).as_deref(), Some("7"));
        storage.remove(keys::USER_ID).unwrap();
        assert!(storage.get(keys::USER_ID).is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn removing_missing_key_is_ok() {
        let mut storage = MemoryStorage::new();
        assert!(storage.remove(keys::AUTH_TOKEN).is_ok());
    }
}
