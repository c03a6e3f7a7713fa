//! Durable key/value storage port

use crate::domain::result::Result;

/// Keys kept in durable storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    AuthToken,
    Username,
    Email,
}

impl StorageKey {
    pub const ALL: [StorageKey; 3] = [StorageKey::AuthToken, StorageKey::Username, StorageKey::Email];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::AuthToken => "authToken",
            StorageKey::Username => "username",
            StorageKey::Email => "email",
        }
    }
}

/// String key/value store that survives a restart
///
/// No expiry is enforced.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: StorageKey) -> Result<Option<String>>;

    fn set(&self, key: StorageKey, value: &str) -> Result<()>;

    /// Remove a key; removing a missing key is not an error
    fn remove(&self, key: StorageKey) -> Result<()>;
}
