//! Session store - identity persistence across restarts
//!
//! Token, username and email live in durable storage under the keys
//! `authToken`, `username` and `email`. Verification is never written
//! anywhere, so every process starts unverified.

use std::sync::Arc;

use crate::domain::result::Result;
use crate::domain::{Action, AppState, Session, StoredCredentials};
use crate::ports::{KeyValueStore, StorageKey};

#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    pub fn load_credentials(&self) -> Result<StoredCredentials> {
        Ok(StoredCredentials {
            token: self.storage.get(StorageKey::AuthToken)?,
            username: self.storage.get(StorageKey::Username)?,
            email: self.storage.get(StorageKey::Email)?,
        })
    }

    /// Initial state for a fresh process
    pub fn restore(&self) -> Result<AppState> {
        let session = Session::restore(&self.load_credentials()?);
        tracing::debug!(authenticated = session.authenticated, "session restored");
        Ok(AppState::new(session))
    }

    /// Record a completed login
    ///
    /// Purely local: the token has already been issued by the server.
    /// The token is written last since its presence is what marks a stored
    /// session as authenticated. On a failed write the keys already written
    /// are removed again and the state is left unchanged.
    pub fn login(&self, state: &AppState, username: &str, token: &str, email: &str) -> Result<AppState> {
        let entries = [
            (StorageKey::Username, username),
            (StorageKey::Email, email),
            (StorageKey::AuthToken, token),
        ];
        for (written, (key, value)) in entries.iter().enumerate() {
            if let Err(e) = self.storage.set(*key, value) {
                tracing::warn!(key = key.as_str(), error = %e, "failed to store credential");
                for (key, _) in &entries[..written] {
                    if let Err(e) = self.storage.remove(*key) {
                        tracing::warn!(key = key.as_str(), error = %e, "failed to roll back credential");
                    }
                }
                return Err(e);
            }
        }

        Ok(state.reduce(Action::LoggedIn {
            username: username.to_string(),
            email: email.to_string(),
            token: token.to_string(),
        }))
    }

    /// Forget the identity locally
    ///
    /// Every key is attempted even if one removal fails; the first failure
    /// is returned. The token stays valid on the server.
    pub fn logout(&self) -> Result<()> {
        let mut first_error = None;
        for key in StorageKey::ALL {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!(key = key.as_str(), error = %e, "failed to clear stored credential");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Raise the verified flag
    ///
    /// Client-side only. There is no server check behind it.
    pub fn verify(&self, state: &AppState) -> AppState {
        state.reduce(Action::Verified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStorage;
    use crate::domain::result::Error;

    fn store() -> (Arc<MemoryStorage>, SessionStore) {
        let storage = Arc::new(MemoryStorage::new());
        (storage.clone(), SessionStore::new(storage))
    }

    #[test]
    fn test_login_persists_and_restores_unverified() {
        let (storage, sessions) = store();

        let state = sessions
            .login(&AppState::default(), "alice", "tok", "alice@example.com")
            .unwrap();
        assert!(state.session.authenticated);
        assert_eq!(storage.get(StorageKey::AuthToken).unwrap().as_deref(), Some("tok"));

        let verified = sessions.verify(&state);
        assert!(verified.session.verified);

        let restored = sessions.restore().unwrap();
        assert!(restored.session.authenticated);
        assert!(!restored.session.verified);
        assert_eq!(restored.session.username, "alice");
        assert_eq!(restored.session.email, "alice@example.com");
    }

    #[test]
    fn test_logout_clears_every_key() {
        let storage = Arc::new(MemoryStorage::with_entries([
            (StorageKey::AuthToken, "tok"),
            (StorageKey::Username, "alice"),
            (StorageKey::Email, "alice@example.com"),
        ]));
        let sessions = SessionStore::new(storage.clone());

        sessions.logout().unwrap();

        for key in StorageKey::ALL {
            assert_eq!(storage.get(key).unwrap(), None);
        }
        assert!(!sessions.restore().unwrap().session.authenticated);
    }

    #[test]
    fn test_restore_without_token() {
        let storage = Arc::new(MemoryStorage::with_entries([(StorageKey::Username, "alice")]));
        let state = SessionStore::new(storage).restore().unwrap();
        assert!(!state.session.authenticated);
        assert_eq!(state.session.username, "alice");
    }

    struct FailingStorage;

    impl KeyValueStore for FailingStorage {
        fn get(&self, _key: StorageKey) -> Result<Option<String>> {
            Ok(None)
        }
        fn set(&self, _key: StorageKey, _value: &str) -> Result<()> {
            Err(Error::storage("disk full"))
        }
        fn remove(&self, _key: StorageKey) -> Result<()> {
            Err(Error::storage("read-only"))
        }
    }

    /// Memory storage whose n-th `set` fails
    struct FlakyStorage {
        inner: MemoryStorage,
        fail_on: usize,
        sets: std::sync::atomic::AtomicUsize,
    }

    impl KeyValueStore for FlakyStorage {
        fn get(&self, key: StorageKey) -> Result<Option<String>> {
            self.inner.get(key)
        }
        fn set(&self, key: StorageKey, value: &str) -> Result<()> {
            let n = self.sets.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
            if n == self.fail_on {
                return Err(Error::storage("disk full"));
            }
            self.inner.set(key, value)
        }
        fn remove(&self, key: StorageKey) -> Result<()> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_partial_login_write_leaves_no_session() {
        for fail_on in 1..=3 {
            let storage = Arc::new(FlakyStorage {
                inner: MemoryStorage::new(),
                fail_on,
                sets: Default::default(),
            });
            let sessions = SessionStore::new(storage.clone());

            let result = sessions.login(&AppState::default(), "alice", "tok", "alice@example.com");
            assert!(matches!(result, Err(Error::Storage(_))), "fail_on={fail_on}");

            let restored = sessions.restore().unwrap();
            assert!(!restored.session.authenticated, "fail_on={fail_on}");
            for key in StorageKey::ALL {
                assert_eq!(storage.get(key).unwrap(), None, "fail_on={fail_on}");
            }
        }
    }

    #[test]
    fn test_storage_failures_surface() {
        let sessions = SessionStore::new(Arc::new(FailingStorage));
        let err = sessions
            .login(&AppState::default(), "alice", "tok", "alice@example.com")
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert!(matches!(sessions.logout(), Err(Error::Storage(_))));
    }
}
