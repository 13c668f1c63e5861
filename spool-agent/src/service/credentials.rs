//! Credential holder
//!
//! Keeps the username/password pair supplied at login for the lifetime of the
//! process. Values are replaced whole, so a reader sees either the old pair or
//! the new one, never a mix.

use spool_core::Credentials;
use std::sync::Arc;
use tokio::sync::watch;

/// In-memory credential store shared between the login side and the scheduler
#[derive(Debug, Clone)]
pub struct CredentialStore {
    current: Arc<watch::Sender<Option<Credentials>>>,
}

impl CredentialStore {
    /// Creates an empty store
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            current: Arc::new(tx),
        }
    }

    /// Replaces the stored pair
    pub fn set(&self, username: impl Into<String>, password: impl Into<String>) {
        self.current
            .send_replace(Some(Credentials::new(username, password)));
    }

    /// Returns the current pair, or `None` if nothing has been set
    pub fn get(&self) -> Option<Credentials> {
        self.current.borrow().clone()
    }

    /// Forgets the stored pair
    pub fn clear(&self) {
        self.current.send_replace(None);
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_by_default() {
        assert_eq!(CredentialStore::new().get(), None);
    }

    #[test]
    fn test_set_replaces_whole_pair() {
        let store = CredentialStore::new();
        store.set("alice", "secret");
        store.set("bob", "hunter2");

        assert_eq!(store.get(), Some(Credentials::new("bob", "hunter2")));
    }

    #[test]
    fn test_clones_share_state() {
        let store = CredentialStore::new();
        let login_side = store.clone();

        login_side.set("alice", "secret");
        assert_eq!(store.get(), Some(Credentials::new("alice", "secret")));

        store.clear();
        assert_eq!(login_side.get(), None);
    }

    #[test]
    fn test_concurrent_readers_never_see_mixed_pair() {
        let store = CredentialStore::new();
        store.set("a", "a");

        let writer = {
            let store = store.clone();
            std::thread::spawn(move || {
                for i in 0..1000 {
                    let v = if i % 2 == 0 { "b" } else { "a" };
                    store.set(v, v);
                }
            })
        };

        for _ in 0..1000 {
            let creds = store.get().unwrap();
            assert_eq!(creds.username(), creds.password());
        }

        writer.join().unwrap();
    }
}
