/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Session registry.
//!
//! Maps canonical session keys (`version:sender->target`) to their connected
//! flag. Entries are never removed, so the key set only grows for the life of
//! the process.

use fixstatus_core::types::{ConnectionStatus, SessionIdentity};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Connectivity of one session, as seen in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    /// Canonical session key.
    pub identity: String,
    /// Whether the session is logged on.
    pub connected: bool,
}

impl SessionState {
    /// Returns the connection status for display.
    #[inline]
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus::from_connected(self.connected)
    }
}

/// Thread-safe registry of session connectivity.
///
/// One `RwLock` guards the whole map. Lifecycle callbacks take it exclusively
/// and readers take it shared; no method acquires it twice.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<BTreeMap<String, bool>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session as disconnected.
    ///
    /// Idempotent: an already registered session keeps its current state.
    pub fn create(&self, id: &SessionIdentity) {
        let key = id.key();
        let mut sessions = self.sessions.write();
        if !sessions.contains_key(&key) {
            debug!(session = %key, "session registered");
            sessions.insert(key, false);
        }
    }

    /// Records a logon (`true`) or logout (`false`).
    ///
    /// Registers the session first if the creation callback was never seen.
    pub fn set_connected(&self, id: &SessionIdentity, connected: bool) {
        let key = id.key();
        debug!(session = %key, connected, "session connectivity changed");
        self.sessions.write().insert(key, connected);
    }

    /// Returns true if the session is registered and logged on.
    #[must_use]
    pub fn is_active(&self, id: &SessionIdentity) -> bool {
        self.is_active_key(&id.key())
    }

    /// Returns true if the canonical key is registered and logged on.
    #[must_use]
    pub fn is_active_key(&self, key: &str) -> bool {
        self.sessions.read().get(key).copied().unwrap_or(false)
    }

    /// Returns an immutable copy of every session, ordered by key.
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        let sessions = self.sessions.read();
        RegistrySnapshot {
            entries: sessions
                .iter()
                .map(|(identity, connected)| SessionState {
                    identity: identity.clone(),
                    connected: *connected,
                })
                .collect(),
        }
    }

    /// Returns the number of registered sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Returns true if no session has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

/// Point-in-time copy of the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RegistrySnapshot {
    entries: Vec<SessionState>,
}

impl RegistrySnapshot {
    /// Returns the smallest connected key.
    ///
    /// When more than one session is logged on this is the one the
    /// coordinator drives.
    #[must_use]
    pub fn first_active(&self) -> Option<&str> {
        self.entries
            .iter()
            .find(|s| s.connected)
            .map(|s| s.identity.as_str())
    }

    /// Returns the state for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SessionState> {
        self.entries
            .binary_search_by(|s| s.identity.as_str().cmp(key))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Iterates sessions in key order.
    pub fn iter(&self) -> impl Iterator<Item = &SessionState> {
        self.entries.iter()
    }

    /// Returns how many sessions are logged on.
    #[must_use]
    pub fn connected_count(&self) -> usize {
        self.entries.iter().filter(|s| s.connected).count()
    }

    /// Returns the number of sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for RegistrySnapshot {
    type Item = SessionState;
    type IntoIter = std::vec::IntoIter<SessionState>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
