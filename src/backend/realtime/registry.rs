//! Session Registry
//!
//! Process-wide map from identity key to [`Session`]. Sessions are created
//! lazily on first use and live for the rest of the process. The registry
//! is a cheap `Clone` handle passed to handlers through application state.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::backend::realtime::session::Session;

/// Shared identity → session map
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, Arc<Session>>>>,
    queue_capacity: usize,
}

impl SessionRegistry {
    /// Create an empty registry; new sessions get `queue_capacity`
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            queue_capacity,
        }
    }

    /// Session for `identity_key`, created on first call
    ///
    /// Concurrent first calls for the same key all get the same session.
    pub fn get_or_create(&self, identity_key: &str) -> Arc<Session> {
        if let Some(session) = self.get(identity_key) {
            return session;
        }
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions
            .entry(identity_key.to_string())
            .or_insert_with(|| {
                tracing::info!("[Hub] Created session for identity {}", identity_key);
                Arc::new(Session::new(identity_key, self.queue_capacity))
            })
            .clone()
    }

    /// Session for `identity_key` if one exists
    pub fn get(&self, identity_key: &str) -> Option<Arc<Session>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identity_key)
            .cloned()
    }

    /// Snapshot of every session
    pub fn snapshot(&self) -> Vec<Arc<Session>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Visit every session present when the call starts
    ///
    /// The map lock is released before `visit` runs, so `visit` may call
    /// back into the registry.
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(&Arc<Session>),
    {
        for session in self.snapshot() {
            visit(&session);
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(256)
    }
}
