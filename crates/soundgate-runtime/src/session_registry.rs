//! Per-user session registry
//!
//! Keyed table of session states. Each entry sits behind its own mutex, so
//! events of one user run one at a time while other users proceed.
//! Transport-agnostic: works with any identifier type.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Session table
///
/// Generic over session ID type to support different transports:
/// - Telegram: `i64` (user_id)
/// - Web: `String` (session token)
pub struct SessionRegistry<Id, S>
where
    Id: Hash + Eq + Clone + Send + Sync + std::fmt::Debug + 'static,
{
    sessions: RwLock<HashMap<Id, Arc<Mutex<S>>>>,
}

impl<Id, S> Default for SessionRegistry<Id, S>
where
    Id: Hash + Eq + Clone + Send + Sync + std::fmt::Debug + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Id, S> SessionRegistry<Id, S>
where
    Id: Hash + Eq + Clone + Send + Sync + std::fmt::Debug + 'static,
{
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Get existing session or create a new one using `factory`.
    ///
    /// The flag is `true` only for the single caller that created the entry.
    pub async fn get_or_create<F>(&self, id: Id, factory: F) -> (Arc<Mutex<S>>, bool)
    where
        F: FnOnce() -> S,
    {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(&id) {
                return (session.clone(), false);
            }
        }

        let mut sessions = self.sessions.write().await;
        match sessions.entry(id) {
            Entry::Occupied(entry) => (entry.get().clone(), false),
            Entry::Vacant(entry) => {
                debug!(id = ?entry.key(), "Creating session");
                (entry.insert(Arc::new(Mutex::new(factory()))).clone(), true)
            }
        }
    }

    /// Get session if exists
    pub async fn get(&self, id: &Id) -> Option<Arc<Mutex<S>>> {
        let sessions = self.sessions.read().await;
        sessions.get(id).cloned()
    }

    /// Check if session exists
    pub async fn contains(&self, id: &Id) -> bool {
        let sessions = self.sessions.read().await;
        sessions.contains_key(id)
    }

    /// Number of sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no session exists yet
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
