//! In-memory session store
//!
//! A single reader/writer lock guards the id → session map. Reads (`list`,
//! `get`) share the lock; `create`, `update` and `delete` hold it exclusively
//! for the whole mutation, so a reader never sees a half-written session.

use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::session::{IdAllocator, Session};

/// Date shared by the sample sessions seeded at startup
const SAMPLE_DATE: &str = "06/02/2013";
const SAMPLE_COUNT: u64 = 5;

/// Thread-safe in-memory session store
#[derive(Debug, Default)]
pub struct SessionStore {
    /// Keyed by session id; ordered so `list` needs no sort
    sessions: RwLock<BTreeMap<u64, Session>>,
    /// Source of ids for newly created sessions
    ids: IdAllocator,
}

impl SessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the sample sessions
    pub async fn with_samples() -> Self {
        let store = Self::new();
        store.seed_samples().await;
        store
    }

    /// Insert the sample sessions `Sess1`..`Sess5`
    ///
    /// Ids come from the allocator, so on a fresh store they are 1..=5 and
    /// the next created session gets id 6.
    pub async fn seed_samples(&self) {
        for _ in 0..SAMPLE_COUNT {
            let mut sessions = self.sessions.write().await;
            let id = self.ids.next();
            sessions.insert(id, Session::new(id, format!("Sess{}", id), SAMPLE_DATE));
        }
        info!("Seeded {} sample sessions", SAMPLE_COUNT);
    }

    /// All sessions in ascending id order
    pub async fn list(&self) -> Vec<Session> {
        let sessions = self.sessions.read().await;
        debug!("Listing {} sessions", sessions.len());
        sessions.values().cloned().collect()
    }

    /// Create a session with a freshly allocated id
    pub async fn create(&self, title: impl Into<String>, date: impl Into<String>) -> Session {
        let id = self.ids.next();
        let session = Session::new(id, title, date);

        let mut sessions = self.sessions.write().await;
        sessions.insert(id, session.clone());
        info!("Created session {}", id);

        session
    }

    /// Get a session by id
    pub async fn get(&self, id: u64) -> Option<Session> {
        let sessions = self.sessions.read().await;
        sessions.get(&id).cloned()
    }

    /// Replace the title and date of an existing session
    ///
    /// Returns `None` without inserting anything if `id` is absent.
    pub async fn update(
        &self,
        id: u64,
        title: impl Into<String>,
        date: impl Into<String>,
    ) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id)?;

        session.title = title.into();
        session.date = date.into();
        info!("Updated session {}", id);

        Some(session.clone())
    }

    /// Remove a session, returning whether it existed
    pub async fn delete(&self, id: u64) -> bool {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(&id).is_some();
        if removed {
            info!("Deleted session {}", id);
        } else {
            debug!("Delete of unknown session {}", id);
        }
        removed
    }

    /// Number of stored sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether the store holds no sessions
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
