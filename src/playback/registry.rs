use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::info;

use crate::playback::session::{Session, SessionId};

/// Sessions keyed by id. Each session is created lazily on first use.
#[derive(Default)]
pub struct Registry {
    sessions: Mutex<HashMap<SessionId, Arc<Session>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, Arc<Session>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_or_create(&self, id: SessionId) -> Arc<Session> {
        self.lock()
            .entry(id)
            .or_insert_with(|| {
                info!(session = id, "session created");
                Arc::new(Session::new(id))
            })
            .clone()
    }

    pub fn get(&self, id: SessionId) -> Option<Arc<Session>> {
        self.lock().get(&id).cloned()
    }

    /// Clear and drop a session. Handles still held elsewhere see an empty queue.
    pub fn remove(&self, id: SessionId) -> bool {
        let Some(session) = self.lock().remove(&id) else {
            return false;
        };
        session.clear();
        info!(session = id, "session removed");
        true
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Ids of live sessions, ascending.
    pub fn session_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.lock().keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
