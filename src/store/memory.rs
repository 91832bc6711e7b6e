use anyhow::Result;
use parking_lot::RwLock;

use crate::model::{ComparisonSession, Id};
use crate::store::traits::SessionStore;

#[derive(Debug, Default)]
struct SessionList {
    sessions: Vec<ComparisonSession>,
    active: Option<Id>,
}

/// In-process session store.
///
/// The session list and the active pointer live behind one lock so that a create
/// or delete never leaves them out of step.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<SessionList>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemoryStore {
    async fn create_session(&self, session: ComparisonSession) -> Result<ComparisonSession> {
        let mut inner = self.inner.write();
        inner.active = Some(session.id.clone());
        inner.sessions.push(session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: &Id) -> Result<Option<ComparisonSession>> {
        let inner = self.inner.read();
        Ok(inner.sessions.iter().find(|s| &s.id == id).cloned())
    }

    async fn list_sessions(&self) -> Result<Vec<ComparisonSession>> {
        Ok(self.inner.read().sessions.clone())
    }

    async fn delete_session(&self, id: &Id) -> Result<bool> {
        let mut inner = self.inner.write();
        let before = inner.sessions.len();
        inner.sessions.retain(|s| &s.id != id);
        let removed = inner.sessions.len() != before;

        if removed && inner.active.as_ref() == Some(id) {
            inner.active = None;
        }
        Ok(removed)
    }

    async fn get_active_session(&self) -> Result<Option<ComparisonSession>> {
        let inner = self.inner.read();
        let Some(active) = inner.active.as_ref() else {
            return Ok(None);
        };
        Ok(inner.sessions.iter().find(|s| &s.id == active).cloned())
    }

    async fn set_active_session(&self, id: &Id) -> Result<bool> {
        let mut inner = self.inner.write();
        if !inner.sessions.iter().any(|s| &s.id == id) {
            return Ok(false);
        }
        inner.active = Some(id.clone());
        Ok(true)
    }
}
