use crate::model::{ComparisonSession, Id};
use anyhow::Result;

/// Persisted list of comparison sessions with at most one active session
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Append a session and make it the active one, as a single step
    async fn create_session(&self, session: ComparisonSession) -> Result<ComparisonSession>;
    /// Get a session by id
    async fn get_session(&self, id: &Id) -> Result<Option<ComparisonSession>>;
    /// List sessions in creation order
    async fn list_sessions(&self) -> Result<Vec<ComparisonSession>>;
    /// Delete a session, clearing the active pointer if it pointed at it
    async fn delete_session(&self, id: &Id) -> Result<bool>;
    /// Get the active session (if any)
    async fn get_active_session(&self) -> Result<Option<ComparisonSession>>;
    /// Select an existing session as active; false when no such session exists
    async fn set_active_session(&self, id: &Id) -> Result<bool>;
}
