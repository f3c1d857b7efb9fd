//! In-memory session store.
//!
//! Useful for testing and ephemeral runs.

use super::{SessionState, SessionStore};
use crate::error::{Result, VidbriefError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory session store.
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionState>>,
}

impl MemorySessionStore {
    /// Create a new, empty in-memory store.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> VidbriefError {
    VidbriefError::SessionStore(format!("Failed to acquire lock: {}", e))
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, user_id: &str) -> Result<Option<SessionState>> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        Ok(sessions.get(user_id).cloned())
    }

    async fn save(&self, user_id: &str, state: &SessionState) -> Result<()> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        sessions.insert(user_id.to_string(), state.clone());
        Ok(())
    }
}
