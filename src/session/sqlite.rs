//! SQLite-backed session store.
//!
//! Each user's state is one JSON document in the `sessions` table. A row whose
//! JSON no longer parses is reported as missing.

use super::{SessionState, SessionStore};
use crate::error::{Result, VidbriefError};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, instrument, warn};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS sessions (
        user_id TEXT PRIMARY KEY,
        state_json TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
"#;

/// SQLite session store.
pub struct SqliteSessionStore {
    conn: Mutex<Connection>,
}

impl SqliteSessionStore {
    /// Open (or create) a session database at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite session store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| VidbriefError::SessionStore(format!("Failed to acquire lock: {}", e)))
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    #[instrument(skip(self))]
    async fn load(&self, user_id: &str) -> Result<Option<SessionState>> {
        let conn = self.lock()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT state_json FROM sessions WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                warn!("Discarding unreadable session for {}: {}", user_id, e);
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, state))]
    async fn save(&self, user_id: &str, state: &SessionState) -> Result<()> {
        let json = serde_json::to_string(state)?;
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO sessions (user_id, state_json, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id) DO UPDATE SET
                state_json = excluded.state_json,
                updated_at = excluded.updated_at
            "#,
            params![user_id, json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::QaTurn;

    #[tokio::test]
    async fn test_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sessions.db");

        let mut state = SessionState::new("Kannada");
        state.transcript = "some transcript".to_string();
        state.record_answer("What is it about?", "Pricing. [03:15]");

        {
            let store = SqliteSessionStore::new(&path).unwrap();
            store.save("user-1", &state).await.unwrap();
        }

        let store = SqliteSessionStore::new(&path).unwrap();
        let loaded = store.load("user-1").await.unwrap().unwrap();
        assert_eq!(loaded.language, "Kannada");
        assert_eq!(
            loaded.qa_history,
            vec![QaTurn::new("What is it about?", "Pricing. [03:15]")]
        );
        assert!(store.load("user-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let store = SqliteSessionStore::in_memory().unwrap();
        store.save("u", &SessionState::new("Hindi")).await.unwrap();
        store.save("u", &SessionState::new("Tamil")).await.unwrap();
        assert_eq!(store.load("u").await.unwrap().unwrap().language, "Tamil");
    }

    #[tokio::test]
    async fn test_unreadable_json_is_treated_as_missing() {
        let store = SqliteSessionStore::in_memory().unwrap();
        store
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO sessions (user_id, state_json, updated_at) VALUES ('u', 'not json', 'now')",
                [],
            )
            .unwrap();

        // The caller then starts a fresh session in its own default language.
        assert!(store.load("u").await.unwrap().is_none());

        store.save("u", &SessionState::new("Telugu")).await.unwrap();
        assert_eq!(store.load("u").await.unwrap().unwrap().language, "Telugu");
    }
}
