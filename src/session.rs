//! Analysis session records.
//!
//! One session is one `analyze` invocation with its timestamped result.
//! Storage sits behind [`SessionStore`] so an embedding service can plug
//! in its own database; the in-memory store covers tests and single-run
//! tooling.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::pipeline::AnalysisResult;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session {0} not found")]
    NotFound(Uuid),

    #[error("session store unavailable: {0}")]
    Store(String),
}

/// A completed analysis invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub result: AnalysisResult,
}

impl AnalysisSession {
    pub fn new(result: AnalysisResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            result,
        }
    }
}

/// Session persistence abstraction (allows mocking for tests).
pub trait SessionStore {
    fn save(&self, session: &AnalysisSession) -> Result<(), SessionError>;
    fn load(&self, id: Uuid) -> Result<AnalysisSession, SessionError>;
}

/// Mutex-guarded map store. Sessions live for the process lifetime.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<Uuid, AnalysisSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn save(&self, session: &AnalysisSession) -> Result<(), SessionError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| SessionError::Store(e.to_string()))?;
        sessions.insert(session.id, session.clone());
        Ok(())
    }

    fn load(&self, id: Uuid) -> Result<AnalysisSession, SessionError> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|e| SessionError::Store(e.to_string()))?;
        sessions.get(&id).cloned().ok_or(SessionError::NotFound(id))
    }
}
