//! Session tracking
//!
//! A session groups the runs a client created under the same session id.
//! Sessions live in memory only; they hold run ids and inputs, while run
//! output stays with the run registry.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::core::{Message, RunId, RunStatus, SessionId};
use crate::runtime::RunRegistry;

/// One run as remembered by its session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRun {
    pub run_id: RunId,
    pub inputs: Vec<Message>,
}

/// A conversation spanning several runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,
    /// Runs in creation order
    pub runs: Vec<SessionRun>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(session_id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            runs: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn run_ids(&self) -> Vec<RunId> {
        self.runs.iter().map(|r| r.run_id).collect()
    }
}

/// In-memory store of sessions
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a run to a session, creating the session on first use
    pub async fn record_run(&self, session_id: &SessionId, run_id: RunId, inputs: Vec<Message>) {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(session_id.clone()).or_insert_with(|| {
            tracing::debug!(session_id = %session_id, "Session created");
            Session::new(session_id.clone())
        });
        session.runs.push(SessionRun { run_id, inputs });
        session.updated_at = Utc::now();
    }

    pub async fn get(&self, session_id: &SessionId) -> Option<Session> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned()
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Forget runs that are no longer in `retained`
    ///
    /// Sessions left without runs are removed. Returns the number of run
    /// entries dropped.
    pub async fn prune(&self, retained: &HashSet<RunId>) -> usize {
        let mut sessions = self.sessions.write().await;
        let mut dropped = 0;
        sessions.retain(|session_id, session| {
            let before = session.runs.len();
            session.runs.retain(|run| retained.contains(&run.run_id));
            dropped += before - session.runs.len();
            if session.runs.is_empty() {
                tracing::debug!(session_id = %session_id, "Session removed");
                false
            } else {
                true
            }
        });
        dropped
    }

    /// Conversation so far in a session
    ///
    /// For every completed run still retained by `runs`, its inputs
    /// followed by the messages it produced. Runs that failed, were
    /// cancelled, are still going, or have been evicted contribute nothing.
    pub async fn history(&self, session_id: &SessionId, runs: &RunRegistry) -> Vec<Message> {
        let Some(session) = self.get(session_id).await else {
            return Vec::new();
        };

        let mut history = Vec::new();
        for entry in session.runs {
            let Some(bundle) = runs.get(entry.run_id).await else {
                continue;
            };
            let run = bundle.snapshot();
            if run.status != RunStatus::Completed {
                continue;
            }
            history.extend(entry.inputs);
            history.extend(run.output_messages().cloned());
        }
        history
    }
}
