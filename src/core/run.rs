//! Run record, identifiers and status

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ErrorModel;
use super::event::{AwaitRequest, Event, Message};

/// Unique identifier for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// Generate a fresh run identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for RunId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Identifier grouping runs into a conversation
///
/// Session ids are chosen by clients, so any string is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random session identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Lifecycle status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunStatus {
    /// Run is registered but the handler has not been scheduled
    Created,
    /// Handler is executing
    InProgress,
    /// Handler is suspended on an await request
    Awaiting,
    /// Cancellation requested, waiting for the handler to stop
    Cancelling,
    /// Handler stopped after cancellation
    Cancelled,
    /// Handler finished normally
    Completed,
    /// Handler raised an error
    Failed,
}

impl RunStatus {
    /// Check if the status can never change again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Cancelled | RunStatus::Completed | RunStatus::Failed
        )
    }

    /// Wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Created => "created",
            RunStatus::InProgress => "in-progress",
            RunStatus::Awaiting => "awaiting",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    /// Ordering rank used to keep transitions monotonic
    ///
    /// `InProgress` and `Awaiting` share a rank since a run may move between
    /// them any number of times.
    fn rank(&self) -> u8 {
        match self {
            RunStatus::Created => 0,
            RunStatus::InProgress | RunStatus::Awaiting => 1,
            RunStatus::Cancelling => 2,
            RunStatus::Cancelled | RunStatus::Completed | RunStatus::Failed => 3,
        }
    }

    /// Check if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (RunStatus::Cancelling, RunStatus::Cancelled) => true,
            (RunStatus::Cancelling, _) => false,
            (RunStatus::InProgress, RunStatus::Awaiting)
            | (RunStatus::Awaiting, RunStatus::InProgress) => true,
            _ => next.rank() > self.rank(),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of one agent invocation
///
/// Only the owning run bundle mutates a `Run`; everyone else observes
/// clones of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub run_id: RunId,
    pub agent_name: String,
    pub session_id: Option<SessionId>,
    pub status: RunStatus,
    #[serde(default)]
    pub output: Vec<Event>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub await_request: Option<AwaitRequest>,
    pub error: Option<ErrorModel>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Point-in-time copy of a run as handed to clients
pub type RunSnapshot = Run;

impl Run {
    /// Create a new run in the `Created` state
    pub fn new(agent_name: impl Into<String>, session_id: Option<SessionId>) -> Self {
        Self {
            run_id: RunId::new(),
            agent_name: agent_name.into(),
            session_id,
            status: RunStatus::Created,
            output: Vec::new(),
            await_request: None,
            error: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Apply a status transition, returning `false` if it is not allowed
    pub fn transition(&mut self, next: RunStatus) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
            self.await_request = None;
        }
        true
    }

    /// Messages in the output, in emission order
    pub fn output_messages(&self) -> impl Iterator<Item = &Message> {
        self.output.iter().filter_map(Event::as_message)
    }
}
