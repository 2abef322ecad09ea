//! Request and response models

use std::fmt;

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::agent::AgentInfo;
use crate::core::{AwaitResume, Message, RunSnapshot, SessionId};
use crate::stream::{sse_stream, FrameStream};

/// How the caller wants to consume a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Block until the run is terminal or awaiting
    #[default]
    Sync,
    /// Return immediately; the caller polls
    Async,
    /// Stream events as they are produced
    Stream,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunMode::Sync => "sync",
            RunMode::Async => "async",
            RunMode::Stream => "stream",
        })
    }
}

/// Request to start a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunCreateRequest {
    pub agent_name: String,
    #[serde(default, alias = "input")]
    pub inputs: Vec<Message>,
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub mode: RunMode,
}

impl RunCreateRequest {
    pub fn new(agent_name: impl Into<String>, inputs: Vec<Message>) -> Self {
        Self {
            agent_name: agent_name.into(),
            inputs,
            session_id: None,
            mode: RunMode::default(),
        }
    }

    pub fn with_session(mut self, session_id: impl Into<SessionId>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Request to resume an awaiting run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResumeRequest {
    #[serde(rename = "await")]
    pub await_resume: AwaitResume,
    #[serde(default)]
    pub mode: RunMode,
}

impl RunResumeRequest {
    pub fn new(await_resume: AwaitResume) -> Self {
        Self {
            await_resume,
            mode: RunMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Agent listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentsListResponse {
    pub agents: Vec<AgentInfo>,
}

/// Result of creating or resuming a run, shaped by the requested mode
pub enum RunResponse {
    /// Async mode: the run was accepted and is executing
    Accepted(RunSnapshot),
    /// Sync mode: the run is terminal or awaiting
    Snapshot(RunSnapshot),
    /// Stream mode: frames until the run is terminal or awaiting
    Stream(FrameStream),
}

impl RunResponse {
    /// HTTP status a transport should use
    pub fn status_code(&self) -> u16 {
        match self {
            RunResponse::Accepted(_) => 202,
            RunResponse::Snapshot(_) | RunResponse::Stream(_) => 200,
        }
    }

    /// The snapshot for non-streaming responses
    pub fn snapshot(&self) -> Option<&RunSnapshot> {
        match self {
            RunResponse::Accepted(run) | RunResponse::Snapshot(run) => Some(run),
            RunResponse::Stream(_) => None,
        }
    }

    pub fn into_snapshot(self) -> Option<RunSnapshot> {
        match self {
            RunResponse::Accepted(run) | RunResponse::Snapshot(run) => Some(run),
            RunResponse::Stream(_) => None,
        }
    }

    pub fn into_stream(self) -> Option<FrameStream> {
        match self {
            RunResponse::Stream(frames) => Some(frames),
            _ => None,
        }
    }

    /// The frame stream encoded as server-sent events
    pub fn into_sse(self) -> Option<BoxStream<'static, String>> {
        self.into_stream().map(sse_stream)
    }
}

impl fmt::Debug for RunResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunResponse::Accepted(run) => f.debug_tuple("Accepted").field(run).finish(),
            RunResponse::Snapshot(run) => f.debug_tuple("Snapshot").field(run).finish(),
            RunResponse::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}
