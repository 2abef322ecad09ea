//! Run orchestration core for an Agent Communication Protocol server
//!
//! Agents are registered once and invoked as runs. Each run executes on its
//! own task, records an append-only event output, can suspend awaiting client
//! input, and can be cancelled. Runs are consumed synchronously, by polling,
//! or as a live event stream.

pub mod core;
pub mod runtime;
pub mod session;

// Agent trait and registry
pub mod agent;

// Streaming adapter (frames and SSE)
pub mod stream;

// Protocol facade
pub mod server;

// Optional components
pub mod logging;

pub use crate::agent::{Agent, AgentInfo, AgentRegistry, FnAgent};
pub use crate::core::{
    AcpError, AcpResult, Artifact, AwaitRequest, AwaitResume, ErrorModel, Event, Message,
    MessagePart, Run, RunId, RunSnapshot, RunStatus, SessionId,
};
pub use crate::runtime::{RunBundle, RunContext, RunOptions, RunRegistry};
pub use crate::server::{AcpServer, RunCreateRequest, RunMode, RunResponse, RunResumeRequest, ServerConfig};
