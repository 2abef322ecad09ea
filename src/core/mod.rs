//! Core types for run orchestration
//!
//! This module provides the value types shared by every other module:
//! - `Event` and its payloads - What handlers emit
//! - `Run` / `RunStatus` - The record of one invocation
//! - `AcpError` - Error types

pub mod error;
pub mod event;
pub mod run;

pub use error::{AcpError, AcpResult, ErrorModel};
pub use event::{
    Artifact, AwaitRequest, AwaitResume, ContentEncoding, Event, Message, MessagePart,
    MessageRole, StatusUpdate,
};
pub use run::{Run, RunId, RunSnapshot, RunStatus, SessionId};
