//! Run execution and coordination
//!
//! This module provides the infrastructure for running agents:
//! - `RunRegistry` - Creates run bundles and keeps them addressable by id
//! - `RunBundle` - Owns one run and drives its agent on a tokio task
//! - `RunContext` - Handed to the agent to emit events and await resumes
//! - `EventReader` - Ordered, live cursor over a run's output
//! - Channel types for handler/driver/client communication
//!
//! Handlers run as separate tokio tasks and communicate via channels. Client
//! operations never wait on the handler, except `join` which exists to wait.

pub mod bundle;
pub mod channels;
pub mod context;
pub mod reader;
pub mod registry;

pub use bundle::{RunBundle, RunOptions, DEFAULT_CANCEL_GRACE_PERIOD};
pub use channels::{EventReceiver, EventSender, ResumeReceiver, ResumeSender, EVENT_CHANNEL_SIZE};
pub use context::RunContext;
pub use reader::EventReader;
pub use registry::RunRegistry;
