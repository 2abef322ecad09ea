//! Agents and the agent registry
//!
//! - `Agent` - Trait implemented by every runnable agent
//! - `FnAgent` - Adapter turning an async closure into an agent
//! - `AgentRegistry` - Name-keyed, registration-ordered set of agents

pub mod handle;
pub mod registry;

pub use handle::{Agent, AgentInfo, FnAgent};
pub use registry::AgentRegistry;
