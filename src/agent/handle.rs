//! Agent trait definition
//!
//! Every agent the server can run implements [`Agent`]. An agent is
//! registered once at startup and shared by all of its runs.

use std::future::Future;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::Message;
use crate::runtime::RunContext;

/// Public description of a registered agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub name: String,
    pub description: String,
}

/// A named, runnable agent
///
/// `run` receives the run's input messages and a [`RunContext`] through
/// which it emits events and suspends on await requests. Returning `Ok`
/// completes the run; returning an error fails it.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Unique name of this agent
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// Execute one run
    async fn run(&self, inputs: Vec<Message>, ctx: RunContext) -> anyhow::Result<()>;

    /// Get the public description of this agent
    fn info(&self) -> AgentInfo {
        AgentInfo {
            name: self.name().to_string(),
            description: self.description().to_string(),
        }
    }
}

/// Agent backed by an async closure
///
/// ```ignore
/// let echo = FnAgent::new("echo", "Echoes its input", |inputs, ctx| async move {
///     for message in inputs {
///         ctx.message(message).await?;
///     }
///     Ok(())
/// });
/// ```
pub struct FnAgent<F> {
    name: String,
    description: String,
    handler: F,
}

impl<F, Fut> FnAgent<F>
where
    F: Fn(Vec<Message>, RunContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    pub fn new(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            handler,
        }
    }
}

#[async_trait]
impl<F, Fut> Agent for FnAgent<F>
where
    F: Fn(Vec<Message>, RunContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn run(&self, inputs: Vec<Message>, ctx: RunContext) -> anyhow::Result<()> {
        (self.handler)(inputs, ctx).await
    }
}

impl<F> std::fmt::Debug for FnAgent<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnAgent")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}
