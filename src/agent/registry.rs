//! Agent registry
//!
//! Holds every agent the server can run, keyed by name. Agents are
//! registered during startup; afterwards the registry is read-only and
//! shared behind an `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{AcpError, AcpResult};

use super::handle::{Agent, AgentInfo};

/// Registry of available agents, in registration order
#[derive(Default)]
pub struct AgentRegistry {
    agents: Vec<Arc<dyn Agent>>,
    index: HashMap<String, usize>,
}

impl AgentRegistry {
    /// Create a new empty agent registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent
    ///
    /// Fails if an agent with the same name is already registered.
    pub fn register<A: Agent + 'static>(&mut self, agent: A) -> AcpResult<()> {
        self.register_arc(Arc::new(agent))
    }

    /// Register an already shared agent
    pub fn register_arc(&mut self, agent: Arc<dyn Agent>) -> AcpResult<()> {
        let name = agent.name().to_string();
        if self.index.contains_key(&name) {
            return Err(AcpError::InvalidConfig(format!(
                "Agent name conflict: '{}' is already registered",
                name
            )));
        }

        tracing::info!("Registering agent: {}", name);
        self.index.insert(name, self.agents.len());
        self.agents.push(agent);
        Ok(())
    }

    /// Builder-style registration
    pub fn with_agent<A: Agent + 'static>(mut self, agent: A) -> AcpResult<Self> {
        self.register(agent)?;
        Ok(self)
    }

    /// Get an agent by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.index.get(name).map(|&i| self.agents[i].clone())
    }

    /// Get an agent by name, failing with `AgentNotFound`
    pub fn find(&self, name: &str) -> AcpResult<Arc<dyn Agent>> {
        self.get(name)
            .ok_or_else(|| AcpError::AgentNotFound(name.to_string()))
    }

    /// Describe all agents in registration order
    pub fn list(&self) -> Vec<AgentInfo> {
        self.agents.iter().map(|a| a.info()).collect()
    }

    /// Check if an agent exists
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.agents.iter().map(|a| a.name()).collect();
        f.debug_struct("AgentRegistry").field("agents", &names).finish()
    }
}
