//! RunRegistry - Maps run identifiers to run bundles
//!
//! The registry is responsible for:
//! - Creating bundles with fresh identifiers and starting them
//! - Looking bundles up for read, resume and cancel
//! - Retaining finished runs so repeated reads stay consistent
//! - Optionally evicting the oldest finished runs beyond a cap, once a
//!   client has read their final state

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::agent::Agent;
use crate::core::{AcpError, AcpResult, Message, RunId, RunSnapshot, RunStatus, SessionId};

use super::bundle::{RunBundle, RunOptions};

/// Registry of all retained runs
///
/// Clones share the same underlying map.
#[derive(Clone)]
pub struct RunRegistry {
    runs: Arc<RwLock<HashMap<RunId, Arc<RunBundle>>>>,
    options: RunOptions,
    max_completed_runs: Option<usize>,
}

impl RunRegistry {
    /// Create a registry that never evicts runs
    pub fn new(options: RunOptions) -> Self {
        Self {
            runs: Arc::new(RwLock::new(HashMap::new())),
            options,
            max_completed_runs: None,
        }
    }

    /// Keep at most `max` finished runs; older ones are evicted on insertion
    ///
    /// Only runs whose terminal state a client has already been handed are
    /// evicted, so the cap may be exceeded while finished runs are unread.
    /// A cap of zero is rejected.
    pub fn with_max_completed_runs(mut self, max: usize) -> AcpResult<Self> {
        if max == 0 {
            return Err(AcpError::InvalidConfig(
                "max_completed_runs must be at least 1".into(),
            ));
        }
        self.max_completed_runs = Some(max);
        Ok(self)
    }

    /// Create, register and start a run for `agent`
    pub async fn create(
        &self,
        agent: Arc<dyn Agent>,
        inputs: Vec<Message>,
        session_id: Option<SessionId>,
    ) -> AcpResult<Arc<RunBundle>> {
        self.create_with_history(agent, inputs, session_id, Vec::new())
            .await
    }

    /// Like [`create`](Self::create), handing the agent prior session messages
    pub async fn create_with_history(
        &self,
        agent: Arc<dyn Agent>,
        inputs: Vec<Message>,
        session_id: Option<SessionId>,
        session_history: Vec<Message>,
    ) -> AcpResult<Arc<RunBundle>> {
        let bundle = RunBundle::new(agent, session_id, session_history, self.options);

        {
            let mut runs = self.runs.write().await;
            runs.insert(bundle.run_id(), bundle.clone());
            if let Some(max) = self.max_completed_runs {
                Self::evict_completed(&mut runs, max);
            }
        }

        tracing::info!(
            run_id = %bundle.run_id(),
            agent = %bundle.agent_name(),
            "Run created"
        );

        Self::launch(&bundle, inputs).await?;
        Ok(bundle)
    }

    /// Start a registered bundle
    ///
    /// A client may cancel the run between registration and start; the run
    /// then exists as `cancelled` and is returned as such.
    async fn launch(bundle: &Arc<RunBundle>, inputs: Vec<Message>) -> AcpResult<()> {
        match bundle.start(inputs).await {
            Ok(_) => Ok(()),
            Err(AcpError::InvalidState { status: RunStatus::Cancelled, .. }) => {
                tracing::debug!(run_id = %bundle.run_id(), "Run cancelled before start");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Ids of all retained runs
    pub async fn ids(&self) -> HashSet<RunId> {
        let runs = self.runs.read().await;
        runs.keys().copied().collect()
    }

    /// Whether finished runs may be evicted
    pub fn evicts(&self) -> bool {
        self.max_completed_runs.is_some()
    }

    /// Get a run bundle, failing with `RunNotFound`
    pub async fn find(&self, run_id: RunId) -> AcpResult<Arc<RunBundle>> {
        self.get(run_id).await.ok_or(AcpError::RunNotFound(run_id))
    }

    /// Get a run bundle if it is retained
    pub async fn get(&self, run_id: RunId) -> Option<Arc<RunBundle>> {
        let runs = self.runs.read().await;
        runs.get(&run_id).cloned()
    }

    /// Check if a run is retained
    pub async fn contains(&self, run_id: RunId) -> bool {
        let runs = self.runs.read().await;
        runs.contains_key(&run_id)
    }

    /// Get the number of retained runs
    pub async fn count(&self) -> usize {
        let runs = self.runs.read().await;
        runs.len()
    }

    /// Snapshots of all retained runs, oldest first
    pub async fn list(&self) -> Vec<RunSnapshot> {
        let mut snapshots: Vec<RunSnapshot> = {
            let runs = self.runs.read().await;
            runs.values().map(|b| b.snapshot()).collect()
        };
        snapshots.sort_by_key(|r| r.created_at);
        snapshots
    }

    fn evict_completed(runs: &mut HashMap<RunId, Arc<RunBundle>>, max: usize) {
        let mut finished: Vec<_> = runs
            .values()
            .filter_map(|b| b.finished_at().map(|at| (at, b.run_id(), b.is_observed())))
            .collect();

        if finished.len() <= max {
            return;
        }

        finished.sort();
        let excess = finished.len() - max;
        let evictable = finished.into_iter().filter(|(_, _, observed)| *observed);
        for (_, run_id, _) in evictable.take(excess) {
            runs.remove(&run_id);
            tracing::debug!(run_id = %run_id, "Evicted finished run");
        }
    }
}

impl Default for RunRegistry {
    fn default() -> Self {
        Self::new(RunOptions::default())
    }
}

impl std::fmt::Debug for RunRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunRegistry")
            .field("options", &self.options)
            .field("max_completed_runs", &self.max_completed_runs)
            .finish()
    }
}
