//! RunBundle - Owns one run and drives its agent to completion
//!
//! Each bundle runs two tokio tasks once started:
//! - the **handler task**, executing `Agent::run`
//! - the **driver task**, which records every event the handler emits onto
//!   the run, reacts to cancellation and finalizes the run status when the
//!   handler stops
//!
//! The run record lives in a watch channel; the driver is its only writer
//! apart from the client operations `resume` and `cancel`, which apply
//! their checked transitions atomically through the same channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::agent::Agent;
use crate::core::{
    AcpError, AcpResult, AwaitResume, ErrorModel, Event, Message, Run, RunId, RunSnapshot,
    RunStatus, SessionId,
};

use super::channels::{
    create_event_channel, create_resume_channel, create_state_channel, EventReceiver,
    EventSender, ResumeReceiver, ResumeSender, RunStateSender, EVENT_CHANNEL_SIZE,
};
use super::context::RunContext;
use super::reader::EventReader;

/// Default bound on cooperative cancellation before the handler is aborted
pub const DEFAULT_CANCEL_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Per-run tuning knobs
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// How long a cancelled handler may take to stop on its own
    pub cancel_grace_period: Duration,
    /// Capacity of the handler-to-driver event channel
    pub event_buffer: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            cancel_grace_period: DEFAULT_CANCEL_GRACE_PERIOD,
            event_buffer: EVENT_CHANNEL_SIZE,
        }
    }
}

/// Channel ends handed to the handler and driver on start
struct PendingStart {
    event_tx: EventSender,
    event_rx: EventReceiver,
    resume_rx: ResumeReceiver,
    session_history: Vec<Message>,
}

/// How the handler task ended
enum Outcome {
    Completed,
    Failed(String),
    Cancelled,
}

/// Owner of a single run
pub struct RunBundle {
    run_id: RunId,
    agent: Arc<dyn Agent>,
    state: RunStateSender,
    resume_tx: ResumeSender,
    cancel: CancellationToken,
    options: RunOptions,
    pending: Mutex<Option<PendingStart>>,
    /// Set once a client has been handed the terminal state
    observed: Arc<AtomicBool>,
}

impl RunBundle {
    /// Create a bundle for a new run in the `Created` state
    ///
    /// Nothing executes until [`start`](Self::start) is called.
    pub fn new(
        agent: Arc<dyn Agent>,
        session_id: Option<SessionId>,
        session_history: Vec<Message>,
        options: RunOptions,
    ) -> Arc<Self> {
        let run = Run::new(agent.name(), session_id);
        let run_id = run.run_id;
        let (event_tx, event_rx) = create_event_channel(options.event_buffer);
        let (resume_tx, resume_rx) = create_resume_channel();

        Arc::new(Self {
            run_id,
            agent,
            state: create_state_channel(run),
            resume_tx,
            cancel: CancellationToken::new(),
            options,
            pending: Mutex::new(Some(PendingStart {
                event_tx,
                event_rx,
                resume_rx,
                session_history,
            })),
            observed: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn agent_name(&self) -> &str {
        self.agent.name()
    }

    /// Current state of the run
    pub fn snapshot(&self) -> RunSnapshot {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> RunStatus {
        self.state.borrow().status
    }

    /// Snapshot for a client read; a terminal snapshot counts as observed
    pub fn observe(&self) -> RunSnapshot {
        let run = self.snapshot();
        self.mark_observed(&run);
        run
    }

    /// Whether a client has been handed the terminal state
    pub fn is_observed(&self) -> bool {
        self.observed.load(Ordering::Acquire)
    }

    /// When the run reached a terminal state, if it has
    pub(crate) fn finished_at(&self) -> Option<DateTime<Utc>> {
        let run = self.state.borrow();
        if run.status.is_terminal() {
            run.finished_at
        } else {
            None
        }
    }

    fn mark_observed(&self, run: &RunSnapshot) {
        if run.status.is_terminal() {
            self.observed.store(true, Ordering::Release);
        }
    }

    // =========================================================================
    // Lifecycle Operations
    // =========================================================================

    /// Schedule the handler and move the run to `in-progress`
    ///
    /// Returns immediately with the snapshot. A bundle can only be started
    /// once.
    pub async fn start(self: &Arc<Self>, inputs: Vec<Message>) -> AcpResult<RunSnapshot> {
        let mut pending = self.pending.lock().await;

        let mut snapshot = None;
        let started = self.state.send_if_modified(|run| {
            let changed =
                run.status == RunStatus::Created && run.transition(RunStatus::InProgress);
            snapshot = Some(run.clone());
            changed
        });
        let snapshot = snapshot.unwrap_or_else(|| self.snapshot());

        let parts = match pending.take() {
            Some(parts) if started => parts,
            _ => {
                return Err(AcpError::invalid_state(
                    self.run_id,
                    snapshot.status,
                    "start",
                ))
            }
        };
        drop(pending);

        let ctx = RunContext::new(
            self.run_id,
            snapshot.session_id.clone(),
            parts.session_history,
            parts.event_tx,
            parts.resume_rx,
            self.cancel.clone(),
        );

        let agent = self.agent.clone();
        let handler = tokio::spawn(async move { agent.run(inputs, ctx).await });
        tokio::spawn(self.clone().drive(handler, parts.event_rx));

        tracing::info!(run_id = %self.run_id, agent = %self.agent.name(), "Run started");
        Ok(snapshot)
    }

    /// Deliver a resume payload to a suspended handler
    ///
    /// Fails with `InvalidState` unless the run is `awaiting`. Returns the
    /// snapshot taken at the moment the run went back to `in-progress`,
    /// without waiting for the handler.
    pub async fn resume(&self, payload: AwaitResume) -> AcpResult<RunSnapshot> {
        let mut outcome = Err(RunStatus::Created);
        self.state.send_if_modified(|run| {
            if run.status == RunStatus::Awaiting && run.transition(RunStatus::InProgress) {
                run.await_request = None;
                outcome = Ok(run.clone());
                true
            } else {
                outcome = Err(run.status);
                false
            }
        });

        let snapshot = outcome
            .map_err(|status| AcpError::invalid_state(self.run_id, status, "resume"))?;

        self.resume_tx
            .send(payload)
            .await
            .map_err(|_| AcpError::ChannelClosed)?;

        tracing::info!(run_id = %self.run_id, agent = %self.agent.name(), "Run resumed");
        Ok(snapshot)
    }

    /// Wait until the run is terminal or awaiting
    pub async fn join(&self) -> RunSnapshot {
        let mut rx = self.state.subscribe();
        let result = rx
            .wait_for(|run| run.status.is_terminal() || run.status == RunStatus::Awaiting)
            .await
            .map(|run| run.clone());
        let run = match result {
            Ok(run) => run,
            Err(_) => self.snapshot(),
        };
        self.mark_observed(&run);
        run
    }

    /// Wait until the run is terminal
    pub async fn wait_terminal(&self) -> RunSnapshot {
        let mut rx = self.state.subscribe();
        let result = rx
            .wait_for(|run| run.status.is_terminal())
            .await
            .map(|run| run.clone());
        let run = match result {
            Ok(run) => run,
            Err(_) => self.snapshot(),
        };
        self.mark_observed(&run);
        run
    }

    /// Reader over the whole output, from the first event
    pub fn subscribe(&self) -> EventReader {
        self.subscribe_from(0)
    }

    /// Reader over the output starting at `position`
    pub fn subscribe_from(&self, position: usize) -> EventReader {
        EventReader::new(self.state.subscribe(), position).with_observed(self.observed.clone())
    }

    /// Request cancellation
    ///
    /// Fails with `InvalidState` if the run is already terminal. Otherwise
    /// the run moves to `cancelling` and the handler is signalled; calling
    /// this again before the run reaches `cancelled` returns the current
    /// snapshot. A run that was never started is cancelled immediately.
    pub async fn cancel(&self) -> AcpResult<RunSnapshot> {
        let mut outcome = Err(RunStatus::Created);
        let changed = self.state.send_if_modified(|run| {
            if run.status.is_terminal() {
                outcome = Err(run.status);
                return false;
            }
            let next = match run.status {
                RunStatus::Created => RunStatus::Cancelled,
                _ => RunStatus::Cancelling,
            };
            let changed = run.transition(next);
            outcome = Ok(run.clone());
            changed
        });

        let snapshot = outcome
            .map_err(|status| AcpError::invalid_state(self.run_id, status, "cancel"))?;

        if changed {
            tracing::info!(run_id = %self.run_id, agent = %self.agent.name(), "Run cancel requested");
            self.cancel.cancel();
        }
        Ok(snapshot)
    }

    // =========================================================================
    // Driver
    // =========================================================================

    async fn drive(
        self: Arc<Self>,
        mut handler: JoinHandle<anyhow::Result<()>>,
        mut events: EventReceiver,
    ) {
        let outcome = loop {
            tokio::select! {
                biased;
                Some(event) = events.recv() => self.record(event),
                _ = self.cancel.cancelled() => break self.teardown(&mut handler).await,
                result = &mut handler => break self.outcome(result),
            }
        };

        while let Ok(event) = events.try_recv() {
            self.record(event);
        }

        self.finalize(outcome);
    }

    /// Append an event to the output
    fn record(&self, event: Event) {
        tracing::debug!(run_id = %self.run_id, kind = event.kind(), "Event recorded");
        self.state.send_modify(|run| {
            if let Event::Await(request) = &event {
                if run.transition(RunStatus::Awaiting) {
                    run.await_request = Some(request.clone());
                    tracing::info!(run_id = %run.run_id, agent = %run.agent_name, "Run awaiting");
                }
            }
            run.output.push(event);
        });
    }

    /// Give a cancelled handler the grace period to stop, then abort it
    async fn teardown(&self, handler: &mut JoinHandle<anyhow::Result<()>>) -> Outcome {
        match tokio::time::timeout(self.options.cancel_grace_period, &mut *handler).await {
            Ok(_) => {
                tracing::debug!(run_id = %self.run_id, "Handler stopped after cancellation");
            }
            Err(_) => {
                tracing::warn!(
                    run_id = %self.run_id,
                    agent = %self.agent.name(),
                    grace_ms = self.options.cancel_grace_period.as_millis() as u64,
                    "Handler ignored cancellation, aborting"
                );
                handler.abort();
                let _ = handler.await;
            }
        }
        Outcome::Cancelled
    }

    fn outcome(&self, result: Result<anyhow::Result<()>, JoinError>) -> Outcome {
        match result {
            Ok(Ok(())) => Outcome::Completed,
            Ok(Err(e)) => {
                let cancelled = matches!(e.downcast_ref::<AcpError>(), Some(AcpError::Cancelled));
                if cancelled && self.cancel.is_cancelled() {
                    Outcome::Cancelled
                } else {
                    Outcome::Failed(e.to_string())
                }
            }
            Err(e) if e.is_panic() => Outcome::Failed(panic_message(e)),
            Err(_) => Outcome::Cancelled,
        }
    }

    fn finalize(&self, outcome: Outcome) {
        self.state.send_modify(|run| {
            let (status, error) = match outcome {
                _ if run.status == RunStatus::Cancelling => (RunStatus::Cancelled, None),
                Outcome::Completed => (RunStatus::Completed, None),
                Outcome::Failed(message) => {
                    (RunStatus::Failed, Some(ErrorModel::server_error(message)))
                }
                Outcome::Cancelled => (RunStatus::Cancelled, None),
            };

            if run.transition(status) {
                run.error = error;
            }

            match run.status {
                RunStatus::Failed => tracing::error!(
                    run_id = %run.run_id,
                    agent = %run.agent_name,
                    error = run.error.as_ref().map(|e| e.message.as_str()).unwrap_or_default(),
                    "Run failed"
                ),
                status => tracing::info!(
                    run_id = %run.run_id,
                    agent = %run.agent_name,
                    status = %status,
                    events = run.output.len(),
                    "Run finished"
                ),
            }
        });
    }
}

fn panic_message(err: JoinError) -> String {
    let payload = err.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("Handler panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("Handler panicked: {}", s)
    } else {
        "Handler panicked".to_string()
    }
}

impl std::fmt::Debug for RunBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunBundle")
            .field("run_id", &self.run_id)
            .field("agent", &self.agent.name())
            .field("status", &self.status())
            .finish()
    }
}
