//! RunContext - What an agent receives for one run
//!
//! The `RunContext` is the handler's side of a run. It provides methods to:
//! - Emit events (messages, artifacts, status updates)
//! - Suspend on an await request until the run is resumed
//! - Observe cancellation
//! - Read the run and session identity

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::core::{
    AcpError, AcpResult, Artifact, AwaitRequest, AwaitResume, Event, Message, RunId, SessionId,
    StatusUpdate,
};

use super::channels::{EventSender, ResumeReceiver};

/// Handler-side view of a run
///
/// Cheap to clone; clones share the same channels, so a handler may hand
/// copies to helper tasks.
#[derive(Clone)]
pub struct RunContext {
    run_id: RunId,
    session_id: Option<SessionId>,
    session_history: Arc<Vec<Message>>,
    event_tx: EventSender,
    resume_rx: Arc<Mutex<ResumeReceiver>>,
    cancel: CancellationToken,
}

impl RunContext {
    /// Create a new run context
    ///
    /// This is typically called by `RunBundle::start()`, not directly.
    pub fn new(
        run_id: RunId,
        session_id: Option<SessionId>,
        session_history: Vec<Message>,
        event_tx: EventSender,
        resume_rx: ResumeReceiver,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            run_id,
            session_id,
            session_history: Arc::new(session_history),
            event_tx,
            resume_rx: Arc::new(Mutex::new(resume_rx)),
            cancel,
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// Messages from earlier completed runs in the same session
    pub fn session_history(&self) -> &[Message] {
        &self.session_history
    }

    // =========================================================================
    // Output Methods
    // =========================================================================

    /// Emit an event
    ///
    /// Waits while the event channel is full. Fails with
    /// `AcpError::Cancelled` once cancellation has been requested, so
    /// handlers can unwind with `?`. Await events must go through
    /// [`await_resume`](Self::await_resume).
    pub async fn emit(&self, event: impl Into<Event>) -> AcpResult<()> {
        let event = event.into();
        if event.is_await() {
            return Err(AcpError::handler(
                "await events must be sent with await_resume",
            ));
        }
        self.send(event).await
    }

    /// Emit a message
    pub async fn message(&self, message: impl Into<Message>) -> AcpResult<()> {
        self.send(Event::Message(message.into())).await
    }

    /// Emit a plain text message
    pub async fn text(&self, text: impl Into<String>) -> AcpResult<()> {
        self.send(Event::text(text)).await
    }

    /// Emit an artifact
    pub async fn artifact(&self, artifact: Artifact) -> AcpResult<()> {
        self.send(Event::Artifact(artifact)).await
    }

    /// Emit a status update
    pub async fn status(&self, update: impl Into<StatusUpdate>) -> AcpResult<()> {
        self.send(Event::Status(update.into())).await
    }

    async fn send(&self, event: Event) -> AcpResult<()> {
        if self.cancel.is_cancelled() {
            return Err(AcpError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(AcpError::Cancelled),
            result = self.event_tx.send(event) => result.map_err(|_| AcpError::ChannelClosed),
        }
    }

    // =========================================================================
    // Await / Resume
    // =========================================================================

    /// Suspend until the run is resumed
    ///
    /// Emits the await request, which moves the run to `awaiting`, then
    /// blocks on the resume channel. Returns the resume payload exactly as
    /// the client supplied it, or `AcpError::Cancelled` if the run is
    /// cancelled while waiting.
    pub async fn await_resume(&self, request: AwaitRequest) -> AcpResult<AwaitResume> {
        self.send(Event::Await(request)).await?;

        let mut resume_rx = self.resume_rx.lock().await;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(AcpError::Cancelled),
            payload = resume_rx.recv() => payload.ok_or(AcpError::ChannelClosed),
        }
    }

    // =========================================================================
    // Cancellation
    // =========================================================================

    /// Check if cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once cancellation has been requested
    ///
    /// Handlers doing long work without emitting can `select!` on this.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("run_id", &self.run_id)
            .field("session_id", &self.session_id)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
