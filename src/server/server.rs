//! AcpServer - Protocol-level operations over agents and runs
//!
//! The server ties the agent registry, run registry and session store
//! together behind the operations a transport exposes: agent discovery,
//! run creation in sync/async/stream mode, read, resume, cancel and listing.
//! It performs no I/O itself.

use std::sync::Arc;

use crate::agent::{AgentInfo, AgentRegistry};
use crate::core::{AcpError, AcpResult, RunId, RunSnapshot};
use crate::runtime::{RunBundle, RunRegistry};
use crate::session::SessionStore;
use crate::stream::{run_stream, Lifecycle};

use super::config::ServerConfig;
use super::models::{
    AgentsListResponse, RunCreateRequest, RunMode, RunResponse, RunResumeRequest,
};

/// Entry point for all client operations
///
/// Clones share the same agents, runs and sessions.
#[derive(Clone)]
pub struct AcpServer {
    agents: Arc<AgentRegistry>,
    runs: RunRegistry,
    sessions: SessionStore,
    config: ServerConfig,
}

impl AcpServer {
    /// Create a server over a fixed set of agents
    pub fn new(agents: AgentRegistry, config: ServerConfig) -> AcpResult<Self> {
        config.validate()?;

        let mut runs = RunRegistry::new(config.run_options());
        if let Some(max) = config.max_completed_runs {
            runs = runs.with_max_completed_runs(max)?;
        }

        tracing::info!(
            agents = agents.len(),
            grace_ms = config.cancel_grace_period.as_millis() as u64,
            event_buffer = config.event_buffer,
            "ACP server initialized"
        );

        Ok(Self {
            agents: Arc::new(agents),
            runs,
            sessions: SessionStore::new(),
            config,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    // =========================================================================
    // Agents
    // =========================================================================

    /// All agents in registration order
    pub fn list_agents(&self) -> AgentsListResponse {
        AgentsListResponse {
            agents: self.agents.list(),
        }
    }

    /// Describe one agent
    pub fn read_agent(&self, name: &str) -> AcpResult<AgentInfo> {
        self.agents.find(name).map(|agent| agent.info())
    }

    // =========================================================================
    // Runs
    // =========================================================================

    /// Start a run and respond according to the requested mode
    pub async fn create_run(&self, request: RunCreateRequest) -> AcpResult<RunResponse> {
        let agent = self.agents.find(&request.agent_name)?;

        let history = match &request.session_id {
            Some(session_id) => self.sessions.history(session_id, &self.runs).await,
            None => Vec::new(),
        };

        let bundle = self
            .runs
            .create_with_history(
                agent,
                request.inputs.clone(),
                request.session_id.clone(),
                history,
            )
            .await?;

        if let Some(session_id) = &request.session_id {
            self.sessions
                .record_run(session_id, bundle.run_id(), request.inputs)
                .await;
        }
        if self.runs.evicts() {
            let dropped = self.sessions.prune(&self.runs.ids().await).await;
            if dropped > 0 {
                tracing::debug!(dropped, "Pruned evicted runs from sessions");
            }
        }

        tracing::debug!(run_id = %bundle.run_id(), mode = %request.mode, "Create run");

        Ok(match request.mode {
            RunMode::Async => RunResponse::Accepted(bundle.snapshot()),
            RunMode::Sync => RunResponse::Snapshot(bundle.join().await),
            RunMode::Stream => RunResponse::Stream(run_stream(
                Lifecycle::Created,
                bundle.snapshot(),
                bundle.subscribe(),
            )),
        })
    }

    /// Current snapshot of a run
    ///
    /// Reading a terminal run makes it eligible for eviction.
    pub async fn read_run(&self, run_id: RunId) -> AcpResult<RunSnapshot> {
        Ok(self.runs.find(run_id).await?.observe())
    }

    /// Resume an awaiting run
    ///
    /// A streaming resume attaches to the live run from the point of the
    /// resume instead of replaying earlier output.
    pub async fn resume_run(
        &self,
        run_id: RunId,
        request: RunResumeRequest,
    ) -> AcpResult<RunResponse> {
        let bundle = self.runs.find(run_id).await?;
        let snapshot = bundle.resume(request.await_resume).await?;

        tracing::debug!(run_id = %run_id, mode = %request.mode, "Resume run");

        Ok(match request.mode {
            RunMode::Async => RunResponse::Accepted(snapshot),
            RunMode::Sync => RunResponse::Snapshot(bundle.join().await),
            RunMode::Stream => {
                let reader = bundle.subscribe_from(snapshot.output.len());
                RunResponse::Stream(run_stream(Lifecycle::InProgress, snapshot, reader))
            }
        })
    }

    /// Request cancellation of a run
    ///
    /// Fails with `Forbidden` if the run is already terminal.
    pub async fn cancel_run(&self, run_id: RunId) -> AcpResult<RunSnapshot> {
        let bundle = self.runs.find(run_id).await?;
        bundle.cancel().await.map_err(|e| match e {
            AcpError::InvalidState { status, .. } => AcpError::Forbidden(format!(
                "Run with terminal status {} can't be cancelled",
                status
            )),
            other => other,
        })
    }

    /// Snapshots of all retained runs, oldest first
    pub async fn list_runs(&self) -> Vec<RunSnapshot> {
        self.runs.list().await
    }

    /// The bundle behind a run, for callers that need `join` or a reader
    pub async fn run_bundle(&self, run_id: RunId) -> AcpResult<Arc<RunBundle>> {
        self.runs.find(run_id).await
    }
}

impl std::fmt::Debug for AcpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcpServer")
            .field("agents", &self.agents)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::FnAgent;
    use crate::core::{
        Artifact, AwaitRequest, AwaitResume, ContentEncoding, Event, Message, MessagePart,
        RunStatus, SessionId,
    };
    use crate::stream::{parse_sse, StreamFrame};
    use futures::StreamExt;
    use serde_json::json;
    use std::time::Duration;

    const LIMIT: Duration = Duration::from_secs(5);

    fn test_server() -> AcpServer {
        let mut agents = AgentRegistry::new();

        agents
            .register(FnAgent::new("echo", "Echoes everything", |inputs, ctx| async move {
                for message in inputs {
                    ctx.message(Message::new(message.parts)).await?;
                }
                Ok(())
            }))
            .unwrap();

        agents
            .register(FnAgent::new("awaiter", "Greets and awaits for more data", |_inputs, ctx| async move {
                let resume = ctx
                    .await_resume(AwaitRequest::message(Message::text("Give me more")))
                    .await?;
                let text = resume
                    .message
                    .map(|m| m.text_content())
                    .or_else(|| resume.data.and_then(|d| d.as_str().map(str::to_string)))
                    .unwrap_or_else(|| "empty".to_string());
                ctx.text(text).await?;
                Ok(())
            }))
            .unwrap();

        agents
            .register(FnAgent::new("failer", "Fails", |_inputs, _ctx| async move {
                anyhow::bail!("Whoops")
            }))
            .unwrap();

        agents
            .register(FnAgent::new("sessioner", "Reports its session", |_inputs, ctx| async move {
                let session = ctx
                    .session_id()
                    .map(|s| s.to_string())
                    .ok_or_else(|| anyhow::anyhow!("no session"))?;
                ctx.text(session).await?;
                ctx.text(ctx.session_history().len().to_string()).await?;
                Ok(())
            }))
            .unwrap();

        agents
            .register(FnAgent::new("mime_types", "Mixed content types", |_inputs, ctx| async move {
                ctx.message(Message::new(vec![
                    MessagePart::new("<h1>HTML Content</h1>", "text/html"),
                    MessagePart::new(r#"{"key": "value"}"#, "application/json"),
                    MessagePart::new("console.log('Hello');", "application/javascript"),
                    MessagePart::new("body { color: red; }", "text/css"),
                ]))
                .await?;
                Ok(())
            }))
            .unwrap();

        agents
            .register(FnAgent::new("base64_encoding", "Binary content", |_inputs, ctx| async move {
                ctx.message(Message::new(vec![
                    MessagePart::base64(b"\x89PNG\r\n\x1a\n", "image/png"),
                    MessagePart::text("This is plain text"),
                ]))
                .await?;
                Ok(())
            }))
            .unwrap();

        agents
            .register(FnAgent::new("artifact_producer", "Produces artifacts", |_inputs, ctx| async move {
                ctx.text("Processing with artifacts").await?;
                ctx.artifact(Artifact::new("text-result.txt", "This is a text artifact result", "text/plain"))
                    .await?;
                ctx.artifact(Artifact::new("data.json", r#"{"results": [1, 2, 3]}"#, "application/json"))
                    .await?;
                ctx.artifact(Artifact::base64("image.png", b"\x89PNG\r\n\x1a\n", "image/png"))
                    .await?;
                Ok(())
            }))
            .unwrap();

        agents
            .register(FnAgent::new("slow", "Works until cancelled", |_inputs, ctx| async move {
                ctx.status("working").await?;
                ctx.cancelled().await;
                Ok(())
            }))
            .unwrap();

        AcpServer::new(agents, ServerConfig::default()).unwrap()
    }

    async fn sync_run(server: &AcpServer, request: RunCreateRequest) -> RunSnapshot {
        tokio::time::timeout(LIMIT, server.create_run(request))
            .await
            .unwrap()
            .unwrap()
            .into_snapshot()
            .unwrap()
    }

    async fn collect_frames(response: RunResponse) -> Vec<StreamFrame> {
        let frames = response.into_stream().unwrap();
        tokio::time::timeout(LIMIT, frames.collect()).await.unwrap()
    }

    #[tokio::test]
    async fn test_list_and_read_agents() {
        let server = test_server();
        let names: Vec<String> = server.list_agents().agents.into_iter().map(|a| a.name).collect();
        assert_eq!(names[..3], ["echo", "awaiter", "failer"]);

        let info = server.read_agent("awaiter").unwrap();
        assert_eq!(info.description, "Greets and awaits for more data");

        let err = server.read_agent("nobody").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Agent nobody not found");
    }

    #[tokio::test]
    async fn test_sync_run() {
        let server = test_server();
        let run = sync_run(
            &server,
            RunCreateRequest::new("echo", vec![Message::user_text("Howdy!")]),
        )
        .await;

        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.agent_name, "echo");
        assert_eq!(run.output, vec![Event::text("Howdy!")]);
    }

    #[tokio::test]
    async fn test_async_run_then_poll() {
        let server = test_server();
        let response = server
            .create_run(
                RunCreateRequest::new("echo", vec![Message::user_text("Howdy!")])
                    .with_mode(RunMode::Async),
            )
            .await
            .unwrap();
        assert_eq!(response.status_code(), 202);
        let accepted = response.into_snapshot().unwrap();
        assert!(!accepted.status.is_terminal());

        let bundle = server.run_bundle(accepted.run_id).await.unwrap();
        tokio::time::timeout(LIMIT, bundle.wait_terminal()).await.unwrap();

        let run = server.read_run(accepted.run_id).await.unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.output.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_agent_and_run() {
        let server = test_server();
        let err = server
            .create_run(RunCreateRequest::new("nobody", Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, AcpError::AgentNotFound(_)));
        assert!(server.list_runs().await.is_empty());

        let missing = RunId::new();
        assert!(server.read_run(missing).await.unwrap_err().is_not_found());
        assert!(server.cancel_run(missing).await.unwrap_err().is_not_found());
        assert!(server
            .resume_run(missing, RunResumeRequest::new(AwaitResume::default()))
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_failed_run_cannot_be_cancelled() {
        let server = test_server();
        let run = sync_run(&server, RunCreateRequest::new("failer", Vec::new())).await;

        assert_eq!(run.status, RunStatus::Failed);
        assert!(run.output.is_empty());
        assert_eq!(run.error.as_ref().unwrap().message, "Whoops");

        let err = server.cancel_run(run.run_id).await.unwrap_err();
        assert_eq!(err.code(), "forbidden");
        assert_eq!(
            err.to_string(),
            "Run with terminal status failed can't be cancelled"
        );

        // Terminal state is stable across reads
        assert_eq!(server.read_run(run.run_id).await.unwrap(), run);
    }

    #[tokio::test]
    async fn test_sync_await_then_sync_resume() {
        let server = test_server();
        let run = sync_run(&server, RunCreateRequest::new("awaiter", Vec::new())).await;

        assert_eq!(run.status, RunStatus::Awaiting);
        let request = run.await_request.as_ref().unwrap();
        assert_eq!(request.message.as_ref().unwrap().text_content(), "Give me more");

        let response = tokio::time::timeout(
            LIMIT,
            server.resume_run(
                run.run_id,
                RunResumeRequest::new(AwaitResume::message(Message::user_text("Thanks"))),
            ),
        )
        .await
        .unwrap()
        .unwrap();
        let run = response.into_snapshot().unwrap();

        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.output.len(), 2);
        assert!(run.output[0].is_await());
        assert_eq!(run.output[1], Event::text("Thanks"));

        let err = server
            .resume_run(run.run_id, RunResumeRequest::new(AwaitResume::default()))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }

    #[tokio::test]
    async fn test_stream_create_and_resume() {
        let server = test_server();
        let response = server
            .create_run(RunCreateRequest::new("awaiter", Vec::new()).with_mode(RunMode::Stream))
            .await
            .unwrap();
        let frames = collect_frames(response).await;

        let tags: Vec<&str> = frames.iter().map(|f| f.tag()).collect();
        assert_eq!(tags, vec!["run.created", "await", "run.awaiting"]);
        let run_id = frames[0].run().unwrap().run_id;

        let response = server
            .resume_run(
                run_id,
                RunResumeRequest::new(AwaitResume::data(json!("ok"))).with_mode(RunMode::Stream),
            )
            .await
            .unwrap();
        let frames = collect_frames(response).await;

        // Resumed stream starts at the resume point, not from scratch
        let tags: Vec<&str> = frames.iter().map(|f| f.tag()).collect();
        assert_eq!(tags, vec!["run.in-progress", "message", "run.completed"]);
        assert_eq!(frames[1].seq(), Some(1));
        assert_eq!(frames[1].event(), Some(&Event::text("ok")));

        let final_run = frames[2].run().unwrap();
        assert_eq!(final_run.status, RunStatus::Completed);
        assert_eq!(final_run.output.len(), 2);
    }

    #[tokio::test]
    async fn test_stream_as_sse() {
        let server = test_server();
        let response = server
            .create_run(
                RunCreateRequest::new("echo", vec![Message::user_text("Howdy!")])
                    .with_mode(RunMode::Stream),
            )
            .await
            .unwrap();

        let body: String = tokio::time::timeout(
            LIMIT,
            response.into_sse().unwrap().collect::<Vec<_>>(),
        )
        .await
        .unwrap()
        .concat();

        let records = parse_sse(&body);
        let events: Vec<&str> = records.iter().map(|r| r.event.as_str()).collect();
        assert_eq!(events, vec!["run.created", "message", "run.completed"]);
        assert_eq!(records[1].id.as_deref(), Some("0"));

        let event: Event = serde_json::from_str(&records[1].data).unwrap();
        assert_eq!(event, Event::text("Howdy!"));
    }

    #[tokio::test]
    async fn test_failed_stream_surfaces_error() {
        let server = test_server();
        let response = server
            .create_run(RunCreateRequest::new("failer", Vec::new()).with_mode(RunMode::Stream))
            .await
            .unwrap();
        let frames = collect_frames(response).await;

        let last = frames.last().unwrap();
        assert_eq!(last.tag(), "run.failed");
        assert_eq!(last.run().unwrap().error.as_ref().unwrap().code, "server_error");
    }

    #[tokio::test]
    async fn test_cancel_run() {
        let server = test_server();
        let accepted = server
            .create_run(RunCreateRequest::new("slow", Vec::new()).with_mode(RunMode::Async))
            .await
            .unwrap()
            .into_snapshot()
            .unwrap();

        let bundle = server.run_bundle(accepted.run_id).await.unwrap();
        let mut reader = bundle.subscribe();
        tokio::time::timeout(LIMIT, reader.next()).await.unwrap();

        let cancelling = server.cancel_run(accepted.run_id).await.unwrap();
        assert_eq!(cancelling.status, RunStatus::Cancelling);

        let run = tokio::time::timeout(LIMIT, bundle.join()).await.unwrap();
        assert_eq!(run.status, RunStatus::Cancelled);
        assert_eq!(run.output, vec![Event::status("working")]);

        let err = server.cancel_run(accepted.run_id).await.unwrap_err();
        assert!(matches!(err, AcpError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_session_continuity() {
        let server = test_server();

        let first = sync_run(
            &server,
            RunCreateRequest::new("sessioner", vec![Message::user_text("one")])
                .with_session("conversation-1"),
        )
        .await;
        assert_eq!(
            first.output,
            vec![Event::text("conversation-1"), Event::text("0")]
        );

        // Second run sees the first run's input plus its two output messages
        let second = sync_run(
            &server,
            RunCreateRequest::new("sessioner", vec![Message::user_text("two")])
                .with_session("conversation-1"),
        )
        .await;
        assert_eq!(second.output[1], Event::text("3"));

        let session = server
            .sessions()
            .get(&"conversation-1".into())
            .await
            .unwrap();
        assert_eq!(session.run_ids(), vec![first.run_id, second.run_id]);

        // Without a session the handler fails
        let run = sync_run(&server, RunCreateRequest::new("sessioner", Vec::new())).await;
        assert_eq!(run.status, RunStatus::Failed);
    }

    #[tokio::test]
    async fn test_content_types_and_encoding() {
        let server = test_server();

        let run = sync_run(&server, RunCreateRequest::new("mime_types", Vec::new())).await;
        let message = run.output[0].as_message().unwrap();
        let types: Vec<&str> = message.parts.iter().map(|p| p.content_type.as_str()).collect();
        assert_eq!(
            types,
            vec!["text/html", "application/json", "application/javascript", "text/css"]
        );

        let run = sync_run(&server, RunCreateRequest::new("base64_encoding", Vec::new())).await;
        let message = run.output[0].as_message().unwrap();
        assert_eq!(message.parts[0].content_encoding, ContentEncoding::Base64);
        assert_eq!(message.parts[0].decoded_bytes().unwrap(), b"\x89PNG\r\n\x1a\n");
        assert_eq!(message.parts[1].content_encoding, ContentEncoding::Plain);
    }

    #[tokio::test]
    async fn test_artifacts() {
        let server = test_server();
        let run = sync_run(&server, RunCreateRequest::new("artifact_producer", Vec::new())).await;

        assert_eq!(run.status, RunStatus::Completed);
        let artifacts: Vec<&Artifact> = run
            .output
            .iter()
            .filter_map(|e| match e {
                Event::Artifact(a) => Some(a),
                _ => None,
            })
            .collect();
        let names: Vec<&str> = artifacts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["text-result.txt", "data.json", "image.png"]);
        assert_eq!(artifacts[2].decoded_bytes().unwrap(), b"\x89PNG\r\n\x1a\n");
        assert_eq!(run.output_messages().count(), 1);
    }

    #[tokio::test]
    async fn test_list_runs() {
        let server = test_server();
        let a = sync_run(&server, RunCreateRequest::new("echo", Vec::new())).await;
        let b = sync_run(&server, RunCreateRequest::new("failer", Vec::new())).await;

        let runs = server.list_runs().await;
        let ids: Vec<RunId> = runs.iter().map(|r| r.run_id).collect();
        assert_eq!(ids, vec![a.run_id, b.run_id]);
    }

    #[tokio::test]
    async fn test_eviction_through_config() {
        let mut agents = AgentRegistry::new();
        agents
            .register(FnAgent::new("noop", "Does nothing", |_inputs, _ctx| async move { Ok(()) }))
            .unwrap();
        let server = AcpServer::new(agents, ServerConfig::new().with_max_completed_runs(1)).unwrap();

        let first = sync_run(&server, RunCreateRequest::new("noop", Vec::new())).await;
        let second = sync_run(&server, RunCreateRequest::new("noop", Vec::new())).await;
        let third = sync_run(&server, RunCreateRequest::new("noop", Vec::new())).await;

        // Third insertion saw two finished runs and evicted the oldest
        assert!(server.read_run(first.run_id).await.is_err());
        assert!(server.read_run(second.run_id).await.is_ok());
        assert!(server.read_run(third.run_id).await.is_ok());
    }

    fn capped_server(max: usize) -> AcpServer {
        let mut agents = AgentRegistry::new();
        agents
            .register(FnAgent::new("noop", "Does nothing", |_inputs, _ctx| async move { Ok(()) }))
            .unwrap();
        AcpServer::new(agents, ServerConfig::new().with_max_completed_runs(max)).unwrap()
    }

    async fn settle(server: &AcpServer, run_id: RunId) {
        let bundle = server.run_bundle(run_id).await.unwrap();
        tokio::time::timeout(LIMIT, async {
            while !bundle.status().is_terminal() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    async fn async_run(server: &AcpServer, request: RunCreateRequest) -> RunId {
        let run = server
            .create_run(request.with_mode(RunMode::Async))
            .await
            .unwrap()
            .into_snapshot()
            .unwrap();
        settle(server, run.run_id).await;
        run.run_id
    }

    #[tokio::test]
    async fn test_unpolled_async_runs_stay_readable() {
        let server = capped_server(1);
        let a = async_run(&server, RunCreateRequest::new("noop", Vec::new())).await;
        let b = async_run(&server, RunCreateRequest::new("noop", Vec::new())).await;
        let c = async_run(&server, RunCreateRequest::new("noop", Vec::new())).await;

        // Nobody polled a or b, so both outlive later insertions
        for run_id in [a, b, c] {
            let run = server.read_run(run_id).await.unwrap();
            assert_eq!(run.status, RunStatus::Completed);
        }

        // All three have been read now; the next insertion trims to the cap
        let d = async_run(&server, RunCreateRequest::new("noop", Vec::new())).await;
        assert!(server.read_run(a).await.unwrap_err().is_not_found());
        assert!(server.read_run(b).await.unwrap_err().is_not_found());
        assert!(server.read_run(c).await.is_ok());
        assert!(server.read_run(d).await.is_ok());
    }

    #[tokio::test]
    async fn test_sessions_forget_evicted_runs() {
        let server = capped_server(1);
        let session = SessionId::from("pruned");
        let mut ids = Vec::new();
        for _ in 0..3 {
            let run = sync_run(&server, RunCreateRequest::new("noop", Vec::new()).with_session("pruned")).await;
            ids.push(run.run_id);
        }

        // The third insertion evicted the first run, which had been read
        let stored = server.sessions().get(&session).await.unwrap();
        assert_eq!(stored.run_ids(), ids[1..].to_vec());
        assert_eq!(server.list_runs().await.len(), 2);
    }

    #[tokio::test]
    async fn test_slow_stream_closes_at_await_after_resume() {
        let server = test_server();
        let create_stream = server
            .create_run(RunCreateRequest::new("awaiter", Vec::new()).with_mode(RunMode::Stream))
            .await
            .unwrap();
        let run_id = server.list_runs().await[0].run_id;
        let bundle = server.run_bundle(run_id).await.unwrap();

        // Another client resumes before the first stream is read at all
        let run = tokio::time::timeout(LIMIT, bundle.join()).await.unwrap();
        assert_eq!(run.status, RunStatus::Awaiting);
        let resume_stream = server
            .resume_run(
                run_id,
                RunResumeRequest::new(AwaitResume::data(json!("later"))).with_mode(RunMode::Stream),
            )
            .await
            .unwrap();

        let resumed = collect_frames(resume_stream).await;
        let tags: Vec<&str> = resumed.iter().map(|f| f.tag()).collect();
        assert_eq!(tags, vec!["run.in-progress", "message", "run.completed"]);

        // The original stream stops at its await; the rest belongs to the resume
        let created = collect_frames(create_stream).await;
        let tags: Vec<&str> = created.iter().map(|f| f.tag()).collect();
        assert_eq!(tags, vec!["run.created", "await", "run.awaiting"]);
        assert_eq!(created[1].seq(), Some(0));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let result = AcpServer::new(AgentRegistry::new(), ServerConfig::new().with_event_buffer(0));
        assert!(matches!(result, Err(AcpError::InvalidConfig(_))));
    }
}
