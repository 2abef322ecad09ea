use acp_run_core::core::{AwaitRequest, AwaitResume, Message};
use acp_run_core::logging;
use acp_run_core::server::{AcpServer, RunCreateRequest, RunMode, RunResumeRequest, ServerConfig};
use acp_run_core::{AgentRegistry, FnAgent};
use futures::StreamExt;

fn build_agents() -> anyhow::Result<AgentRegistry> {
    let mut agents = AgentRegistry::new();

    agents.register(FnAgent::new("echo", "Echoes everything", |inputs, ctx| async move {
        for message in inputs {
            ctx.text(message.text_content()).await?;
        }
        Ok(())
    }))?;

    agents.register(FnAgent::new(
        "awaiter",
        "Greets and awaits for more data",
        |_inputs, ctx| async move {
            ctx.text("Hello!").await?;
            let resume = ctx
                .await_resume(AwaitRequest::message(Message::text("Can you provide more data?")))
                .await?;
            let reply = resume
                .message
                .map(|m| m.text_content())
                .unwrap_or_else(|| "nothing".to_string());
            ctx.text(format!("Thanks for {}", reply)).await?;
            Ok(())
        },
    ))?;

    agents.register(FnAgent::new("failer", "Fails", |_inputs, _ctx| async move {
        anyhow::bail!("Whoops")
    }))?;

    Ok(agents)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging system
    let _guard = logging::init_logging()?;

    tracing::info!("=== ACP Run Demo Starting ===");

    let server = AcpServer::new(build_agents()?, ServerConfig::from_env()?)?;

    println!("Agents:");
    for agent in server.list_agents().agents {
        println!("  {} - {}", agent.name, agent.description);
    }

    // Sync run
    let response = server
        .create_run(RunCreateRequest::new("echo", vec![Message::user_text("Howdy!")]))
        .await?;
    if let Some(run) = response.snapshot() {
        println!("\n[sync] echo -> {}", serde_json::to_string_pretty(run)?);
    }

    let response = server
        .create_run(RunCreateRequest::new("failer", Vec::new()))
        .await?;
    if let Some(run) = response.snapshot() {
        let error = run.error.as_ref().map(|e| e.message.as_str()).unwrap_or("");
        println!("\n[sync] failer -> {} ({})", run.status, error);
    }

    // Streamed run, suspended on an await request
    println!("\n[stream] awaiter");
    let response = server
        .create_run(RunCreateRequest::new("awaiter", Vec::new()).with_mode(RunMode::Stream))
        .await?;
    let mut sse = response
        .into_sse()
        .ok_or_else(|| anyhow::anyhow!("expected a stream response"))?;
    let mut run_id = None;
    while let Some(record) = sse.next().await {
        print!("{}", record);
        if run_id.is_none() {
            run_id = first_run_id(&record);
        }
    }
    let run_id = run_id.ok_or_else(|| anyhow::anyhow!("stream did not announce a run"))?;

    // Resume the same run and stream the rest
    println!("[stream] resume {}", run_id);
    let response = server
        .resume_run(
            run_id,
            RunResumeRequest::new(AwaitResume::message(Message::user_text("the data")))
                .with_mode(RunMode::Stream),
        )
        .await?;
    if let Some(mut sse) = response.into_sse() {
        while let Some(record) = sse.next().await {
            print!("{}", record);
        }
    }

    tracing::info!(runs = server.list_runs().await.len(), "=== ACP Run Demo Finished ===");

    Ok(())
}

/// Pull the run id out of a `run.*` SSE record
fn first_run_id(record: &str) -> Option<acp_run_core::RunId> {
    let parsed = acp_run_core::stream::parse_sse(record);
    let data: serde_json::Value = serde_json::from_str(&parsed.first()?.data).ok()?;
    serde_json::from_value(data.get("run")?.get("run_id")?.clone()).ok()
}
