use std::sync::Arc;

use research_assist::agent::create_agent;
use research_assist::api::{ApiState, api_routes};
use research_assist::config::ServiceConfig;
use research_assist::memory::MemoryStore;
use research_assist::task::{ExecutorDeps, Runner, TaskRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServiceConfig::from_env()?;

    eprintln!("🔎 Research Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://{}/api", config.bind_addr);
    eprintln!(
        "   Agent: {}",
        config.agent_endpoint.as_deref().unwrap_or("static (builtin)")
    );

    // Shared stores, created once and injected everywhere.
    let registry = Arc::new(TaskRegistry::new(config.max_active_tasks));
    let memory = Arc::new(MemoryStore::new(config.memory_item_ttl));
    let agent = create_agent(&config);

    let runner = Arc::new(Runner::new(ExecutorDeps {
        registry,
        memory: Arc::clone(&memory),
        agent: Arc::clone(&agent),
        timeout: config.task_timeout,
    }));

    runner.spawn_maintenance(
        config.sweep_interval,
        config.stale_threshold,
        config.task_retention,
    );

    let app = api_routes(ApiState {
        runner,
        memory,
        agent,
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
