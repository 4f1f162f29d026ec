//! Binary entrypoint for the Taskflow API server.
use anyhow::Context;
use std::time::Duration;
use taskflow_api::{run, AppState};
use taskflow_journal::JournalBridge;
use taskflow_orchestrator::{OrchestratorConfig, TaskOrchestrator};
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "0.0.0.0:8787";
const DEFAULT_JOURNAL_PROGRAM: &str = "python3";
const DEFAULT_JOURNAL_SCRIPT: &str = "../task_journal/journal_processor.py";
const DEFAULT_JOURNAL_TIMEOUT_MS: u64 = 30_000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::var("TASKFLOW_CONFIG") {
        Ok(path) => OrchestratorConfig::from_file(&path)
            .with_context(|| format!("loading config from {}", path))?,
        Err(_) => OrchestratorConfig::default(),
    }
    .with_env_overrides()?;

    let orchestrator = TaskOrchestrator::new(config).context("building orchestrator")?;

    let timeout_ms = match std::env::var("TASKFLOW_JOURNAL_TIMEOUT_MS") {
        Ok(value) => value
            .parse()
            .with_context(|| format!("TASKFLOW_JOURNAL_TIMEOUT_MS='{}'", value))?,
        Err(_) => DEFAULT_JOURNAL_TIMEOUT_MS,
    };
    let journal = JournalBridge::new(
        env_or("TASKFLOW_JOURNAL_PROGRAM", DEFAULT_JOURNAL_PROGRAM),
        env_or("TASKFLOW_JOURNAL_SCRIPT", DEFAULT_JOURNAL_SCRIPT),
    )
    .with_timeout(Duration::from_millis(timeout_ms));

    let state = AppState::new(orchestrator, journal)?;
    let addr = env_or("TASKFLOW_ADDR", DEFAULT_ADDR);
    run(&addr, state).await?;
    Ok(())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
