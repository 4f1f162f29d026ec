//! Taskflow API /v1: REST endpoints over the task orchestrator
pub mod dto;
pub mod error;
pub mod handlers;
pub mod metrics;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use taskflow_journal::JournalBridge;
use taskflow_orchestrator::TaskOrchestrator;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use metrics::ApiMetrics;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<TaskOrchestrator>,
    pub journal: Arc<JournalBridge>,
    pub metrics: Arc<ApiMetrics>,
}

impl AppState {
    pub fn new(
        orchestrator: TaskOrchestrator,
        journal: JournalBridge,
    ) -> Result<Self, prometheus::Error> {
        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            journal: Arc::new(journal),
            metrics: Arc::new(ApiMetrics::new()?),
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/v1/tasks", post(handlers::execute_task))
        .route("/v1/tasks/pipeline", post(handlers::execute_pipeline))
        .route("/v1/tasks/parallel", post(handlers::execute_parallel))
        .route("/v1/graphs", get(handlers::list_graphs))
        .route("/v1/graphs/{task_type}", get(handlers::describe_graph))
        .route(
            "/v1/metrics",
            get(handlers::get_metrics).delete(handlers::clear_metrics),
        )
        .route("/v1/metrics/aggregate", get(handlers::get_aggregated_metrics))
        .route("/v1/metrics/summary", get(handlers::get_metrics_summary))
        .route("/v1/health", get(handlers::health))
        .route("/v1/journal", post(handlers::save_journal))
        .route("/metrics", get(handlers::prometheus_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(addr: &str, state: AppState) -> std::io::Result<()> {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Taskflow API listening on {}", addr);
    axum::serve(listener, app).await
}
