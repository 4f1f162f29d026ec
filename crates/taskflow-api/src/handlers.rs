//! API Handlers
use crate::dto::{
    runnable, BatchRequest, BatchResponse, GraphsResponse, HealthResponse, TaskRequest,
};
use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use taskflow_core::{GraphDescription, Task, TaskType};
use taskflow_journal::{JournalEntry, JournalReply};
use taskflow_metrics::{AggregatedMetrics, MetricSample, MetricsSummary};

// ============================================================================
// Tasks
// ============================================================================

pub async fn execute_task(
    State(state): State<AppState>,
    Json(request): Json<TaskRequest>,
) -> Result<Json<Task>, ApiError> {
    let task = request.into_task()?;
    let result = state.orchestrator.execute_task(&task).await;
    state.metrics.observe_task(&result);
    Ok(Json(result))
}

pub async fn execute_pipeline(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Json<BatchResponse> {
    let slots = request.into_slots();
    let results = state.orchestrator.execute_pipeline(&runnable(&slots)).await;
    results.iter().for_each(|t| state.metrics.observe_task(t));
    Json(BatchResponse::merge(slots, results))
}

pub async fn execute_parallel(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Json<BatchResponse> {
    let slots = request.into_slots();
    let results = state.orchestrator.execute_parallel_tasks(&runnable(&slots)).await;
    results.iter().for_each(|t| state.metrics.observe_task(t));
    Json(BatchResponse::merge(slots, results))
}

// ============================================================================
// Graphs
// ============================================================================

pub async fn list_graphs(State(state): State<AppState>) -> Json<GraphsResponse> {
    Json(GraphsResponse {
        graphs: state.orchestrator.get_available_graphs(),
    })
}

pub async fn describe_graph(
    State(state): State<AppState>,
    Path(task_type): Path<String>,
) -> Result<Json<GraphDescription>, ApiError> {
    task_type
        .parse::<TaskType>()
        .ok()
        .and_then(|t| state.orchestrator.describe_graph(t))
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("graph '{}'", task_type)))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::from_graphs(state.orchestrator.health_check()))
}

// ============================================================================
// Metrics
// ============================================================================

pub async fn get_metrics(State(state): State<AppState>) -> Json<Vec<MetricSample>> {
    Json(state.orchestrator.get_metrics())
}

pub async fn get_aggregated_metrics(State(state): State<AppState>) -> Json<AggregatedMetrics> {
    Json(state.orchestrator.get_aggregated_metrics())
}

pub async fn get_metrics_summary(State(state): State<AppState>) -> Json<MetricsSummary> {
    Json(state.orchestrator.metrics_summary())
}

pub async fn clear_metrics(State(state): State<AppState>) -> StatusCode {
    state.orchestrator.clear_metrics();
    StatusCode::NO_CONTENT
}

pub async fn prometheus_metrics(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let body = state.metrics.encode(&state.orchestrator.metrics_summary())?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

// ============================================================================
// Journal
// ============================================================================

pub async fn save_journal(
    State(state): State<AppState>,
    Json(entry): Json<JournalEntry>,
) -> Result<Json<JournalReply>, ApiError> {
    entry
        .validate()
        .map_err(|e| ApiError::InvalidArgument(e.to_string()))?;
    tracing::info!(summary = %entry.summary(), "saving journal entry");
    Ok(Json(state.journal.save(&entry).await))
}
