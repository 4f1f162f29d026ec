//! Task Orchestrator: the single entry point for executing tasks
//!
//! Every call to [`TaskOrchestrator::execute_task`] returns a terminal task
//! and records exactly one metric sample. Failures come back as data
//! (`status = error`, `metadata.error`), never as `Err`.

use crate::config::OrchestratorConfig;
use crate::error::OrchestratorError;
use crate::registry::GraphRegistry;
use futures::future::join_all;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Instant;
use taskflow_core::rng::shared_random;
use taskflow_core::{
    ExecutionState, GraphDescription, PipelineRunner, RunOutcome, SharedRandom, StageGraph, Task,
    TaskStatus, TaskType, TaskflowError, ValidationFailure,
};
use taskflow_metrics::{AggregatedMetrics, MetricSample, MetricsRecorder, MetricsSummary};
use taskflow_stages::{default_pipelines, StageOptions};

pub struct TaskOrchestrator {
    config: OrchestratorConfig,
    registry: GraphRegistry,
    metrics: Mutex<MetricsRecorder>,
}

impl TaskOrchestrator {
    /// Register and compile every built-in graph. Any compile failure
    /// aborts construction.
    pub fn new(config: OrchestratorConfig) -> Result<Self, OrchestratorError> {
        let rng = shared_random(config.random_seed);
        Self::with_random(config, rng)
    }

    /// As [`new`](Self::new), with an explicit random source for the
    /// placeholder stages.
    pub fn with_random(
        config: OrchestratorConfig,
        rng: SharedRandom,
    ) -> Result<Self, OrchestratorError> {
        let mut options = StageOptions::new(rng);
        if let Some(delay) = config.simulated_delay {
            options = options.with_delay(delay);
        }

        let registry = GraphRegistry::new();
        for (task_type, graph) in default_pipelines(&options, config.enable_translation)? {
            graph
                .compile()
                .map_err(|source| OrchestratorError::Graph { task_type, source })?;
            registry.register(task_type, graph);
        }

        tracing::info!(
            graphs = registry.len(),
            metrics_capacity = config.metrics_capacity,
            seeded = config.random_seed.is_some(),
            "orchestrator ready"
        );

        Ok(Self {
            metrics: Mutex::new(MetricsRecorder::new(config.metrics_capacity)),
            config,
            registry,
        })
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Replace (or add) the graph for `task_type`. The graph is not
    /// compiled here; use [`health_check`](Self::health_check) to probe it.
    pub fn register_graph(&self, task_type: TaskType, graph: StageGraph) {
        if self.registry.register(task_type, graph).is_some() {
            tracing::info!(task_type = %task_type, "graph replaced");
        }
    }

    // ------------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------------

    pub async fn execute_task(&self, task: &Task) -> Task {
        let start = Instant::now();
        let result = self.run(task).await;
        let elapsed = start.elapsed();
        let execution_ms = elapsed.as_millis() as u64;
        let latency_ms = elapsed.as_secs_f64() * 1000.0;

        match result {
            Ok(outcome) => {
                let finished = self.finish(task, outcome, execution_ms);
                self.record(MetricSample::success(latency_ms, finished.confidence));
                tracing::info!(
                    task_id = %finished.id,
                    task_type = %finished.task_type,
                    status = ?finished.status,
                    execution_ms,
                    "task finished"
                );
                finished
            }
            Err(e) => {
                self.record(MetricSample::failure(latency_ms));
                tracing::info!(
                    task_id = %task.id,
                    task_type = %task.task_type,
                    error = %e,
                    execution_ms,
                    "task failed"
                );
                let mut failed = task.clone();
                failed.status = TaskStatus::Error;
                failed
                    .metadata
                    .insert("error".to_string(), Value::String(e.to_string()));
                failed
                    .metadata
                    .insert("executionTime".to_string(), Value::from(execution_ms));
                failed
            }
        }
    }

    /// Run tasks one at a time in order. A failed task never stops the batch.
    pub async fn execute_pipeline(&self, tasks: &[Task]) -> Vec<Task> {
        let mut results = Vec::with_capacity(tasks.len());
        for task in tasks {
            let result = self.execute_task(task).await;
            if result.status == TaskStatus::Error {
                tracing::warn!(
                    task_id = %task.id,
                    error = result.error_message().unwrap_or("unknown"),
                    "task failed, continuing with pipeline"
                );
            }
            results.push(result);
        }
        results
    }

    /// Run all tasks concurrently. Results keep input order.
    pub async fn execute_parallel_tasks(&self, tasks: &[Task]) -> Vec<Task> {
        join_all(tasks.iter().map(|task| self.execute_task(task))).await
    }

    async fn run(&self, task: &Task) -> Result<RunOutcome, TaskflowError> {
        let graph = self
            .registry
            .get(task.task_type)
            .ok_or_else(|| TaskflowError::UnknownTaskType(task.task_type.to_string()))?;
        let runner = PipelineRunner::new(graph.compile()?);
        let outcome = runner.run(ExecutionState::for_task(task)).await?;

        for trace in &outcome.trace {
            tracing::debug!(
                task_id = %task.id,
                stage = %trace.stage,
                step = %trace.step,
                latency_ms = trace.latency_ms,
                "stage trace"
            );
        }
        Ok(outcome)
    }

    /// Combine the caller's task with the final execution state.
    fn finish(&self, original: &Task, outcome: RunOutcome, execution_ms: u64) -> Task {
        let RunOutcome { state, .. } = outcome;
        let mut result = original.clone();

        if let Some(current) = state.current_task {
            result.input = current.input;
            result.output = Some(current.output.unwrap_or_default());
            result.confidence = current.confidence;
            result.status = current.status;
        } else {
            result.output = Some(String::new());
            result.status = TaskStatus::Completed;
        }

        if !result.status.is_terminal() {
            tracing::warn!(
                task_id = %result.id,
                status = ?result.status,
                step = %state.step,
                "graph ended without a terminal status, marking completed"
            );
            result.status = TaskStatus::Completed;
        }

        if let Some(failure) = state
            .context
            .get("validation_failure")
            .and_then(|v| serde_json::from_value::<ValidationFailure>(v.clone()).ok())
        {
            result
                .metadata
                .insert("error".to_string(), Value::String(failure.reason));
        }

        result
            .metadata
            .insert("executionTime".to_string(), Value::from(execution_ms));
        result
            .metadata
            .insert("step".to_string(), Value::String(state.step));
        result.metadata.insert(
            "context".to_string(),
            Value::Object(state.context.into_iter().collect()),
        );
        result
    }

    // ------------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------------

    pub fn get_available_graphs(&self) -> Vec<TaskType> {
        self.registry.task_types()
    }

    pub fn describe_graph(&self, task_type: TaskType) -> Option<GraphDescription> {
        self.registry.get(task_type).map(|graph| graph.describe())
    }

    /// Compile every registered graph. One broken graph does not stop the
    /// others from being probed.
    pub fn health_check(&self) -> BTreeMap<TaskType, bool> {
        self.registry
            .entries()
            .into_iter()
            .map(|(task_type, graph)| {
                let healthy = match graph.compile() {
                    Ok(_) => true,
                    Err(e) => {
                        tracing::error!(task_type = %task_type, error = %e, "health check failed");
                        false
                    }
                };
                (task_type, healthy)
            })
            .collect()
    }

    // ------------------------------------------------------------------------
    // Metrics
    // ------------------------------------------------------------------------

    fn record(&self, sample: MetricSample) {
        self.metrics.lock().record(sample);
    }

    pub fn get_metrics(&self) -> Vec<MetricSample> {
        self.metrics.lock().snapshot()
    }

    pub fn get_aggregated_metrics(&self) -> AggregatedMetrics {
        self.metrics.lock().aggregate()
    }

    pub fn metrics_summary(&self) -> MetricsSummary {
        self.metrics.lock().summary()
    }

    pub fn clear_metrics(&self) {
        self.metrics.lock().clear();
    }
}
