//! Pipeline Runner: walks a compiled graph, folding each stage's update into the state
use crate::context::ExecutionState;
use crate::error::{Result, StageError, TaskflowError};
use crate::graph::{CompiledGraph, Transition, END};
use serde::Serialize;
use std::time::Instant;

/// Timing record for one stage of one run.
#[derive(Debug, Clone, Serialize)]
pub struct StageTrace {
    pub stage: String,
    /// `step` value after the stage's update was applied.
    pub step: String,
    pub latency_ms: u64,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub state: ExecutionState,
    pub trace: Vec<StageTrace>,
}

pub struct PipelineRunner {
    graph: CompiledGraph,
}

impl PipelineRunner {
    pub fn new(graph: CompiledGraph) -> Self {
        Self { graph }
    }

    /// Execute stages strictly one after another until `END`.
    ///
    /// A stage error aborts the run and is returned as
    /// [`TaskflowError::StageExecution`]; nothing is retried.
    pub async fn run(&self, mut state: ExecutionState) -> Result<RunOutcome> {
        let mut trace = Vec::new();
        let mut current = self.graph.entry().to_string();

        while current != END {
            let stage = self.graph.stage(&current).ok_or_else(|| {
                TaskflowError::Configuration(format!(
                    "graph '{}' has no handler for '{}'",
                    self.graph.name(),
                    current
                ))
            })?;

            let start = Instant::now();
            let update = stage
                .run(&state)
                .await
                .map_err(|e| TaskflowError::stage(current.clone(), e))?;
            state.apply(update);
            let latency_ms = start.elapsed().as_millis() as u64;

            tracing::debug!(
                graph = %self.graph.name(),
                stage = %current,
                step = %state.step,
                latency_ms,
                "stage completed"
            );

            trace.push(StageTrace {
                stage: current.clone(),
                step: state.step.clone(),
                latency_ms,
            });

            current = self.next_stage(&current, &state)?;
        }

        Ok(RunOutcome { state, trace })
    }

    fn next_stage(&self, from: &str, state: &ExecutionState) -> Result<String> {
        match self.graph.transition(from) {
            Some(Transition::Direct(to)) => Ok(to.clone()),
            Some(Transition::Conditional { router, targets }) => {
                let route = router(state);
                if targets.contains(&route) {
                    Ok(route)
                } else {
                    Err(TaskflowError::stage(
                        from,
                        StageError::InvalidRoute {
                            route,
                            allowed: targets.clone(),
                        },
                    ))
                }
            }
            None => Err(TaskflowError::GraphValidation(format!(
                "graph '{}': stage '{}' has no outgoing edge",
                self.graph.name(),
                from
            ))),
        }
    }
}
