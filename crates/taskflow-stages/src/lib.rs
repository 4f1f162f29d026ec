//! Taskflow Stages: the concrete task-type pipelines.
//!
//! The model calls are placeholders driven by an injected random source.
//! What matters is the shape: stage order, the context each stage writes,
//! and the status each stage leaves on the task.
//!
//! # Pipelines
//!
//! ```text
//! sentiment       analyze_sentiment → validate_result → format_output
//! classification  preprocess_text → classify_text → post_process
//! extraction      tokenize → extract_entities → classify_entities → aggregate_results
//! summarization   chunk_text → extract_key_sentences → generate_summary → refine_summary
//! translation     translate
//! ```

mod classification;
mod delay;
mod extraction;
mod sentiment;
mod summarization;
mod translation;

pub use classification::{classification_pipeline, CATEGORIES};
pub use delay::{DelayedStage, SimulatedDelay};
pub use extraction::{extraction_pipeline, Entity, ENTITY_LABELS};
pub use sentiment::{sentiment_pipeline, SENTIMENT_LABELS, VALIDATION_THRESHOLD};
pub use summarization::summarization_pipeline;
pub use translation::{translation_pipeline, PLACEHOLDER_TRANSLATION};

use serde::de::DeserializeOwned;
use std::sync::Arc;
use taskflow_core::{
    ExecutionState, Result, SharedRandom, SharedStage, StageError, StageGraph, Task, TaskType,
};

// ============================================================================
// STAGE OPTIONS
// ============================================================================

/// Shared inputs for building stages: the random source and an optional
/// simulated latency applied to every stage.
#[derive(Clone)]
pub struct StageOptions {
    pub rng: SharedRandom,
    pub delay: Option<SimulatedDelay>,
}

impl StageOptions {
    pub fn new(rng: SharedRandom) -> Self {
        Self { rng, delay: None }
    }

    pub fn with_delay(mut self, delay: SimulatedDelay) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn wrap(&self, stage: SharedStage) -> SharedStage {
        match self.delay {
            Some(delay) => Arc::new(DelayedStage::new(stage, delay, self.rng.clone())),
            None => stage,
        }
    }
}

// ============================================================================
// CONVENIENCE BUILDERS
// ============================================================================

/// Build the pipeline for one task type.
pub fn pipeline_for(task_type: TaskType, options: &StageOptions) -> Result<StageGraph> {
    match task_type {
        TaskType::Sentiment => sentiment_pipeline(options),
        TaskType::Classification => classification_pipeline(options),
        TaskType::Extraction => extraction_pipeline(options),
        TaskType::Summarization => summarization_pipeline(options),
        TaskType::Translation => translation_pipeline(options),
    }
}

/// Every built-in pipeline, in registration order. Translation is left out
/// when `include_translation` is false.
pub fn default_pipelines(
    options: &StageOptions,
    include_translation: bool,
) -> Result<Vec<(TaskType, StageGraph)>> {
    TaskType::ALL
        .into_iter()
        .filter(|t| include_translation || *t != TaskType::Translation)
        .map(|t| pipeline_for(t, options).map(|graph| (t, graph)))
        .collect()
}

// ============================================================================
// HELPERS
// ============================================================================

pub(crate) fn current_task(state: &ExecutionState) -> std::result::Result<Task, StageError> {
    state.current_task.clone().ok_or(StageError::MissingTask)
}

/// Read a list from the context. A missing key is an empty list.
pub(crate) fn context_list<T: DeserializeOwned>(
    state: &ExecutionState,
    key: &str,
) -> std::result::Result<Vec<T>, StageError> {
    match state.context_value(key) {
        None => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| StageError::ExecutionFailed(format!("context '{}': {}", key, e))),
    }
}

pub(crate) fn to_json<T: serde::Serialize>(
    value: &T,
) -> std::result::Result<serde_json::Value, StageError> {
    serde_json::to_value(value).map_err(|e| StageError::ExecutionFailed(e.to_string()))
}

// ============================================================================
// TESTS
// ============================================================================
