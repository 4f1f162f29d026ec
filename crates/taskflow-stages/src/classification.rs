use crate::{current_task, StageOptions};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use taskflow_core::{
    ExecutionState, Result, SharedRandom, Stage, StageError, StageGraph, StateUpdate, TaskStatus,
};

pub const CATEGORIES: [&str; 5] = [
    "technology",
    "sports",
    "politics",
    "entertainment",
    "science",
];

/// Lower-cases and trims the task input in place.
pub struct PreprocessTextStage;

#[async_trait]
impl Stage for PreprocessTextStage {
    async fn run(&self, state: &ExecutionState) -> std::result::Result<StateUpdate, StageError> {
        let mut task = current_task(state)?;
        task.input = task.input.trim().to_lowercase();
        Ok(StateUpdate::new().task(task).step("preprocessed"))
    }
}

pub struct ClassifyTextStage {
    rng: SharedRandom,
}

#[async_trait]
impl Stage for ClassifyTextStage {
    async fn run(&self, state: &ExecutionState) -> std::result::Result<StateUpdate, StageError> {
        let mut task = current_task(state)?;
        task.output = Some(CATEGORIES[self.rng.pick(CATEGORIES.len())].to_string());
        task.confidence = Some(self.rng.in_range(0.6, 0.4));
        task.status = TaskStatus::Completed;
        Ok(StateUpdate::new().task(task).step("classified"))
    }
}

pub struct PostProcessStage;

#[async_trait]
impl Stage for PostProcessStage {
    async fn run(&self, state: &ExecutionState) -> std::result::Result<StateUpdate, StageError> {
        let task = current_task(state)?;
        Ok(StateUpdate::new()
            .context(
                "classification",
                json!({
                    "category": task.output,
                    "confidence": task.confidence,
                    "processedAt": chrono::Utc::now().to_rfc3339(),
                }),
            )
            .step("post_processed")
            .processing(false))
    }
}

/// `preprocess_text → classify_text → post_process`
pub fn classification_pipeline(options: &StageOptions) -> Result<StageGraph> {
    let graph = StageGraph::new("classification")
        .add_stage("preprocess_text", options.wrap(Arc::new(PreprocessTextStage)))?
        .add_stage(
            "classify_text",
            options.wrap(Arc::new(ClassifyTextStage {
                rng: options.rng.clone(),
            })),
        )?
        .add_stage("post_process", options.wrap(Arc::new(PostProcessStage)))?;

    Ok(graph.linear(&["preprocess_text", "classify_text", "post_process"]))
}
