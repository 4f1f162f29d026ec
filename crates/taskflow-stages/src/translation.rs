use crate::{current_task, StageOptions};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use taskflow_core::{
    ExecutionState, Result, Stage, StageError, StageGraph, StateUpdate, TaskStatus,
};

pub const PLACEHOLDER_TRANSLATION: &str = "Ceci est une traduction simulée du texte d'entrée.";
const PLACEHOLDER_CONFIDENCE: f64 = 0.92;

pub struct TranslateStage;

#[async_trait]
impl Stage for TranslateStage {
    async fn run(&self, state: &ExecutionState) -> std::result::Result<StateUpdate, StageError> {
        let mut task = current_task(state)?;
        task.output = Some(PLACEHOLDER_TRANSLATION.to_string());
        task.confidence = Some(PLACEHOLDER_CONFIDENCE);
        task.status = TaskStatus::Completed;

        Ok(StateUpdate::new()
            .context(
                "translation",
                json!({
                    "targetLanguage": "fr",
                    "sourceLength": state.input().chars().count(),
                }),
            )
            .task(task)
            .step("translated")
            .processing(false))
    }
}

/// Single stage: `translate`
pub fn translation_pipeline(options: &StageOptions) -> Result<StageGraph> {
    Ok(StageGraph::new("translation")
        .add_stage("translate", options.wrap(Arc::new(TranslateStage)))?
        .linear(&["translate"]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskflow_core::{FixedRandom, PipelineRunner, Task, TaskType};

    #[tokio::test]
    async fn test_placeholder_translation() {
        let options = StageOptions::new(Arc::new(FixedRandom::first()));
        let graph = translation_pipeline(&options).unwrap().compile().unwrap();
        let task = Task::new(TaskType::Translation, "Hello world");

        let state = PipelineRunner::new(graph)
            .run(ExecutionState::for_task(&task))
            .await
            .unwrap()
            .state;
        let result = state.current_task.unwrap();

        assert_eq!(result.output.as_deref(), Some(PLACEHOLDER_TRANSLATION));
        assert_eq!(result.confidence, Some(0.92));
        assert_eq!(result.status, TaskStatus::Completed);
        assert_eq!(state.context["translation"]["sourceLength"], json!(11));
        assert_eq!(state.step, "translated");
    }
}
