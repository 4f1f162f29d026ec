use crate::{current_task, to_json, StageOptions};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use taskflow_core::{
    ExecutionState, Result, SharedRandom, Stage, StageError, StageGraph, StateUpdate, TaskStatus,
    ValidationFailure,
};

pub const SENTIMENT_LABELS: [&str; 3] = ["positive", "negative", "neutral"];

/// Confidence must be strictly above this for the result to be accepted.
pub const VALIDATION_THRESHOLD: f64 = 0.6;

pub struct AnalyzeSentimentStage {
    rng: SharedRandom,
}

#[async_trait]
impl Stage for AnalyzeSentimentStage {
    async fn run(&self, state: &ExecutionState) -> std::result::Result<StateUpdate, StageError> {
        let mut task = current_task(state)?;
        let label = SENTIMENT_LABELS[self.rng.pick(SENTIMENT_LABELS.len())];
        task.output = Some(label.to_string());
        task.confidence = Some(self.rng.in_range(0.5, 0.5));
        task.status = TaskStatus::Processing;

        Ok(StateUpdate::new().task(task).step("sentiment_analyzed"))
    }
}

pub struct ValidateResultStage;

#[async_trait]
impl Stage for ValidateResultStage {
    async fn run(&self, state: &ExecutionState) -> std::result::Result<StateUpdate, StageError> {
        let mut task = current_task(state)?;
        let confidence = task.confidence.unwrap_or(0.0);
        let passed = confidence > VALIDATION_THRESHOLD;

        let mut update = StateUpdate::new().context(
            "validation",
            json!({
                "passed": passed,
                "threshold": VALIDATION_THRESHOLD,
                "confidence": confidence,
            }),
        );

        if passed {
            task.status = TaskStatus::Completed;
            update = update.step("validated");
        } else {
            task.status = TaskStatus::Error;
            let failure = ValidationFailure::new(
                "validate_result",
                format!(
                    "confidence {:.3} is not above threshold {}",
                    confidence, VALIDATION_THRESHOLD
                ),
            );
            update = update
                .context("validation_failure", to_json(&failure)?)
                .step("validation_failed");
        }

        Ok(update.task(task))
    }
}

pub struct FormatOutputStage;

#[async_trait]
impl Stage for FormatOutputStage {
    async fn run(&self, state: &ExecutionState) -> std::result::Result<StateUpdate, StageError> {
        let task = current_task(state)?;
        Ok(StateUpdate::new()
            .context(
                "result",
                json!({
                    "sentiment": task.output,
                    "confidence": task.confidence,
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                }),
            )
            .step("formatted")
            .processing(false))
    }
}

/// `analyze_sentiment → validate_result → format_output`
pub fn sentiment_pipeline(options: &StageOptions) -> Result<StageGraph> {
    StageGraph::new("sentiment")
        .add_stage(
            "analyze_sentiment",
            options.wrap(Arc::new(AnalyzeSentimentStage {
                rng: options.rng.clone(),
            })),
        )?
        .add_stage("validate_result", options.wrap(Arc::new(ValidateResultStage)))?
        .add_stage("format_output", options.wrap(Arc::new(FormatOutputStage)))
        .map(|g| g.linear(&["analyze_sentiment", "validate_result", "format_output"]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskflow_core::{FixedRandom, PipelineRunner, Task, TaskType};

    async fn run_with(value: f64) -> ExecutionState {
        let options = StageOptions::new(Arc::new(FixedRandom::new(value)));
        let graph = sentiment_pipeline(&options).unwrap().compile().unwrap();
        let task = Task::new(TaskType::Sentiment, "I love this").with_id("s-1");
        PipelineRunner::new(graph)
            .run(ExecutionState::for_task(&task))
            .await
            .unwrap()
            .state
    }

    #[tokio::test]
    async fn test_low_confidence_fails_validation() {
        let state = run_with(0.0).await;
        let task = state.current_task.unwrap();

        assert_eq!(task.output.as_deref(), Some("positive"));
        assert_eq!(task.confidence, Some(0.5));
        assert_eq!(task.status, TaskStatus::Error);
        assert_eq!(state.context["validation"]["passed"], json!(false));
        assert_eq!(
            state.context["validation_failure"]["stage"],
            json!("validate_result")
        );
        assert_eq!(state.step, "formatted");
        assert!(!state.is_processing);
    }

    #[tokio::test]
    async fn test_confident_result_completes() {
        let state = run_with(0.3).await;
        let task = state.current_task.unwrap();

        assert_eq!(task.output.as_deref(), Some("positive"));
        assert!((task.confidence.unwrap() - 0.65).abs() < 1e-9);
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(state.context["validation"]["passed"], json!(true));
        assert!(!state.context.contains_key("validation_failure"));
        assert_eq!(state.context["result"]["sentiment"], json!("positive"));
    }

    #[tokio::test]
    async fn test_threshold_is_exclusive() {
        let mut task = Task::new(TaskType::Sentiment, "meh");
        task.confidence = Some(VALIDATION_THRESHOLD);
        let state = ExecutionState::for_task(&task);

        let update = ValidateResultStage.run(&state).await.unwrap();
        assert_eq!(update.current_task.unwrap().status, TaskStatus::Error);
        assert_eq!(update.step.as_deref(), Some("validation_failed"));
    }

    #[tokio::test]
    async fn test_missing_task_is_an_error() {
        let state = ExecutionState::default();
        let err = FormatOutputStage.run(&state).await.unwrap_err();
        assert_eq!(err, StageError::MissingTask);
    }
}
