use crate::{context_list, current_task, to_json, StageOptions};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use taskflow_core::{
    ExecutionState, Result, SharedRandom, Stage, StageError, StageGraph, StateUpdate, TaskStatus,
};

lazy_static! {
    static ref TOKEN: Regex = Regex::new(r"\S+").unwrap();
}

pub const ENTITY_LABELS: [&str; 4] = ["PERSON", "ORG", "LOC", "MISC"];

/// Probability threshold a token's draw must exceed to become an entity.
const SELECTION_THRESHOLD: f64 = 0.7;

/// A span of the input picked out as an entity. Offsets are byte offsets
/// into the task input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Splits on whitespace, keeping each token's byte span.
pub struct TokenizeStage;

#[async_trait]
impl Stage for TokenizeStage {
    async fn run(&self, state: &ExecutionState) -> std::result::Result<StateUpdate, StageError> {
        let (tokens, offsets): (Vec<&str>, Vec<(usize, usize)>) = TOKEN
            .find_iter(state.input())
            .map(|m| (m.as_str(), (m.start(), m.end())))
            .unzip();

        Ok(StateUpdate::new()
            .context("tokens", to_json(&tokens)?)
            .context("token_offsets", to_json(&offsets)?)
            .step("tokenized"))
    }
}

pub struct ExtractEntitiesStage {
    rng: SharedRandom,
}

#[async_trait]
impl Stage for ExtractEntitiesStage {
    async fn run(&self, state: &ExecutionState) -> std::result::Result<StateUpdate, StageError> {
        let tokens: Vec<String> = context_list(state, "tokens")?;
        let offsets: Vec<(usize, usize)> = context_list(state, "token_offsets")?;
        if tokens.len() != offsets.len() {
            return Err(StageError::ExecutionFailed(format!(
                "{} tokens but {} offsets",
                tokens.len(),
                offsets.len()
            )));
        }

        let entities: Vec<Entity> = tokens
            .into_iter()
            .zip(offsets)
            .filter(|_| self.rng.next_f64() > SELECTION_THRESHOLD)
            .map(|(text, (start, end))| Entity {
                text,
                start,
                end,
                label: "UNKNOWN".to_string(),
                confidence: None,
            })
            .collect();

        Ok(StateUpdate::new()
            .context("entities", to_json(&entities)?)
            .step("entities_extracted"))
    }
}

pub struct ClassifyEntitiesStage {
    rng: SharedRandom,
}

#[async_trait]
impl Stage for ClassifyEntitiesStage {
    async fn run(&self, state: &ExecutionState) -> std::result::Result<StateUpdate, StageError> {
        let mut task = current_task(state)?;
        let classified: Vec<Entity> = context_list::<Entity>(state, "entities")?
            .into_iter()
            .map(|entity| Entity {
                label: ENTITY_LABELS[self.rng.pick(ENTITY_LABELS.len())].to_string(),
                confidence: Some(self.rng.in_range(0.7, 0.3)),
                ..entity
            })
            .collect();

        task.output = Some(
            serde_json::to_string(&classified)
                .map_err(|e| StageError::ExecutionFailed(e.to_string()))?,
        );
        task.status = TaskStatus::Completed;

        Ok(StateUpdate::new()
            .context("classifiedEntities", to_json(&classified)?)
            .task(task)
            .step("entities_classified"))
    }
}

/// Counts classified entities per label.
pub struct AggregateResultsStage;

#[async_trait]
impl Stage for AggregateResultsStage {
    async fn run(&self, state: &ExecutionState) -> std::result::Result<StateUpdate, StageError> {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for entity in context_list::<Entity>(state, "classifiedEntities")? {
            *counts.entry(entity.label).or_default() += 1;
        }

        Ok(StateUpdate::new()
            .context("summary", to_json(&counts)?)
            .step("aggregated")
            .processing(false))
    }
}

/// `tokenize → extract_entities → classify_entities → aggregate_results`
pub fn extraction_pipeline(options: &StageOptions) -> Result<StageGraph> {
    let graph = StageGraph::new("extraction")
        .add_stage("tokenize", options.wrap(Arc::new(TokenizeStage)))?
        .add_stage(
            "extract_entities",
            options.wrap(Arc::new(ExtractEntitiesStage {
                rng: options.rng.clone(),
            })),
        )?
        .add_stage(
            "classify_entities",
            options.wrap(Arc::new(ClassifyEntitiesStage {
                rng: options.rng.clone(),
            })),
        )?
        .add_stage("aggregate_results", options.wrap(Arc::new(AggregateResultsStage)))?;

    Ok(graph.linear(&[
        "tokenize",
        "extract_entities",
        "classify_entities",
        "aggregate_results",
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use taskflow_core::{FixedRandom, PipelineRunner, Task, TaskType};

    async fn run_with(value: f64, input: &str) -> ExecutionState {
        let options = StageOptions::new(Arc::new(FixedRandom::new(value)));
        let graph = extraction_pipeline(&options).unwrap().compile().unwrap();
        let task = Task::new(TaskType::Extraction, input);
        PipelineRunner::new(graph)
            .run(ExecutionState::for_task(&task))
            .await
            .unwrap()
            .state
    }

    #[tokio::test]
    async fn test_tokens_keep_offsets() {
        let state = ExecutionState::for_task(&Task::new(TaskType::Extraction, " Ada  met Bob"));
        let update = TokenizeStage.run(&state).await.unwrap();
        assert_eq!(update.context["tokens"], json!(["Ada", "met", "Bob"]));
        assert_eq!(
            update.context["token_offsets"],
            json!([[1, 4], [6, 9], [10, 13]])
        );
    }

    #[tokio::test]
    async fn test_every_token_selected_on_high_draw() {
        let state = run_with(0.9, "Ada met Bob").await;
        let task = state.current_task.unwrap();
        let entities: Vec<Entity> = serde_json::from_str(task.output.as_deref().unwrap()).unwrap();

        assert_eq!(entities.len(), 3);
        assert!(entities.iter().all(|e| e.label == "MISC"));
        assert!((entities[0].confidence.unwrap() - 0.97).abs() < 1e-9);
        assert_eq!(entities[2].text, "Bob");
        assert_eq!((entities[2].start, entities[2].end), (8, 11));
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(state.context["summary"], json!({ "MISC": 3 }));
        assert_eq!(state.step, "aggregated");
    }

    #[tokio::test]
    async fn test_nothing_selected_on_low_draw() {
        let state = run_with(0.0, "Ada met Bob").await;
        let task = state.current_task.unwrap();
        assert_eq!(task.output.as_deref(), Some("[]"));
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(state.context["summary"], json!({}));
    }

    #[tokio::test]
    async fn test_empty_input_yields_no_entities() {
        let state = run_with(0.9, "").await;
        assert_eq!(state.context["tokens"], json!([]));
        assert_eq!(state.current_task.unwrap().output.as_deref(), Some("[]"));
    }
}
