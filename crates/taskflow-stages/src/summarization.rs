use crate::{context_list, current_task, to_json, StageOptions};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;
use std::sync::Arc;
use taskflow_core::{
    ExecutionState, Result, SharedRandom, Stage, StageError, StageGraph, StateUpdate, TaskStatus,
};

lazy_static! {
    static ref SENTENCE_END: Regex = Regex::new(r"[.!?]+").unwrap();
}

const KEEP_THRESHOLD: f64 = 0.6;
const KEEP_FRACTION: f64 = 0.3;

/// Splits the input into trimmed, non-empty sentences.
pub struct ChunkTextStage;

#[async_trait]
impl Stage for ChunkTextStage {
    async fn run(&self, state: &ExecutionState) -> std::result::Result<StateUpdate, StageError> {
        let input = state.input();
        let sentences: Vec<&str> = SENTENCE_END
            .split(input)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        Ok(StateUpdate::new()
            .context("sentences", to_json(&sentences)?)
            .context("originalLength", json!(input.chars().count()))
            .step("chunked"))
    }
}

pub struct ExtractKeySentencesStage {
    rng: SharedRandom,
}

#[async_trait]
impl Stage for ExtractKeySentencesStage {
    async fn run(&self, state: &ExecutionState) -> std::result::Result<StateUpdate, StageError> {
        let sentences: Vec<String> = context_list(state, "sentences")?;
        let limit = ((sentences.len() as f64 * KEEP_FRACTION).floor() as usize).max(1);

        let mut key: Vec<String> = sentences
            .iter()
            .filter(|_| self.rng.next_f64() > KEEP_THRESHOLD)
            .take(limit)
            .cloned()
            .collect();
        if key.is_empty() {
            key.extend(sentences.first().cloned());
        }

        Ok(StateUpdate::new()
            .context("keySentences", to_json(&key)?)
            .step("key_sentences_extracted"))
    }
}

pub struct GenerateSummaryStage;

#[async_trait]
impl Stage for GenerateSummaryStage {
    async fn run(&self, state: &ExecutionState) -> std::result::Result<StateUpdate, StageError> {
        let mut task = current_task(state)?;
        let key: Vec<String> = context_list(state, "keySentences")?;
        let summary = if key.is_empty() {
            String::new()
        } else {
            format!("{}.", key.join(". "))
        };

        task.output = Some(summary.clone());
        Ok(StateUpdate::new()
            .context("summary", json!(summary))
            .task(task)
            .step("summary_generated"))
    }
}

/// Scores the summary by its compression against the original input.
pub struct RefineSummaryStage;

#[async_trait]
impl Stage for RefineSummaryStage {
    async fn run(&self, state: &ExecutionState) -> std::result::Result<StateUpdate, StageError> {
        let mut task = current_task(state)?;
        let summary_len = task.output.as_deref().unwrap_or_default().chars().count();
        let original_len = state
            .context_value("originalLength")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        let ratio = if original_len == 0 {
            1.0
        } else {
            summary_len as f64 / original_len as f64
        };
        task.confidence = Some(if ratio < 0.5 { 0.9 } else { 0.7 });
        task.status = TaskStatus::Completed;

        Ok(StateUpdate::new()
            .context("compressionRatio", json!(ratio))
            .task(task)
            .step("summary_refined")
            .processing(false))
    }
}

/// `chunk_text → extract_key_sentences → generate_summary → refine_summary`
pub fn summarization_pipeline(options: &StageOptions) -> Result<StageGraph> {
    let graph = StageGraph::new("summarization")
        .add_stage("chunk_text", options.wrap(Arc::new(ChunkTextStage)))?
        .add_stage(
            "extract_key_sentences",
            options.wrap(Arc::new(ExtractKeySentencesStage {
                rng: options.rng.clone(),
            })),
        )?
        .add_stage("generate_summary", options.wrap(Arc::new(GenerateSummaryStage)))?
        .add_stage("refine_summary", options.wrap(Arc::new(RefineSummaryStage)))?;

    Ok(graph.linear(&[
        "chunk_text",
        "extract_key_sentences",
        "generate_summary",
        "refine_summary",
    ]))
}
