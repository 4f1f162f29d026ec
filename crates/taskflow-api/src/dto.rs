//! Request and response bodies

use crate::error::ApiError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use taskflow_core::data_model::generate_task_id;
use taskflow_core::{Task, TaskStatus, TaskType, TaskflowError};

/// A task submission. `type` is kept as a string so an unknown name is a
/// client error rather than a body rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub task_type: String,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl TaskRequest {
    pub fn into_task(self) -> Result<Task, ApiError> {
        self.into_slot().map_err(|(_, e)| ApiError::InvalidArgument(e.to_string()))
    }

    fn into_slot(self) -> Result<Task, (Self, TaskflowError)> {
        let task_type: TaskType = match self.task_type.parse() {
            Ok(task_type) => task_type,
            Err(e) => return Err((self, e)),
        };

        let mut task = Task::new(task_type, self.input);
        if let Some(id) = self.id {
            task = task.with_id(id);
        }
        task.metadata.extend(self.metadata);
        Ok(task)
    }

    fn reject(self, error: TaskflowError) -> RejectedTask {
        let now = Utc::now();
        let mut metadata = self.metadata;
        metadata
            .entry("createdAt".to_string())
            .or_insert_with(|| Value::String(now.to_rfc3339()));
        metadata.insert("error".to_string(), Value::String(error.to_string()));
        metadata.insert("executionTime".to_string(), Value::from(0u64));

        RejectedTask {
            id: self.id.unwrap_or_else(|| generate_task_id(now)),
            task_type: self.task_type,
            input: self.input,
            status: TaskStatus::Error,
            metadata,
        }
    }
}

/// A batch element whose `type` names no graph. It never reaches the
/// orchestrator and is reported as an error task at its position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedTask {
    pub id: String,
    #[serde(rename = "type")]
    pub task_type: String,
    pub input: String,
    pub status: TaskStatus,
    pub metadata: HashMap<String, Value>,
}

#[derive(Debug, Clone)]
pub enum BatchSlot {
    Run(Task),
    Rejected(RejectedTask),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub tasks: Vec<TaskRequest>,
}

impl BatchRequest {
    /// One slot per submitted element, in order. Unknown types become
    /// rejections instead of failing the whole batch.
    pub fn into_slots(self) -> Vec<BatchSlot> {
        self.tasks
            .into_iter()
            .map(|request| match request.into_slot() {
                Ok(task) => BatchSlot::Run(task),
                Err((request, e)) => BatchSlot::Rejected(request.reject(e)),
            })
            .collect()
    }
}

/// Tasks to hand to the orchestrator, in slot order.
pub fn runnable(slots: &[BatchSlot]) -> Vec<Task> {
    slots
        .iter()
        .filter_map(|slot| match slot {
            BatchSlot::Run(task) => Some(task.clone()),
            BatchSlot::Rejected(_) => None,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchResult {
    Executed(Task),
    Rejected(RejectedTask),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResponse {
    pub results: Vec<BatchResult>,
}

impl BatchResponse {
    /// Put executed tasks back between the rejections, in submission order.
    pub fn merge(slots: Vec<BatchSlot>, executed: Vec<Task>) -> Self {
        let mut executed = executed.into_iter();
        let results = slots
            .into_iter()
            .filter_map(|slot| match slot {
                BatchSlot::Run(_) => executed.next().map(BatchResult::Executed),
                BatchSlot::Rejected(rejected) => Some(BatchResult::Rejected(rejected)),
            })
            .collect();
        Self { results }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphsResponse {
    pub graphs: Vec<TaskType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` when every graph compiles, `degraded` otherwise
    pub status: String,
    pub version: String,
    pub graphs: BTreeMap<TaskType, bool>,
}

impl HealthResponse {
    pub fn from_graphs(graphs: BTreeMap<TaskType, bool>) -> Self {
        let status = if graphs.values().all(|healthy| *healthy) {
            "ok"
        } else {
            "degraded"
        };
        Self {
            status: status.to_string(),
            version: taskflow_core::TASKFLOW_VERSION.to_string(),
            graphs,
        }
    }
}
