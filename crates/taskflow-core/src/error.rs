//! Unified Error Model
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskflowError {
    /// A graph references an undeclared stage, or a stage was declared twice.
    #[error("CONFIG/{0}")]
    Configuration(String),

    /// Structural problem found while compiling a graph.
    #[error("GRAPH/{0}")]
    GraphValidation(String),

    #[error("TASK/Unknown task type: {0}")]
    UnknownTaskType(String),

    #[error("STAGE/{stage}: {source}")]
    StageExecution {
        stage: String,
        #[source]
        source: StageError,
    },
}

impl TaskflowError {
    pub fn stage(stage: impl Into<String>, source: StageError) -> Self {
        Self::StageExecution {
            stage: stage.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TaskflowError>;

/// Error returned by a stage handler. Aborts the run it occurs in.
#[derive(Debug, Clone, PartialEq)]
pub enum StageError {
    ExecutionFailed(String),
    MissingTask,
    InvalidRoute { route: String, allowed: Vec<String> },
}

impl std::fmt::Display for StageError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::ExecutionFailed(msg) => write!(f, "EXEC: {}", msg),
            Self::MissingTask => write!(f, "EXEC: no task in execution state"),
            Self::InvalidRoute { route, allowed } => {
                write!(f, "ROUTE: '{}' is not one of [{}]", route, allowed.join(", "))
            }
        }
    }
}

impl std::error::Error for StageError {}

/// A stage rejecting its own result. This is an expected outcome recorded in
/// the execution context (the task ends with status `error`), not a fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub stage: String,
    pub reason: String,
}

impl ValidationFailure {
    pub fn new(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            reason: reason.into(),
        }
    }
}
