use taskflow_core::{TaskType, TaskflowError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("CONFIG/read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CONFIG/yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CONFIG/env {key}='{value}': {reason}")]
    Env {
        key: String,
        value: String,
        reason: String,
    },
}

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("ORCHESTRATOR/build: {0}")]
    Build(#[from] TaskflowError),

    #[error("ORCHESTRATOR/graph '{task_type}': {source}")]
    Graph {
        task_type: TaskType,
        #[source]
        source: TaskflowError,
    },
}
