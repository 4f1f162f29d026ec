//! Taskflow Orchestrator: task execution façade
//!
//! ```text
//! Task ─► TaskOrchestrator::execute_task
//!            │ registry lookup by task type
//!            │ compile ─► PipelineRunner::run
//!            │ merge final state into the caller's task
//!            └ record one MetricSample
//! ```
//!
//! # Example
//!
//! ```ignore
//! use taskflow_orchestrator::{OrchestratorConfig, TaskOrchestrator};
//! use taskflow_core::{Task, TaskType};
//!
//! let orchestrator = TaskOrchestrator::new(OrchestratorConfig::default())?;
//! let result = orchestrator
//!     .execute_task(&Task::new(TaskType::Summarization, "One. Two. Three."))
//!     .await;
//! println!("{:?} {:?}", result.status, result.output);
//! ```

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod registry;

pub use config::OrchestratorConfig;
pub use error::{ConfigError, OrchestratorError};
pub use orchestrator::TaskOrchestrator;
pub use registry::GraphRegistry;
