//! Taskflow Core: Stage Graph, Pipeline Runner, and Data Model
//!
//! A task is executed by walking a [`StageGraph`] from `START` to `END`.
//! Each stage returns a partial [`StateUpdate`] that is folded into the
//! per-run [`ExecutionState`] by per-field reducers.
//!
//! ```text
//! Task → ExecutionState::for_task → PipelineRunner::run(CompiledGraph) → RunOutcome
//!                                        │
//!                          stage.run(&state) → StateUpdate → state.apply
//! ```

pub mod context;
pub mod data_model;
pub mod error;
pub mod graph;
pub mod rng;
pub mod runner;
pub mod stage;

pub use context::{Context, ExecutionState, StateUpdate};
pub use data_model::{Message, Role, Task, TaskStatus, TaskType};
pub use error::{Result, StageError, TaskflowError, ValidationFailure};
pub use graph::{CompiledGraph, GraphDescription, StageGraph, END, START};
pub use rng::{FixedRandom, RandomSource, SeededRandom, SharedRandom};
pub use runner::{PipelineRunner, RunOutcome, StageTrace};
pub use stage::{stage_fn, SharedStage, Stage};

/// Taskflow engine version
pub const TASKFLOW_VERSION: &str = "1.0.0";
