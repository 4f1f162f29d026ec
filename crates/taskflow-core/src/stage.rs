//! Stage Trait: the single contract every pipeline stage implements
use crate::context::{ExecutionState, StateUpdate};
use crate::error::StageError;
use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// A named unit of work inside a stage graph.
///
/// A stage reads the current execution state and returns a partial update.
/// Returning `Err` aborts the run; the runner does not retry.
#[async_trait]
pub trait Stage: Send + Sync {
    async fn run(&self, state: &ExecutionState) -> Result<StateUpdate, StageError>;
}

pub type SharedStage = Arc<dyn Stage>;

/// Adapter turning an async closure into a [`Stage`].
pub struct FnStage<F, Fut> {
    f: F,
    _marker: PhantomData<fn() -> Fut>,
}

#[async_trait]
impl<F, Fut> Stage for FnStage<F, Fut>
where
    F: Fn(ExecutionState) -> Fut + Send + Sync,
    Fut: Future<Output = Result<StateUpdate, StageError>> + Send,
{
    async fn run(&self, state: &ExecutionState) -> Result<StateUpdate, StageError> {
        (self.f)(state.clone()).await
    }
}

/// Wrap an async closure as a shared stage. The closure receives its own
/// copy of the state.
///
/// ```ignore
/// let stage = stage_fn(|state| async move {
///     Ok(StateUpdate::new().step("seen").context("len", json!(state.input().len())))
/// });
/// ```
pub fn stage_fn<F, Fut>(f: F) -> SharedStage
where
    F: Fn(ExecutionState) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<StateUpdate, StageError>> + Send + 'static,
{
    Arc::new(FnStage {
        f,
        _marker: PhantomData,
    })
}
