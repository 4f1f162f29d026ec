use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use taskflow_core::{ExecutionState, SharedRandom, SharedStage, Stage, StageError, StateUpdate};

/// Per-stage latency range in milliseconds, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedDelay {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl SimulatedDelay {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: max_ms.max(min_ms),
        }
    }

    /// Delay for a uniform draw in `[0, 1)`.
    pub fn sample(&self, draw: f64) -> Duration {
        let span = self.max_ms.saturating_sub(self.min_ms);
        let offset = (span.saturating_add(1) as f64 * draw).floor() as u64;
        Duration::from_millis(self.min_ms + offset.min(span))
    }
}

/// Sleeps for a sampled delay, then delegates to the wrapped stage.
pub struct DelayedStage {
    inner: SharedStage,
    delay: SimulatedDelay,
    rng: SharedRandom,
}

impl DelayedStage {
    pub fn new(inner: SharedStage, delay: SimulatedDelay, rng: SharedRandom) -> Self {
        Self { inner, delay, rng }
    }
}

#[async_trait]
impl Stage for DelayedStage {
    async fn run(&self, state: &ExecutionState) -> Result<StateUpdate, StageError> {
        let pause = self.delay.sample(self.rng.next_f64());
        if !pause.is_zero() {
            tracing::trace!(delay_ms = pause.as_millis() as u64, "simulated stage delay");
            tokio::time::sleep(pause).await;
        }
        self.inner.run(state).await
    }
}
