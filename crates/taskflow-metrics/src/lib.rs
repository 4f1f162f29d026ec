//! Taskflow Metrics: execution samples and a bounded recorder
//!
//! One [`MetricSample`] is recorded per task execution. The
//! [`MetricsRecorder`] retains the newest samples up to its capacity and
//! computes running means on demand.
//!
//! # Example
//!
//! ```
//! use taskflow_metrics::{MetricSample, MetricsRecorder};
//!
//! let mut recorder = MetricsRecorder::default();
//! recorder.record(MetricSample::success(120.0, Some(0.9)));
//! recorder.record(MetricSample::failure(40.0));
//!
//! let aggregate = recorder.aggregate();
//! assert_eq!(aggregate.error_rate, 0.5);
//! assert_eq!(aggregate.accuracy, Some(0.9));
//! ```

pub mod recorder;
pub mod sample;

pub use recorder::{MetricsRecorder, DEFAULT_CAPACITY};
pub use sample::{AggregatedMetrics, MetricSample, MetricsSummary};
