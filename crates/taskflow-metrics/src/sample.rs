//! Per-execution metric samples

use serde::{Deserialize, Serialize};

/// One latency/throughput/error record, optionally carrying quality scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSample {
    /// Wall-clock execution time in milliseconds
    pub latency: f64,
    /// Tasks per second implied by `latency`
    pub throughput: f64,
    /// 0.0 for a successful execution, 1.0 for a failed one
    pub error_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recall: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f1_score: Option<f64>,
}

impl MetricSample {
    /// Sample for a completed execution. Throughput is `1000 / latency`, or
    /// 0 when the latency rounds to zero.
    pub fn success(latency_ms: f64, accuracy: Option<f64>) -> Self {
        let throughput = if latency_ms > 0.0 {
            1000.0 / latency_ms
        } else {
            0.0
        };
        Self {
            latency: latency_ms,
            throughput,
            error_rate: 0.0,
            accuracy,
            precision: None,
            recall: None,
            f1_score: None,
        }
    }

    pub fn failure(latency_ms: f64) -> Self {
        Self {
            latency: latency_ms,
            throughput: 0.0,
            error_rate: 1.0,
            accuracy: None,
            precision: None,
            recall: None,
            f1_score: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error_rate > 0.0
    }
}

/// Means over the retained samples. Optional fields are averaged only over
/// samples that define them and are absent when none do.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedMetrics {
    pub latency: f64,
    pub throughput: f64,
    pub error_rate: f64,
    pub accuracy: Option<f64>,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub sample_count: usize,
    pub error_count: usize,
    pub aggregate: AggregatedMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_throughput() {
        let sample = MetricSample::success(250.0, Some(0.8));
        assert_eq!(sample.throughput, 4.0);
        assert!(!sample.is_error());
        assert_eq!(MetricSample::success(0.0, None).throughput, 0.0);
    }

    #[test]
    fn test_failure_sample() {
        let sample = MetricSample::failure(12.0);
        assert_eq!(sample.throughput, 0.0);
        assert_eq!(sample.error_rate, 1.0);
        assert!(sample.is_error());
    }

    #[test]
    fn test_wire_names() {
        let mut sample = MetricSample::success(100.0, Some(0.9));
        sample.f1_score = Some(0.5);
        let value = serde_json::to_value(&sample).unwrap();
        assert_eq!(
            value,
            json!({
                "latency": 100.0,
                "throughput": 10.0,
                "errorRate": 0.0,
                "accuracy": 0.9,
                "f1Score": 0.5
            })
        );
    }
}
