//! Bounded metrics recorder

use crate::sample::{AggregatedMetrics, MetricSample, MetricsSummary};
use std::collections::VecDeque;

pub const DEFAULT_CAPACITY: usize = 1000;

/// Keeps the most recent `capacity` samples, evicting oldest first.
#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    samples: VecDeque<MetricSample>,
    capacity: usize,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl MetricsRecorder {
    /// `capacity` is raised to at least 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn record(&mut self, sample: MetricSample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Retained samples, most recent last.
    pub fn snapshot(&self) -> Vec<MetricSample> {
        self.samples.iter().cloned().collect()
    }

    pub fn aggregate(&self) -> AggregatedMetrics {
        if self.samples.is_empty() {
            return AggregatedMetrics::default();
        }

        let count = self.samples.len() as f64;
        AggregatedMetrics {
            latency: self.samples.iter().map(|s| s.latency).sum::<f64>() / count,
            throughput: self.samples.iter().map(|s| s.throughput).sum::<f64>() / count,
            error_rate: self.samples.iter().map(|s| s.error_rate).sum::<f64>() / count,
            accuracy: self.optional_mean(|s| s.accuracy),
            precision: self.optional_mean(|s| s.precision),
            recall: self.optional_mean(|s| s.recall),
            f1_score: self.optional_mean(|s| s.f1_score),
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            sample_count: self.samples.len(),
            error_count: self.samples.iter().filter(|s| s.is_error()).count(),
            aggregate: self.aggregate(),
        }
    }

    fn optional_mean(&self, field: impl Fn(&MetricSample) -> Option<f64>) -> Option<f64> {
        let values: Vec<f64> = self.samples.iter().filter_map(field).collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }
}
