//! Prometheus exposition for `/metrics`
use prometheus::{Encoder, Gauge, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use taskflow_core::Task;
use taskflow_metrics::MetricsSummary;

/// Gauges mirror the orchestrator's aggregate at scrape time; the task
/// counter is incremented per request.
pub struct ApiMetrics {
    registry: Registry,
    latency_ms: Gauge,
    throughput: Gauge,
    error_rate: Gauge,
    accuracy: Gauge,
    samples: IntGauge,
    sample_errors: IntGauge,
    tasks_total: IntCounterVec,
}

impl ApiMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("taskflow".to_string()), None)?;

        let latency_ms = Gauge::new("latency_ms", "Mean task latency over retained samples")?;
        let throughput = Gauge::new("throughput", "Mean tasks per second over retained samples")?;
        let error_rate = Gauge::new("error_rate", "Mean error rate over retained samples")?;
        let accuracy = Gauge::new("accuracy", "Mean accuracy where defined; NaN when none")?;
        let samples = IntGauge::new("samples", "Metric samples currently retained")?;
        let sample_errors = IntGauge::new("sample_errors", "Retained samples from failed runs")?;
        let tasks_total = IntCounterVec::new(
            Opts::new("tasks_total", "Tasks executed through the API"),
            &["type", "status"],
        )?;

        registry.register(Box::new(latency_ms.clone()))?;
        registry.register(Box::new(throughput.clone()))?;
        registry.register(Box::new(error_rate.clone()))?;
        registry.register(Box::new(accuracy.clone()))?;
        registry.register(Box::new(samples.clone()))?;
        registry.register(Box::new(sample_errors.clone()))?;
        registry.register(Box::new(tasks_total.clone()))?;

        Ok(Self {
            registry,
            latency_ms,
            throughput,
            error_rate,
            accuracy,
            samples,
            sample_errors,
            tasks_total,
        })
    }

    pub fn observe_task(&self, task: &Task) {
        self.tasks_total
            .with_label_values(&[task.task_type.as_str(), task.status.as_str()])
            .inc();
    }

    /// Refresh the gauges from `summary` and render the text format.
    pub fn encode(&self, summary: &MetricsSummary) -> Result<String, prometheus::Error> {
        let aggregate = &summary.aggregate;
        self.latency_ms.set(aggregate.latency);
        self.throughput.set(aggregate.throughput);
        self.error_rate.set(aggregate.error_rate);
        self.accuracy.set(aggregate.accuracy.unwrap_or(f64::NAN));
        self.samples.set(summary.sample_count as i64);
        self.sample_errors.set(summary.error_count as i64);

        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskflow_core::{TaskStatus, TaskType};
    use taskflow_metrics::{MetricSample, MetricsRecorder};

    #[test]
    fn test_encode_reflects_summary() {
        let metrics = ApiMetrics::new().unwrap();
        let mut recorder = MetricsRecorder::default();
        recorder.record(MetricSample::success(100.0, Some(0.8)));
        recorder.record(MetricSample::failure(300.0));

        let mut task = Task::new(TaskType::Sentiment, "x");
        task.status = TaskStatus::Completed;
        metrics.observe_task(&task);

        let text = metrics.encode(&recorder.summary()).unwrap();
        assert!(text.contains("taskflow_latency_ms 200"));
        assert!(text.contains("taskflow_samples 2"));
        assert!(text.contains("taskflow_sample_errors 1"));
        let counter = text
            .lines()
            .find(|l| l.starts_with("taskflow_tasks_total{"))
            .unwrap();
        assert!(counter.contains(r#"type="sentiment""#));
        assert!(counter.contains(r#"status="completed""#));
        assert!(counter.ends_with(" 1"));
    }
}
