// crates/observability/src/lib.rs

use std::time::Instant;

use maitre_core::{MaitreError, MaitreResult};
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

pub mod metrics;

pub use metrics::MetricType;

/// Request counters behind a private registry, exposed in Prometheus text
/// format on `/metrics`.
pub struct MetricsCollector {
    registry: Registry,
    interpret_requests: IntCounter,
    transcriptions_completed: IntCounter,
    transcriptions_failed: IntCounter,
    validations_accepted: IntCounter,
    validations_rejected: IntCounter,
    start_time: Instant,
}

impl MetricsCollector {
    pub fn new() -> Self {
        let registry = Registry::new();

        let counter = |name: &str, help: &str| {
            let counter =
                IntCounter::new(name, help).expect("Failed to create Prometheus counter");
            registry
                .register(Box::new(counter.clone()))
                .expect("Failed to register Prometheus counter");
            counter
        };

        Self {
            interpret_requests: counter(
                "maitre_interpret_requests_total",
                "Conversations interpreted",
            ),
            transcriptions_completed: counter(
                "maitre_transcriptions_completed_total",
                "Audio uploads transcribed successfully",
            ),
            transcriptions_failed: counter(
                "maitre_transcriptions_failed_total",
                "Audio uploads that failed to transcribe",
            ),
            validations_accepted: counter(
                "maitre_validations_accepted_total",
                "Special requests accepted",
            ),
            validations_rejected: counter(
                "maitre_validations_rejected_total",
                "Special requests rejected",
            ),
            registry,
            start_time: Instant::now(),
        }
    }

    pub fn increment(&self, metric: MetricType) {
        match metric {
            MetricType::InterpretRequests => self.interpret_requests.inc(),
            MetricType::TranscriptionsCompleted => self.transcriptions_completed.inc(),
            MetricType::TranscriptionsFailed => self.transcriptions_failed.inc(),
            MetricType::ValidationsAccepted => self.validations_accepted.inc(),
            MetricType::ValidationsRejected => self.validations_rejected.inc(),
        }
    }

    pub fn get(&self, metric: MetricType) -> u64 {
        match metric {
            MetricType::InterpretRequests => self.interpret_requests.get(),
            MetricType::TranscriptionsCompleted => self.transcriptions_completed.get(),
            MetricType::TranscriptionsFailed => self.transcriptions_failed.get(),
            MetricType::ValidationsAccepted => self.validations_accepted.get(),
            MetricType::ValidationsRejected => self.validations_rejected.get(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn render(&self) -> MaitreResult<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| MaitreError::Unknown(format!("Failed to encode metrics: {}", e)))?;
        String::from_utf8(buffer)
            .map_err(|e| MaitreError::Unknown(format!("Metrics are not valid UTF-8: {}", e)))
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
