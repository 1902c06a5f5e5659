// crates/observability/src/metrics.rs

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    InterpretRequests,
    TranscriptionsCompleted,
    TranscriptionsFailed,
    ValidationsAccepted,
    ValidationsRejected,
}
