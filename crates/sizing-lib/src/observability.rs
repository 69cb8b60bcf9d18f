//! Observability infrastructure for the sizing engine
//!
//! Provides:
//! - Prometheus metrics (ingestion and query latency, dataset size, findings)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};

use crate::error::DataQualityError;

/// Histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<EngineMetricsInner> = OnceLock::new();

struct EngineMetricsInner {
    ingest_latency_seconds: Histogram,
    query_latency_seconds: Histogram,
    vms_loaded: IntGauge,
    queries_served: IntCounterVec,
    data_quality_findings: IntCounterVec,
    ingest_failures: IntCounter,
}

impl EngineMetricsInner {
    fn new() -> Self {
        Self {
            ingest_latency_seconds: register_histogram!(
                "rightsize_ingest_latency_seconds",
                "Time spent loading, normalizing and sizing a dataset",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register ingest_latency_seconds"),

            query_latency_seconds: register_histogram!(
                "rightsize_query_latency_seconds",
                "Time spent answering a filtered query",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register query_latency_seconds"),

            vms_loaded: register_int_gauge!(
                "rightsize_vms_loaded",
                "Number of VM records in the active dataset"
            )
            .expect("Failed to register vms_loaded"),

            queries_served: register_int_counter_vec!(
                "rightsize_queries_served_total",
                "Total number of queries served, by endpoint",
                &["endpoint"]
            )
            .expect("Failed to register queries_served"),

            data_quality_findings: register_int_counter_vec!(
                "rightsize_data_quality_findings_total",
                "Data-quality findings reported at ingestion, by kind",
                &["kind"]
            )
            .expect("Failed to register data_quality_findings"),

            ingest_failures: register_int_counter!(
                "rightsize_ingest_failures_total",
                "Total number of rejected datasets"
            )
            .expect("Failed to register ingest_failures"),
        }
    }
}

/// Engine metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the same
/// underlying metrics.
#[derive(Clone)]
pub struct EngineMetrics {
    _private: (),
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &EngineMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_ingest_latency(&self, duration_secs: f64) {
        self.inner().ingest_latency_seconds.observe(duration_secs);
    }

    pub fn observe_query_latency(&self, duration_secs: f64) {
        self.inner().query_latency_seconds.observe(duration_secs);
    }

    pub fn set_vms_loaded(&self, count: usize) {
        self.inner().vms_loaded.set(count as i64);
    }

    pub fn inc_queries_served(&self, endpoint: &str) {
        self.inner()
            .queries_served
            .with_label_values(&[endpoint])
            .inc();
    }

    /// Count findings by kind
    pub fn record_findings(&self, findings: &[DataQualityError]) {
        for finding in findings {
            self.inner()
                .data_quality_findings
                .with_label_values(&[finding_kind(finding)])
                .inc();
        }
    }

    pub fn inc_ingest_failures(&self) {
        self.inner().ingest_failures.inc();
    }
}

fn finding_kind(finding: &DataQualityError) -> &'static str {
    match finding {
        DataQualityError::DuplicateJoinKey { .. } => "duplicate_join_key",
        DataQualityError::PercentOutOfRange { .. } => "percent_out_of_range",
        DataQualityError::OrphanMetricRow { .. } => "orphan_metric_row",
    }
}

/// Structured logger for engine events
///
/// Consistent JSON-friendly fields for ingestion and query events.
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    /// Log a successfully built dataset
    pub fn log_dataset_loaded(&self, source: &str, vms: usize, findings: usize, elapsed_secs: f64) {
        info!(
            event = "dataset_loaded",
            instance = %self.instance,
            source = %source,
            vms = vms,
            findings = findings,
            elapsed_ms = elapsed_secs * 1000.0,
            "Dataset loaded"
        );
    }

    /// Log a rejected dataset
    pub fn log_schema_error(&self, source: &str, error: &dyn std::error::Error) {
        error!(
            event = "schema_error",
            instance = %self.instance,
            source = %source,
            error = %error,
            "Dataset rejected"
        );
    }

    /// Log a dataset refused by strict validation
    pub fn log_data_quality_rejected(&self, source: &str, findings: &[DataQualityError]) {
        for finding in findings {
            self.log_data_quality_issue(finding);
        }
        error!(
            event = "data_quality_rejected",
            instance = %self.instance,
            source = %source,
            findings = findings.len(),
            "Dataset rejected by strict validation"
        );
    }

    pub fn log_data_quality_issue(&self, finding: &DataQualityError) {
        if finding.is_informational() {
            info!(
                event = "data_quality_issue",
                instance = %self.instance,
                kind = finding_kind(finding),
                details = %finding,
                "Data quality note"
            );
        } else {
            warn!(
                event = "data_quality_issue",
                instance = %self.instance,
                kind = finding_kind(finding),
                details = %finding,
                "Data quality issue"
            );
        }
    }

    pub fn log_query_served(&self, endpoint: &str, rows: usize, elapsed_secs: f64) {
        info!(
            event = "query_served",
            instance = %self.instance,
            endpoint = %endpoint,
            rows = rows,
            elapsed_ms = elapsed_secs * 1000.0,
            "Query served"
        );
    }

    pub fn log_startup(&self, version: &str, addr: &str) {
        info!(
            event = "server_started",
            instance = %self.instance,
            version = %version,
            addr = %addr,
            "Right-sizing server started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "server_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Right-sizing server shutting down"
        );
    }
}
