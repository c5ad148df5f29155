use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder,
    HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    pub static ref RATE_LIMITED_REQUESTS_TOTAL: IntCounter = register_int_counter!(
        "rate_limited_requests_total",
        "Requests rejected by the fixed-window rate limiter"
    )
    .unwrap();

    // Score ledger
    pub static ref LEDGER_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "ledger_operations_total",
        "Total number of score ledger operations",
        &["operation", "status"]
    )
    .unwrap();

    pub static ref LEDGER_OPERATION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "ledger_operation_duration_seconds",
        "Score ledger operation duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .unwrap();

    // Business Metrics
    pub static ref PUZZLES_SERVED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "puzzles_served_total",
        "Total number of puzzles served",
        &["kind"]
    )
    .unwrap();

    pub static ref ANSWERS_VALIDATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "answers_validated_total",
        "Total number of answers validated",
        &["correct"]
    )
    .unwrap();

    pub static ref SYNC_ENTRIES_RECEIVED_TOTAL: IntCounter = register_int_counter!(
        "sync_entries_received_total",
        "Activity entries received through batch sync"
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

/// Helper: track score ledger operation with metrics
pub async fn track_ledger_operation<F, T>(operation: &str, future: F) -> Result<T, anyhow::Error>
where
    F: std::future::Future<Output = Result<T, anyhow::Error>>,
{
    let start = std::time::Instant::now();
    let result = future.await;
    let duration = start.elapsed().as_secs_f64();

    let status = if result.is_ok() { "success" } else { "error" };

    LEDGER_OPERATIONS_TOTAL
        .with_label_values(&[operation, status])
        .inc();

    LEDGER_OPERATION_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration);

    result
}
