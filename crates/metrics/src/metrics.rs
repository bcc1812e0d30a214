use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};

lazy_static! {
    // ═══════════════════════════════════════════════════════════════════════════
    // QUOTE METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Total number of delivery-fee quotes calculated
    pub static ref QUOTES_CALCULATED: IntCounter = register_int_counter!(
        "coursemax_quotes_calculated_total",
        "Total number of delivery-fee quotes calculated"
    )
    .unwrap();

    /// Total number of quote requests that failed, by failure kind
    pub static ref QUOTE_FAILURES: IntCounterVec = register_int_counter_vec!(
        "coursemax_quote_failures_total",
        "Total quote failures by kind",
        &["kind"]
    )
    .unwrap();

    /// Latency of the full quote flow (geocode + route + pricing) in seconds
    pub static ref QUOTE_DURATION: Histogram = register_histogram!(
        "coursemax_quote_duration_seconds",
        "Latency of delivery-fee quote calculation",
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // ═══════════════════════════════════════════════════════════════════════════
    // CHECKOUT METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Total number of receipts calculated at checkout
    pub static ref RECEIPTS_CALCULATED: IntCounter = register_int_counter!(
        "coursemax_receipts_calculated_total",
        "Total number of receipts calculated"
    )
    .unwrap();

    // ═══════════════════════════════════════════════════════════════════════════
    // DISPATCH METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Total number of driver assignments created
    pub static ref ASSIGNMENTS_CREATED: IntCounter = register_int_counter!(
        "coursemax_assignments_created_total",
        "Total number of driver assignments created"
    )
    .unwrap();

    /// Total number of assignments accepted by a driver
    pub static ref ASSIGNMENTS_ACCEPTED: IntCounter = register_int_counter!(
        "coursemax_assignments_accepted_total",
        "Total number of assignments accepted"
    )
    .unwrap();

    /// Acceptance attempts that lost the race or arrived late, by outcome
    pub static ref ACCEPT_REJECTIONS: IntCounterVec = register_int_counter_vec!(
        "coursemax_accept_rejections_total",
        "Acceptance attempts that did not claim the batch, by outcome",
        &["outcome"]
    )
    .unwrap();

    /// Total number of assignments transitioned by the expiry sweep
    pub static ref ASSIGNMENTS_EXPIRED: IntCounter = register_int_counter!(
        "coursemax_assignments_expired_total",
        "Total number of assignments expired by the sweep"
    )
    .unwrap();
}

/// Export all registered metrics in Prometheus text format.
pub fn export_metrics() -> Result<String, prometheus::Error> {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_register_and_increment() {
        let before = ASSIGNMENTS_ACCEPTED.get();
        ASSIGNMENTS_ACCEPTED.inc();
        assert_eq!(ASSIGNMENTS_ACCEPTED.get(), before + 1);

        ACCEPT_REJECTIONS.with_label_values(&["already_taken"]).inc();
    }

    #[test]
    fn test_export_contains_namespace() {
        QUOTES_CALCULATED.inc();
        let exported = export_metrics().unwrap();
        assert!(exported.contains("coursemax_quotes_calculated_total"));
    }
}
