use std::net::SocketAddr;

use crate::engine::EngineError;
use crate::model::{FreeCounts, OpKind, SkipReason, SpotClass};

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: lot operations. Labels: op, status (ok | validation | exhausted | conflict).
pub const OPERATIONS_TOTAL: &str = "parkline_operations_total";

/// Counter: check-in tickets consumed without effect. Labels: reason.
pub const CHECK_INS_SKIPPED_TOTAL: &str = "parkline_check_ins_skipped_total";

/// Counter: undo requests. Labels: kind, status.
pub const UNDO_TOTAL: &str = "parkline_undo_total";

/// Counter: fees charged at check-out, in currency units.
pub const FEES_CHARGED_TOTAL: &str = "parkline_fees_charged_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: free spots in a lot. Labels: class.
pub const FREE_SPOTS: &str = "parkline_free_spots";

/// Gauge: valid tickets waiting in a lot's admission queue.
pub const PENDING_CHECK_INS: &str = "parkline_pending_check_ins";

/// Gauge: number of lots held by the lot manager.
pub const LOTS_ACTIVE: &str = "parkline_lots_active";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Install the fmt subscriber. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().try_init();
}

/// Status label for an operation result.
pub fn status_label<T>(result: &Result<T, EngineError>) -> &'static str {
    use crate::engine::ErrorKind;
    match result {
        Ok(_) => "ok",
        Err(e) => match e.kind() {
            ErrorKind::Validation => "validation",
            ErrorKind::Exhausted => "exhausted",
            ErrorKind::Conflict => "conflict",
        },
    }
}

pub(crate) fn record_operation<T>(op: &'static str, result: &Result<T, EngineError>) {
    if let Err(e) = result {
        tracing::debug!("{op} rejected: {e}");
    }
    metrics::counter!(OPERATIONS_TOTAL, "op" => op, "status" => status_label(result)).increment(1);
}

pub(crate) fn record_lot_gauges(free: FreeCounts, pending: usize) {
    for class in SpotClass::ALL {
        metrics::gauge!(FREE_SPOTS, "class" => class.label()).set(free.get(class) as f64);
    }
    metrics::gauge!(PENDING_CHECK_INS).set(pending as f64);
}

pub(crate) fn record_skip(reason: SkipReason) {
    let reason = match reason {
        SkipReason::Withdrawn => "withdrawn",
        SkipReason::ReservationState => "reservation_state",
        SkipReason::SpotState => "spot_state",
    };
    metrics::counter!(CHECK_INS_SKIPPED_TOTAL, "reason" => reason).increment(1);
}

pub(crate) fn record_undo<T>(kind: Option<OpKind>, result: &Result<T, EngineError>) {
    let kind = kind.map_or("none", |k| k.label());
    metrics::counter!(UNDO_TOTAL, "kind" => kind, "status" => status_label(result)).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels_follow_error_kind() {
        assert_eq!(status_label::<()>(&Ok(())), "ok");
        assert_eq!(status_label::<()>(&Err(EngineError::EmptyUser)), "validation");
        assert_eq!(status_label::<()>(&Err(EngineError::QueueEmpty)), "exhausted");
        assert_eq!(status_label::<()>(&Err(EngineError::NothingToUndo)), "exhausted");
        assert_eq!(
            status_label::<()>(&Err(EngineError::NotFound(ulid::Ulid::new()))),
            "conflict"
        );
    }

    #[test]
    fn init_without_port_is_noop() {
        assert!(init(None).is_ok());
        init_tracing();
        init_tracing();
    }
}
