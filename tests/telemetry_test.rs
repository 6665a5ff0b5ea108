//! Integration tests for telemetry initialization and span helpers.

use painters::model::{WorkerId, WorkerState};
use uuid::Uuid;

#[test]
fn telemetry_initializes_without_endpoint() {
    // A global subscriber can only be set once per process; a second
    // init in the same binary returns Err, which is acceptable here.
    let config = painters::telemetry::TelemetryConfig {
        endpoint: None,
        service_name: "painters-test".to_string(),
        log_level: "debug".to_string(),
    };
    if let Ok(guard) = painters::telemetry::init_telemetry(config) {
        assert!(!guard.is_exporting());
        guard.force_flush();
    }
}

#[test]
fn painter_span_records_transitions() {
    let span = painters::telemetry::painter::start_painter_span(WorkerId(1), &Uuid::new_v4());
    painters::telemetry::painter::record_state_transition(
        &span,
        WorkerState::Starting,
        WorkerState::Running,
    );
}
