//! Metric instrument factories for painters.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! Without an OTLP endpoint the global provider is a no-op.

use opentelemetry::metrics::{Counter, Meter};

fn meter() -> Meter {
    opentelemetry::global::meter("painters")
}

/// Counter: shapes applied to the canvas.
/// Labels: `worker_id`.
pub fn shapes_drawn() -> Counter<u64> {
    meter()
        .u64_counter("painters.shapes.drawn")
        .with_description("Number of shapes applied to the canvas")
        .build()
}

/// Counter: sub-task lifecycle events.
/// Labels: `event` ("started" | "start_failed" | "canceled" | "exited").
pub fn subtask_events() -> Counter<u64> {
    meter()
        .u64_counter("painters.subtask.events")
        .with_description("Sub-task lifecycle events")
        .build()
}

/// Counter: painters that reached `terminated`.
/// Labels: `status`.
pub fn worker_terminations() -> Counter<u64> {
    meter()
        .u64_counter("painters.worker.terminations")
        .with_description("Number of painters that terminated")
        .build()
}

/// Counter: supervisor snapshot rounds.
pub fn snapshot_rounds() -> Counter<u64> {
    meter()
        .u64_counter("painters.supervisor.snapshots")
        .with_description("Number of canvas snapshots printed")
        .build()
}
