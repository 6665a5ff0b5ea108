//! Painter span helpers.
//!
//! Every painter runs inside a `painter.run` span; lifecycle transitions are
//! recorded as events on it.

use crate::model::{WorkerId, WorkerState};
use tracing::Span;
use uuid::Uuid;

/// Start a span for one painter's lifetime.
///
/// The `painter.state` field is declared empty and updated by
/// [`record_state_transition`].
pub fn start_painter_span(worker_id: WorkerId, identifier: &Uuid) -> Span {
    tracing::info_span!(
        "painter.run",
        "painter.id" = worker_id.0,
        "painter.identifier" = %identifier,
        "painter.state" = tracing::field::Empty,
    )
}

/// Record a state transition on the painter span.
pub fn record_state_transition(span: &Span, from: WorkerState, to: WorkerState) {
    span.record("painter.state", tracing::field::display(to));
    span.in_scope(|| {
        tracing::debug!(from = %from, to = %to, "state_transition");
    });
}
