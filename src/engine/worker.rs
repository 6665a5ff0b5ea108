//! Painter lifecycle: start a sub-task, draw until the budget runs out or the
//! supervisor cancels, then drain the sub-task and report.

use super::cancel::CancelSignal;
use super::subtask::SubTask;
use crate::canvas::Canvas;
use crate::config::Config;
use crate::drawer::ShapeDrawer;
use crate::error::{Error, Result};
use crate::model::{
    DrainReason, SubTaskOutcome, TerminationStatus, WorkerId, WorkerReport, WorkerState,
};
use crate::telemetry::metrics;
use crate::telemetry::painter::{record_state_transition, start_painter_span};
use opentelemetry::KeyValue;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{Instrument, Span, debug, info, warn};
use uuid::Uuid;

/// Supervisor-side handle to a launched painter.
pub struct WorkerHandle {
    id: WorkerId,
    identifier: Uuid,
    launched_at: Instant,
    cancel: CancelSignal,
    state: watch::Receiver<WorkerState>,
    shapes_drawn: Arc<AtomicU64>,
    task: JoinHandle<WorkerReport>,
}

impl WorkerHandle {
    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn identifier(&self) -> Uuid {
        self.identifier
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// A receiver that sees every later state change.
    pub fn subscribe_state(&self) -> watch::Receiver<WorkerState> {
        self.state.clone()
    }

    /// Shapes applied so far. Final once the painter has left `Running`.
    pub fn shapes_drawn(&self) -> u64 {
        self.shapes_drawn.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished() || self.state().is_terminal()
    }

    /// Ask the painter to stop after its current shape. Returns `false`
    /// when it had already terminated or was already canceled.
    pub fn cancel(&self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.cancel.cancel()
    }

    /// Wait until the painter has left `Starting`.
    pub async fn started(&self) {
        let mut rx = self.state.clone();
        let _ = rx.wait_for(|s| *s != WorkerState::Starting).await;
    }

    /// Wait for the painter to terminate and collect its report.
    pub async fn join(self) -> WorkerReport {
        match self.task.await {
            Ok(report) => report,
            Err(e) => {
                warn!(worker_id = %self.id, error = %e, "painter task died");
                WorkerReport {
                    worker_id: self.id,
                    identifier: self.identifier,
                    status: TerminationStatus::Panicked {
                        error: e.to_string(),
                    },
                    shapes_drawn: self.shapes_drawn.load(Ordering::Acquire),
                    subtasks_canceled: 0,
                    subtask: SubTaskOutcome::None,
                    elapsed_ms: self.launched_at.elapsed().as_millis() as u64,
                }
            }
        }
    }
}

/// A painter's own state, moved into its task.
pub struct Worker {
    id: WorkerId,
    identifier: Uuid,
    canvas: Canvas,
    config: Arc<Config>,
    drawer: ShapeDrawer,
    cancel: CancelSignal,
    state: watch::Sender<WorkerState>,
    shapes_drawn: Arc<AtomicU64>,
    span: Span,
}

impl Worker {
    /// Launch a painter on the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// `Error::WorkerLaunch` when called outside a runtime.
    pub fn spawn(id: WorkerId, canvas: Canvas, config: Arc<Config>) -> Result<WorkerHandle> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| Error::WorkerLaunch {
            id,
            reason: e.to_string(),
        })?;

        let identifier = Uuid::new_v4();
        let cancel = CancelSignal::new();
        let (state_tx, state_rx) = watch::channel(WorkerState::Starting);
        let drawer = ShapeDrawer::for_worker(id, canvas.width(), canvas.height(), config.seed);
        let span = start_painter_span(id, &identifier);
        let shapes_drawn = Arc::new(AtomicU64::new(0));

        let worker = Worker {
            id,
            identifier,
            canvas,
            config,
            drawer,
            cancel: cancel.clone(),
            state: state_tx,
            shapes_drawn: Arc::clone(&shapes_drawn),
            span: span.clone(),
        };
        let task = runtime.spawn(worker.run().instrument(span));

        Ok(WorkerHandle {
            id,
            identifier,
            launched_at: Instant::now(),
            cancel,
            state: state_rx,
            shapes_drawn,
            task,
        })
    }

    async fn run(mut self) -> WorkerReport {
        let started = Instant::now();

        let (subtask, start_failure) = match SubTask::spawn(self.id, &self.config.subtask) {
            Ok(task) => (Some(task), None),
            Err(e) => {
                warn!(worker_id = %self.id, error = %e, "painter continues without sub-task");
                metrics::subtask_events().add(1, &[KeyValue::new("event", "start_failed")]);
                (None, Some(e.to_string()))
            }
        };
        self.transition(WorkerState::Running);

        let deadline = started + self.config.worker_duration();
        let (pause_min, pause_max) = self.config.draw_interval();
        let mut subtasks_canceled = 0u32;

        let reason = loop {
            if self.cancel.is_cancelled() {
                break DrainReason::Canceled;
            }
            if Instant::now() >= deadline {
                break DrainReason::Expired;
            }

            self.drawer.apply_random_shape(&self.canvas);
            self.shapes_drawn.fetch_add(1, Ordering::Release);

            if let Some(task) = subtask.as_ref()
                && task.is_alive()
                && self.drawer.rng().f64() < self.config.subtask_cancel_probability
                && task.cancel()
            {
                info!(worker_id = %self.id, pid = task.pid(), "painter canceled its sub-task");
                subtasks_canceled += 1;
            }

            let pause = random_between(self.drawer.rng(), pause_min, pause_max);
            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = self.cancel.cancelled() => {}
            }
        };

        self.transition(WorkerState::Draining);
        let shapes_drawn = self.shapes_drawn.load(Ordering::Acquire);
        info!(worker_id = %self.id, reason = %reason, shapes_drawn, "painter draining");

        let subtask = match (subtask, start_failure) {
            (Some(task), _) => {
                if task.cancel() {
                    debug!(worker_id = %self.id, "forwarded cancellation to sub-task");
                }
                SubTaskOutcome::Finished {
                    exit: task.join().await,
                }
            }
            (None, Some(error)) => SubTaskOutcome::StartFailed { error },
            (None, None) => SubTaskOutcome::None,
        };

        self.transition(WorkerState::Terminated);
        let status = TerminationStatus::from(reason);
        info!(worker_id = %self.id, status = %status, "painter terminated");
        metrics::worker_terminations().add(1, &[KeyValue::new("status", status.to_string())]);

        WorkerReport {
            worker_id: self.id,
            identifier: self.identifier,
            status,
            shapes_drawn,
            subtasks_canceled,
            subtask,
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }

    fn transition(&self, to: WorkerState) {
        let from = *self.state.borrow();
        debug_assert!(from.can_transition_to(to), "{from} -> {to}");
        self.state.send_replace(to);
        record_state_transition(&self.span, from, to);
    }
}

fn random_between(rng: &mut fastrand::Rng, min: Duration, max: Duration) -> Duration {
    let lo = min.as_millis() as u64;
    let hi = max.as_millis() as u64;
    Duration::from_millis(rng.u64(lo..=hi))
}
