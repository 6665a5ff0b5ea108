//! Supervisor: launch painters, print snapshots, cancel one mid-run, collect
//! every termination report, print the final canvas.

use super::worker::{Worker, WorkerHandle};
use crate::canvas::Canvas;
use crate::config::Config;
use crate::error::Result;
use crate::model::{RunReport, WorkerId, WorkerReport, WorkerState};
use crate::telemetry::metrics;
use chrono::Utc;
use std::io::Write;
use std::sync::Arc;
use tracing::{error, info};

/// Starts one painter. [`Worker::spawn`] unless replaced with
/// [`Supervisor::with_launcher`].
pub type Launcher =
    Arc<dyn Fn(WorkerId, Canvas, Arc<Config>) -> Result<WorkerHandle> + Send + Sync>;

/// Owns the canvas and the painter set for one run.
pub struct Supervisor {
    config: Arc<Config>,
    canvas: Canvas,
    rng: fastrand::Rng,
    launcher: Launcher,
}

impl Supervisor {
    /// Validate the config and allocate a blank canvas. Nothing is launched
    /// yet, so a canvas failure leaves no painter behind.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let canvas = Canvas::new(config.width, config.height)?;
        canvas.clear();
        let rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Ok(Self {
            config: Arc::new(config),
            canvas,
            rng,
            launcher: Arc::new(Worker::spawn),
        })
    }

    /// Replace how painters are started, e.g. to wrap or refuse a launch.
    pub fn with_launcher<F>(mut self, launcher: F) -> Self
    where
        F: Fn(WorkerId, Canvas, Arc<Config>) -> Result<WorkerHandle> + Send + Sync + 'static,
    {
        self.launcher = Arc::new(launcher);
        self
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run to completion, writing every canvas rendering to `out`.
    ///
    /// # Errors
    ///
    /// `Error::WorkerLaunch` if any painter fails to start (the ones already
    /// running are canceled and awaited first), or `Error::Io` if `out`
    /// fails.
    pub async fn run<W: Write>(&mut self, out: &mut W) -> Result<RunReport> {
        let started_at = Utc::now();

        write!(out, "{}", self.canvas.snapshot().render_framed())?;
        writeln!(out, "====== ASCII Art Generator ======")?;
        out.flush()?;

        let workers = self.launch_workers().await?;

        let canceled_worker = match self.observe(&workers, out).await {
            Ok(canceled) => canceled,
            Err(e) => {
                error!(error = %e, "snapshot output failed, stopping painters");
                shutdown(workers).await;
                return Err(e);
            }
        };

        let reports = collect_reports(workers).await;

        let final_canvas = self.canvas.snapshot();
        writeln!(out, "\n== Final Artwork ==")?;
        write!(out, "{}", final_canvas.render_framed())?;
        out.flush()?;

        Ok(RunReport {
            started_at,
            finished_at: Utc::now(),
            workers: reports,
            canceled_worker,
            final_canvas: final_canvas.rows(),
        })
    }

    async fn launch_workers(&self) -> Result<Vec<WorkerHandle>> {
        let mut workers = Vec::with_capacity(self.config.worker_count as usize);

        for i in 0..self.config.worker_count {
            let id = WorkerId(i);
            match (self.launcher)(id, self.canvas.clone(), Arc::clone(&self.config)) {
                Ok(handle) => {
                    info!(worker_id = %id, identifier = %handle.identifier(), "launched painter");
                    workers.push(handle);
                }
                Err(e) => {
                    error!(worker_id = %id, error = %e, "painter launch failed, aborting run");
                    shutdown(workers).await;
                    return Err(e);
                }
            }
            // Stagger launches so entropy-seeded painters start apart.
            tokio::time::sleep(self.config.launch_stagger()).await;
        }

        Ok(workers)
    }

    /// Snapshot rounds. Returns the painter canceled mid-run, if any.
    async fn observe<W: Write>(
        &mut self,
        workers: &[WorkerHandle],
        out: &mut W,
    ) -> Result<Option<WorkerId>> {
        let mut canceled = None;

        for round in 1..=self.config.snapshot_rounds {
            tokio::time::sleep(self.config.snapshot_interval()).await;

            write!(out, "{}", self.canvas.snapshot().render_framed())?;
            out.flush()?;
            metrics::snapshot_rounds().add(1, &[]);

            if self.config.cancel_round == Some(round) {
                canceled = self.cancel_random_live(workers);
            }
        }

        Ok(canceled)
    }

    fn cancel_random_live(&mut self, workers: &[WorkerHandle]) -> Option<WorkerId> {
        let states: Vec<WorkerState> = workers.iter().map(WorkerHandle::state).collect();
        let Some(index) = pick_running(&states, &mut self.rng) else {
            info!("no live painter left to cancel");
            return None;
        };

        let chosen = &workers[index];
        // The painter may have begun draining since its state was read.
        if !chosen.cancel() {
            info!(worker_id = %chosen.id(), "painter finished before it could be canceled");
            return None;
        }
        info!(
            worker_id = %chosen.id(),
            identifier = %chosen.identifier(),
            "supervisor canceling painter"
        );
        Some(chosen.id())
    }
}

/// Uniform pick among painters still in `Running`. Draining painters are
/// already on their way out and never count as live.
fn pick_running(states: &[WorkerState], rng: &mut fastrand::Rng) -> Option<usize> {
    let running: Vec<usize> = states
        .iter()
        .enumerate()
        .filter(|(_, s)| **s == WorkerState::Running)
        .map(|(i, _)| i)
        .collect();
    if running.is_empty() {
        return None;
    }
    Some(running[rng.usize(..running.len())])
}

async fn collect_reports(workers: Vec<WorkerHandle>) -> Vec<WorkerReport> {
    let mut reports = Vec::with_capacity(workers.len());
    for handle in workers {
        let report = handle.join().await;
        info!(
            worker_id = %report.worker_id,
            identifier = %report.identifier,
            status = %report.status,
            shapes_drawn = report.shapes_drawn,
            "collected painter termination"
        );
        reports.push(report);
    }
    reports
}

async fn shutdown(workers: Vec<WorkerHandle>) {
    for handle in &workers {
        handle.cancel();
    }
    collect_reports(workers).await;
}
