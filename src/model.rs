//! Core data model.
//!
//! Painters are identified by a small integer id and draw ephemeral shapes
//! onto a shared canvas. Their lifecycle state and final reports live here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The symbols a painter may draw with.
pub const ALPHABET: [char; 10] = ['@', ')', '*', '+', '.', '$', '(', '0', '&', '%'];

/// Value of an untouched cell.
pub const BLANK: char = ' ';

pub const RADIUS_MIN: u32 = 2;
pub const RADIUS_MAX: u32 = 5;

// ---------------------------------------------------------------------------
// Worker identity
// ---------------------------------------------------------------------------

/// Newtype for painter ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkerId(pub u32);

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

/// A filled circle. Produced per drawing operation, never retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub center_x: usize,
    pub center_y: usize,
    pub radius: u32,
    pub symbol: char,
}

impl Shape {
    /// Whether the cell at `(x, y)` lies within the shape's radius.
    pub fn covers(&self, x: usize, y: usize) -> bool {
        let dx = x as i64 - self.center_x as i64;
        let dy = y as i64 - self.center_y as i64;
        let r = i64::from(self.radius);
        dx * dx + dy * dy <= r * r
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Lifecycle state of a painter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Spawned, sub-task not yet attempted.
    Starting,
    /// Drawing shapes.
    Running,
    /// Budget expired or canceled; waiting on the sub-task.
    Draining,
    /// Done. Terminal.
    Terminated,
}

impl WorkerState {
    /// Can transition from self to `to`?
    pub fn can_transition_to(self, to: WorkerState) -> bool {
        use WorkerState::*;
        matches!(
            (self, to),
            (Starting, Running) | (Running, Draining) | (Draining, Terminated)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == WorkerState::Terminated
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkerState::Starting => "starting",
            WorkerState::Running => "running",
            WorkerState::Draining => "draining",
            WorkerState::Terminated => "terminated",
        };
        write!(f, "{s}")
    }
}

/// Why a painter left the running state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainReason {
    Expired,
    Canceled,
}

impl std::fmt::Display for DrainReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DrainReason::Expired => write!(f, "expired"),
            DrainReason::Canceled => write!(f, "canceled"),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// How a painter ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TerminationStatus {
    /// Ran until its duration budget elapsed.
    Expired,
    /// Stopped by the supervisor.
    Canceled,
    /// The painter task itself died.
    Panicked { error: String },
}

impl From<DrainReason> for TerminationStatus {
    fn from(reason: DrainReason) -> Self {
        match reason {
            DrainReason::Expired => TerminationStatus::Expired,
            DrainReason::Canceled => TerminationStatus::Canceled,
        }
    }
}

impl std::fmt::Display for TerminationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationStatus::Expired => write!(f, "expired"),
            TerminationStatus::Canceled => write!(f, "canceled"),
            TerminationStatus::Panicked { error } => write!(f, "panicked: {error}"),
        }
    }
}

/// How a sub-task process ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubTaskExit {
    /// Exited on its own. `code` is `None` when killed by a foreign signal.
    Exited { code: Option<i32> },
    /// Killed at its owner's request.
    Canceled,
    /// Waiting on the process failed.
    Failed { error: String },
}

impl std::fmt::Display for SubTaskExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubTaskExit::Exited { code: Some(code) } => write!(f, "exited({code})"),
            SubTaskExit::Exited { code: None } => write!(f, "exited(signal)"),
            SubTaskExit::Canceled => write!(f, "canceled"),
            SubTaskExit::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

/// The sub-task as recorded in a painter's report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubTaskOutcome {
    /// No sub-task was attempted (the painter died first).
    None,
    /// The sub-task could not be started. Never fatal.
    StartFailed { error: String },
    Finished { exit: SubTaskExit },
}

/// Termination report collected by the supervisor for each painter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerReport {
    pub worker_id: WorkerId,
    /// Unique per launch, distinguishes painters across runs.
    pub identifier: Uuid,
    pub status: TerminationStatus,
    pub shapes_drawn: u64,
    pub subtasks_canceled: u32,
    pub subtask: SubTaskOutcome,
    pub elapsed_ms: u64,
}

/// Everything a supervisor run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub workers: Vec<WorkerReport>,
    /// The painter picked for mid-run cancellation, if any was live.
    pub canceled_worker: Option<WorkerId>,
    /// Final canvas, one string per row.
    pub final_canvas: Vec<String>,
}
