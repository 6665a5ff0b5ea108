//! Painter engine: cancellation, sub-tasks, painter lifecycle, supervision.

pub mod cancel;
pub mod subtask;
pub mod supervisor;
pub mod worker;

pub use cancel::CancelSignal;
pub use subtask::{SubTask, SubTaskCommand};
pub use supervisor::{Launcher, Supervisor};
pub use worker::{Worker, WorkerHandle};
