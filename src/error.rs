//! Error types for painters.

use crate::model::WorkerId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("canvas allocation failed ({width}x{height}): {reason}")]
    CanvasInit {
        width: usize,
        height: usize,
        reason: String,
    },

    #[error("failed to launch painter {id}: {reason}")]
    WorkerLaunch { id: WorkerId, reason: String },

    #[error("painter {owner} could not start sub-task {program}: {source}")]
    SubTaskStart {
        owner: WorkerId,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
