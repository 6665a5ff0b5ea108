//! Sub-task lifecycle: start an external command, wait for it or kill it.

use super::cancel::CancelSignal;
use crate::error::{Error, Result};
use crate::model::{SubTaskExit, WorkerId};
use crate::telemetry::metrics;
use opentelemetry::KeyValue;
use serde::{Deserialize, Serialize};
use std::process::{ExitStatus, Stdio};
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// The external command a painter runs alongside its drawing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTaskCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for SubTaskCommand {
    fn default() -> Self {
        Self {
            program: "/bin/echo".to_string(),
            args: vec!["Painter subprocess drawing...".to_string()],
        }
    }
}

/// Handle to a running (or finished) sub-task.
///
/// Cancelling and joining are both idempotent: a finished sub-task ignores
/// `cancel`, and `join` returns the same exit every time.
#[derive(Debug)]
pub struct SubTask {
    owner: WorkerId,
    pid: Option<u32>,
    cancel: CancelSignal,
    exit: watch::Receiver<Option<SubTaskExit>>,
}

impl SubTask {
    /// Start the command. Must be called from within a Tokio runtime.
    pub fn spawn(owner: WorkerId, command: &SubTaskCommand) -> Result<Self> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| Error::SubTaskStart {
                owner,
                program: command.program.clone(),
                source,
            })?;

        let pid = child.id();
        let stdout = child.stdout.take();
        let cancel = CancelSignal::new();
        let (tx, exit) = watch::channel(None);

        info!(worker_id = %owner, pid, program = %command.program, "sub-task started");
        metrics::subtask_events().add(1, &[KeyValue::new("event", "started")]);

        tokio::spawn(drive(owner, child, stdout, cancel.clone(), tx));

        Ok(Self {
            owner,
            pid,
            cancel,
            exit,
        })
    }

    pub fn owner(&self) -> WorkerId {
        self.owner
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn is_finished(&self) -> bool {
        self.exit.borrow().is_some()
    }

    /// Neither finished nor asked to stop.
    pub fn is_alive(&self) -> bool {
        !self.is_finished() && !self.cancel.is_cancelled()
    }

    /// Ask the sub-task to stop. Returns `false`, and does nothing, when it
    /// has already finished or was already canceled.
    pub fn cancel(&self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.cancel.cancel()
    }

    /// Wait until the sub-task has terminated.
    pub async fn join(&self) -> SubTaskExit {
        let mut rx = self.exit.clone();
        let exit = match rx.wait_for(Option::is_some).await {
            Ok(exit) => exit.clone(),
            Err(_) => None,
        };
        exit.unwrap_or_else(|| SubTaskExit::Failed {
            error: "sub-task driver stopped before reporting".to_string(),
        })
    }
}

async fn drive(
    owner: WorkerId,
    mut child: Child,
    stdout: Option<ChildStdout>,
    cancel: CancelSignal,
    tx: watch::Sender<Option<SubTaskExit>>,
) {
    let finished = tokio::select! {
        res = wait_with_output(&mut child, stdout) => Some(res),
        _ = cancel.cancelled() => None,
    };

    let exit = match finished {
        Some(Ok((status, output))) => {
            for line in output.lines() {
                debug!(worker_id = %owner, line, "sub-task output");
            }
            exited(status)
        }
        Some(Err(e)) => SubTaskExit::Failed {
            error: e.to_string(),
        },
        None => {
            if let Err(e) = child.kill().await {
                warn!(worker_id = %owner, error = %e, "failed to kill sub-task");
            }
            SubTaskExit::Canceled
        }
    };

    let event = match exit {
        SubTaskExit::Canceled => "canceled",
        _ => "exited",
    };
    metrics::subtask_events().add(1, &[KeyValue::new("event", event)]);
    debug!(worker_id = %owner, exit = %exit, "sub-task finished");

    tx.send_replace(Some(exit));
}

async fn wait_with_output(
    child: &mut Child,
    stdout: Option<ChildStdout>,
) -> std::io::Result<(ExitStatus, String)> {
    let mut output = String::new();
    if let Some(mut stdout) = stdout {
        stdout.read_to_string(&mut output).await?;
    }
    let status = child.wait().await?;
    Ok((status, output))
}

fn exited(status: ExitStatus) -> SubTaskExit {
    SubTaskExit::Exited {
        code: status.code(),
    }
}
