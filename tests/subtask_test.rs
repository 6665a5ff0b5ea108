//! Integration tests for sub-task start, cancellation and joining.
//!
//! These spawn real processes and assume a Unix userland.
#![cfg(unix)]

use painters::engine::{SubTask, SubTaskCommand};
use painters::error::Error;
use painters::model::{SubTaskExit, WorkerId};
use std::time::Duration;

fn command(program: &str, args: &[&str]) -> SubTaskCommand {
    SubTaskCommand {
        program: program.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
    }
}

#[tokio::test]
async fn finished_subtask_reports_exit_code() {
    let task = SubTask::spawn(WorkerId(0), &SubTaskCommand::default()).unwrap();
    assert_eq!(task.owner(), WorkerId(0));

    let exit = tokio::time::timeout(Duration::from_secs(5), task.join())
        .await
        .expect("echo should finish");
    assert_eq!(exit, SubTaskExit::Exited { code: Some(0) });
    assert!(task.is_finished());
}

#[tokio::test]
async fn cancel_after_finish_is_a_noop() {
    let task = SubTask::spawn(WorkerId(1), &command("/bin/sh", &["-c", "exit 3"])).unwrap();
    let first = task.join().await;
    assert_eq!(first, SubTaskExit::Exited { code: Some(3) });

    assert!(!task.cancel());
    assert!(!task.cancel());

    let again = tokio::time::timeout(Duration::from_millis(100), task.join())
        .await
        .expect("join on a finished sub-task returns immediately");
    assert_eq!(again, first);
}

#[tokio::test]
async fn cancel_kills_a_long_running_subtask() {
    let task = SubTask::spawn(WorkerId(2), &command("/bin/sleep", &["30"])).unwrap();
    assert!(task.is_alive());
    assert!(task.pid().is_some());

    assert!(task.cancel());
    assert!(!task.is_alive());
    assert!(!task.cancel(), "second cancel must be a no-op");

    let exit = tokio::time::timeout(Duration::from_secs(5), task.join())
        .await
        .expect("canceled sub-task should terminate promptly");
    assert_eq!(exit, SubTaskExit::Canceled);
    assert_eq!(task.join().await, SubTaskExit::Canceled);
}

#[tokio::test]
async fn missing_program_is_start_failure() {
    let err = SubTask::spawn(
        WorkerId(3),
        &command("/nonexistent/painters-subtask", &[]),
    )
    .unwrap_err();
    assert!(matches!(err, Error::SubTaskStart { owner: WorkerId(3), .. }));
}
