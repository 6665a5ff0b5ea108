//! Integration tests for the painter lifecycle.
#![cfg(unix)]

use painters::canvas::Canvas;
use painters::config::Config;
use painters::engine::{SubTaskCommand, Worker};
use painters::model::{
    ALPHABET, BLANK, SubTaskExit, SubTaskOutcome, TerminationStatus, WorkerId, WorkerState,
};
use std::sync::Arc;
use std::time::Duration;

fn fast_config() -> Config {
    Config {
        width: 30,
        height: 10,
        worker_duration_seconds: 0.3,
        draw_interval_min_seconds: 0.01,
        draw_interval_max_seconds: 0.02,
        seed: Some(11),
        ..Config::default()
    }
}

#[tokio::test]
async fn worker_expires_after_its_budget() {
    let config = fast_config();
    let canvas = Canvas::new(config.width, config.height).unwrap();
    let handle = Worker::spawn(WorkerId(0), canvas.clone(), Arc::new(config)).unwrap();

    let report = tokio::time::timeout(Duration::from_secs(5), handle.join())
        .await
        .expect("worker should finish within its budget");

    assert_eq!(report.worker_id, WorkerId(0));
    assert_eq!(report.status, TerminationStatus::Expired);
    assert!(report.shapes_drawn > 0);
    assert!(matches!(report.subtask, SubTaskOutcome::Finished { .. }));

    let snap = canvas.snapshot();
    assert!(!snap.is_blank());
    assert!(snap.cells().iter().all(|c| *c == BLANK || ALPHABET.contains(c)));
}

#[tokio::test]
async fn canceled_worker_terminates_within_one_iteration() {
    let config = Config {
        worker_duration_seconds: 60.0,
        draw_interval_min_seconds: 0.05,
        draw_interval_max_seconds: 0.1,
        subtask: SubTaskCommand {
            program: "/bin/sleep".to_string(),
            args: vec!["30".to_string()],
        },
        subtask_cancel_probability: 0.0,
        ..fast_config()
    };
    let canvas = Canvas::new(config.width, config.height).unwrap();
    let handle = Worker::spawn(WorkerId(1), canvas, Arc::new(config)).unwrap();

    handle.started().await;
    assert_eq!(handle.state(), WorkerState::Running);
    tokio::time::sleep(Duration::from_millis(120)).await;

    assert!(handle.cancel());
    assert!(!handle.cancel(), "second cancel must be a no-op");

    // One drawing step plus at most one pause, with slack for the kill.
    let report = tokio::time::timeout(Duration::from_secs(2), handle.join())
        .await
        .expect("canceled worker should terminate promptly");

    assert_eq!(report.status, TerminationStatus::Canceled);
    assert!(report.elapsed_ms < 5_000);
    // The live sub-task received the forwarded cancellation.
    assert_eq!(
        report.subtask,
        SubTaskOutcome::Finished {
            exit: SubTaskExit::Canceled
        }
    );
}

#[tokio::test]
async fn worker_without_subtask_still_terminates_normally() {
    let config = Config {
        subtask: SubTaskCommand {
            program: "/nonexistent/painters-subtask".to_string(),
            args: Vec::new(),
        },
        ..fast_config()
    };
    let canvas = Canvas::new(config.width, config.height).unwrap();
    let handle = Worker::spawn(WorkerId(2), canvas, Arc::new(config)).unwrap();

    let report = tokio::time::timeout(Duration::from_secs(5), handle.join())
        .await
        .expect("worker should finish");

    assert_eq!(report.status, TerminationStatus::Expired);
    assert!(report.shapes_drawn > 0);
    assert_eq!(report.subtasks_canceled, 0);
    assert!(matches!(report.subtask, SubTaskOutcome::StartFailed { .. }));
}

#[tokio::test]
async fn cancel_after_termination_is_a_noop() {
    let config = Config {
        worker_duration_seconds: 0.0,
        ..fast_config()
    };
    let canvas = Canvas::new(config.width, config.height).unwrap();
    let handle = Worker::spawn(WorkerId(3), canvas.clone(), Arc::new(config)).unwrap();

    while !handle.is_finished() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(!handle.cancel());

    let report = handle.join().await;
    assert_eq!(report.status, TerminationStatus::Expired);
    assert_eq!(report.shapes_drawn, 0);
    assert!(canvas.snapshot().is_blank());
}

#[tokio::test(flavor = "multi_thread")]
async fn canceled_worker_stops_drawing() {
    let config = Config {
        worker_duration_seconds: 60.0,
        draw_interval_min_seconds: 0.01,
        draw_interval_max_seconds: 0.02,
        subtask_cancel_probability: 0.0,
        ..fast_config()
    };
    let canvas = Canvas::new(config.width, config.height).unwrap();
    let handle = Worker::spawn(WorkerId(4), canvas.clone(), Arc::new(config)).unwrap();

    handle.started().await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(handle.cancel());
    let at_cancel = handle.shapes_drawn();
    assert!(at_cancel > 0);

    let mut state = handle.subscribe_state();
    tokio::time::timeout(
        Duration::from_secs(2),
        state.wait_for(|s| matches!(s, WorkerState::Draining | WorkerState::Terminated)),
    )
    .await
    .expect("canceled worker should start draining")
    .expect("state channel closed before draining");
    let after_drain = canvas.snapshot();
    let drawn_after_drain = handle.shapes_drawn();

    // Several draw intervals pass with nothing new applied.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(handle.shapes_drawn(), drawn_after_drain);
    assert_eq!(canvas.snapshot().cells(), after_drain.cells());

    let report = handle.join().await;
    assert_eq!(report.status, TerminationStatus::Canceled);
    // At most the step already in flight when cancel arrived.
    assert!(report.shapes_drawn <= at_cancel + 1);
    assert_eq!(report.shapes_drawn, drawn_after_drain);
    assert_eq!(canvas.snapshot().cells(), after_drain.cells());
}
