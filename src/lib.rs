//! # painters
//!
//! Concurrent painters drawing random shapes onto one shared canvas while a
//! supervisor snapshots the canvas and cancels a painter mid-run.
//!
//! Painters are Tokio tasks; the canvas is a single mutex-guarded grid;
//! cancellation is a cooperative signal checked between drawing steps.

pub mod canvas;
pub mod config;
pub mod drawer;
pub mod engine;
pub mod error;
pub mod model;
pub mod telemetry;
