//! Random shape generation for a single painter.

use crate::canvas::Canvas;
use crate::model::{ALPHABET, RADIUS_MAX, RADIUS_MIN, Shape, WorkerId};
use crate::telemetry::metrics;
use opentelemetry::KeyValue;
use tracing::info;

/// Produces random shapes for one painter from its own random source.
pub struct ShapeDrawer {
    worker_id: WorkerId,
    width: usize,
    height: usize,
    rng: fastrand::Rng,
}

impl ShapeDrawer {
    pub fn new(worker_id: WorkerId, width: usize, height: usize, rng: fastrand::Rng) -> Self {
        Self {
            worker_id,
            width,
            height,
            rng,
        }
    }

    /// Seed from the run seed mixed with the painter id, or from fresh
    /// entropy when no run seed is set. Either way two painters never share
    /// a sequence.
    pub fn for_worker(worker_id: WorkerId, width: usize, height: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => fastrand::Rng::with_seed(seed ^ (u64::from(worker_id.0) << 16)),
            None => fastrand::Rng::new(),
        };
        Self::new(worker_id, width, height, rng)
    }

    /// The drawer's random source, shared with the painter's own rolls.
    pub fn rng(&mut self) -> &mut fastrand::Rng {
        &mut self.rng
    }

    pub fn random_shape(&mut self) -> Shape {
        Shape {
            center_x: self.rng.usize(..self.width),
            center_y: self.rng.usize(..self.height),
            radius: self.rng.u32(RADIUS_MIN..=RADIUS_MAX),
            symbol: ALPHABET[self.rng.usize(..ALPHABET.len())],
        }
    }

    /// Draw one random shape onto the canvas and report it.
    pub fn apply_random_shape(&mut self, canvas: &Canvas) -> Shape {
        let shape = self.random_shape();
        canvas.apply(&shape);

        info!(
            worker_id = %self.worker_id,
            symbol = %shape.symbol,
            x = shape.center_x,
            y = shape.center_y,
            radius = shape.radius,
            "painter drew shape"
        );
        metrics::shapes_drawn().add(
            1,
            &[KeyValue::new("worker_id", i64::from(self.worker_id.0))],
        );

        shape
    }
}
