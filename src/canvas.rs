//! Shared drawing surface.
//!
//! One grid per canvas, guarded by a single mutex. The lock is held for the
//! duration of one `clear`, `apply` or `snapshot` call and never across an
//! `.await`, so painters and the supervisor cannot deadlock on it.

use crate::error::{Error, Result};
use crate::model::{BLANK, Shape};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const BANNER_TOP: &str = "====== ASCII ART ======";
const BANNER_BOTTOM: &str = "======================";

/// Handle to a shared grid. Clones refer to the same cells.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: usize,
    height: usize,
    cells: Arc<Mutex<Vec<char>>>,
}

impl Canvas {
    /// Allocate a blank `width` x `height` canvas.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let init_err = |reason: String| Error::CanvasInit {
            width,
            height,
            reason,
        };
        if width == 0 || height == 0 {
            return Err(init_err("dimensions must be non-zero".to_string()));
        }
        let len = width
            .checked_mul(height)
            .ok_or_else(|| init_err("cell count overflows".to_string()))?;

        let mut cells = Vec::new();
        cells
            .try_reserve_exact(len)
            .map_err(|e| init_err(e.to_string()))?;
        cells.resize(len, BLANK);

        Ok(Self {
            width,
            height,
            cells: Arc::new(Mutex::new(cells)),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Set every cell to blank.
    pub fn clear(&self) {
        self.lock().fill(BLANK);
    }

    /// Fill every cell within the shape's radius, clipped to the grid.
    pub fn apply(&self, shape: &Shape) {
        let r = shape.radius as usize;
        let x_lo = shape.center_x.saturating_sub(r);
        let y_lo = shape.center_y.saturating_sub(r);
        let x_hi = shape.center_x.saturating_add(r).min(self.width - 1);
        let y_hi = shape.center_y.saturating_add(r).min(self.height - 1);

        let mut cells = self.lock();
        for y in y_lo..=y_hi {
            for x in x_lo..=x_hi {
                if shape.covers(x, y) {
                    cells[y * self.width + x] = shape.symbol;
                }
            }
        }
    }

    /// Copy the whole grid out under the lock.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            width: self.width,
            height: self.height,
            cells: self.lock().clone(),
        }
    }

    // A painter that panicked mid-apply still leaves whole chars behind.
    fn lock(&self) -> MutexGuard<'_, Vec<char>> {
        self.cells.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An immutable copy of a canvas, safe to print without holding the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    width: usize,
    height: usize,
    cells: Vec<char>,
}

impl Snapshot {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<char> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.cells[y * self.width + x])
    }

    pub fn cells(&self) -> &[char] {
        &self.cells
    }

    pub fn rows(&self) -> Vec<String> {
        self.cells
            .chunks(self.width)
            .map(|row| row.iter().collect())
            .collect()
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|&c| c == BLANK)
    }

    /// The grid surrounded by the banner lines.
    pub fn render_framed(&self) -> String {
        format!("\n{BANNER_TOP}\n{self}{BANNER_BOTTOM}\n\n")
    }
}

impl std::fmt::Display for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.cells.chunks(self.width) {
            for c in row {
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(x: usize, y: usize, radius: u32, symbol: char) -> Shape {
        Shape {
            center_x: x,
            center_y: y,
            radius,
            symbol,
        }
    }

    #[test]
    fn new_canvas_is_blank() {
        let canvas = Canvas::new(50, 15).unwrap();
        let snap = canvas.snapshot();
        assert!(snap.is_blank());
        assert_eq!(snap.rows().len(), 15);
        assert!(snap.rows().iter().all(|r| r.chars().count() == 50));
    }

    #[test]
    fn zero_dimension_is_init_failure() {
        assert!(matches!(
            Canvas::new(0, 15),
            Err(Error::CanvasInit { .. })
        ));
        assert!(matches!(
            Canvas::new(usize::MAX, 2),
            Err(Error::CanvasInit { .. })
        ));
    }

    #[test]
    fn apply_fills_exactly_the_disc() {
        let canvas = Canvas::new(50, 15).unwrap();
        let s = shape(20, 7, 3, '$');
        canvas.apply(&s);
        let snap = canvas.snapshot();
        for y in 0..15 {
            for x in 0..50 {
                let expected = if s.covers(x, y) { '$' } else { BLANK };
                assert_eq!(snap.cell(x, y), Some(expected), "cell ({x},{y})");
            }
        }
    }

    #[test]
    fn apply_clips_at_corners() {
        let canvas = Canvas::new(10, 5).unwrap();
        canvas.apply(&shape(0, 0, 5, '@'));
        canvas.apply(&shape(9, 4, 2, '%'));
        let snap = canvas.snapshot();
        assert_eq!(snap.cell(0, 0), Some('@'));
        assert_eq!(snap.cell(9, 4), Some('%'));
        assert_eq!(snap.cell(9, 0), Some(BLANK));
    }

    #[test]
    fn center_outside_grid_does_not_panic() {
        let canvas = Canvas::new(10, 5).unwrap();
        canvas.apply(&shape(12, 6, 3, '*'));
        assert_eq!(canvas.snapshot().cell(9, 4), Some('*'));
    }

    #[test]
    fn clear_resets_and_repeated_snapshots_stay_blank() {
        let canvas = Canvas::new(8, 4).unwrap();
        canvas.apply(&shape(3, 2, 2, '+'));
        canvas.clear();
        for _ in 0..3 {
            assert!(canvas.snapshot().is_blank());
        }
    }

    #[test]
    fn framed_render_has_banners() {
        let canvas = Canvas::new(3, 2).unwrap();
        let text = canvas.snapshot().render_framed();
        assert!(text.starts_with("\n====== ASCII ART ======\n"));
        assert!(text.contains("   \n   \n"));
        assert!(text.ends_with("======================\n\n"));
    }
}
