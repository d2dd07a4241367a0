//! Accepts line segments and circular dots for the path currently open on a
//! tile; computes scanline intersections and folds column-zero crossings
//! into the per-row starting count (component D).

use lilac_macros::require;

use crate::error::LilacError;
use crate::intersection::{Direction, Intersection, IntersectionBuffer};

/// Below this y-span, a line segment is treated as horizontal and
/// contributes nothing. Also the threshold below which a dot radius is a
/// silent no-op.
pub const COORD_EPSILON: f64 = 1e-5;

/// Scanlines whose distance from a dot's center crosses within this of the
/// tangent (`|w| > 1 - CIRCLE_EPSILON`) are discarded. This is the source
/// asymmetry noted in the design notes: it can leave a one-pixel gap at the
/// very top/bottom of a large disc, and is preserved for compatibility.
pub const CIRCLE_EPSILON: f64 = 1e-5;

/// The live-region geometry of the tile currently open for path operations.
#[derive(Debug, Clone, Copy)]
pub struct TileGeometry {
    pub tile_x: u32,
    pub tile_y: u32,
    pub tile_w: u32,
    pub tile_h: u32,
}

impl TileGeometry {
    fn scan_begin(self) -> f64 {
        f64::from(self.tile_x)
    }

    fn scan_end(self) -> f64 {
        f64::from(self.tile_x + self.tile_w)
    }

    /// The y coordinate of tile scanline `k`, per the half-pixel-center
    /// scanline model in §4.D.
    fn scanline_y(self, k: u32) -> f64 {
        f64::from(self.tile_y + k) + 0.5
    }
}

/// Per-tile path state: the starting-count array and the intersection
/// buffer for the path currently open.
pub struct PathAccumulator {
    tile: TileGeometry,
    start: Vec<i32>,
    intersections: IntersectionBuffer,
}

impl PathAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tile: TileGeometry {
                tile_x: 0,
                tile_y: 0,
                tile_w: 0,
                tile_h: 0,
            },
            start: Vec::new(),
            intersections: IntersectionBuffer::new(),
        }
    }

    /// Resets the starting-count array and clears the intersection buffer
    /// for a new path on `tile` (`begin_path`).
    pub fn begin(&mut self, tile: TileGeometry) {
        self.tile = tile;
        self.start.clear();
        self.start.resize(tile.tile_h as usize, 0);
        self.intersections.reset();
    }

    #[must_use]
    pub fn start_counts(&self) -> &[i32] {
        &self.start
    }

    pub fn intersections(&self) -> &IntersectionBuffer {
        &self.intersections
    }

    pub fn intersections_mut(&mut self) -> &mut IntersectionBuffer {
        &mut self.intersections
    }

    /// Adds a line segment `(x1, y1) -> (x2, y2)` to the path.
    ///
    /// # Errors
    ///
    /// Returns a fatal [`LilacError`] if a coordinate is non-finite, or if
    /// folding a crossing into the starting count overflows `i32`, or if the
    /// intersection buffer's ceiling is exceeded.
    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<(), LilacError> {
        for (name, v) in [("x1", x1), ("y1", y1), ("x2", x2), ("y2", y2)] {
            if !v.is_finite() {
                return Err(LilacError::parameter_domain(name, "must be finite"));
            }
        }

        if (y2 - y1).abs() < COORD_EPSILON {
            return Ok(());
        }

        let direction = if y1 > y2 { Direction::Up } else { Direction::Down };
        let (y_lo, y_hi) = (y1.min(y2), y1.max(y2));

        for k in 0..self.tile.tile_h {
            let scan_y = self.tile.scanline_y(k);
            if scan_y < y_lo || scan_y > y_hi {
                continue;
            }

            let t = ((scan_y - y1) / (y2 - y1)).clamp(0.0, 1.0);
            let ix = (1.0 - t).mul_add(x1, t * x2);
            self.emit_crossing(k, ix, direction)?;
        }

        Ok(())
    }

    /// Adds a dot (filled circle of radius `r` centered at `(cx, cy)`) to
    /// the path, treating its perimeter as a clockwise curve.
    ///
    /// # Errors
    ///
    /// Returns a fatal [`LilacError`] if any argument is non-finite, or if
    /// `r <= 0.0`, or on starting-count overflow / intersection buffer
    /// ceiling.
    pub fn dot(&mut self, cx: f64, cy: f64, r: f64) -> Result<(), LilacError> {
        for (name, v) in [("cx", cx), ("cy", cy), ("r", r)] {
            if !v.is_finite() {
                return Err(LilacError::parameter_domain(name, "must be finite"));
            }
        }
        require!(r > 0.0, LilacError::parameter_domain("r", "must be > 0"));
        if r < COORD_EPSILON {
            return Ok(());
        }

        for k in 0..self.tile.tile_h {
            let y = self.tile.scanline_y(k);
            let w = (y - cy) / r;
            if w.abs() > 1.0 - CIRCLE_EPSILON {
                continue;
            }

            let a = w.asin();
            let b = r * a.cos();
            self.emit_crossing(k, cx - b, Direction::Up)?;
            self.emit_crossing(k, cx + b, Direction::Down)?;
        }

        Ok(())
    }

    /// Filters, clamps, and files one crossing at tile scanline `k` and
    /// image-space X `ix` into either the starting count (column 0) or the
    /// intersection buffer, per the shared rule used by both lines and dots.
    fn emit_crossing(&mut self, k: u32, ix: f64, direction: Direction) -> Result<(), LilacError> {
        let scan_begin = self.tile.scan_begin();
        let scan_end = self.tile.scan_end();

        if ix >= scan_end {
            return Ok(());
        }
        let ix = ix.max(scan_begin);

        let tile_w = self.tile.tile_w;
        let x_t = ((ix - scan_begin).floor() as i64).clamp(0, i64::from(tile_w.saturating_sub(1)));

        if x_t <= 0 {
            let slot = &mut self.start[k as usize];
            *slot = slot.checked_add(direction.sign()).ok_or_else(|| {
                LilacError::CapacityExhausted(format!(
                    "starting count overflowed at scanline {k}"
                ))
            })?;
        } else {
            self.intersections.push(Intersection {
                tile_x: x_t as u16,
                tile_y: k as u16,
                direction,
            })?;
        }

        Ok(())
    }
}

impl Default for PathAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tile(w: u32, h: u32) -> TileGeometry {
        TileGeometry {
            tile_x: 0,
            tile_y: 0,
            tile_w: w,
            tile_h: h,
        }
    }

    #[test]
    fn horizontal_line_contributes_nothing() {
        let mut p = PathAccumulator::new();
        p.begin(tile(10, 10));
        p.line(0.0, 5.5, 9.0, 5.5).unwrap();
        assert!(p.start_counts().iter().all(|&c| c == 0));
        assert!(p.intersections().is_empty());
    }

    #[test]
    fn line_strictly_between_scanlines_contributes_nothing() {
        let mut p = PathAccumulator::new();
        p.begin(tile(10, 10));
        // Scanlines sit at k + 0.5; a span of [0.51, 0.99] crosses none.
        p.line(0.0, 0.51, 9.0, 0.99).unwrap();
        assert!(p.start_counts().iter().all(|&c| c == 0));
        assert!(p.intersections().is_empty());
    }

    #[test]
    fn vertical_line_at_column_zero_uses_start_count() {
        let mut p = PathAccumulator::new();
        p.begin(tile(10, 10));
        // Downward-traversed vertical line at x=0 crosses every scanline.
        p.line(0.0, 0.0, 0.0, 10.0).unwrap();
        assert!(p.intersections().is_empty());
        assert!(p.start_counts().iter().all(|&c| c == -1));
    }

    #[test]
    fn intersection_at_scan_end_is_discarded() {
        let mut p = PathAccumulator::new();
        p.begin(tile(10, 10));
        p.line(10.0, 0.0, 10.0, 10.0).unwrap();
        assert!(p.intersections().is_empty());
        assert!(p.start_counts().iter().all(|&c| c == 0));
    }

    #[test]
    fn dot_below_epsilon_radius_is_a_silent_no_op() {
        let mut p = PathAccumulator::new();
        p.begin(tile(64, 64));
        p.dot(32.0, 32.0, 1e-6).unwrap();
        assert!(p.intersections().is_empty());
        assert!(p.start_counts().iter().all(|&c| c == 0));
    }

    #[test]
    fn dot_nonpositive_radius_is_fatal() {
        let mut p = PathAccumulator::new();
        p.begin(tile(64, 64));
        assert!(p.dot(32.0, 32.0, 0.0).is_err());
        assert!(p.dot(32.0, 32.0, -5.0).is_err());
    }

    #[test]
    fn non_finite_coordinates_are_fatal() {
        let mut p = PathAccumulator::new();
        p.begin(tile(64, 64));
        assert!(p.line(f64::NAN, 0.0, 1.0, 1.0).is_err());
        assert!(p.dot(f64::INFINITY, 0.0, 1.0).is_err());
    }

    #[test]
    fn dot_produces_symmetric_crossings_off_column_zero() {
        let mut p = PathAccumulator::new();
        p.begin(tile(64, 64));
        p.dot(32.0, 32.0, 20.0).unwrap();
        assert!(!p.intersections().is_empty());
    }
}
