//! Sorts the intersection buffer and scans each tile row applying the
//! non-zero winding rule, blending the current fill color over the tile
//! buffer (component E, run at `end_path`).

use lilac_macros::require;

use crate::blend::Blender;
use crate::color::Color;
use crate::error::LilacError;
use crate::path::{PathAccumulator, TileGeometry};

/// Runs the fill algorithm described in §4.E over one tile's pixel buffer.
///
/// `tile_buf` is the full `dim x dim` allocation; only rows/columns inside
/// `tile`'s live region are touched. `delta` is scratch space reused across
/// calls, sized to at least `tile.tile_w`.
///
/// # Errors
///
/// Returns [`LilacError::CapacityExhausted`] if a per-column delta or the
/// running fill count overflows.
pub fn fill(
    path: &mut PathAccumulator,
    tile: TileGeometry,
    dim: u32,
    color: Color,
    blender: &mut Blender,
    tile_buf: &mut [Color],
    delta: &mut Vec<i32>,
) -> Result<(), LilacError> {
    path.intersections_mut().sort();

    delta.clear();
    delta.resize(tile.tile_w as usize, 0);

    let mut cursor = path.intersections().iter().peekable();

    for k in 0..tile.tile_h {
        for slot in delta.iter_mut() {
            *slot = 0;
        }
        delta[0] = path.start_counts()[k as usize];

        while let Some(ir) = cursor.peek().copied() {
            if u32::from(ir.tile_y) != k {
                break;
            }
            cursor.next();

            let tx = ir.tile_x as usize;
            require!(
                tx < delta.len(),
                LilacError::parameter_domain(
                    "intersection.tile_x",
                    format!("{tx} is out of bounds for tile width {}", tile.tile_w),
                )
            );
            delta[tx] = delta[tx].checked_add(ir.direction.sign()).ok_or_else(|| {
                LilacError::CapacityExhausted(format!("delta overflow at column {tx}, row {k}"))
            })?;
        }

        let mut fill_count: i64 = 0;
        let row_base = (k * dim) as usize;
        for (x, &d) in delta.iter().enumerate() {
            fill_count += i64::from(d);
            if fill_count != 0 {
                let idx = row_base + x;
                tile_buf[idx] = blender.blend(color, tile_buf[idx]);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use crate::gamma::GammaTable;

    fn tile(w: u32, h: u32) -> TileGeometry {
        TileGeometry {
            tile_x: 0,
            tile_y: 0,
            tile_w: w,
            tile_h: h,
        }
    }

    fn filled_pixels(buf: &[Color], dim: u32, tile_w: u32, tile_h: u32, fill: Color) -> usize {
        let mut count = 0;
        for y in 0..tile_h {
            for x in 0..tile_w {
                if buf[(y * dim + x) as usize] == fill {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn rectangle_by_lines_fills_interior_and_excludes_right_column() {
        let dim = 16;
        let t = tile(dim, dim);
        let mut path = PathAccumulator::new();
        path.begin(t);

        // Clockwise square from (2,2) to (12,12), matching the half-open
        // right-edge rule from §4.E.
        path.line(2.0, 2.0, 12.0, 2.0).unwrap();
        path.line(12.0, 2.0, 12.0, 12.0).unwrap();
        path.line(12.0, 12.0, 2.0, 12.0).unwrap();
        path.line(2.0, 12.0, 2.0, 2.0).unwrap();

        let background = Color::from_argb(255, 255, 255, 255);
        let fill_color = Color::from_argb(255, 0, 0, 0);
        let mut tile_buf = vec![background; (dim * dim) as usize];
        let mut blender = Blender::new(GammaTable::new());
        let mut delta = Vec::new();

        fill(
            &mut path,
            t,
            dim,
            fill_color,
            &mut blender,
            &mut tile_buf,
            &mut delta,
        )
        .unwrap();

        // Column 11 (last interior column, 0-indexed) is filled...
        assert_eq!(tile_buf[(5 * dim + 11) as usize], fill_color);
        // ...but column 12 (the line's own X) is not, per the half-open edge.
        assert_eq!(tile_buf[(5 * dim + 12) as usize], background);
        // Outside the square entirely stays background.
        assert_eq!(tile_buf[(0 * dim) as usize], background);
    }

    #[test]
    fn donut_with_matching_winding_fills_the_hole() {
        let dim = 20;
        let t = tile(dim, dim);
        let mut path = PathAccumulator::new();
        path.begin(t);

        // Outer square, clockwise.
        path.line(2.0, 2.0, 18.0, 2.0).unwrap();
        path.line(18.0, 2.0, 18.0, 18.0).unwrap();
        path.line(18.0, 18.0, 2.0, 18.0).unwrap();
        path.line(2.0, 18.0, 2.0, 2.0).unwrap();

        // Inner square, also clockwise: winds to +2 inside, stays filled.
        path.line(7.0, 7.0, 13.0, 7.0).unwrap();
        path.line(13.0, 7.0, 13.0, 13.0).unwrap();
        path.line(13.0, 13.0, 7.0, 13.0).unwrap();
        path.line(7.0, 13.0, 7.0, 7.0).unwrap();

        let background = Color::from_argb(255, 255, 255, 255);
        let fill_color = Color::from_argb(255, 0, 0, 0);
        let mut tile_buf = vec![background; (dim * dim) as usize];
        let mut blender = Blender::new(GammaTable::new());
        let mut delta = Vec::new();

        fill(
            &mut path,
            t,
            dim,
            fill_color,
            &mut blender,
            &mut tile_buf,
            &mut delta,
        )
        .unwrap();

        assert_eq!(tile_buf[(10 * dim + 10) as usize], fill_color);
    }

    #[test]
    fn donut_with_reversed_inner_winding_leaves_the_hole_unfilled() {
        let dim = 20;
        let t = tile(dim, dim);
        let mut path = PathAccumulator::new();
        path.begin(t);

        // Outer square, clockwise.
        path.line(2.0, 2.0, 18.0, 2.0).unwrap();
        path.line(18.0, 2.0, 18.0, 18.0).unwrap();
        path.line(18.0, 18.0, 2.0, 18.0).unwrap();
        path.line(2.0, 18.0, 2.0, 2.0).unwrap();

        // Inner square, counter-clockwise: cancels winding to 0 inside.
        path.line(7.0, 7.0, 7.0, 13.0).unwrap();
        path.line(7.0, 13.0, 13.0, 13.0).unwrap();
        path.line(13.0, 13.0, 13.0, 7.0).unwrap();
        path.line(13.0, 7.0, 7.0, 7.0).unwrap();

        let background = Color::from_argb(255, 255, 255, 255);
        let fill_color = Color::from_argb(255, 0, 0, 0);
        let mut tile_buf = vec![background; (dim * dim) as usize];
        let mut blender = Blender::new(GammaTable::new());
        let mut delta = Vec::new();

        fill(
            &mut path,
            t,
            dim,
            fill_color,
            &mut blender,
            &mut tile_buf,
            &mut delta,
        )
        .unwrap();

        assert_eq!(tile_buf[(10 * dim + 10) as usize], background);
        assert_eq!(tile_buf[(4 * dim + 4) as usize], fill_color);
        let count = filled_pixels(&tile_buf, dim, t.tile_w, t.tile_h, fill_color);
        assert!(count > 0);
    }
}
