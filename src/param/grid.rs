//! Square scalar grids over the unit square.

use crate::geom::UvPoint;

/// One grid cell. Boundary cells carry fixed Dirichlet data.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cell {
    pub boundary: bool,
    pub value: f64,
}

/// A `2^levels x 2^levels` grid; cell `(x, y)` sits at `(x / size, y / size)`.
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonicGrid {
    levels: u32,
    size: usize,
    cells: Vec<Cell>,
}

impl HarmonicGrid {
    /// All cells free and zero.
    #[must_use]
    pub fn new(levels: u32) -> Self {
        let size = 1_usize << levels;
        Self {
            levels,
            size,
            cells: vec![Cell::default(); size * size],
        }
    }

    #[must_use]
    pub fn levels(&self) -> u32 {
        self.levels
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    #[must_use]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.size + x
    }

    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> Cell {
        self.cells[self.index(x, y)]
    }

    #[must_use]
    pub fn value(&self, x: usize, y: usize) -> f64 {
        self.cell(x, y).value
    }

    /// Fixes `(x, y)` to `value`.
    pub fn set_boundary(&mut self, x: usize, y: usize, value: f64) {
        let index = self.index(x, y);
        self.cells[index] = Cell {
            boundary: true,
            value,
        };
    }

    #[must_use]
    pub fn boundary_count(&self) -> usize {
        self.cells.iter().filter(|c| c.boundary).count()
    }

    /// Nearest cell to a unit-square point, clamped to the grid.
    #[must_use]
    pub fn nearest_cell(&self, p: UvPoint) -> (usize, usize) {
        let max = (self.size - 1) as f64;
        let clamp = |t: f64| (t * self.size as f64).round().clamp(0.0, max) as usize;
        (clamp(p.u), clamp(p.v))
    }

    /// Marks the cells of the digital line from `from` to `to` as boundary, with values
    /// interpolated linearly from `from_value` to `to_value`.
    ///
    /// Integer line drawing, one cell per step along the major axis. Progress is measured
    /// along that axis.
    pub fn rasterize_segment(&mut self, from: UvPoint, from_value: f64, to: UvPoint, to_value: f64) {
        let (x0, y0) = self.nearest_cell(from);
        let (x1, y1) = self.nearest_cell(to);
        let (mut x, mut y) = (x0 as i64, y0 as i64);
        let (x1, y1) = (x1 as i64, y1 as i64);

        let dx = (x1 - x).abs();
        let dy = (y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let major = dx.max(dy);
        let mut err = dx - dy;

        loop {
            let remaining = (x1 - x).abs().max((y1 - y).abs());
            let ratio = if major == 0 { 0.0 } else { remaining as f64 / major as f64 };
            self.set_boundary(x as usize, y as usize, from_value * ratio + to_value * (1.0 - ratio));
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                x += sx;
            }
            if e2 < dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Bilinear interpolation at a unit-square point.
    ///
    /// The lower cell index is `floor(uv * size)` clamped to `[0, size - 2]` and the fraction is
    /// left unclamped, so points on or past the last row/column extrapolate linearly from the
    /// outermost cell pair.
    #[must_use]
    pub fn sample(&self, uv: UvPoint) -> f64 {
        let max_index = self.size.saturating_sub(2) as f64;
        let locate = |t: f64| {
            let scaled = t * self.size as f64;
            let base = scaled.floor().clamp(0.0, max_index);
            (base as usize, scaled - base)
        };
        let (x, fx) = locate(uv.u);
        let (y, fy) = locate(uv.v);

        let v00 = self.value(x, y);
        let v10 = self.value(x + 1, y);
        let v01 = self.value(x, y + 1);
        let v11 = self.value(x + 1, y + 1);
        v00 * (1.0 - fx) * (1.0 - fy) + v10 * fx * (1.0 - fy) + v01 * (1.0 - fx) * fy + v11 * fx * fy
    }
}
