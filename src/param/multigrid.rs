//! Multigrid Laplace solver for [`HarmonicGrid`]s.
//!
//! Grids above level 3 are first coarsened and solved at half resolution; the coarse solution
//! seeds the free fine cells before relaxation. Relaxation is in place, replacing each free
//! cell with the mean of its four neighbours until the mean absolute change per free cell
//! drops below [`SolverOptions::tolerance`].

use serde::{Deserialize, Serialize};

use super::grid::HarmonicGrid;

/// Grids at or below this level are relaxed directly.
pub const COARSEST_LEVEL: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Stop once the mean absolute change per free cell falls below this.
    pub tolerance: f64,
    /// Sweeps allowed per level before giving up with a warning.
    pub max_sweeps: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-5,
            max_sweeps: 200_000,
        }
    }
}

/// Outcome of [`solve`] on the finest level.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SolveReport {
    pub levels: u32,
    /// Sweeps on the finest level.
    pub sweeps: usize,
    /// Sweeps over all levels.
    pub total_sweeps: usize,
    /// Mean absolute change of the last sweep.
    pub final_change: f64,
    pub converged: bool,
}

/// Half-resolution copy of `grid`.
///
/// A coarse cell is boundary when any of its four fine cells is; it then holds their boundary
/// mean. Free coarse cells start at zero.
#[must_use]
pub fn coarsen(grid: &HarmonicGrid) -> HarmonicGrid {
    let mut coarse = HarmonicGrid::new(grid.levels().saturating_sub(1));
    let size = coarse.size();
    for y in 0..size {
        for x in 0..size {
            let mut sum = 0.0;
            let mut count = 0_usize;
            for (fx, fy) in [(2 * x, 2 * y), (2 * x + 1, 2 * y), (2 * x, 2 * y + 1), (2 * x + 1, 2 * y + 1)] {
                let cell = grid.cell(fx, fy);
                if cell.boundary {
                    sum += cell.value;
                    count += 1;
                }
            }
            if count > 0 {
                coarse.set_boundary(x, y, sum / count as f64);
            }
        }
    }
    coarse
}

/// Copies the coarse solution into every free cell of `fine` (nearest neighbour).
pub fn prolong(coarse: &HarmonicGrid, fine: &mut HarmonicGrid) {
    let size = fine.size();
    let coarse_size = coarse.size();
    let cells = fine.cells_mut();
    for y in 0..size {
        for x in 0..size {
            let cell = &mut cells[y * size + x];
            if !cell.boundary {
                let cx = (x / 2).min(coarse_size - 1);
                let cy = (y / 2).min(coarse_size - 1);
                cell.value = coarse.value(cx, cy);
            }
        }
    }
}

/// Relaxes the interior of `grid` in place. Returns `(sweeps, final_change, converged)`.
///
/// The outermost ring is never updated. Boundary cells are never written.
pub fn relax(grid: &mut HarmonicGrid, options: &SolverOptions) -> (usize, f64, bool) {
    let size = grid.size();
    if size < 3 {
        return (0, 0.0, true);
    }
    let free = (1..size - 1)
        .flat_map(|y| (1..size - 1).map(move |x| (x, y)))
        .filter(|&(x, y)| !grid.cell(x, y).boundary)
        .count();
    if free == 0 {
        return (0, 0.0, true);
    }

    let cells = grid.cells_mut();
    let mut sweeps = 0;
    let mut change = f64::INFINITY;
    while change >= options.tolerance {
        if sweeps >= options.max_sweeps {
            log::warn!(
                "relaxation stopped after {sweeps} sweeps on a {size}x{size} grid (change {change:.3e})"
            );
            return (sweeps, change, false);
        }
        let mut total = 0.0;
        for y in 1..size - 1 {
            for x in 1..size - 1 {
                let index = y * size + x;
                if cells[index].boundary {
                    continue;
                }
                let mean = 0.25
                    * (cells[index - 1].value
                        + cells[index + 1].value
                        + cells[index - size].value
                        + cells[index + size].value);
                total += (mean - cells[index].value).abs();
                cells[index].value = mean;
            }
        }
        change = total / free as f64;
        sweeps += 1;
    }
    (sweeps, change, true)
}

/// Solves `grid` for its free cells, recursing through coarser levels first.
pub fn solve(grid: &mut HarmonicGrid, options: &SolverOptions) -> SolveReport {
    let mut coarse_sweeps = 0;
    if grid.levels() > COARSEST_LEVEL {
        let mut coarse = coarsen(grid);
        coarse_sweeps = solve(&mut coarse, options).total_sweeps;
        prolong(&coarse, grid);
    }
    let (sweeps, final_change, converged) = relax(grid, options);
    SolveReport {
        levels: grid.levels(),
        sweeps,
        total_sweeps: sweeps + coarse_sweeps,
        final_change,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coarsen_averages_boundary_sub_cells() {
        let mut fine = HarmonicGrid::new(4);
        fine.set_boundary(0, 0, 1.0);
        fine.set_boundary(1, 1, 3.0);
        fine.set_boundary(5, 2, 7.0);
        let coarse = coarsen(&fine);
        assert_eq!(coarse.size(), 8);
        assert!(coarse.cell(0, 0).boundary);
        assert_eq!(coarse.value(0, 0), 2.0);
        assert_eq!(coarse.value(2, 1), 7.0);
        assert_eq!(coarse.boundary_count(), 2);
    }

    #[test]
    fn prolong_leaves_boundary_cells_alone() {
        let mut coarse = HarmonicGrid::new(2);
        coarse.cells_mut().iter_mut().for_each(|c| c.value = 5.0);
        let mut fine = HarmonicGrid::new(3);
        fine.set_boundary(3, 3, -1.0);
        prolong(&coarse, &mut fine);
        assert_eq!(fine.value(3, 3), -1.0);
        assert_eq!(fine.value(4, 4), 5.0);
    }

    #[test]
    fn relax_without_free_cells_is_a_no_op() {
        let mut grid = HarmonicGrid::new(2);
        for y in 0..4 {
            for x in 0..4 {
                grid.set_boundary(x, y, 1.0);
            }
        }
        assert_eq!(relax(&mut grid, &SolverOptions::default()), (0, 0.0, true));
    }

    #[test]
    fn sweep_cap_stops_relaxation() {
        let mut grid = HarmonicGrid::new(5);
        for x in 0..32 {
            grid.set_boundary(x, 0, 1.0);
        }
        let options = SolverOptions {
            tolerance: 0.0,
            max_sweeps: 3,
        };
        let (sweeps, _, converged) = relax(&mut grid, &options);
        assert_eq!(sweeps, 3);
        assert!(!converged);
    }
}
