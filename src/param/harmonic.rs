//! Harmonic ribbon parameterizations.
//!
//! Every side `i` owns a [`HarmonicGrid`] whose Dirichlet data is `u` along side `i`,
//! `1 - u` along the next side and `0` along the rest of the loop. With `b_i` the solved field
//! of side `i` sampled at a point:
//!
//! - `s = b_i / (b_i + b_{i-1})`
//! - `d = 1 - b_i - b_{i-1}`

use std::sync::{Arc, PoisonError, RwLock};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::geom::{BSplineCurve, BoundaryCurve, Domain, DomainError, Tolerance, UvPoint};

use super::blend::RibbonCoordinateBlender;
use super::grid::HarmonicGrid;
use super::multigrid::{SolveReport, SolverOptions, solve};
use super::{Parameterization, ParameterizationError, RibbonCoordinate};

/// Smallest accepted grid level (4x4 cells).
pub const MIN_LEVELS: u32 = 2;
/// Largest accepted grid level (4096x4096 cells).
pub const MAX_LEVELS: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarmonicOptions {
    /// Grids are `2^levels` cells wide.
    pub levels: u32,
    /// Segments per side used to rasterize the boundary.
    pub boundary_resolution: usize,
    pub solver: SolverOptions,
}

impl Default for HarmonicOptions {
    fn default() -> Self {
        Self {
            levels: 10,
            boundary_resolution: 100,
            solver: SolverOptions::default(),
        }
    }
}

impl HarmonicOptions {
    #[must_use]
    pub fn with_levels(mut self, levels: u32) -> Self {
        self.levels = levels;
        self
    }
}

/// Dirichlet value of side `curve` at parameter `u` for the field of `side`.
fn boundary_value(side: usize, curve: usize, sides: usize, u: f64) -> f64 {
    if curve == side {
        u
    } else if curve == (side + 1) % sides {
        1.0 - u
    } else {
        0.0
    }
}

/// Rasterizes and solves the field of `side` over the planar loop `curves`.
#[must_use]
pub fn build_side_grid(curves: &[BSplineCurve], side: usize, options: &HarmonicOptions) -> (HarmonicGrid, SolveReport) {
    let mut grid = HarmonicGrid::new(options.levels);
    let steps = options.boundary_resolution.max(1);
    for (j, curve) in curves.iter().enumerate() {
        let mut u0 = 0.0;
        let mut p0 = curve.evaluate(u0).to_uv();
        for k in 1..=steps {
            let u1 = k as f64 / steps as f64;
            let p1 = curve.evaluate(u1).to_uv();
            grid.rasterize_segment(
                p0,
                boundary_value(side, j, curves.len(), u0),
                p1,
                boundary_value(side, j, curves.len(), u1),
            );
            (u0, p0) = (u1, p1);
        }
    }
    let report = solve(&mut grid, &options.solver);
    log::debug!(
        "side {side} relaxed in {} sweeps ({} over all levels), change {:.3e}",
        report.sweeps,
        report.total_sweeps,
        report.final_change
    );
    (grid, report)
}

#[cfg(feature = "parallel")]
fn build_side_grids(curves: &[BSplineCurve], options: &HarmonicOptions) -> Vec<(HarmonicGrid, SolveReport)> {
    (0..curves.len())
        .into_par_iter()
        .map(|side| build_side_grid(curves, side, options))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn build_side_grids(curves: &[BSplineCurve], options: &HarmonicOptions) -> Vec<(HarmonicGrid, SolveReport)> {
    (0..curves.len())
        .map(|side| build_side_grid(curves, side, options))
        .collect()
}

#[derive(Debug, Default)]
struct Fields {
    grids: Vec<HarmonicGrid>,
    reports: Vec<SolveReport>,
}

impl Fields {
    fn plain(&self, side: usize, uv: UvPoint) -> RibbonCoordinate {
        let n = self.grids.len();
        let side = side % n;
        let prev = (side + n - 1) % n;
        let bi = self.grids[side].sample(uv);
        let bp = self.grids[prev].sample(uv);
        let sum = bi + bp;
        let s = if sum.abs() < Tolerance::SINGULAR.eps { 0.0 } else { bi / sum };
        RibbonCoordinate::new(s, 1.0 - sum)
    }
}

/// Plain harmonic parameterization.
#[derive(Default)]
pub struct HarmonicParameterization {
    options: HarmonicOptions,
    domain: RwLock<Option<Arc<dyn Domain>>>,
    fields: RwLock<Arc<Fields>>,
}

impl std::fmt::Debug for HarmonicParameterization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HarmonicParameterization")
            .field("options", &self.options)
            .field("sides", &self.size())
            .finish()
    }
}

impl HarmonicParameterization {
    #[must_use]
    pub fn new(options: HarmonicOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn options(&self) -> &HarmonicOptions {
        &self.options
    }

    /// Solver outcome per side of the last update.
    #[must_use]
    pub fn solve_reports(&self) -> Vec<SolveReport> {
        self.snapshot().reports.clone()
    }

    /// Solved grid of `side`, if updated.
    #[must_use]
    pub fn grid(&self, side: usize) -> Option<HarmonicGrid> {
        self.snapshot().grids.get(side).cloned()
    }

    fn snapshot(&self) -> Arc<Fields> {
        Arc::clone(&self.fields.read().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Parameterization for HarmonicParameterization {
    fn set_domain(&self, domain: Arc<dyn Domain>) {
        *self.domain.write().unwrap_or_else(PoisonError::into_inner) = Some(domain);
        *self.fields.write().unwrap_or_else(PoisonError::into_inner) = Arc::default();
    }

    fn update(&self) -> Result<(), ParameterizationError> {
        let levels = self.options.levels;
        if !(MIN_LEVELS..=MAX_LEVELS).contains(&levels) {
            return Err(ParameterizationError::InvalidLevels { levels });
        }
        let domain = self
            .domain
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ParameterizationError::NoDomain)?;
        let curves = domain.boundaries();
        if curves.is_empty() {
            return Err(DomainError::NoCurves.into());
        }

        let (grids, reports): (Vec<_>, Vec<_>) = build_side_grids(&curves, &self.options).into_iter().unzip();
        let unconverged = reports.iter().filter(|r| !r.converged).count();
        if unconverged > 0 {
            log::warn!("{unconverged} of {} harmonic fields did not converge", reports.len());
        }
        *self.fields.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(Fields { grids, reports });
        Ok(())
    }

    fn size(&self) -> usize {
        self.snapshot().grids.len()
    }

    fn map_to_ribbon(&self, side: usize, uv: UvPoint) -> RibbonCoordinate {
        let fields = self.snapshot();
        if fields.grids.is_empty() {
            return RibbonCoordinate::UNMAPPED;
        }
        fields.plain(side, uv)
    }
}

/// Harmonic parameterization with the corner-safe `d` correction of
/// [`RibbonCoordinateBlender`].
#[derive(Debug, Default)]
pub struct ConstrainedHarmonicParameterization {
    harmonic: HarmonicParameterization,
    blender: RibbonCoordinateBlender,
}

impl ConstrainedHarmonicParameterization {
    #[must_use]
    pub fn new(options: HarmonicOptions) -> Self {
        Self {
            harmonic: HarmonicParameterization::new(options),
            blender: RibbonCoordinateBlender::default(),
        }
    }

    /// The unconstrained parameterization underneath.
    #[must_use]
    pub fn harmonic(&self) -> &HarmonicParameterization {
        &self.harmonic
    }
}

impl Parameterization for ConstrainedHarmonicParameterization {
    fn set_domain(&self, domain: Arc<dyn Domain>) {
        self.harmonic.set_domain(domain);
    }

    fn update(&self) -> Result<(), ParameterizationError> {
        self.harmonic.update()
    }

    fn size(&self) -> usize {
        self.harmonic.size()
    }

    fn map_to_ribbon(&self, side: usize, uv: UvPoint) -> RibbonCoordinate {
        let fields = self.harmonic.snapshot();
        let n = fields.grids.len();
        if n == 0 {
            return RibbonCoordinate::UNMAPPED;
        }
        let side = side % n;
        let plain = fields.plain(side, uv);
        let s_prev = fields.plain(side + n - 1, uv).s;
        let s_next = fields.plain(side + 1, uv).s;
        RibbonCoordinate::new(plain.s, self.blender.blend(plain, s_prev, s_next))
    }
}
