//! Ribbon parameterizations over a curved domain.
//!
//! A [`Parameterization`] maps a domain point to one `(s, d)` [`RibbonCoordinate`] per
//! boundary side. Two families are provided: grid-based harmonic fields
//! ([`HarmonicParameterization`], [`ConstrainedHarmonicParameterization`]) and
//! transfinite mean-value coordinates ([`MeanValueParameterization`]).

mod blend;
mod contours;
mod grid;
mod harmonic;
mod mean_value;
mod multigrid;
mod quadrature;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geom::{Domain, DomainError, UvPoint};

pub use blend::RibbonCoordinateBlender;
pub use contours::{ContourOptions, ContourSegment, iso_d_contours};
pub use grid::{Cell, HarmonicGrid};
pub use harmonic::{
    ConstrainedHarmonicParameterization, HarmonicOptions, HarmonicParameterization, MAX_LEVELS, MIN_LEVELS,
    build_side_grid,
};
pub use mean_value::{MeanValueEvaluator, MeanValueOptions, MeanValueParameterization};
pub use multigrid::{COARSEST_LEVEL, SolveReport, SolverOptions, coarsen, prolong, relax, solve};
pub use quadrature::{QuadratureRule, adaptive_simpson, chebyshev_fixed, romberg};

/// Local coordinates relative to one side: `s` runs along it, `d` away from it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RibbonCoordinate {
    pub s: f64,
    pub d: f64,
}

impl RibbonCoordinate {
    #[must_use]
    pub const fn new(s: f64, d: f64) -> Self {
        Self { s, d }
    }

    /// Returned for points a parameterization cannot place yet.
    pub const UNMAPPED: Self = Self::new(0.0, 1.0);

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.s.is_finite() && self.d.is_finite()
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParameterizationError {
    #[error("parameterization has no domain")]
    NoDomain,
    #[error("grid levels must be in {MIN_LEVELS}..={MAX_LEVELS}, got {levels}")]
    InvalidLevels { levels: u32 },
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// What a surface needs from a parameterization.
///
/// Shared between surfaces as `Arc<dyn Parameterization>`. `update` rebuilds the internal
/// state from the current domain and publishes it at once; mapping always reads a complete
/// snapshot. Before the first successful update every side maps to
/// [`RibbonCoordinate::UNMAPPED`].
pub trait Parameterization: Send + Sync {
    fn set_domain(&self, domain: Arc<dyn Domain>);

    fn update(&self) -> Result<(), ParameterizationError>;

    /// Number of sides of the last published state.
    fn size(&self) -> usize;

    /// `(s, d)` of `uv` relative to `side` (taken modulo the side count).
    fn map_to_ribbon(&self, side: usize, uv: UvPoint) -> RibbonCoordinate;

    fn map_to_ribbons(&self, uv: UvPoint) -> Vec<RibbonCoordinate> {
        (0..self.size()).map(|side| self.map_to_ribbon(side, uv)).collect()
    }
}

#[cfg(test)]
mod tests;
