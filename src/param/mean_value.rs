//! Transfinite mean-value ribbon coordinates.
//!
//! For a point `p` and side `i`, `d` is the ratio of two integrals over the direction angle:
//! the alternating sum of `f(hit) / |hit - p|` over the forward ray hits with the boundary,
//! and the same sum with `f = 1`. The boundary function `f` is 0 on side `i`, a linear ramp
//! on its neighbours (0 at the shared corners) and 1 elsewhere. `s` is not defined for this
//! parameterization and is always 0.

use std::cell::Cell;
use std::f64::consts::TAU;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::geom::{
    BSplineCurve, BoundaryCurve, DEFAULT_INTERSECTION_SAMPLES, Domain, DomainError, Point3, Tolerance, UvPoint,
    Vec3, plane_crossings,
};

use super::quadrature::QuadratureRule;
use super::{Parameterization, ParameterizationError, RibbonCoordinate};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeanValueOptions {
    pub quadrature: QuadratureRule,
    /// Samples per side when searching for ray crossings.
    pub intersection_samples: usize,
}

impl Default for MeanValueOptions {
    fn default() -> Self {
        Self {
            quadrature: QuadratureRule::default(),
            intersection_samples: DEFAULT_INTERSECTION_SAMPLES,
        }
    }
}

/// A ray crossing with the boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Hit {
    distance: f64,
    side: usize,
    u: f64,
}

/// Evaluates mean-value `d` coordinates over a planar boundary loop.
#[derive(Debug, Clone, Copy)]
pub struct MeanValueEvaluator<'a> {
    curves: &'a [BSplineCurve],
    options: &'a MeanValueOptions,
}

impl<'a> MeanValueEvaluator<'a> {
    #[must_use]
    pub fn new(curves: &'a [BSplineCurve], options: &'a MeanValueOptions) -> Self {
        Self { curves, options }
    }

    /// Boundary function of `side` at parameter `u` of boundary curve `curve`.
    #[must_use]
    pub fn boundary_value(&self, side: usize, curve: usize, u: f64) -> f64 {
        let n = self.curves.len();
        if curve == side {
            0.0
        } else if curve == (side + 1) % n {
            u
        } else if curve == (side + n - 1) % n {
            1.0 - u
        } else {
            1.0
        }
    }

    /// Forward hits of the ray from `p` in direction `dir`, nearest first.
    fn hits(&self, p: Point3, dir: Vec3) -> Vec<Hit> {
        let normal = Vec3::new(dir.y, -dir.x, 0.0);
        let mut hits = Vec::new();
        for (side, curve) in self.curves.iter().enumerate() {
            let crossings = plane_crossings(|u| curve.evaluate(u), p, normal, self.options.intersection_samples);
            for u in crossings {
                let offset = curve.evaluate(u).sub_point(p);
                let offset = Vec3::new(offset.x, offset.y, 0.0);
                let distance = offset.length();
                if distance <= Tolerance::SINGULAR.eps || offset.dot(dir) >= 0.0 {
                    hits.push(Hit { distance, side, u });
                }
            }
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        // A ray through a shared corner crosses both sides there.
        hits.dedup_by(|b, a| (b.distance - a.distance).abs() <= Tolerance::DEFAULT.eps);
        hits
    }

    /// `d` of `uv` relative to `side`.
    ///
    /// A point on the boundary returns the boundary function at that point for the whole
    /// integral, not a 0/1 integrand value for the one direction that hit it.
    #[must_use]
    pub fn distance(&self, side: usize, uv: UvPoint) -> f64 {
        let n = self.curves.len();
        if n == 0 {
            return RibbonCoordinate::UNMAPPED.d;
        }
        let side = side % n;
        let p = uv.to_point3();
        let on_boundary = Cell::new(None);

        let sums = |theta: f64| {
            let dir = Vec3::new(theta.cos(), theta.sin(), 0.0);
            let (mut num, mut den) = (0.0, 0.0);
            for (k, hit) in self.hits(p, dir).iter().enumerate() {
                if hit.distance <= Tolerance::SINGULAR.eps {
                    on_boundary.set(Some(self.boundary_value(side, hit.side, hit.u)));
                    break;
                }
                let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
                num += sign * self.boundary_value(side, hit.side, hit.u) / hit.distance;
                den += sign / hit.distance;
            }
            (num, den)
        };

        let numerator = self.options.quadrature.integrate(|t| sums(t).0, 0.0, TAU);
        if let Some(value) = on_boundary.get() {
            return value;
        }
        let denominator = self.options.quadrature.integrate(|t| sums(t).1, 0.0, TAU);
        if let Some(value) = on_boundary.get() {
            return value;
        }
        if denominator.abs() < Tolerance::SINGULAR.eps {
            log::warn!("mean-value normalization vanished at ({:.6}, {:.6}) for side {side}", uv.u, uv.v);
            return 1.0;
        }
        numerator / denominator
    }

    #[must_use]
    pub fn map(&self, side: usize, uv: UvPoint) -> RibbonCoordinate {
        RibbonCoordinate::new(0.0, self.distance(side, uv))
    }
}

/// Mean-value parameterization over the projected boundary of a domain.
#[derive(Default)]
pub struct MeanValueParameterization {
    options: MeanValueOptions,
    domain: RwLock<Option<Arc<dyn Domain>>>,
    curves: RwLock<Arc<[BSplineCurve]>>,
}

impl std::fmt::Debug for MeanValueParameterization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeanValueParameterization")
            .field("options", &self.options)
            .field("sides", &self.size())
            .finish()
    }
}

impl MeanValueParameterization {
    #[must_use]
    pub fn new(options: MeanValueOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn options(&self) -> &MeanValueOptions {
        &self.options
    }

    fn snapshot(&self) -> Arc<[BSplineCurve]> {
        Arc::clone(&self.curves.read().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Parameterization for MeanValueParameterization {
    fn set_domain(&self, domain: Arc<dyn Domain>) {
        *self.domain.write().unwrap_or_else(PoisonError::into_inner) = Some(domain);
        *self.curves.write().unwrap_or_else(PoisonError::into_inner) = Arc::from(Vec::new());
    }

    fn update(&self) -> Result<(), ParameterizationError> {
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
        *self.curves.write().unwrap_or_else(PoisonError::into_inner) = curves;
        Ok(())
    }

    fn size(&self) -> usize {
        self.snapshot().len()
    }

    fn map_to_ribbon(&self, side: usize, uv: UvPoint) -> RibbonCoordinate {
        let curves = self.snapshot();
        if curves.is_empty() {
            return RibbonCoordinate::UNMAPPED;
        }
        MeanValueEvaluator::new(&curves, &self.options).map(side, uv)
    }
}
