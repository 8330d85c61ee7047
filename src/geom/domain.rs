//! Curved n-sided parameter domain.
//!
//! A [`CurvedDomain`] owns the boundary loop as supplied by the caller, its projection into
//! the unit square and the per-resolution triangulations of that projection.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cache::{MeshCache, MeshCacheStats, SharedMesh};
use super::core::{Tolerance, UvPoint};
use super::curve::{BSplineCurve, BoundaryCurve};
use super::mesh::DomainMesh;
use super::plane::{DEFAULT_MARGIN, PlaneProjector};
use super::triangulation::{
    TriangulationError, TriangulationOptions, equilateral_area, polygon_self_intersects, triangulate,
};

/// Samples per side used to check the projected loop for self-intersections on update.
const LOOP_CHECK_SAMPLES: usize = 32;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    #[error("domain has no boundary curves")]
    NoCurves,
    #[error("domain needs at least 3 sides, got {count}")]
    NotEnoughSides { count: usize },
    #[error("boundary control points must be finite")]
    NonFinitePoint,
    #[error("domain degenerate: boundary has no well-defined plane or extent")]
    DomainDegenerate,
    #[error("projected boundary loop intersects itself")]
    SelfIntersecting,
    #[error("mesh resolution must be >= 1")]
    InvalidResolution,
    #[error("failed to triangulate domain: {0}")]
    Triangulation(#[from] TriangulationError),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainOptions {
    /// Inset of the projected loop inside the unit square.
    pub margin: f64,
    /// Largest gap between consecutive sides (in projected units) accepted without a warning.
    pub boundary_tolerance: f64,
    pub triangulation: TriangulationOptions,
}

impl Default for DomainOptions {
    fn default() -> Self {
        Self {
            margin: DEFAULT_MARGIN,
            boundary_tolerance: Tolerance::LOOSE.eps,
            triangulation: TriangulationOptions::default(),
        }
    }
}

/// What a parameterization needs from a domain.
///
/// Implementations are shared between parameterizations and surfaces, hence `Send + Sync`
/// and `&self` everywhere.
pub trait Domain: Send + Sync {
    /// Rebuilds derived geometry; returns whether the projected boundary changed.
    fn update(&self) -> Result<bool, DomainError>;

    /// Number of sides.
    fn size(&self) -> usize;

    /// Projected boundary curves, side 0 first. Empty before the first successful update.
    fn boundaries(&self) -> Arc<[BSplineCurve]>;

    /// Triangulated domain at `resolution` samples per side.
    fn mesh(&self, resolution: usize) -> Result<SharedMesh, DomainError>;

    /// Mesh sample points, boundary samples first.
    fn parameters(&self, resolution: usize) -> Result<Vec<UvPoint>, DomainError> {
        Ok(self.mesh(resolution)?.parameters.clone())
    }

    /// Triangle list (three indices per triangle) into [`Domain::parameters`].
    fn mesh_topology(&self, resolution: usize) -> Result<Vec<u32>, DomainError> {
        Ok(self.mesh(resolution)?.indices.clone())
    }
}

#[derive(Debug, Clone, Default)]
struct Boundary {
    generation: u64,
    planar: Arc<[BSplineCurve]>,
}

#[derive(Debug, Default)]
pub struct CurvedDomain {
    options: DomainOptions,
    curves: RwLock<Arc<[BSplineCurve]>>,
    boundary: RwLock<Boundary>,
    cache: Mutex<MeshCache>,
}

impl CurvedDomain {
    #[must_use]
    pub fn new(options: DomainOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Domain over `curves`, already updated.
    pub fn from_curves(curves: Vec<BSplineCurve>, options: DomainOptions) -> Result<Self, DomainError> {
        let domain = Self::new(options);
        domain.set_curves(curves);
        domain.update()?;
        Ok(domain)
    }

    #[must_use]
    pub fn options(&self) -> &DomainOptions {
        &self.options
    }

    /// Replaces the boundary loop. Takes effect on the next [`Domain::update`].
    pub fn set_curves(&self, curves: Vec<BSplineCurve>) {
        *self.curves.write().unwrap_or_else(PoisonError::into_inner) = curves.into();
    }

    /// The boundary loop as supplied, before projection.
    #[must_use]
    pub fn curves(&self) -> Arc<[BSplineCurve]> {
        Arc::clone(&self.curves.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Increases every time the projected boundary changes.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.boundary.read().unwrap_or_else(PoisonError::into_inner).generation
    }

    #[must_use]
    pub fn cache_stats(&self) -> MeshCacheStats {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).stats()
    }

    fn snapshot(&self) -> Boundary {
        self.boundary.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn project(&self, curves: &[BSplineCurve]) -> Result<Vec<BSplineCurve>, DomainError> {
        match curves.len() {
            0 => return Err(DomainError::NoCurves),
            count @ 1..=2 => return Err(DomainError::NotEnoughSides { count }),
            _ => {}
        }
        let planar = PlaneProjector::new(self.options.margin).project(curves)?;

        for (i, curve) in planar.iter().enumerate() {
            let next = &planar[(i + 1) % planar.len()];
            let gap = curve.end().distance_to(next.start());
            if gap > self.options.boundary_tolerance {
                log::warn!("side {i} ends {gap:.3e} away from the start of side {}", (i + 1) % planar.len());
            }
        }
        if polygon_self_intersects(&boundary_samples(&planar, LOOP_CHECK_SAMPLES)) {
            return Err(DomainError::SelfIntersecting);
        }
        Ok(planar)
    }
}

impl Domain for CurvedDomain {
    fn update(&self) -> Result<bool, DomainError> {
        let curves = self.curves();
        let planar = self.project(&curves)?;

        let mut boundary = self.boundary.write().unwrap_or_else(PoisonError::into_inner);
        if boundary.planar.as_ref() == planar.as_slice() {
            return Ok(false);
        }
        let generation = boundary.generation + 1;
        *boundary = Boundary {
            generation,
            planar: planar.into(),
        };
        // Invalidate while still holding the boundary lock so no reader can pair the new
        // boundary with an old mesh.
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).invalidate(generation);
        log::debug!("domain updated to generation {generation} with {} sides", curves.len());
        Ok(true)
    }

    fn size(&self) -> usize {
        self.boundary.read().unwrap_or_else(PoisonError::into_inner).planar.len()
    }

    fn boundaries(&self) -> Arc<[BSplineCurve]> {
        self.snapshot().planar
    }

    fn mesh(&self, resolution: usize) -> Result<SharedMesh, DomainError> {
        if resolution == 0 {
            return Err(DomainError::InvalidResolution);
        }
        let Boundary { generation, planar } = self.snapshot();
        if planar.is_empty() {
            return Err(DomainError::NoCurves);
        }

        if let Some(mesh) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(resolution, generation)
        {
            return Ok(mesh);
        }

        let mesh = build_mesh(&planar, resolution, &self.options.triangulation)?;
        Ok(self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .publish(resolution, generation, mesh))
    }
}

/// `resolution` samples per side at `u = k / resolution`, side 0 first.
#[must_use]
pub fn boundary_samples(curves: &[BSplineCurve], resolution: usize) -> Vec<UvPoint> {
    let mut samples = Vec::with_capacity(curves.len() * resolution);
    for curve in curves {
        for k in 0..resolution {
            samples.push(curve.evaluate(k as f64 / resolution as f64).to_uv());
        }
    }
    samples
}

/// Triangulates the region bounded by the sampled loop.
///
/// Unless `options` fixes one, the area bound is that of an equilateral triangle whose
/// edge is the average side length over `2 * resolution`.
pub fn build_mesh(
    planar: &[BSplineCurve],
    resolution: usize,
    options: &TriangulationOptions,
) -> Result<DomainMesh, DomainError> {
    let samples = boundary_samples(planar, resolution);
    if samples.iter().any(|p| !p.is_finite()) {
        return Err(DomainError::NonFinitePoint);
    }
    if polygon_self_intersects(&samples) {
        return Err(DomainError::SelfIntersecting);
    }

    let n = samples.len() as u32;
    let segments: Vec<[u32; 2]> = (0..n).map(|i| [i, (i + 1) % n]).collect();

    let average_side = planar.iter().map(|c| c.arc_length(0.0, 1.0)).sum::<f64>() / planar.len() as f64;
    let edge = average_side / (2.0 * resolution as f64);
    let options = TriangulationOptions {
        max_area: options.max_area.or(Some(equilateral_area(edge))),
        ..*options
    };

    let result = triangulate(&samples, &segments, &options)?;
    Ok(DomainMesh {
        resolution,
        sides: planar.len(),
        parameters: result.vertices,
        indices: result.indices,
        diagnostics: result.diagnostics,
    })
}
