//! Iso-`d` contour lines over a domain mesh, for inspecting a parameterization.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::geom::{DomainMesh, UvPoint};

use super::{Parameterization, RibbonCoordinate};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourOptions {
    /// Spacing between consecutive levels.
    pub density: f64,
    /// Levels per side, at `density, 2 * density, ...`.
    pub lines: usize,
}

impl Default for ContourOptions {
    fn default() -> Self {
        Self {
            density: 0.1,
            lines: 5,
        }
    }
}

impl ContourOptions {
    #[must_use]
    pub fn levels(&self) -> Vec<f64> {
        (1..=self.lines).map(|k| k as f64 * self.density).collect()
    }
}

/// Piece of the curve `d = level` of `side` inside one mesh triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourSegment {
    pub side: usize,
    pub level: f64,
    pub a: UvPoint,
    pub b: UvPoint,
}

#[cfg(feature = "parallel")]
fn map_vertices(points: &[UvPoint], parameterization: &dyn Parameterization) -> Vec<Vec<RibbonCoordinate>> {
    points.par_iter().map(|&uv| parameterization.map_to_ribbons(uv)).collect()
}

#[cfg(not(feature = "parallel"))]
fn map_vertices(points: &[UvPoint], parameterization: &dyn Parameterization) -> Vec<Vec<RibbonCoordinate>> {
    points.iter().map(|&uv| parameterization.map_to_ribbons(uv)).collect()
}

/// Marches every mesh triangle for every side and level.
///
/// Vertices are classified by `d < level`; an edge whose ends fall in different classes is
/// cut at the linearly interpolated crossing.
#[must_use]
pub fn iso_d_contours(
    mesh: &DomainMesh,
    parameterization: &dyn Parameterization,
    options: &ContourOptions,
) -> Vec<ContourSegment> {
    let coordinates = map_vertices(&mesh.parameters, parameterization);
    let sides = parameterization.size();
    let levels = options.levels();
    let mut segments = Vec::new();

    for side in 0..sides {
        for &level in &levels {
            for tri in mesh.triangles() {
                let offset = |i: u32| {
                    coordinates[i as usize]
                        .get(side)
                        .map_or(f64::NAN, |c| c.d - level)
                };
                let mut cut = Vec::with_capacity(2);
                for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                    let (fa, fb) = (offset(a), offset(b));
                    if !fa.is_finite() || !fb.is_finite() || (fa < 0.0) == (fb < 0.0) {
                        continue;
                    }
                    let t = fa / (fa - fb);
                    cut.push(mesh.parameters[a as usize].lerp(mesh.parameters[b as usize], t));
                }
                if let [a, b] = cut[..] {
                    segments.push(ContourSegment { side, level, a, b });
                }
            }
        }
    }
    log::debug!("traced {} contour segments over {sides} sides", segments.len());
    segments
}
