use super::core::{UvPoint, orient2d};
use super::triangulation::TriangulationDiagnostics;

/// Triangulated parameter domain at one sampling resolution.
///
/// The first `boundary_vertex_count()` parameters are the boundary samples in loop order
/// (side 0 first, `resolution` samples per side); Steiner points follow.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DomainMesh {
    pub resolution: usize,
    pub sides: usize,
    pub parameters: Vec<UvPoint>,
    pub indices: Vec<u32>,
    pub diagnostics: TriangulationDiagnostics,
}

impl DomainMesh {
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.parameters.len()
    }

    #[must_use]
    pub fn boundary_vertex_count(&self) -> usize {
        self.sides * self.resolution
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Total (unsigned) area of the triangles.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.triangles()
            .map(|[a, b, c]| {
                let p = |i: u32| self.parameters[i as usize];
                0.5 * orient2d(p(a), p(b), p(c)).abs()
            })
            .sum()
    }

    /// Returns true if any parameter contains NaN or Inf values.
    #[must_use]
    pub fn has_invalid_vertices(&self) -> bool {
        self.parameters.iter().any(|p| !p.is_finite())
    }

    /// Returns true if all vertex indices are within bounds.
    #[must_use]
    pub fn has_valid_indices(&self) -> bool {
        let n = self.parameters.len() as u32;
        self.indices.iter().all(|&i| i < n)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.indices.len() % 3 != 0 {
            return Err("mesh indices are not a triangle list (len % 3 != 0)".to_string());
        }
        if self.has_invalid_vertices() {
            return Err("mesh has invalid parameter coordinates (NaN/Inf)".to_string());
        }
        if !self.has_valid_indices() {
            return Err("mesh has out-of-bounds vertex indices".to_string());
        }
        if self.parameters.len() < self.boundary_vertex_count() {
            return Err(format!(
                "mesh has {} parameters but {} boundary samples were requested",
                self.parameters.len(),
                self.boundary_vertex_count()
            ));
        }
        Ok(())
    }
}
