mod cache;
mod core;
mod curve;
mod domain;
mod mesh;
mod plane;
mod triangulation;

pub use cache::{MAX_CACHED_MESHES, MeshCache, MeshCacheStats, SharedMesh};
pub use core::{BBox, Point3, Tolerance, UvPoint, Vec3, orient2d};
pub use curve::{
    ARC_LENGTH_SAMPLES, BSplineCurve, BoundaryCurve, Curve3, CurveError, DEFAULT_INTERSECTION_SAMPLES,
    plane_crossings, polyline_length,
};
pub use domain::{CurvedDomain, Domain, DomainError, DomainOptions, boundary_samples, build_mesh};
pub use mesh::DomainMesh;
pub use plane::{BestFitPlane, DEFAULT_MARGIN, PlaneProjector, fit_plane};
pub use triangulation::{
    TriangulationDiagnostics, TriangulationError, TriangulationOptions, TriangulationResult,
    equilateral_area, polygon_self_intersects, triangulate,
};

#[cfg(test)]
mod tests;
