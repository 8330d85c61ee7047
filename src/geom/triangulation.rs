use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::core::{Tolerance, UvPoint, orient2d};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TriangulationError {
    #[error("triangulation vertices must be finite")]
    NonFinitePoint,
    #[error("triangulation requires at least 3 points, got {0}")]
    NotEnoughPoints(usize),
    #[error("segment {segment} references vertex {index} but only {count} vertices exist")]
    InvalidSegment { segment: usize, index: u32, count: usize },
    #[error("boundary polygon is degenerate (zero area)")]
    DegeneratePolygon,
    #[error("triangulation produced no interior triangles")]
    NoTriangles,
}

/// Quality flags of the constrained triangulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriangulationOptions {
    /// Upper bound on triangle area; `None` bounds only the angles.
    pub max_area: Option<f64>,
    pub min_angle_deg: f64,
    /// Allow extra vertices (interior and on split boundary segments).
    pub allow_steiner: bool,
    /// Keep every boundary segment (or its split pieces) as a mesh edge.
    pub preserve_boundary: bool,
    pub max_refinement_rounds: usize,
}

impl Default for TriangulationOptions {
    fn default() -> Self {
        Self {
            max_area: None,
            min_angle_deg: 20.0,
            allow_steiner: true,
            preserve_boundary: true,
            max_refinement_rounds: 24,
        }
    }
}

impl TriangulationOptions {
    #[must_use]
    pub fn with_max_area(mut self, max_area: f64) -> Self {
        self.max_area = Some(max_area);
        self
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct TriangulationDiagnostics {
    pub input_vertex_count: usize,
    pub steiner_point_count: usize,
    pub boundary_split_count: usize,
    pub output_triangle_count: usize,
    pub refinement_rounds: usize,
    /// Smallest interior angle of the output, in degrees.
    pub min_angle_deg: f64,
    pub max_triangle_area: f64,
    pub quality_met: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriangulationResult {
    /// Input vertices in their original order, followed by Steiner points.
    pub vertices: Vec<UvPoint>,
    /// Counter-clockwise triangles, three indices each.
    pub indices: Vec<u32>,
    pub diagnostics: TriangulationDiagnostics,
}

/// Area of an equilateral triangle with the given edge length.
#[must_use]
pub fn equilateral_area(edge: f64) -> f64 {
    edge * edge * 3.0_f64.sqrt() / 4.0
}

/// Quality-constrained triangulation of the region bounded by `segments`.
///
/// The region is the even-odd interior of the segment set. Delaunay triangulation is
/// delegated to `delaunator`; quality is reached by seeding an equilateral lattice and then
/// inserting circumcenters of bad triangles, splitting boundary segments they encroach upon.
pub fn triangulate(
    points: &[UvPoint],
    segments: &[[u32; 2]],
    options: &TriangulationOptions,
) -> Result<TriangulationResult, TriangulationError> {
    if points.len() < 3 {
        return Err(TriangulationError::NotEnoughPoints(points.len()));
    }
    if points.iter().any(|p| !p.is_finite()) {
        return Err(TriangulationError::NonFinitePoint);
    }
    for (segment, seg) in segments.iter().enumerate() {
        for &index in seg {
            if index as usize >= points.len() {
                return Err(TriangulationError::InvalidSegment {
                    segment,
                    index,
                    count: points.len(),
                });
            }
        }
    }

    let region_area = segments
        .iter()
        .map(|&[a, b]| {
            let (a, b) = (points[a as usize], points[b as usize]);
            0.5 * (a.u * b.v - b.u * a.v)
        })
        .sum::<f64>()
        .abs();
    if region_area <= Tolerance::ZERO_LENGTH.eps {
        return Err(TriangulationError::DegeneratePolygon);
    }

    let mean_segment = segments
        .iter()
        .map(|&[a, b]| points[a as usize].distance(points[b as usize]))
        .sum::<f64>()
        / segments.len().max(1) as f64;

    let max_area = options.max_area.filter(|a| a.is_finite() && *a > 0.0);
    // Edge length of an equilateral triangle meeting the area bound, slightly shrunk so
    // lattice triangles land strictly under it.
    let spacing = match max_area {
        Some(area) => 0.95 * (4.0 * area / 3.0_f64.sqrt()).sqrt(),
        None => mean_segment,
    }
    .max(Tolerance::LOOSE.eps);

    let target_triangles = region_area / equilateral_area(spacing);
    let mut refiner = Refiner {
        options,
        points: points.to_vec(),
        segments: segments.to_vec(),
        grid: PointGrid::new(spacing),
        spacing,
        max_area: max_area.unwrap_or(f64::INFINITY),
        point_budget: points.len() + 8 * segments.len() + (4.0 * target_triangles) as usize,
        boundary_splits: 0,
    };
    for (i, p) in points.iter().enumerate() {
        refiner.grid.insert(i as u32, *p);
    }

    let mut rounds = 0;
    if options.allow_steiner {
        if options.preserve_boundary {
            refiner.conform();
        }
        refiner.seed_lattice();
    }

    let mut triangles = refiner.interior_triangles()?;
    if options.allow_steiner {
        for round in 0..options.max_refinement_rounds {
            let bad = refiner.bad_triangles(&triangles);
            if bad.is_empty() {
                break;
            }
            rounds = round + 1;
            if refiner.refine(&triangles, &bad) == 0 {
                break;
            }
            if options.preserve_boundary {
                refiner.conform();
            }
            triangles = refiner.interior_triangles()?;
        }
    }

    let diagnostics = refiner.diagnostics(points.len(), &triangles, rounds);
    if !diagnostics.quality_met {
        log::warn!(
            "triangulation quality bound not met after {} rounds (min angle {:.2} deg, max area {:.3e})",
            rounds,
            diagnostics.min_angle_deg,
            diagnostics.max_triangle_area
        );
    }
    log::debug!(
        "triangulated {} triangles ({} steiner points) in {} refinement rounds",
        diagnostics.output_triangle_count,
        diagnostics.steiner_point_count,
        rounds
    );

    Ok(TriangulationResult {
        vertices: refiner.points,
        indices: triangles.iter().flatten().copied().collect(),
        diagnostics,
    })
}

/// Whether the closed polygon through `points` crosses itself.
///
/// Consecutive edges share a vertex and are not tested against each other.
#[must_use]
pub fn polygon_self_intersects(points: &[UvPoint]) -> bool {
    let n = points.len();
    if n < 4 {
        return false;
    }
    let tol = Tolerance::ZERO_LENGTH;
    for i in 0..n {
        let (a, b) = (points[i], points[(i + 1) % n]);
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let (c, d) = (points[j], points[(j + 1) % n]);
            if segments_intersect(a, b, c, d, tol) {
                return true;
            }
        }
    }
    false
}

struct Refiner<'a> {
    options: &'a TriangulationOptions,
    points: Vec<UvPoint>,
    segments: Vec<[u32; 2]>,
    grid: PointGrid,
    spacing: f64,
    max_area: f64,
    point_budget: usize,
    boundary_splits: usize,
}

impl Refiner<'_> {
    fn insert(&mut self, p: UvPoint) -> u32 {
        let index = self.points.len() as u32;
        self.points.push(p);
        self.grid.insert(index, p);
        index
    }

    fn has_budget(&self) -> bool {
        self.points.len() < self.point_budget
    }

    /// Even-odd containment against the current segment set.
    fn inside(&self, p: UvPoint) -> bool {
        let mut inside = false;
        for &[a, b] in &self.segments {
            let (a, b) = (self.points[a as usize], self.points[b as usize]);
            if (a.v > p.v) != (b.v > p.v) {
                let x = a.u + (p.v - a.v) / (b.v - a.v) * (b.u - a.u);
                if p.u < x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// First segment whose diametral circle strictly contains `p`.
    fn encroached_segment(&self, p: UvPoint) -> Option<usize> {
        self.segments.iter().position(|&[a, b]| {
            let (a, b) = (self.points[a as usize], self.points[b as usize]);
            (a.u - p.u) * (b.u - p.u) + (a.v - p.v) * (b.v - p.v) < 0.0
        })
    }

    fn segment_is_encroached(&self, k: usize) -> bool {
        let [ia, ib] = self.segments[k];
        let (a, b) = (self.points[ia as usize], self.points[ib as usize]);
        let mid = a.lerp(b, 0.5);
        self.grid.any_near(&self.points, mid, 0.5 * a.distance(b), |index, p| {
            index != ia && index != ib && (a.u - p.u) * (b.u - p.u) + (a.v - p.v) * (b.v - p.v) < 0.0
        })
    }

    fn split_segment(&mut self, k: usize) -> bool {
        let [ia, ib] = self.segments[k];
        let (a, b) = (self.points[ia as usize], self.points[ib as usize]);
        if a.distance(b) < 0.1 * self.spacing || !self.has_budget() {
            return false;
        }
        let m = self.insert(a.lerp(b, 0.5));
        self.segments[k] = [ia, m];
        self.segments.push([m, ib]);
        self.boundary_splits += 1;
        true
    }

    /// Splits boundary segments until none has a vertex inside its diametral circle.
    fn conform(&mut self) {
        let mut queue: Vec<usize> = (0..self.segments.len()).collect();
        while let Some(k) = queue.pop() {
            if self.segment_is_encroached(k) && self.split_segment(k) {
                queue.push(k);
                queue.push(self.segments.len() - 1);
            }
        }
    }

    fn seed_lattice(&mut self) {
        let Some((min, max)) = bounds(&self.points) else {
            return;
        };
        let h = self.spacing;
        let row = h * 3.0_f64.sqrt() / 2.0;
        let rows = ((max.v - min.v) / row).ceil() as usize;
        let cols = ((max.u - min.u) / h).ceil() as usize + 1;

        for j in 0..rows {
            let v = min.v + (j as f64 + 0.5) * row;
            let offset = if j % 2 == 1 { 0.5 * h } else { 0.0 };
            for i in 0..cols {
                if !self.has_budget() {
                    return;
                }
                let p = UvPoint::new(min.u + offset + i as f64 * h, v);
                if !self.inside(p) || self.near_boundary(p) {
                    continue;
                }
                if self.grid.any_near(&self.points, p, 0.5 * h, |_, _| true) {
                    continue;
                }
                self.insert(p);
            }
        }
    }

    /// Inside a slightly enlarged diametral circle of some segment.
    fn near_boundary(&self, p: UvPoint) -> bool {
        let pad = 0.25 * self.spacing;
        self.segments.iter().any(|&[a, b]| {
            let (a, b) = (self.points[a as usize], self.points[b as usize]);
            p.distance(a.lerp(b, 0.5)) < 0.5 * a.distance(b) + pad
        })
    }

    fn interior_triangles(&self) -> Result<Vec<[u32; 3]>, TriangulationError> {
        let input: Vec<delaunator::Point> = self
            .points
            .iter()
            .map(|p| delaunator::Point { x: p.u, y: p.v })
            .collect();
        let triangulation = delaunator::triangulate(&input);

        let degenerate = Tolerance::ZERO_LENGTH.eps * self.spacing * self.spacing;
        let mut triangles = Vec::with_capacity(triangulation.triangles.len() / 3);
        for tri in triangulation.triangles.chunks_exact(3) {
            let (i0, i1, i2) = (tri[0] as u32, tri[1] as u32, tri[2] as u32);
            let (a, b, c) = (self.point(i0), self.point(i1), self.point(i2));
            let area2 = orient2d(a, b, c);
            if area2.abs() <= degenerate {
                continue;
            }
            let centroid = UvPoint::new((a.u + b.u + c.u) / 3.0, (a.v + b.v + c.v) / 3.0);
            if !self.inside(centroid) {
                continue;
            }
            if area2 > 0.0 {
                triangles.push([i0, i1, i2]);
            } else {
                triangles.push([i0, i2, i1]);
            }
        }

        if triangles.is_empty() {
            return Err(TriangulationError::NoTriangles);
        }
        Ok(triangles)
    }

    fn point(&self, index: u32) -> UvPoint {
        self.points[index as usize]
    }

    fn is_bad(&self, tri: &[u32; 3]) -> bool {
        let (a, b, c) = (self.point(tri[0]), self.point(tri[1]), self.point(tri[2]));
        let area = 0.5 * orient2d(a, b, c).abs();
        area > self.max_area || min_angle_deg(a, b, c) < self.options.min_angle_deg
    }

    fn bad_triangles(&self, triangles: &[[u32; 3]]) -> Vec<usize> {
        let mut bad: Vec<usize> = (0..triangles.len()).filter(|&t| self.is_bad(&triangles[t])).collect();
        // Largest first: their circumcenters clear the most space.
        bad.sort_by(|&x, &y| {
            let area = |t: usize| {
                let tri = triangles[t];
                orient2d(self.point(tri[0]), self.point(tri[1]), self.point(tri[2])).abs()
            };
            area(y).total_cmp(&area(x))
        });
        bad
    }

    /// Inserts circumcenters of `bad` triangles; returns the number of new vertices.
    fn refine(&mut self, triangles: &[[u32; 3]], bad: &[usize]) -> usize {
        let mut inserted = 0;
        for &t in bad {
            if !self.has_budget() {
                break;
            }
            let tri = triangles[t];
            let Some((center, radius)) = circumcircle(self.point(tri[0]), self.point(tri[1]), self.point(tri[2]))
            else {
                continue;
            };

            if self.options.preserve_boundary {
                if let Some(k) = self.encroached_segment(center) {
                    if self.split_segment(k) {
                        inserted += 1;
                    }
                    continue;
                }
            }
            if !self.inside(center) {
                continue;
            }
            if self.grid.any_near(&self.points, center, 0.5 * radius, |_, _| true) {
                continue;
            }
            self.insert(center);
            inserted += 1;
        }
        inserted
    }

    fn diagnostics(&self, input: usize, triangles: &[[u32; 3]], rounds: usize) -> TriangulationDiagnostics {
        let mut min_angle = f64::INFINITY;
        let mut max_area: f64 = 0.0;
        for tri in triangles {
            let (a, b, c) = (self.point(tri[0]), self.point(tri[1]), self.point(tri[2]));
            min_angle = min_angle.min(min_angle_deg(a, b, c));
            max_area = max_area.max(0.5 * orient2d(a, b, c).abs());
        }
        TriangulationDiagnostics {
            input_vertex_count: input,
            steiner_point_count: self.points.len() - input,
            boundary_split_count: self.boundary_splits,
            output_triangle_count: triangles.len(),
            refinement_rounds: rounds,
            min_angle_deg: min_angle,
            max_triangle_area: max_area,
            quality_met: triangles.iter().all(|t| !self.is_bad(t)),
        }
    }
}

/// Uniform bucket grid for proximity queries over a growing point set.
struct PointGrid {
    cell: f64,
    buckets: HashMap<(i64, i64), Vec<u32>>,
}

impl PointGrid {
    fn new(cell: f64) -> Self {
        Self {
            cell,
            buckets: HashMap::new(),
        }
    }

    fn key(&self, p: UvPoint) -> (i64, i64) {
        ((p.u / self.cell).floor() as i64, (p.v / self.cell).floor() as i64)
    }

    fn insert(&mut self, index: u32, p: UvPoint) {
        let key = self.key(p);
        self.buckets.entry(key).or_default().push(index);
    }

    /// True if some point strictly within `radius` of `center` satisfies `pred`.
    fn any_near(
        &self,
        points: &[UvPoint],
        center: UvPoint,
        radius: f64,
        mut pred: impl FnMut(u32, UvPoint) -> bool,
    ) -> bool {
        let (cx, cy) = self.key(center);
        let reach = (radius / self.cell).ceil() as i64;
        let r2 = radius * radius;
        for x in (cx - reach)..=(cx + reach) {
            for y in (cy - reach)..=(cy + reach) {
                let Some(bucket) = self.buckets.get(&(x, y)) else {
                    continue;
                };
                for &index in bucket {
                    let p = points[index as usize];
                    if p.distance_squared(center) < r2 && pred(index, p) {
                        return true;
                    }
                }
            }
        }
        false
    }
}

fn bounds(points: &[UvPoint]) -> Option<(UvPoint, UvPoint)> {
    let first = *points.first()?;
    Some(points.iter().fold((first, first), |(lo, hi), p| {
        (
            UvPoint::new(lo.u.min(p.u), lo.v.min(p.v)),
            UvPoint::new(hi.u.max(p.u), hi.v.max(p.v)),
        )
    }))
}

fn circumcircle(a: UvPoint, b: UvPoint, c: UvPoint) -> Option<(UvPoint, f64)> {
    let d = 2.0 * orient2d(a, b, c);
    if d.abs() <= f64::MIN_POSITIVE {
        return None;
    }
    let (bx, by) = (b.u - a.u, b.v - a.v);
    let (cx, cy) = (c.u - a.u, c.v - a.v);
    let b2 = bx * bx + by * by;
    let c2 = cx * cx + cy * cy;
    let ux = (cy * b2 - by * c2) / d;
    let uy = (bx * c2 - cx * b2) / d;
    let center = UvPoint::new(a.u + ux, a.v + uy);
    center.is_finite().then(|| (center, (ux * ux + uy * uy).sqrt()))
}

fn min_angle_deg(a: UvPoint, b: UvPoint, c: UvPoint) -> f64 {
    let angle = |p: UvPoint, q: UvPoint, r: UvPoint| {
        let (x1, y1) = (q.u - p.u, q.v - p.v);
        let (x2, y2) = (r.u - p.u, r.v - p.v);
        (x1 * y2 - y1 * x2).abs().atan2(x1 * x2 + y1 * y2)
    };
    angle(a, b, c).min(angle(b, c, a)).min(angle(c, a, b)).to_degrees()
}

fn segments_intersect(a: UvPoint, b: UvPoint, c: UvPoint, d: UvPoint, tol: Tolerance) -> bool {
    let o1 = orient2d(a, b, c);
    let o2 = orient2d(a, b, d);
    let o3 = orient2d(c, d, a);
    let o4 = orient2d(c, d, b);

    if o1.abs() <= tol.eps && on_segment(a, c, b, tol) {
        return true;
    }
    if o2.abs() <= tol.eps && on_segment(a, d, b, tol) {
        return true;
    }
    if o3.abs() <= tol.eps && on_segment(c, a, d, tol) {
        return true;
    }
    if o4.abs() <= tol.eps && on_segment(c, b, d, tol) {
        return true;
    }

    let ab = (o1 > tol.eps && o2 < -tol.eps) || (o1 < -tol.eps && o2 > tol.eps);
    let cd = (o3 > tol.eps && o4 < -tol.eps) || (o3 < -tol.eps && o4 > tol.eps);
    ab && cd
}

fn on_segment(a: UvPoint, p: UvPoint, b: UvPoint, tol: Tolerance) -> bool {
    p.u >= a.u.min(b.u) - tol.eps
        && p.u <= a.u.max(b.u) + tol.eps
        && p.v >= a.v.min(b.v) - tol.eps
        && p.v <= a.v.max(b.v) + tol.eps
}
