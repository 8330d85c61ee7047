//! Best-fit plane projection of a boundary loop into the unit square.

use super::core::{BBox, Point3, Tolerance, Vec3};
use super::curve::{BSplineCurve, BoundaryCurve};
use super::domain::DomainError;

/// Default inset of the projected loop inside the unit square.
pub const DEFAULT_MARGIN: f64 = 0.025;

/// Least-squares plane through a point cloud.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestFitPlane {
    pub origin: Point3,
    pub normal: Vec3,
    /// Direction of largest spread.
    pub u_axis: Vec3,
    pub v_axis: Vec3,
}

impl BestFitPlane {
    /// Plane coordinates of `p` (its projection, expressed in the `u`/`v` basis).
    #[must_use]
    pub fn to_plane(&self, p: Point3) -> (f64, f64) {
        let d = p.sub_point(self.origin);
        (d.dot(self.u_axis), d.dot(self.v_axis))
    }
}

/// Fits a plane through `points` via the eigen-decomposition of their covariance matrix.
///
/// The normal is oriented so that `points`, read as a closed polygon, wind counter-clockwise
/// around it. Coincident or collinear input has no unique plane and is rejected.
pub fn fit_plane(points: &[Point3]) -> Result<BestFitPlane, DomainError> {
    if points.len() < 3 {
        return Err(DomainError::DomainDegenerate);
    }
    if points.iter().any(|p| !p.is_finite()) {
        return Err(DomainError::NonFinitePoint);
    }

    let n = points.len() as f64;
    let sum = points.iter().fold(Vec3::ZERO, |acc, p| acc + p.to_vec3());
    let origin = Point3::new(sum.x / n, sum.y / n, sum.z / n);

    let mut cov = [[0.0_f64; 3]; 3];
    for p in points {
        let d = p.sub_point(origin);
        let d = [d.x, d.y, d.z];
        for r in 0..3 {
            for c in 0..3 {
                cov[r][c] += d[r] * d[c];
            }
        }
    }

    let (values, vectors) = symmetric_eigen(cov);
    let mut order = [0_usize, 1, 2];
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

    let largest = values[order[0]];
    let middle = values[order[1]];
    if largest <= Tolerance::ZERO_LENGTH.eps || middle <= Tolerance::DEFAULT.eps * largest {
        return Err(DomainError::DomainDegenerate);
    }

    let column = |k: usize| Vec3::new(vectors[0][k], vectors[1][k], vectors[2][k]);
    let u_axis = column(order[0]).normalized().ok_or(DomainError::DomainDegenerate)?;
    let mut normal = column(order[2]).normalized().ok_or(DomainError::DomainDegenerate)?;
    if polygon_normal(points).dot(normal) < 0.0 {
        normal = -normal;
    }
    let v_axis = normal.cross(u_axis);

    Ok(BestFitPlane {
        origin,
        normal,
        u_axis,
        v_axis,
    })
}

/// Projects a boundary loop onto its best-fit plane and rescales it into
/// `[margin, 1 - margin]²`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneProjector {
    margin: f64,
}

impl Default for PlaneProjector {
    fn default() -> Self {
        Self::new(DEFAULT_MARGIN)
    }
}

impl PlaneProjector {
    #[must_use]
    pub fn new(margin: f64) -> Self {
        Self {
            margin: margin.clamp(0.0, 0.49),
        }
    }

    #[must_use]
    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Returns the projected curves: same degree and knots, control points replaced by their
    /// planar images (z = 0).
    pub fn project(&self, curves: &[BSplineCurve]) -> Result<Vec<BSplineCurve>, DomainError> {
        let cloud = loop_control_points(curves);
        let plane = fit_plane(&cloud)?;

        let planar: Vec<Vec<Point3>> = curves
            .iter()
            .map(|c| {
                c.control_points()
                    .iter()
                    .map(|p| {
                        let (x, y) = plane.to_plane(*p);
                        Point3::new(x, y, 0.0)
                    })
                    .collect()
            })
            .collect();

        let all: Vec<Point3> = planar.iter().flatten().copied().collect();
        let bbox = BBox::from_points(&all).ok_or(DomainError::NonFinitePoint)?;
        let size = bbox.size();
        let len = size.x.max(size.y);
        if !len.is_finite() || len <= Tolerance::ZERO_LENGTH.eps {
            return Err(DomainError::DomainDegenerate);
        }

        let scale = (1.0 - 2.0 * self.margin) / len;
        let to_unit = |p: Point3| {
            Point3::new(
                (p.x - bbox.min.x) * scale + self.margin,
                (p.y - bbox.min.y) * scale + self.margin,
                0.0,
            )
        };

        log::debug!(
            "projected {} control points onto plane with normal ({:.4}, {:.4}, {:.4})",
            cloud.len(),
            plane.normal.x,
            plane.normal.y,
            plane.normal.z
        );

        Ok(curves
            .iter()
            .zip(planar)
            .map(|(curve, points)| curve.with_control_points(points.into_iter().map(to_unit).collect()))
            .collect())
    }
}

/// All control points of the loop, without repeating a corner shared by consecutive curves.
fn loop_control_points(curves: &[BSplineCurve]) -> Vec<Point3> {
    let tol = Tolerance::DEFAULT;
    let mut points = Vec::new();
    for (i, curve) in curves.iter().enumerate() {
        let next_start = curves[(i + 1) % curves.len()].control_points().first().copied();
        let cps = curve.control_points();
        let shared_end = match (cps.last(), next_start) {
            (Some(&last), Some(first)) => cps.len() > 1 && tol.approx_eq_point3(last, first),
            _ => false,
        };
        let keep = if shared_end { cps.len() - 1 } else { cps.len() };
        points.extend_from_slice(&cps[..keep]);
    }
    points
}

fn polygon_normal(points: &[Point3]) -> Vec3 {
    let mut n = Vec3::ZERO;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        n.x += (a.y - b.y) * (a.z + b.z);
        n.y += (a.z - b.z) * (a.x + b.x);
        n.z += (a.x - b.x) * (a.y + b.y);
    }
    n
}

/// Cyclic Jacobi rotations on a symmetric 3x3 matrix.
///
/// Returns the eigenvalues and the eigenvectors stored as matrix columns.
fn symmetric_eigen(mut a: [[f64; 3]; 3]) -> ([f64; 3], [[f64; 3]; 3]) {
    let mut v = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

    for _ in 0..50 {
        let off = a[0][1].abs() + a[0][2].abs() + a[1][2].abs();
        if off <= f64::MIN_POSITIVE {
            break;
        }
        for (p, q) in [(0, 1), (0, 2), (1, 2)] {
            if a[p][q] == 0.0 {
                continue;
            }
            let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
            let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
            let c = 1.0 / (t * t + 1.0).sqrt();
            let s = t * c;

            for k in 0..3 {
                let akp = a[k][p];
                let akq = a[k][q];
                a[k][p] = c * akp - s * akq;
                a[k][q] = s * akp + c * akq;
            }
            for k in 0..3 {
                let apk = a[p][k];
                let aqk = a[q][k];
                a[p][k] = c * apk - s * aqk;
                a[q][k] = s * apk + c * aqk;
            }
            for row in &mut v {
                let vkp = row[p];
                let vkq = row[q];
                row[p] = c * vkp - s * vkq;
                row[q] = s * vkp + c * vkq;
            }
        }
    }

    ([a[0][0], a[1][1], a[2][2]], v)
}
