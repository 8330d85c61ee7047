use thiserror::Error;

use super::core::{Point3, Tolerance, Vec3};

/// Samples used by [`BoundaryCurve::arc_length`] when integrating the polyline length.
pub const ARC_LENGTH_SAMPLES: usize = 128;

/// Samples used by [`BoundaryCurve::intersect_with_plane`] when bracketing sign changes.
pub const DEFAULT_INTERSECTION_SAMPLES: usize = 64;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CurveError {
    #[error("curve degree must be >= 1")]
    InvalidDegree,
    #[error("curve of degree {degree} needs at least {required} control points, got {actual}")]
    NotEnoughControlPoints {
        degree: usize,
        required: usize,
        actual: usize,
    },
    #[error("curve with {control_points} control points of degree {degree} cannot use {actual} knots")]
    KnotCount {
        degree: usize,
        control_points: usize,
        actual: usize,
    },
    #[error("curve knots must be finite and non-decreasing")]
    InvalidKnots,
    #[error("curve knot vector has an empty parameter domain")]
    EmptyDomain,
    #[error("curve control points must be finite")]
    NonFiniteControlPoint,
}

/// Evaluation in the curve's own knot parameter.
pub trait Curve3 {
    fn point_at(&self, t: f64) -> Point3;

    #[must_use]
    fn domain(&self) -> (f64, f64) {
        (0.0, 1.0)
    }
}

/// The boundary-curve contract the domain and the parameterizations rely on.
///
/// Parameters are normalized: `u = 0` is the start of the side and `u = 1` its end,
/// whatever the underlying knot domain.
pub trait BoundaryCurve: Send + Sync {
    fn evaluate(&self, u: f64) -> Point3;

    fn control_points(&self) -> &[Point3];

    fn control_points_mut(&mut self) -> &mut [Point3];

    /// Length of the piece between the normalized parameters `a` and `b`.
    fn arc_length(&self, a: f64, b: f64) -> f64 {
        polyline_length(|u| self.evaluate(u), a, b, ARC_LENGTH_SAMPLES)
    }

    /// Normalized parameters where the curve crosses the plane through `point` with `normal`.
    fn intersect_with_plane(&self, point: Point3, normal: Vec3) -> Vec<f64> {
        plane_crossings(|u| self.evaluate(u), point, normal, DEFAULT_INTERSECTION_SAMPLES)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BSplineCurve
// ─────────────────────────────────────────────────────────────────────────────

/// Non-rational B-spline curve.
#[derive(Debug, Clone, PartialEq)]
pub struct BSplineCurve {
    degree: usize,
    knots: Vec<f64>,
    control_points: Vec<Point3>,
}

impl BSplineCurve {
    /// Builds a curve from a knot vector and its control points.
    ///
    /// `knots` is either the full vector (`control_points + degree + 1` values) or the
    /// short clamped form (`control_points - degree + 1` values) whose end knots are
    /// implicitly repeated `degree + 1` times, e.g. a line as degree 1, knots `[0, 1]`.
    pub fn new(degree: usize, knots: Vec<f64>, control_points: Vec<Point3>) -> Result<Self, CurveError> {
        if degree == 0 {
            return Err(CurveError::InvalidDegree);
        }
        if control_points.len() < degree + 1 {
            return Err(CurveError::NotEnoughControlPoints {
                degree,
                required: degree + 1,
                actual: control_points.len(),
            });
        }
        if control_points.iter().any(|p| !p.is_finite()) {
            return Err(CurveError::NonFiniteControlPoint);
        }
        if knots.iter().any(|k| !k.is_finite()) || !is_non_decreasing(&knots) {
            return Err(CurveError::InvalidKnots);
        }

        let full_len = control_points.len() + degree + 1;
        let short_len = control_points.len() - degree + 1;
        let knots = if knots.len() == full_len {
            knots
        } else if knots.len() == short_len {
            clamp_knots(&knots, degree)
        } else {
            return Err(CurveError::KnotCount {
                degree,
                control_points: control_points.len(),
                actual: knots.len(),
            });
        };

        let curve = Self {
            degree,
            knots,
            control_points,
        };
        let (a, b) = curve.domain();
        if b - a <= 0.0 {
            return Err(CurveError::EmptyDomain);
        }
        Ok(curve)
    }

    /// A degree-1 segment between two points.
    #[must_use]
    pub fn line(start: Point3, end: Point3) -> Self {
        Self {
            degree: 1,
            knots: vec![0.0, 0.0, 1.0, 1.0],
            control_points: vec![start, end],
        }
    }

    #[must_use]
    pub fn degree(&self) -> usize {
        self.degree
    }

    #[must_use]
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// Same knots and degree, new control points.
    #[must_use]
    pub fn with_control_points(&self, control_points: Vec<Point3>) -> Self {
        Self {
            degree: self.degree,
            knots: self.knots.clone(),
            control_points,
        }
    }

    #[must_use]
    pub fn start(&self) -> Point3 {
        self.evaluate(0.0)
    }

    #[must_use]
    pub fn end(&self) -> Point3 {
        self.evaluate(1.0)
    }

    fn to_knot_parameter(&self, u: f64) -> f64 {
        let (a, b) = self.domain();
        a + (b - a) * u.clamp(0.0, 1.0)
    }
}

impl Curve3 for BSplineCurve {
    fn point_at(&self, t: f64) -> Point3 {
        let p = self.degree;
        let (a, b) = self.domain();
        let u = t.clamp(a, b);

        let n = self.control_points.len() - 1;
        let span = find_span(n, p, u, &self.knots);

        let mut d: Vec<Point3> = (0..=p).map(|j| self.control_points[span - p + j]).collect();
        de_boor(&mut d, span, p, u, &self.knots);
        d[p]
    }

    fn domain(&self) -> (f64, f64) {
        (self.knots[self.degree], self.knots[self.control_points.len()])
    }
}

impl BoundaryCurve for BSplineCurve {
    fn evaluate(&self, u: f64) -> Point3 {
        self.point_at(self.to_knot_parameter(u))
    }

    fn control_points(&self) -> &[Point3] {
        &self.control_points
    }

    fn control_points_mut(&mut self) -> &mut [Point3] {
        &mut self.control_points
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sampling helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Length of the polyline through `samples + 1` evenly spaced evaluations on `[a, b]`.
#[must_use]
pub fn polyline_length(eval: impl Fn(f64) -> Point3, a: f64, b: f64, samples: usize) -> f64 {
    let samples = samples.max(1);
    let span = b - a;
    if !span.is_finite() || span == 0.0 {
        return 0.0;
    }

    let mut length = 0.0;
    let mut prev = eval(a);
    for i in 1..=samples {
        let curr = eval(a + span * (i as f64 / samples as f64));
        length += curr.distance_to(prev);
        prev = curr;
    }
    length
}

/// Parameters in `[0, 1]` where `eval` crosses the plane through `origin` with `normal`.
///
/// The curve is sampled at `samples + 1` points; each sign change of the signed distance is
/// refined by bisection. Samples lying exactly on the plane are reported as they are. The
/// result is sorted and free of duplicates.
#[must_use]
pub fn plane_crossings(
    eval: impl Fn(f64) -> Point3,
    origin: Point3,
    normal: Vec3,
    samples: usize,
) -> Vec<f64> {
    let Some(normal) = normal.normalized() else {
        return Vec::new();
    };
    let samples = samples.max(2);
    let signed = |u: f64| eval(u).sub_point(origin).dot(normal);
    let on_plane = Tolerance::ZERO_LENGTH;

    let mut results: Vec<f64> = Vec::new();
    let push = |u: f64, results: &mut Vec<f64>| {
        if results.last().is_none_or(|last| (u - last).abs() > Tolerance::DEFAULT.eps) {
            results.push(u);
        }
    };

    let mut prev_u = 0.0;
    let mut prev_dist = signed(prev_u);
    for i in 1..=samples {
        let u = i as f64 / samples as f64;
        let dist = signed(u);

        if on_plane.approx_zero_f64(prev_dist) {
            push(prev_u, &mut results);
        } else if !on_plane.approx_zero_f64(dist) && prev_dist.signum() != dist.signum() {
            push(bisect(&signed, prev_u, u, prev_dist), &mut results);
        }

        prev_u = u;
        prev_dist = dist;
    }
    if on_plane.approx_zero_f64(prev_dist) {
        push(prev_u, &mut results);
    }

    results
}

fn bisect(f: &impl Fn(f64) -> f64, mut lo: f64, mut hi: f64, mut f_lo: f64) -> f64 {
    for _ in 0..60 {
        let mid = 0.5 * (lo + hi);
        let f_mid = f(mid);
        if f_mid == 0.0 {
            return mid;
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
        if hi - lo <= Tolerance::ZERO_LENGTH.eps {
            break;
        }
    }
    0.5 * (lo + hi)
}

fn is_non_decreasing(knots: &[f64]) -> bool {
    knots.windows(2).all(|w| w[0] <= w[1])
}

fn clamp_knots(knots: &[f64], degree: usize) -> Vec<f64> {
    let mut full = Vec::with_capacity(knots.len() + 2 * degree);
    if let (Some(&first), Some(&last)) = (knots.first(), knots.last()) {
        full.extend(std::iter::repeat_n(first, degree));
        full.extend_from_slice(knots);
        full.extend(std::iter::repeat_n(last, degree));
    }
    full
}

fn find_span(n: usize, p: usize, u: f64, knots: &[f64]) -> usize {
    if u >= knots[n + 1] {
        let mut span = n;
        // Step back over a trailing run of equal knots so the span is non-empty.
        while span > p && knots[span] >= knots[n + 1] {
            span -= 1;
        }
        return span;
    }
    if u <= knots[p] {
        return p;
    }

    let mut low = p;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;
    while u < knots[mid] || u >= knots[mid + 1] {
        if u < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

fn de_boor(d: &mut [Point3], span: usize, p: usize, u: f64, knots: &[f64]) {
    for r in 1..=p {
        for j in (r..=p).rev() {
            let i = span - p + j;
            let denom = knots[i + p + 1 - r] - knots[i];
            let alpha = if denom == 0.0 { 0.0 } else { (u - knots[i]) / denom };
            d[j] = d[j - 1].lerp(d[j], alpha);
        }
    }
}
