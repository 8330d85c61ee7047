//! Small value types shared by the domain builder and the parameterizations.
//!
//! Boundary curves live in 3D ([`Point3`], [`Vec3`]) until they are projected; everything
//! after projection works on [`UvPoint`]s in the unit square.

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Vec3
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub const fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[must_use]
    pub const fn cross(self, other: Self) -> Self {
        let Self { x: ax, y: ay, z: az } = self;
        let Self { x: bx, y: by, z: bz } = other;
        Self::new(ay * bz - az * by, az * bx - ax * bz, ax * by - ay * bx)
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction; `None` for zero or non-finite input.
    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        let len = self.length();
        (len.is_finite() && len > 0.0).then(|| self.mul_scalar(len.recip()))
    }

    #[must_use]
    pub const fn mul_scalar(self, k: f64) -> Self {
        Self::new(k * self.x, k * self.y, k * self.z)
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, k: f64) -> Self {
        self.mul_scalar(k)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        self.mul_scalar(-1.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Point3
// ─────────────────────────────────────────────────────────────────────────────

/// A control point or curve sample in model space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub const fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Vector from `origin` to `self`.
    #[must_use]
    pub const fn sub_point(self, origin: Self) -> Vec3 {
        Vec3::new(self.x - origin.x, self.y - origin.y, self.z - origin.z)
    }

    /// `self` at `t = 0`, `other` at `t = 1`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        self + other.sub_point(self) * t
    }

    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        self.sub_point(other).length()
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        [self.x, self.y, self.z].iter().all(|c| c.is_finite())
    }

    /// Drops z. Only meaningful after projection onto the domain plane.
    #[must_use]
    pub const fn to_uv(self) -> UvPoint {
        UvPoint::new(self.x, self.y)
    }
}

impl Add<Vec3> for Point3 {
    type Output = Self;
    fn add(self, v: Vec3) -> Self {
        Self::new(self.x + v.x, self.y + v.y, self.z + v.z)
    }
}

impl Sub for Point3 {
    type Output = Vec3;
    fn sub(self, other: Self) -> Vec3 {
        self.sub_point(other)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// UvPoint
// ─────────────────────────────────────────────────────────────────────────────

/// A point of the planar domain.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UvPoint {
    pub u: f64,
    pub v: f64,
}

impl UvPoint {
    #[must_use]
    pub const fn new(u: f64, v: f64) -> Self {
        Self { u, v }
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.u.is_finite() && self.v.is_finite()
    }

    #[must_use]
    pub fn distance_squared(&self, other: UvPoint) -> f64 {
        (self.u - other.u).powi(2) + (self.v - other.v).powi(2)
    }

    #[must_use]
    pub fn distance(&self, other: UvPoint) -> f64 {
        (self.u - other.u).hypot(self.v - other.v)
    }

    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self::new(
            t.mul_add(other.u - self.u, self.u),
            t.mul_add(other.v - self.v, self.v),
        )
    }

    /// The same point on the z = 0 plane.
    #[must_use]
    pub const fn to_point3(self) -> Point3 {
        Point3::new(self.u, self.v, 0.0)
    }
}

/// Twice the signed area of `abc`; positive for counter-clockwise winding.
#[must_use]
pub fn orient2d(a: UvPoint, b: UvPoint, c: UvPoint) -> f64 {
    (b.u - a.u) * (c.v - a.v) - (b.v - a.v) * (c.u - a.u)
}

// ─────────────────────────────────────────────────────────────────────────────
// BBox
// ─────────────────────────────────────────────────────────────────────────────

/// Axis-aligned bounds of the projected control points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min: Point3,
    pub max: Point3,
}

impl BBox {
    /// `None` when `points` is empty or holds a non-finite coordinate.
    #[must_use]
    pub fn from_points(points: &[Point3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        rest.iter().try_fold(Self { min: *first, max: *first }, |bbox, p| {
            p.is_finite().then(|| Self {
                min: Point3::new(bbox.min.x.min(p.x), bbox.min.y.min(p.y), bbox.min.z.min(p.z)),
                max: Point3::new(bbox.max.x.max(p.x), bbox.max.y.max(p.y), bbox.max.z.max(p.z)),
            })
        })
        .filter(|_| first.is_finite())
    }

    #[must_use]
    pub fn size(self) -> Vec3 {
        self.max - self.min
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tolerance
// ─────────────────────────────────────────────────────────────────────────────

/// Absolute epsilon for geometric comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub eps: f64,
}

impl Tolerance {
    /// Knot and hit coincidence, plane fitting (1e-9).
    pub const DEFAULT: Self = Self { eps: 1e-9 };

    /// Zero-length edges and degenerate areas (1e-12).
    pub const ZERO_LENGTH: Self = Self { eps: 1e-12 };

    /// Points this close to a side or a corner are treated as on it (1e-8).
    ///
    /// Guards every division by a vanishing quantity: the `s = b_i / (b_i + b_{i-1})`
    /// ratio, the inverse-square corner blend and the mean-value normalization integral.
    pub const SINGULAR: Self = Self { eps: 1e-8 };

    /// Boundary closure checks (1e-6).
    pub const LOOSE: Self = Self { eps: 1e-6 };

    #[must_use]
    pub fn approx_zero_f64(self, value: f64) -> bool {
        value.abs() <= self.eps
    }

    #[must_use]
    pub fn approx_eq_f64(self, a: f64, b: f64) -> bool {
        self.approx_zero_f64(a - b)
    }

    #[must_use]
    pub fn approx_eq_point3(self, a: Point3, b: Point3) -> bool {
        a.distance_to(b) <= self.eps
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
