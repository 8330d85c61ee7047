//! One-dimensional quadrature rules, selectable at run time.

use serde::{Deserialize, Serialize};

/// Minimum number of Romberg refinements before the convergence test applies.
const ROMBERG_MIN_STEPS: usize = 3;

/// Panels the adaptive rule starts from.
const ADAPTIVE_INITIAL_PANELS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum QuadratureRule {
    /// Richardson-extrapolated trapezoid rule.
    Romberg { max_steps: usize, tolerance: f64 },
    /// Gauss-Chebyshev nodes with the weight function divided out.
    ChebyshevFixed { points: usize },
    /// Recursive adaptive Simpson.
    Adaptive { tolerance: f64, max_depth: usize },
}

impl Default for QuadratureRule {
    fn default() -> Self {
        Self::ChebyshevFixed { points: 10 }
    }
}

impl QuadratureRule {
    #[must_use]
    pub const fn romberg() -> Self {
        Self::Romberg {
            max_steps: 12,
            tolerance: 1e-6,
        }
    }

    #[must_use]
    pub const fn adaptive() -> Self {
        Self::Adaptive {
            tolerance: 1e-6,
            max_depth: 12,
        }
    }

    /// Approximates the integral of `f` over `[a, b]`.
    pub fn integrate(&self, f: impl Fn(f64) -> f64, a: f64, b: f64) -> f64 {
        match *self {
            Self::Romberg { max_steps, tolerance } => romberg(&f, a, b, max_steps, tolerance),
            Self::ChebyshevFixed { points } => chebyshev_fixed(&f, a, b, points),
            Self::Adaptive { tolerance, max_depth } => adaptive_simpson(&f, a, b, tolerance, max_depth),
        }
    }
}

pub fn romberg(f: &impl Fn(f64) -> f64, a: f64, b: f64, max_steps: usize, tolerance: f64) -> f64 {
    let max_steps = max_steps.max(1);
    let mut h = b - a;
    let mut previous = vec![0.5 * h * (f(a) + f(b))];
    for step in 1..max_steps {
        h *= 0.5;
        let fresh = 1_usize << (step - 1);
        let midpoints: f64 = (0..fresh).map(|k| f(a + (2 * k + 1) as f64 * h)).sum();

        let mut row = Vec::with_capacity(step + 1);
        row.push(0.5 * previous[0] + h * midpoints);
        let mut factor = 1.0;
        for j in 1..=step {
            factor *= 4.0;
            row.push(row[j - 1] + (row[j - 1] - previous[j - 1]) / (factor - 1.0));
        }

        let (estimate, last) = (row[step], previous[step - 1]);
        if step >= ROMBERG_MIN_STEPS && (estimate - last).abs() <= tolerance * estimate.abs().max(1.0) {
            return estimate;
        }
        previous = row;
    }
    previous[previous.len() - 1]
}

pub fn chebyshev_fixed(f: &impl Fn(f64) -> f64, a: f64, b: f64, points: usize) -> f64 {
    let n = points.max(1);
    let half = 0.5 * (b - a);
    let mid = 0.5 * (a + b);
    let sum: f64 = (1..=n)
        .map(|k| {
            let angle = (2 * k - 1) as f64 * std::f64::consts::PI / (2 * n) as f64;
            let x = angle.cos();
            f(mid + half * x) * angle.sin()
        })
        .sum();
    half * std::f64::consts::PI / n as f64 * sum
}

pub fn adaptive_simpson(f: &impl Fn(f64) -> f64, a: f64, b: f64, tolerance: f64, max_depth: usize) -> f64 {
    let width = (b - a) / ADAPTIVE_INITIAL_PANELS as f64;
    let panel_tolerance = tolerance / ADAPTIVE_INITIAL_PANELS as f64;
    (0..ADAPTIVE_INITIAL_PANELS)
        .map(|k| {
            let lo = a + k as f64 * width;
            let hi = lo + width;
            let (flo, fmid, fhi) = (f(lo), f(0.5 * (lo + hi)), f(hi));
            let whole = simpson(lo, hi, flo, fmid, fhi);
            simpson_step(f, lo, hi, flo, fmid, fhi, whole, panel_tolerance, max_depth)
        })
        .sum()
}

fn simpson(a: f64, b: f64, fa: f64, fm: f64, fb: f64) -> f64 {
    (b - a) / 6.0 * (fa + 4.0 * fm + fb)
}

#[allow(clippy::too_many_arguments)]
fn simpson_step(
    f: &impl Fn(f64) -> f64,
    a: f64,
    b: f64,
    fa: f64,
    fm: f64,
    fb: f64,
    whole: f64,
    tolerance: f64,
    depth: usize,
) -> f64 {
    let m = 0.5 * (a + b);
    let (lm, rm) = (0.5 * (a + m), 0.5 * (m + b));
    let (flm, frm) = (f(lm), f(rm));
    let left = simpson(a, m, fa, flm, fm);
    let right = simpson(m, b, fm, frm, fb);
    let delta = left + right - whole;
    if depth == 0 || delta.abs() <= 15.0 * tolerance {
        return left + right + delta / 15.0;
    }
    simpson_step(f, a, m, fa, flm, fm, left, 0.5 * tolerance, depth - 1)
        + simpson_step(f, m, b, fm, frm, fb, right, 0.5 * tolerance, depth - 1)
}
