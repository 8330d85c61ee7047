//! Corner-safe re-blending of the harmonic `d` coordinate.

use crate::geom::Tolerance;

use super::RibbonCoordinate;

/// Blends a side's `d` with its neighbours' `s` near corners.
///
/// The four weights `{d, 1 - s, 1 - d, s}` measure the distance to the four edges of the
/// corner region. Away from those edges the blend is inverse-square (Shepard); on them the
/// vanishing weights share the mass uniformly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RibbonCoordinateBlender {
    epsilon: f64,
}

impl Default for RibbonCoordinateBlender {
    fn default() -> Self {
        Self::new(Tolerance::SINGULAR)
    }
}

impl RibbonCoordinateBlender {
    #[must_use]
    pub const fn new(tolerance: Tolerance) -> Self {
        Self {
            epsilon: tolerance.eps,
        }
    }

    #[must_use]
    pub const fn epsilon(&self) -> f64 {
        self.epsilon
    }

    #[must_use]
    pub fn weights(coordinate: RibbonCoordinate) -> [f64; 4] {
        let RibbonCoordinate { s, d } = coordinate;
        [d, 1.0 - s, 1.0 - d, s]
    }

    /// Normalized blend factors for `weights`; always sums to 1.
    #[must_use]
    pub fn blends(&self, weights: [f64; 4]) -> [f64; 4] {
        let vanishing = weights.iter().filter(|w| **w < self.epsilon).count();
        if vanishing > 0 {
            let share = 1.0 / vanishing as f64;
            return weights.map(|w| if w < self.epsilon { share } else { 0.0 });
        }
        let inverse = weights.map(|w| 1.0 / (w * w));
        let total: f64 = inverse.iter().sum();
        inverse.map(|w| w / total)
    }

    /// Corrected `d` for a side, given its plain coordinate and the plain `s` of the previous
    /// (`s_prev`) and next (`s_next`) sides.
    #[must_use]
    pub fn blend(&self, coordinate: RibbonCoordinate, s_prev: f64, s_next: f64) -> f64 {
        let b = self.blends(Self::weights(coordinate));
        coordinate.d * (b[0] + b[2]) + s_next * b[1] + (1.0 - s_prev) * b[3]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_blend_is_inverse_square() {
        let blender = RibbonCoordinateBlender::default();
        let b = blender.blends([0.5, 0.5, 0.5, 0.5]);
        assert!(b.iter().all(|w| (w - 0.25).abs() < 1e-15));

        let b = blender.blends([0.25, 0.5, 0.75, 0.5]);
        // 1/w² = 16, 4, 16/9, 4
        let total = 16.0 + 4.0 + 16.0 / 9.0 + 4.0;
        assert!((b[0] - 16.0 / total).abs() < 1e-12);
        assert!((b[2] - (16.0 / 9.0) / total).abs() < 1e-12);
    }

    #[test]
    fn vanishing_weights_share_the_mass() {
        let blender = RibbonCoordinateBlender::default();
        assert_eq!(blender.blends([0.0, 0.3, 1.0, 0.0]), [0.5, 0.0, 0.0, 0.5]);
        assert_eq!(blender.blends([0.4, 0.0, 0.6, 1.0]), [0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn blend_keeps_d_on_the_side() {
        let blender = RibbonCoordinateBlender::default();
        // On side i (d = 0) away from corners only w0 vanishes.
        let d = blender.blend(RibbonCoordinate::new(0.4, 0.0), 0.9, 0.1);
        assert_eq!(d, 0.0);
    }

    #[test]
    fn blend_stays_in_unit_interval() {
        let blender = RibbonCoordinateBlender::default();
        for &(s, d, sp, sn) in &[(0.1, 0.9, 0.0, 1.0), (0.99, 0.01, 0.5, 0.5), (0.5, 0.5, 1.0, 0.0)] {
            let blended = blender.blend(RibbonCoordinate::new(s, d), sp, sn);
            assert!((0.0..=1.0).contains(&blended), "{blended}");
        }
    }
}
