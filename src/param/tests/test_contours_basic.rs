use std::sync::Arc;

use crate::geom::{BSplineCurve, CurvedDomain, Domain, DomainOptions, Point3, UvPoint};
use crate::param::{ContourOptions, Parameterization, ParameterizationError, RibbonCoordinate, iso_d_contours};

/// Two "sides" whose `d` is the `u` and the `v` coordinate.
struct AxisParameterization;

impl Parameterization for AxisParameterization {
    fn set_domain(&self, _domain: Arc<dyn Domain>) {}

    fn update(&self) -> Result<(), ParameterizationError> {
        Ok(())
    }

    fn size(&self) -> usize {
        2
    }

    fn map_to_ribbon(&self, side: usize, uv: UvPoint) -> RibbonCoordinate {
        match side % 2 {
            0 => RibbonCoordinate::new(uv.v, uv.u),
            _ => RibbonCoordinate::new(uv.u, uv.v),
        }
    }
}

fn square_domain() -> CurvedDomain {
    let corners = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ];
    let curves = (0..4).map(|i| BSplineCurve::line(corners[i], corners[(i + 1) % 4])).collect();
    CurvedDomain::from_curves(curves, DomainOptions::default()).unwrap()
}

#[test]
fn default_levels() {
    let levels = ContourOptions::default().levels();
    assert_eq!(levels.len(), 5);
    assert!((levels[0] - 0.1).abs() < 1e-15);
    assert!((levels[4] - 0.5).abs() < 1e-15);
}

#[test]
fn straight_level_sets_are_traced_across_the_domain() {
    let mesh = square_domain().mesh(8).unwrap();
    let options = ContourOptions::default();
    let segments = iso_d_contours(&mesh, &AxisParameterization, &options);

    for side in 0..2 {
        for level in options.levels() {
            let pieces: Vec<_> = segments
                .iter()
                .filter(|s| s.side == side && s.level == level)
                .collect();
            assert!(!pieces.is_empty(), "side {side} level {level}");

            let coordinate = |p: UvPoint| if side == 0 { p.u } else { p.v };
            for piece in &pieces {
                assert!((coordinate(piece.a) - level).abs() < 1e-9);
                assert!((coordinate(piece.b) - level).abs() < 1e-9);
            }
            // The domain spans [0.025, 0.975] in both directions.
            let length: f64 = pieces.iter().map(|s| s.a.distance(s.b)).sum();
            assert!((length - 0.95).abs() < 1e-6, "side {side} level {level}: {length}");
        }
    }
}

#[test]
fn levels_outside_the_field_produce_nothing() {
    let mesh = square_domain().mesh(6).unwrap();
    let options = ContourOptions { density: 0.99, lines: 1 };
    assert!(iso_d_contours(&mesh, &AxisParameterization, &options).is_empty());
}
