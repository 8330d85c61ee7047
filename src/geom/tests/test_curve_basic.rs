use crate::geom::{BSplineCurve, BoundaryCurve, CurveError, Point3, Tolerance, Vec3};

fn cubic() -> BSplineCurve {
    BSplineCurve::new(
        3,
        vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0],
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(3.0, 2.0, 1.0),
            Point3::new(4.0, 0.0, 1.0),
        ],
    )
    .expect("valid cubic")
}

#[test]
fn cubic_bezier_midpoint_matches_bernstein_form() {
    let c = cubic();
    // (P0 + 3 P1 + 3 P2 + P3) / 8
    let expected = Point3::new(
        (0.0 + 3.0 + 9.0 + 4.0) / 8.0,
        (0.0 + 6.0 + 6.0 + 0.0) / 8.0,
        (0.0 + 0.0 + 3.0 + 1.0) / 8.0,
    );
    assert!(Tolerance::DEFAULT.approx_eq_point3(c.evaluate(0.5), expected));
}

#[test]
fn multi_span_curve_is_continuous_at_interior_knot() {
    let c = BSplineCurve::new(
        2,
        vec![0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0],
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(3.0, 1.0, 0.0),
        ],
    )
    .unwrap();
    let before = c.evaluate(0.5 - 1e-9);
    let after = c.evaluate(0.5 + 1e-9);
    assert!(before.distance_to(after) < 1e-7);
    assert_eq!(c.start(), Point3::new(0.0, 0.0, 0.0));
    assert_eq!(c.end(), Point3::new(3.0, 1.0, 0.0));
}

#[test]
fn evaluate_clamps_out_of_range_parameters() {
    let c = cubic();
    assert_eq!(c.evaluate(-0.5), c.start());
    assert_eq!(c.evaluate(1.5), c.end());
}

#[test]
fn arc_length_is_additive() {
    let c = cubic();
    let whole = c.arc_length(0.0, 1.0);
    let parts = c.arc_length(0.0, 0.3) + c.arc_length(0.3, 1.0);
    assert!((whole - parts).abs() < 1e-3 * whole);
    assert!(whole > c.start().distance_to(c.end()));
}

#[test]
fn plane_intersections_of_an_s_curve() {
    let c = cubic();
    // The cubic rises to y = 1.5 and comes back: the plane y = 1 is crossed twice.
    let hits = c.intersect_with_plane(Point3::new(0.0, 1.0, 0.0), Vec3::Y);
    assert_eq!(hits.len(), 2);
    for u in &hits {
        assert!((c.evaluate(*u).y - 1.0).abs() < 1e-9);
    }
    assert!(hits[0] < hits[1]);
}

#[test]
fn control_points_can_be_edited_in_place() {
    let mut c = BSplineCurve::line(Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0));
    c.control_points_mut()[1] = Point3::new(2.0, 0.0, 0.0);
    assert_eq!(c.end(), Point3::new(2.0, 0.0, 0.0));
}

#[test]
fn invalid_curves_are_rejected() {
    assert_eq!(
        BSplineCurve::new(0, vec![0.0, 1.0], vec![Point3::ORIGIN, Point3::ORIGIN]),
        Err(CurveError::InvalidDegree)
    );
    assert!(matches!(
        BSplineCurve::new(3, vec![0.0, 1.0], vec![Point3::ORIGIN, Point3::ORIGIN]),
        Err(CurveError::NotEnoughControlPoints { required: 4, .. })
    ));
    assert_eq!(
        BSplineCurve::new(1, vec![1.0, 1.0], vec![Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0)]),
        Err(CurveError::EmptyDomain)
    );
    assert_eq!(
        BSplineCurve::new(1, vec![0.0, 1.0], vec![Point3::ORIGIN, Point3::new(f64::NAN, 0.0, 0.0)]),
        Err(CurveError::NonFiniteControlPoint)
    );
}
