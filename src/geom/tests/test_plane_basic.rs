use crate::geom::{BSplineCurve, BoundaryCurve, DomainError, PlaneProjector, Point3, Vec3};

fn loop_through(corners: &[Point3]) -> Vec<BSplineCurve> {
    (0..corners.len())
        .map(|i| BSplineCurve::line(corners[i], corners[(i + 1) % corners.len()]))
        .collect()
}

fn all_control_points(curves: &[BSplineCurve]) -> Vec<Point3> {
    curves.iter().flat_map(|c| c.control_points().iter().copied()).collect()
}

#[test]
fn projection_fills_the_inset_unit_square() {
    let curves = loop_through(&[
        Point3::new(10.0, 5.0, 2.0),
        Point3::new(14.0, 5.0, 2.0),
        Point3::new(14.0, 7.0, 2.0),
        Point3::new(10.0, 7.0, 2.0),
    ]);
    let projected = PlaneProjector::new(0.1).project(&curves).unwrap();
    let points = all_control_points(&projected);

    let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let max_x = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

    // The larger extent spans [margin, 1 - margin]; aspect ratio is preserved.
    assert!((min_x - 0.1).abs() < 1e-12 && (max_x - 0.9).abs() < 1e-12);
    assert!((min_y - 0.1).abs() < 1e-12 && (max_y - 0.5).abs() < 1e-12);
    assert!(points.iter().all(|p| p.z == 0.0));
}

#[test]
fn projection_keeps_degree_and_knots() {
    let arc = BSplineCurve::new(
        2,
        vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, -0.5, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ],
    )
    .unwrap();
    let mut curves = vec![arc];
    curves.extend(loop_through(&[Point3::new(2.0, 0.0, 0.0), Point3::new(1.0, 2.0, 0.0), Point3::new(0.0, 0.0, 0.0)])
        .into_iter()
        .take(2));

    let projected = PlaneProjector::default().project(&curves).unwrap();
    assert_eq!(projected.len(), 3);
    for (before, after) in curves.iter().zip(&projected) {
        assert_eq!(before.degree(), after.degree());
        assert_eq!(before.knots(), after.knots());
        assert_eq!(before.control_points().len(), after.control_points().len());
    }
}

#[test]
fn projection_is_deterministic_and_counter_clockwise() {
    // Saddle-like loop, clockwise when seen from +z.
    let curves = loop_through(&[
        Point3::new(0.0, 0.0, 0.2),
        Point3::new(0.0, 1.0, -0.2),
        Point3::new(1.0, 1.0, 0.2),
        Point3::new(1.0, 0.0, -0.2),
    ]);
    let projector = PlaneProjector::default();
    let a = projector.project(&curves).unwrap();
    let b = projector.project(&curves).unwrap();
    assert_eq!(a, b);

    let corners: Vec<Point3> = a.iter().map(|c| c.start()).collect();
    let mut area2 = 0.0;
    for i in 0..corners.len() {
        let (p, q) = (corners[i], corners[(i + 1) % corners.len()]);
        area2 += p.x * q.y - q.x * p.y;
    }
    assert!(area2 > 0.0);
}

#[test]
fn tilted_loop_keeps_its_shape() {
    let n = Vec3::new(0.0, 1.0, 1.0).normalized().unwrap();
    let e1 = Vec3::X;
    let e2 = n.cross(e1);
    let corners: Vec<Point3> = [(0.0, 0.0), (2.0, 0.0), (2.0, 1.0), (0.0, 1.0)]
        .iter()
        .map(|&(x, y)| Point3::new(3.0, -1.0, 2.0) + e1 * x + e2 * y)
        .collect();
    let projected = PlaneProjector::new(0.0).project(&loop_through(&corners)).unwrap();
    // Scaled by the long side: 2 x 1 becomes 1 x 0.5.
    for (c, expected) in projected.iter().zip([1.0, 0.5, 1.0, 0.5]) {
        let len = c.start().distance_to(c.end());
        assert!((len - expected).abs() < 1e-9, "side length {len}");
    }
}

#[test]
fn degenerate_loops_are_rejected() {
    let collinear = loop_through(&[
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
    ]);
    assert_eq!(
        PlaneProjector::default().project(&collinear),
        Err(DomainError::DomainDegenerate)
    );

    let coincident = loop_through(&[Point3::ORIGIN, Point3::ORIGIN, Point3::ORIGIN]);
    assert_eq!(
        PlaneProjector::default().project(&coincident),
        Err(DomainError::DomainDegenerate)
    );
}
