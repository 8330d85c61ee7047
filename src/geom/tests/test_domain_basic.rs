use std::sync::Arc;

use crate::geom::{
    BSplineCurve, BoundaryCurve, CurvedDomain, Domain, DomainError, DomainOptions, Point3, boundary_samples,
};

fn polygon(corners: &[Point3]) -> Vec<BSplineCurve> {
    (0..corners.len())
        .map(|i| BSplineCurve::line(corners[i], corners[(i + 1) % corners.len()]))
        .collect()
}

fn unit_square() -> Vec<BSplineCurve> {
    polygon(&[
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ])
}

fn curved_triangle() -> Vec<BSplineCurve> {
    let bulge = |a: Point3, b: Point3, c: Point3| {
        BSplineCurve::new(2, vec![0.0, 1.0], vec![a, b, c]).expect("valid arc")
    };
    vec![
        bulge(Point3::new(0.0, 0.0, 0.0), Point3::new(0.5, -0.2, 0.1), Point3::new(1.0, 0.0, 0.0)),
        bulge(Point3::new(1.0, 0.0, 0.0), Point3::new(0.9, 0.6, 0.1), Point3::new(0.5, 0.9, 0.0)),
        bulge(Point3::new(0.5, 0.9, 0.0), Point3::new(0.1, 0.6, -0.1), Point3::new(0.0, 0.0, 0.0)),
    ]
}

#[test]
fn square_domain_mesh_is_consistent() {
    let domain = CurvedDomain::from_curves(unit_square(), DomainOptions::default()).unwrap();
    assert_eq!(domain.size(), 4);

    let mesh = domain.mesh(10).unwrap();
    assert!(mesh.validate().is_ok());
    assert_eq!(mesh.boundary_vertex_count(), 40);
    assert!(mesh.triangle_count() > 100);

    // Projected square spans [0.025, 0.975]².
    let side = 1.0 - 2.0 * 0.025;
    assert!((mesh.area() - side * side).abs() < 1e-3, "area {}", mesh.area());
    for p in &mesh.parameters {
        assert!(p.u >= 0.025 - 1e-12 && p.u <= 0.975 + 1e-12);
        assert!(p.v >= 0.025 - 1e-12 && p.v <= 0.975 + 1e-12);
    }
}

#[test]
fn boundary_samples_lead_the_parameters() {
    let domain = CurvedDomain::from_curves(curved_triangle(), DomainOptions::default()).unwrap();
    let parameters = domain.parameters(12).unwrap();
    let samples = boundary_samples(&domain.boundaries(), 12);
    assert_eq!(&parameters[..samples.len()], samples.as_slice());

    let first = domain.boundaries()[0].evaluate(0.0);
    assert_eq!(parameters[0], first.to_uv());
}

#[test]
fn repeated_requests_are_identical_and_cached() {
    let domain = CurvedDomain::from_curves(curved_triangle(), DomainOptions::default()).unwrap();
    let p1 = domain.parameters(10).unwrap();
    let t1 = domain.mesh_topology(10).unwrap();
    let p2 = domain.parameters(10).unwrap();
    let t2 = domain.mesh_topology(10).unwrap();
    assert_eq!(p1, p2);
    assert_eq!(t1, t2);

    let stats = domain.cache_stats();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 3);

    // A fresh domain over the same curves reproduces the mesh bit for bit.
    let other = CurvedDomain::from_curves(curved_triangle(), DomainOptions::default()).unwrap();
    assert_eq!(other.parameters(10).unwrap(), p1);
    assert_eq!(other.mesh_topology(10).unwrap(), t1);
}

#[test]
fn mesh_is_shared_between_callers() {
    let domain: Arc<dyn Domain> =
        Arc::new(CurvedDomain::from_curves(unit_square(), DomainOptions::default()).unwrap());
    let a = domain.mesh(6).unwrap();
    let b = domain.mesh(6).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    let c = domain.mesh(7).unwrap();
    assert_eq!(c.boundary_vertex_count(), 28);
}

#[test]
fn update_reports_changes_and_invalidates_cache() {
    let domain = CurvedDomain::from_curves(unit_square(), DomainOptions::default()).unwrap();
    let generation = domain.generation();
    domain.mesh(8).unwrap();

    assert!(!domain.update().unwrap());
    assert_eq!(domain.generation(), generation);
    assert_eq!(domain.cache_stats().entries, 1);

    domain.set_curves(curved_triangle());
    assert!(domain.update().unwrap());
    assert_eq!(domain.generation(), generation + 1);
    assert_eq!(domain.cache_stats().entries, 0);
    assert_eq!(domain.size(), 3);
    assert_eq!(domain.curves().len(), 3);
}

#[test]
fn invalid_loops_are_reported() {
    let domain = CurvedDomain::new(DomainOptions::default());
    assert_eq!(domain.update(), Err(DomainError::NoCurves));
    assert_eq!(domain.mesh(10).unwrap_err(), DomainError::NoCurves);
    assert!(domain.boundaries().is_empty());

    domain.set_curves(unit_square().into_iter().take(2).collect());
    assert_eq!(domain.update(), Err(DomainError::NotEnoughSides { count: 2 }));

    let bow_tie = polygon(&[
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ]);
    assert_eq!(
        CurvedDomain::from_curves(bow_tie, DomainOptions::default()).err(),
        Some(DomainError::SelfIntersecting)
    );

    let flat = polygon(&[
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(3.0, 0.0, 0.0),
    ]);
    assert_eq!(
        CurvedDomain::from_curves(flat, DomainOptions::default()).err(),
        Some(DomainError::DomainDegenerate)
    );

    let domain = CurvedDomain::from_curves(unit_square(), DomainOptions::default()).unwrap();
    assert_eq!(domain.mesh(0).unwrap_err(), DomainError::InvalidResolution);
}
