//! Wavefront OBJ text exports of domain meshes and parameterization dumps.

use std::io::{self, Write};

use crate::geom::DomainMesh;
use crate::param::{ContourSegment, Parameterization};

fn write_faces(w: &mut impl Write, mesh: &DomainMesh) -> io::Result<()> {
    for [a, b, c] in mesh.triangles() {
        writeln!(w, "f {} {} {}", a + 1, b + 1, c + 1)?;
    }
    Ok(())
}

/// `v u v 0` per parameter sample, then 1-based `f` lines.
pub fn write_domain_mesh(mut w: impl Write, mesh: &DomainMesh) -> io::Result<()> {
    for p in &mesh.parameters {
        writeln!(w, "v {} {} 0", p.u, p.v)?;
    }
    write_faces(&mut w, mesh)
}

/// One `v` line per parameter sample listing `s d` for every side followed by `u v`, then
/// the faces of `mesh`.
pub fn write_domain_eval(mut w: impl Write, mesh: &DomainMesh, parameterization: &dyn Parameterization) -> io::Result<()> {
    for &uv in &mesh.parameters {
        write!(w, "v")?;
        for c in parameterization.map_to_ribbons(uv) {
            write!(w, " {} {}", c.s, c.d)?;
        }
        writeln!(w, " {} {}", uv.u, uv.v)?;
    }
    write_faces(&mut w, mesh)
}

/// Two `v` lines per segment (at z = 0) and one `l` line joining them.
pub fn write_segments(mut w: impl Write, segments: &[ContourSegment]) -> io::Result<()> {
    for s in segments {
        writeln!(w, "v {} {} 0", s.a.u, s.a.v)?;
        writeln!(w, "v {} {} 0", s.b.u, s.b.v)?;
    }
    for i in 1..=segments.len() {
        writeln!(w, "l {} {}", 2 * i - 1, 2 * i)?;
    }
    Ok(())
}
