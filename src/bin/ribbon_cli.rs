use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use curved_ribbons::config::{ParameterizationKind, RibbonConfig};
use curved_ribbons::geom::{CurvedDomain, Domain, DomainMesh};
use curved_ribbons::io::{read_lop, write_domain_eval, write_domain_mesh, write_segments};
use curved_ribbons::param::iso_d_contours;

const USAGE: &str = r#"ribbon_cli (curved-ribbons)

USAGE:
  ribbon_cli <basename> [resolution]

Reads <basename>.lop (and <basename>.json when present) and writes
  <basename>-mesh.obj                  the triangulated domain
  <basename>-<kind>-domain.obj         (s, d) of every side at every mesh point
  <basename>-<kind>-contours.obj       iso-d lines of every side
for each configured parameterization.
"#;

enum Failure {
    Usage(String),
    Unreadable(String),
    Run(String),
}

impl Failure {
    fn exit_code(&self) -> ExitCode {
        match self {
            Failure::Usage(_) => ExitCode::from(1),
            Failure::Unreadable(_) => ExitCode::from(2),
            Failure::Run(_) => ExitCode::from(3),
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            match &failure {
                Failure::Usage(message) => eprintln!("{message}\n\n{USAGE}"),
                Failure::Unreadable(message) | Failure::Run(message) => eprintln!("{message}"),
            }
            failure.exit_code()
        }
    }
}

fn run(args: &[String]) -> Result<(), Failure> {
    let (basename, resolution) = match args {
        [basename] => (basename, None),
        [basename, resolution] => {
            let resolution = resolution
                .parse::<usize>()
                .ok()
                .filter(|r| *r > 0)
                .ok_or_else(|| Failure::Usage(format!("invalid resolution `{resolution}`")))?;
            (basename, Some(resolution))
        }
        _ => return Err(Failure::Usage("expected a basename and an optional resolution".to_string())),
    };

    let config = RibbonConfig::load_or_default(format!("{basename}.json")).map_err(|e| Failure::Usage(e.to_string()))?;
    let resolution = resolution.unwrap_or(config.resolution);

    let curves = read_lop(format!("{basename}.lop"));
    if curves.is_empty() {
        return Err(Failure::Unreadable(format!("Cannot read file: {basename}")));
    }

    let begin = Instant::now();
    let domain = Arc::new(CurvedDomain::new(config.domain));
    domain.set_curves(curves);
    domain.update().map_err(|e| Failure::Run(e.to_string()))?;
    let mesh = domain.mesh(resolution).map_err(|e| Failure::Run(e.to_string()))?;
    println!("Domain ({} sides, resolution {resolution}):", domain.size());
    println!("  Setup time: {}ms", begin.elapsed().as_millis());
    println!(
        "  {} vertices, {} triangles, minimum angle {:.1}",
        mesh.vertex_count(),
        mesh.triangle_count(),
        mesh.diagnostics.min_angle_deg
    );
    write_file(&output_path(basename, "mesh"), |w| write_domain_mesh(w, &mesh))?;

    let domain: Arc<dyn Domain> = domain;
    for &kind in &config.parameterizations {
        evaluate(basename, kind, &config, &domain, &mesh)?;
    }
    Ok(())
}

fn evaluate(
    basename: &str,
    kind: ParameterizationKind,
    config: &RibbonConfig,
    domain: &Arc<dyn Domain>,
    mesh: &DomainMesh,
) -> Result<(), Failure> {
    println!("{kind}:");

    let begin = Instant::now();
    let param = config.parameterization(kind).build();
    param.set_domain(Arc::clone(domain));
    param.update().map_err(|e| Failure::Run(format!("{kind}: {e}")))?;
    println!("  Setup time: {}ms", begin.elapsed().as_millis());

    let begin = Instant::now();
    write_file(&output_path(basename, &format!("{kind}-domain")), |w| {
        write_domain_eval(w, mesh, param.as_ref())
    })?;
    let segments = iso_d_contours(mesh, param.as_ref(), &config.contours);
    write_file(&output_path(basename, &format!("{kind}-contours")), |w| write_segments(w, &segments))?;
    println!("  Evaluation time: {}ms", begin.elapsed().as_millis());
    Ok(())
}

fn output_path(basename: &str, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{basename}-{suffix}.obj"))
}

fn write_file(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
) -> Result<(), Failure> {
    let file = File::create(path).map_err(|e| Failure::Run(format!("create {}: {e}", path.display())))?;
    let mut w = BufWriter::new(file);
    write(&mut w)
        .and_then(|()| w.flush())
        .map_err(|e| Failure::Run(format!("write {}: {e}", path.display())))?;
    log::info!("wrote {}", path.display());
    Ok(())
}
