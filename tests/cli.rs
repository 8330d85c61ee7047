use std::path::PathBuf;
use std::process::{Command, Output};

const UNIT_SQUARE: &str = "4
1 2 0 1 2 0 0 0 1 0 0
1 2 0 1 2 1 0 0 1 1 0
1 2 0 1 2 1 1 0 0 1 0
1 2 0 1 2 0 1 0 0 0 0
";

fn basename(name: &str) -> String {
    let path: PathBuf = std::env::temp_dir().join(format!("curved-ribbons-cli-{}-{name}", std::process::id()));
    path.to_string_lossy().into_owned()
}

fn ribbon_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ribbon_cli"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to launch ribbon_cli")
}

#[test]
fn wrong_argument_count_exits_with_1() {
    assert_eq!(ribbon_cli(&[]).status.code(), Some(1));
    assert_eq!(ribbon_cli(&["a", "10", "extra"]).status.code(), Some(1));
}

#[test]
fn non_numeric_resolution_exits_with_1() {
    let base = basename("bad-resolution");
    std::fs::write(format!("{base}.lop"), UNIT_SQUARE).unwrap();
    assert_eq!(ribbon_cli(&[base.as_str(), "ten"]).status.code(), Some(1));
    std::fs::remove_file(format!("{base}.lop")).unwrap();
}

#[test]
fn unreadable_profile_exits_with_2() {
    let base = basename("truncated");
    std::fs::write(format!("{base}.lop"), &UNIT_SQUARE[..30]).unwrap();
    let output = ribbon_cli(&[base.as_str()]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(&format!("Cannot read file: {base}")), "{stderr}");
    std::fs::remove_file(format!("{base}.lop")).unwrap();

    let missing = basename("missing");
    assert_eq!(ribbon_cli(&[missing.as_str()]).status.code(), Some(2));
}

#[test]
fn square_run_writes_every_output() {
    let base = basename("square");
    std::fs::write(format!("{base}.lop"), UNIT_SQUARE).unwrap();
    std::fs::write(format!("{base}.json"), r#"{ "harmonic": { "levels": 5 } }"#).unwrap();

    let output = ribbon_cli(&[base.as_str(), "8"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Setup time"));

    let mesh = std::fs::read_to_string(format!("{base}-mesh.obj")).unwrap();
    assert_eq!(mesh.lines().filter(|l| l.starts_with("v ")).take(32).count(), 32);
    assert!(mesh.lines().any(|l| l.starts_with("f ")));

    let domain = std::fs::read_to_string(format!("{base}-constrained-harmonic-domain.obj")).unwrap();
    let first = domain.lines().next().unwrap();
    // Four (s, d) pairs then (u, v).
    assert_eq!(first.split_whitespace().count(), 1 + 2 * 4 + 2);

    let contours = std::fs::read_to_string(format!("{base}-mean-value-contours.obj")).unwrap();
    assert!(contours.lines().any(|l| l.starts_with("l ")));

    for suffix in [
        ".lop",
        ".json",
        "-mesh.obj",
        "-constrained-harmonic-domain.obj",
        "-constrained-harmonic-contours.obj",
        "-mean-value-domain.obj",
        "-mean-value-contours.obj",
    ] {
        std::fs::remove_file(format!("{base}{suffix}")).unwrap();
    }
}
