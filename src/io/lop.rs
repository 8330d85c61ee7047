//! ASCII "list of profiles" boundary files.
//!
//! Whitespace separated tokens: the curve count, then per curve its degree, the knot count
//! and knots, the control point count and `x y z` per control point.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::str::SplitWhitespace;

use thiserror::Error;

use crate::geom::{BSplineCurve, BoundaryCurve, CurveError, Point3};

#[derive(Debug, Error)]
pub enum LopError {
    #[error("failed to read profile list: {0}")]
    Io(#[from] io::Error),
    #[error("profile list ended early while reading {expected}")]
    UnexpectedEof { expected: &'static str },
    #[error("invalid {expected} `{token}`")]
    BadToken { expected: &'static str, token: String },
    #[error("curve {index} is invalid: {source}")]
    InvalidCurve {
        index: usize,
        #[source]
        source: CurveError,
    },
}

struct Tokens<'a> {
    inner: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.split_whitespace(),
        }
    }

    fn next<T: std::str::FromStr>(&mut self, expected: &'static str) -> Result<T, LopError> {
        let token = self.inner.next().ok_or(LopError::UnexpectedEof { expected })?;
        token.parse().map_err(|_| LopError::BadToken {
            expected,
            token: token.to_string(),
        })
    }

    fn point(&mut self) -> Result<Point3, LopError> {
        Ok(Point3::new(
            self.next("coordinate")?,
            self.next("coordinate")?,
            self.next("coordinate")?,
        ))
    }
}

/// Parses a profile list. Tokens after the last declared curve are ignored.
pub fn parse_lop(text: &str) -> Result<Vec<BSplineCurve>, LopError> {
    let mut tokens = Tokens::new(text);
    let count: usize = tokens.next("curve count")?;
    let mut curves = Vec::with_capacity(count.min(1024));
    for index in 0..count {
        let degree: usize = tokens.next("degree")?;
        let knot_count: usize = tokens.next("knot count")?;
        let knots = (0..knot_count)
            .map(|_| tokens.next("knot"))
            .collect::<Result<Vec<f64>, _>>()?;
        let point_count: usize = tokens.next("control point count")?;
        let points = (0..point_count)
            .map(|_| tokens.point())
            .collect::<Result<Vec<_>, _>>()?;
        let curve = BSplineCurve::new(degree, knots, points).map_err(|source| LopError::InvalidCurve { index, source })?;
        curves.push(curve);
    }
    Ok(curves)
}

/// Reads a profile list from `path`, reporting why it failed.
pub fn try_read_lop(path: impl AsRef<Path>) -> Result<Vec<BSplineCurve>, LopError> {
    parse_lop(&fs::read_to_string(path)?)
}

/// Reads a profile list from `path`; any failure yields an empty list.
#[must_use]
pub fn read_lop(path: impl AsRef<Path>) -> Vec<BSplineCurve> {
    let path = path.as_ref();
    match try_read_lop(path) {
        Ok(curves) => {
            log::debug!("read {} curves from {}", curves.len(), path.display());
            curves
        }
        Err(err) => {
            log::warn!("{}: {err}", path.display());
            Vec::new()
        }
    }
}

/// Writes `curves` in the format [`parse_lop`] reads.
pub fn write_lop(mut w: impl Write, curves: &[BSplineCurve]) -> io::Result<()> {
    writeln!(w, "{}", curves.len())?;
    for curve in curves {
        writeln!(w, "{}", curve.degree())?;
        let knots: Vec<String> = curve.knots().iter().map(f64::to_string).collect();
        writeln!(w, "{} {}", knots.len(), knots.join(" "))?;
        writeln!(w, "{}", curve.control_points().len())?;
        for p in curve.control_points() {
            writeln!(w, "{} {} {}", p.x, p.y, p.z)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = "4
1 2 0 1 2 0 0 0 1 0 0
1 2 0 1 2 1 0 0 1 1 0
1 2 0 1 2 1 1 0 0 1 0
1 2 0 1 2 0 1 0 0 0 0
";

    #[test]
    fn parses_a_unit_square() {
        let curves = parse_lop(SQUARE).unwrap();
        assert_eq!(curves.len(), 4);
        assert_eq!(curves[1].start(), Point3::new(1.0, 0.0, 0.0));
        assert_eq!(curves[1].end(), Point3::new(1.0, 1.0, 0.0));
        assert!(curves.iter().all(|c| c.degree() == 1));
    }

    #[test]
    fn written_curves_read_back() {
        let curves = parse_lop(SQUARE).unwrap();
        let mut buffer = Vec::new();
        write_lop(&mut buffer, &curves).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(parse_lop(&text).unwrap(), curves);
    }

    #[test]
    fn truncated_and_malformed_input() {
        let truncated = &SQUARE[..SQUARE.len() - 8];
        assert!(matches!(parse_lop(truncated), Err(LopError::UnexpectedEof { .. })));
        assert!(matches!(
            parse_lop("1\n1 2 0 x"),
            Err(LopError::BadToken { expected: "knot", .. })
        ));
        assert!(matches!(
            parse_lop("1\n0 2 0 1 2 0 0 0 1 0 0"),
            Err(LopError::InvalidCurve { index: 0, source: CurveError::InvalidDegree })
        ));
        assert!(matches!(parse_lop(""), Err(LopError::UnexpectedEof { .. })));
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let path = std::env::temp_dir().join("curved-ribbons-missing-profile.lop");
        let _ = fs::remove_file(&path);
        assert!(read_lop(&path).is_empty());
        assert!(matches!(try_read_lop(&path), Err(LopError::Io(_))));
    }
}
