#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Ribbon parameterizations over curved n-sided domains.
//!
//! A boundary loop of B-spline curves is projected onto its best-fit plane and triangulated
//! ([`geom::CurvedDomain`]). A [`param::Parameterization`] then maps every point of that
//! planar domain to one `(s, d)` coordinate pair per side, either from per-side harmonic
//! fields solved on a multigrid or from transfinite mean-value integrals.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use curved_ribbons::geom::{CurvedDomain, Domain, DomainOptions, UvPoint};
//! use curved_ribbons::io::read_lop;
//! use curved_ribbons::param::{ConstrainedHarmonicParameterization, HarmonicOptions, Parameterization};
//!
//! let curves = read_lop("patch.lop");
//! let domain: Arc<dyn Domain> = Arc::new(CurvedDomain::from_curves(curves, DomainOptions::default())?);
//! let param = ConstrainedHarmonicParameterization::new(HarmonicOptions::default());
//! param.set_domain(Arc::clone(&domain));
//! param.update()?;
//! let coordinates = param.map_to_ribbons(UvPoint::new(0.5, 0.5));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod geom;
pub mod io;
pub mod param;
