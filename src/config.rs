//! Run configuration for the command-line driver.
//!
//! Every field has a default, so a config file only lists what it overrides:
//!
//! ```json
//! { "resolution": 40, "parameterizations": ["mean_value"], "harmonic": { "levels": 8 } }
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geom::DomainOptions;
use crate::param::{
    ConstrainedHarmonicParameterization, ContourOptions, HarmonicOptions, HarmonicParameterization,
    MeanValueOptions, MeanValueParameterization, Parameterization,
};

/// Samples per side used when no resolution is given.
pub const DEFAULT_RESOLUTION: usize = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterizationKind {
    Harmonic,
    ConstrainedHarmonic,
    MeanValue,
}

impl ParameterizationKind {
    pub const ALL: &'static [ParameterizationKind] = &[
        ParameterizationKind::Harmonic,
        ParameterizationKind::ConstrainedHarmonic,
        ParameterizationKind::MeanValue,
    ];

    /// Tag used in output file names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Harmonic => "harmonic",
            Self::ConstrainedHarmonic => "constrained-harmonic",
            Self::MeanValue => "mean-value",
        }
    }
}

impl fmt::Display for ParameterizationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which parameterization to build and with what settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterizationOptions {
    pub kind: ParameterizationKind,
    pub harmonic: HarmonicOptions,
    pub mean_value: MeanValueOptions,
}

impl Default for ParameterizationOptions {
    fn default() -> Self {
        Self {
            kind: ParameterizationKind::ConstrainedHarmonic,
            harmonic: HarmonicOptions::default(),
            mean_value: MeanValueOptions::default(),
        }
    }
}

impl ParameterizationOptions {
    #[must_use]
    pub fn build(&self) -> Arc<dyn Parameterization> {
        build_parameterization(self.kind, self.harmonic, self.mean_value)
    }
}

/// Fresh, domain-less parameterization of `kind`.
#[must_use]
pub fn build_parameterization(
    kind: ParameterizationKind,
    harmonic: HarmonicOptions,
    mean_value: MeanValueOptions,
) -> Arc<dyn Parameterization> {
    match kind {
        ParameterizationKind::Harmonic => Arc::new(HarmonicParameterization::new(harmonic)),
        ParameterizationKind::ConstrainedHarmonic => Arc::new(ConstrainedHarmonicParameterization::new(harmonic)),
        ParameterizationKind::MeanValue => Arc::new(MeanValueParameterization::new(mean_value)),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RibbonConfig {
    /// Samples per side of the domain mesh.
    pub resolution: usize,
    pub domain: DomainOptions,
    /// Parameterizations to evaluate, in output order.
    pub parameterizations: Vec<ParameterizationKind>,
    pub harmonic: HarmonicOptions,
    pub mean_value: MeanValueOptions,
    pub contours: ContourOptions,
}

impl Default for RibbonConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            domain: DomainOptions::default(),
            parameterizations: vec![ParameterizationKind::ConstrainedHarmonic, ParameterizationKind::MeanValue],
            harmonic: HarmonicOptions::default(),
            mean_value: MeanValueOptions::default(),
            contours: ContourOptions::default(),
        }
    }
}

impl RibbonConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Config at `path`, or the defaults when there is no such file.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let config = Self::from_json(&std::fs::read_to_string(path)?)?;
        log::info!("using config {}", path.display());
        Ok(config)
    }

    /// Settings for one of the configured parameterizations.
    #[must_use]
    pub fn parameterization(&self, kind: ParameterizationKind) -> ParameterizationOptions {
        ParameterizationOptions {
            kind,
            harmonic: self.harmonic,
            mean_value: self.mean_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::QuadratureRule;

    #[test]
    fn empty_object_gives_defaults() {
        assert_eq!(RibbonConfig::from_json("{}").unwrap(), RibbonConfig::default());
        let config = RibbonConfig::default();
        assert_eq!(config.resolution, 30);
        assert_eq!(config.domain.margin, 0.025);
        assert_eq!(config.harmonic.levels, 10);
        assert_eq!(config.mean_value.quadrature, QuadratureRule::ChebyshevFixed { points: 10 });
    }

    #[test]
    fn partial_overrides_keep_other_defaults() {
        let config = RibbonConfig::from_json(
            r#"{
                "resolution": 12,
                "parameterizations": ["harmonic", "mean_value"],
                "harmonic": { "levels": 7 },
                "mean_value": { "quadrature": { "rule": "adaptive", "tolerance": 1e-5, "max_depth": 8 } }
            }"#,
        )
        .unwrap();
        assert_eq!(config.resolution, 12);
        assert_eq!(config.parameterizations, [ParameterizationKind::Harmonic, ParameterizationKind::MeanValue]);
        assert_eq!(config.harmonic.levels, 7);
        assert_eq!(config.harmonic.boundary_resolution, 100);
        assert_eq!(
            config.mean_value.quadrature,
            QuadratureRule::Adaptive {
                tolerance: 1e-5,
                max_depth: 8
            }
        );
        assert_eq!(config.contours, ContourOptions::default());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(RibbonConfig::from_json("{ resolution: }"), Err(ConfigError::Json(_))));
        assert!(matches!(
            RibbonConfig::from_json(r#"{ "parameterizations": ["bezier"] }"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn every_kind_builds_an_empty_parameterization() {
        let config = RibbonConfig::default();
        for &kind in ParameterizationKind::ALL {
            let param = config.parameterization(kind).build();
            assert_eq!(param.size(), 0, "{kind}");
        }
        assert_eq!(ParameterizationKind::MeanValue.to_string(), "mean-value");
    }
}
