//! Runtime configuration.
//!
//! An optional TOML file selects the artifact location, scoring thresholds
//! and input range policy. Every section and key may be omitted:
//!
//! ```toml
//! [artifacts]
//! dir = "models"
//! model_file = "yield_model.json"
//! codec_file = "crop_codec.json"
//!
//! [scoring]
//! sustainable_above = 0.15
//! moderate_above = 0.08
//!
//! [validation]
//! strict = true          # start from the agronomic ranges
//!
//! [validation.ranges.ph] # explicit ranges override the preset
//! min = 4.0
//! max = 9.0
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::artifacts::{ArtifactStore, DEFAULT_CODEC_FILE, DEFAULT_MODEL_FILE};
use crate::features::FeatureRanges;
use crate::scoring::{ScoringConfig, ScoringConfigError};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "ECOYIELD_CONFIG";

/// Default artifact directory, relative to the working directory.
pub const DEFAULT_ARTIFACT_DIR: &str = "models";

/// Errors loading a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed reading config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed parsing TOML config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Scoring(#[from] ScoringConfigError),
}

/// `[artifacts]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactsConfig {
    pub dir: PathBuf,
    pub model_file: String,
    pub codec_file: String,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_ARTIFACT_DIR),
            model_file: DEFAULT_MODEL_FILE.to_owned(),
            codec_file: DEFAULT_CODEC_FILE.to_owned(),
        }
    }
}

/// `[validation]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    /// Use [`FeatureRanges::agronomic`] as the base policy.
    pub strict: bool,
    /// Per-field overrides on top of the base policy.
    pub ranges: FeatureRanges,
}

impl ValidationConfig {
    /// Effective range policy.
    pub fn effective_ranges(&self) -> FeatureRanges {
        let base = if self.strict {
            FeatureRanges::agronomic()
        } else {
            FeatureRanges::unbounded()
        };
        let o = &self.ranges;
        FeatureRanges {
            nitrogen: o.nitrogen.or(base.nitrogen),
            phosphorus: o.phosphorus.or(base.phosphorus),
            potassium: o.potassium.or(base.potassium),
            temperature: o.temperature.or(base.temperature),
            humidity: o.humidity.or(base.humidity),
            ph: o.ph.or(base.ph),
            rainfall: o.rainfall.or(base.rainfall),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EcoYieldConfig {
    pub artifacts: ArtifactsConfig,
    pub scoring: ScoringConfig,
    pub validation: ValidationConfig,
}

impl EcoYieldConfig {
    /// Parse and validate TOML text.
    pub fn from_toml_str(raw: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.scoring.validate()?;
        Ok(config)
    }

    /// Read a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&raw, path)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load from `$ECOYIELD_CONFIG`, or defaults when it is unset or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load_optional(std::env::var_os(CONFIG_ENV))
    }

    /// Load from `path` if given, otherwise defaults.
    pub fn load_optional(path: Option<impl Into<OsString>>) -> Result<Self, ConfigError> {
        match path.map(Into::into).filter(|p| !p.is_empty()) {
            Some(path) => Self::load(PathBuf::from(path)),
            None => Ok(Self::default()),
        }
    }

    /// Artifact store described by `[artifacts]`.
    pub fn store(&self) -> ArtifactStore {
        ArtifactStore::new(&self.artifacts.dir)
            .with_model_file(&self.artifacts.model_file)
            .with_codec_file(&self.artifacts.codec_file)
    }

    /// Range policy described by `[validation]`.
    pub fn ranges(&self) -> FeatureRanges {
        self.validation.effective_ranges()
    }
}
