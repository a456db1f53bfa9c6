//! Crate-level error type.
//!
//! Each stage owns a narrow error enum; [`Error`] wraps them so the pipeline
//! can propagate with `?` while callers still match on the stage that failed.

use crate::artifacts::ArtifactError;
use crate::codec::CodecError;
use crate::config::ConfigError;
use crate::features::FeatureRangeError;
use crate::inference::PredictionError;
use crate::scoring::ScoringConfigError;

/// Any failure of an inference or scoring request.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Crop name outside the fitted vocabulary, or a bad class index.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Model or codec artifact missing or unreadable.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// Input rejected by the configured range policy.
    #[error("invalid input: {0}")]
    FeatureRange(#[from] FeatureRangeError),

    /// Model and runtime disagree on the feature schema.
    #[error(transparent)]
    Prediction(#[from] PredictionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid scoring thresholds: {0}")]
    Scoring(#[from] ScoringConfigError),
}

impl Error {
    /// Whether the request can succeed with different user input.
    ///
    /// Everything else needs operator action.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Codec(CodecError::UnknownCrop { .. }) | Self::FeatureRange(_)
        )
    }
}

/// Result alias for crate operations.
pub type Result<T> = std::result::Result<T, Error>;
