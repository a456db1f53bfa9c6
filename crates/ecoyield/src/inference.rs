//! Yield prediction.
//!
//! [`YieldPredictor`] is the checked entry point into the model: it confirms
//! the loaded model was fitted on the [`Feature`] schema before invoking it,
//! so a stale model/codec pairing fails loudly instead of predicting garbage.

use std::fmt;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::features::{Feature, FeatureVector, FEATURE_COUNT};
use crate::model::YieldModel;

/// Model rejected the input. Indicates an artifact/schema mismatch; never retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictionError {
    #[error("model was fitted on {actual} features, expected {expected} ({})", expected_schema())]
    FeatureCountMismatch { expected: usize, actual: usize },

    #[error("model feature '{actual}' at column {column}, expected '{expected}' ({})", expected_schema())]
    FeatureNameMismatch {
        column: usize,
        expected: String,
        actual: String,
    },

    #[error("model produced a non-finite yield ({value})")]
    NonFiniteOutput { value: f64 },
}

/// The feature schema the runtime builds, as a comma-separated list.
pub fn expected_schema() -> String {
    Feature::column_names().join(", ")
}

// =============================================================================
// YieldEstimate
// =============================================================================

/// Predicted yield in tons/hectare. Never negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct YieldEstimate(f64);

impl YieldEstimate {
    /// Wrap a raw model output, clamping negatives to zero.
    ///
    /// Returns `None` for NaN or infinite values.
    pub fn new(tons_per_hectare: f64) -> Option<Self> {
        tons_per_hectare
            .is_finite()
            .then(|| Self(tons_per_hectare.max(0.0)))
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for YieldEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} t/ha", self.0)
    }
}

// =============================================================================
// YieldPredictor
// =============================================================================

/// Checked single-row and batch prediction over a [`YieldModel`].
#[derive(Debug, Clone, Copy)]
pub struct YieldPredictor<'m> {
    model: &'m YieldModel,
}

impl<'m> YieldPredictor<'m> {
    pub fn new(model: &'m YieldModel) -> Self {
        Self { model }
    }

    /// Confirm the model was fitted on the [`Feature`] column order.
    ///
    /// Feature names are only compared when the artifact recorded them.
    pub fn check_schema(&self) -> Result<(), PredictionError> {
        let meta = self.model.meta();
        if meta.n_features != FEATURE_COUNT {
            return Err(PredictionError::FeatureCountMismatch {
                expected: FEATURE_COUNT,
                actual: meta.n_features,
            });
        }

        if let Some(names) = &meta.feature_names {
            for (column, (feature, actual)) in Feature::ALL.iter().zip(names).enumerate() {
                if feature.column_name() != actual.as_str() {
                    return Err(PredictionError::FeatureNameMismatch {
                        column,
                        expected: feature.column_name().to_owned(),
                        actual: actual.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Predict yield for one feature vector.
    ///
    /// Deterministic for a fixed model and input.
    pub fn predict(&self, vector: &FeatureVector) -> Result<YieldEstimate, PredictionError> {
        self.check_schema()?;
        let raw = self.model.predict_row(&vector.to_f32_row());
        to_estimate(raw)
    }

    /// Predict several vectors, preserving order.
    pub fn predict_batch(
        &self,
        vectors: &[FeatureVector],
    ) -> Result<Vec<YieldEstimate>, PredictionError> {
        self.check_schema()?;

        let matrix = Array2::from_shape_fn((vectors.len(), FEATURE_COUNT), |(row, col)| {
            vectors[row].values()[col] as f32
        });

        self.model
            .predict_batch(matrix.view())
            .iter()
            .map(|&raw| to_estimate(raw))
            .collect()
    }
}

fn to_estimate(raw: f64) -> Result<YieldEstimate, PredictionError> {
    let estimate = YieldEstimate::new(raw).ok_or(PredictionError::NonFiniteOutput { value: raw })?;
    if raw < 0.0 {
        warn!(raw, "negative yield prediction clamped to zero");
    }
    Ok(estimate)
}
