//! Tree-ensemble yield regressor.

use std::path::Path;

use ndarray::{Array1, ArrayView2, Axis};

use crate::model::meta::ModelMeta;
use crate::persist::{self, ReadError, WriteError};
use crate::repr::{Forest, ForestValidationError};

/// Fitted regression model: forest plus the input schema it expects.
///
/// Access components via [`forest()`](Self::forest) and [`meta()`](Self::meta).
#[derive(Debug, Clone, PartialEq)]
pub struct YieldModel {
    forest: Forest,
    meta: ModelMeta,
}

impl YieldModel {
    /// Create a model from a forest and metadata.
    ///
    /// Validates the forest structure and that every split refers to a
    /// feature covered by `meta`.
    pub fn new(forest: Forest, meta: ModelMeta) -> Result<Self, ForestValidationError> {
        forest.validate()?;
        forest.validate_features(meta.n_features)?;
        Ok(Self { forest, meta })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn meta(&self) -> &ModelMeta {
        &self.meta
    }

    /// Number of input features the model was fitted on.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.meta.n_features
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    /// Predict one row. No schema checks; see
    /// [`YieldPredictor`](crate::inference::YieldPredictor) for the checked path.
    #[inline]
    pub fn predict_row(&self, features: &[f32]) -> f64 {
        self.forest.predict_row(features)
    }

    /// Predict a row-major `[n_rows, n_features]` batch.
    pub fn predict_batch(&self, features: ArrayView2<'_, f32>) -> Array1<f64> {
        features
            .axis_iter(Axis(0))
            .map(|row| match row.as_slice() {
                Some(slice) => self.predict_row(slice),
                None => self.predict_row(&row.to_vec()),
            })
            .collect()
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Load a model artifact from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReadError> {
        persist::load_model(path)
    }

    /// Write this model as a JSON artifact.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), WriteError> {
        persist::save_model(self, path)
    }
}
