//! Model metadata.

use serde::{Deserialize, Serialize};

use crate::features::{Feature, FEATURE_COUNT};

/// Input schema the model was fitted on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModelMeta {
    /// Number of input features.
    pub n_features: usize,
    /// Feature names in column order (optional).
    pub feature_names: Option<Vec<String>>,
}

impl ModelMeta {
    /// Metadata for a model with `n_features` unnamed inputs.
    pub fn new(n_features: usize) -> Self {
        Self {
            n_features,
            feature_names: None,
        }
    }

    /// Metadata matching the field-parameter feature vector.
    pub fn for_field_features() -> Self {
        Self::new(FEATURE_COUNT).with_feature_names(Feature::column_names())
    }

    /// Set feature names.
    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        self.feature_names = Some(names);
        self
    }
}
