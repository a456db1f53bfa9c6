//! Shared fixtures for unit and integration tests.
//!
//! The reference model is a small hand-built forest over the crop
//! recommendation vocabulary. Its leaf values are exact in binary, so
//! predictions are exact sums and tests can compare them directly.

use std::path::Path;

use crate::artifacts::ArtifactStore;
use crate::codec::LabelCodec;
use crate::features::Feature;
use crate::model::{ModelMeta, YieldModel};
use crate::persist::{self, WriteError};
use crate::repr::{Aggregation, Forest, TreeBuilder};

/// Crop vocabulary of the reference codec, already sorted.
pub const CROPS: [&str; 22] = [
    "apple",
    "banana",
    "blackgram",
    "chickpea",
    "coconut",
    "coffee",
    "cotton",
    "grapes",
    "jute",
    "kidneybeans",
    "lentil",
    "maize",
    "mango",
    "mothbeans",
    "mungbean",
    "muskmelon",
    "orange",
    "papaya",
    "pigeonpeas",
    "pomegranate",
    "rice",
    "watermelon",
];

/// Codec fitted on [`CROPS`].
pub fn reference_codec() -> LabelCodec {
    LabelCodec::fit(CROPS).expect("reference vocabulary is valid")
}

/// Three-tree additive model over N, rainfall and crop index.
///
/// | tree | split | leaves |
/// |------|-------|--------|
/// | 0 | `N < 60` | 5.0 / 7.0 |
/// | 1 | `rainfall < 150`, then `< 250` | 2.0 / 4.0 / 6.0 |
/// | 2 | `crop_num < 10.5` | 0.5 / 1.0 |
///
/// Rice with N=80 and 200 mm of rain predicts 7 + 4 + 1 = 12 t/ha.
pub fn reference_model() -> YieldModel {
    let mut forest = Forest::new(Aggregation::Sum);

    let mut nitrogen = TreeBuilder::with_n_nodes(3);
    nitrogen.set_split(0, Feature::Nitrogen.index() as u32, 60.0, true, 1, 2);
    nitrogen.set_leaf(1, 5.0);
    nitrogen.set_leaf(2, 7.0);
    forest.push_tree(nitrogen.build().expect("nitrogen tree is valid"));

    let rainfall = Feature::Rainfall.index() as u32;
    let mut rain = TreeBuilder::with_n_nodes(5);
    rain.set_split(0, rainfall, 150.0, true, 1, 2);
    rain.set_leaf(1, 2.0);
    rain.set_split(2, rainfall, 250.0, false, 3, 4);
    rain.set_leaf(3, 4.0);
    rain.set_leaf(4, 6.0);
    forest.push_tree(rain.build().expect("rainfall tree is valid"));

    let mut crop = TreeBuilder::with_n_nodes(3);
    crop.set_split(0, Feature::CropIndex.index() as u32, 10.5, true, 1, 2);
    crop.set_leaf(1, 0.5);
    crop.set_leaf(2, 1.0);
    forest.push_tree(crop.build().expect("crop tree is valid"));

    YieldModel::new(forest, ModelMeta::for_field_features()).expect("reference model is valid")
}

/// Write the reference artifacts into `dir` with the default file names.
pub fn write_reference_artifacts(dir: &Path) -> Result<ArtifactStore, WriteError> {
    let store = ArtifactStore::new(dir);
    persist::save_model(&reference_model(), store.model_path())?;
    persist::save_codec(&reference_codec(), store.codec_path())?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_predictions() {
        let model = reference_model();
        let codec = reference_codec();
        let rice = codec.encode("rice").unwrap() as f32;
        let maize = codec.encode("maize").unwrap() as f32;
        assert_eq!(rice, 20.0);
        assert_eq!(maize, 11.0);

        assert_eq!(model.predict_row(&[80.0, 40.0, 40.0, 25.0, 70.0, 6.5, 200.0, rice]), 12.0);
        assert_eq!(model.predict_row(&[40.0, 20.0, 20.0, 25.0, 70.0, 6.5, 300.0, maize]), 12.0);
        assert_eq!(model.predict_row(&[40.0, 20.0, 20.0, 25.0, 70.0, 6.5, 100.0, 0.0]), 7.5);
    }
}
