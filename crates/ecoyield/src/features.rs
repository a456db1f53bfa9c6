//! Feature vector assembly.
//!
//! The model was fitted on eight columns in a fixed order: N, P, K,
//! temperature, humidity, pH, rainfall, crop index. [`Feature`] pins that
//! order down; [`FeatureVectorBuilder`] resolves the crop through the
//! [`LabelCodec`] and packs the raw field parameters into a [`FeatureVector`].
//!
//! # Range policy
//!
//! By default finite numeric inputs are passed to the model unchanged,
//! including out-of-domain values such as negative rainfall. NaN and
//! infinities are always rejected. Range checks are opt-in
//! through [`FeatureRanges`]; [`FeatureRanges::agronomic`] gives the domain the
//! dashboards expose.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::LabelCodec;
use crate::error::Result;

/// Number of model input columns.
pub const FEATURE_COUNT: usize = 8;

// =============================================================================
// Feature
// =============================================================================

/// Model input column, in fitted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Nitrogen, kg/ha.
    Nitrogen,
    /// Phosphorus, kg/ha.
    Phosphorus,
    /// Potassium, kg/ha.
    Potassium,
    /// Air temperature, °C.
    Temperature,
    /// Relative humidity, %.
    Humidity,
    /// Soil pH.
    Ph,
    /// Rainfall, mm.
    Rainfall,
    /// Crop index from the label codec.
    CropIndex,
}

impl Feature {
    /// All features in model column order.
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::Nitrogen,
        Feature::Phosphorus,
        Feature::Potassium,
        Feature::Temperature,
        Feature::Humidity,
        Feature::Ph,
        Feature::Rainfall,
        Feature::CropIndex,
    ];

    /// Column position in the feature vector.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Column name used by the training data.
    pub fn column_name(self) -> &'static str {
        match self {
            Feature::Nitrogen => "N",
            Feature::Phosphorus => "P",
            Feature::Potassium => "K",
            Feature::Temperature => "temperature",
            Feature::Humidity => "humidity",
            Feature::Ph => "ph",
            Feature::Rainfall => "rainfall",
            Feature::CropIndex => "crop_num",
        }
    }

    /// Column names in model order.
    pub fn column_names() -> Vec<String> {
        Self::ALL.iter().map(|f| f.column_name().to_owned()).collect()
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

// =============================================================================
// FieldParameters
// =============================================================================

/// Raw per-request inputs as supplied by a presentation adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldParameters {
    pub crop: String,
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: f64,
}

impl FieldParameters {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        crop: impl Into<String>,
        nitrogen: f64,
        phosphorus: f64,
        potassium: f64,
        temperature: f64,
        humidity: f64,
        ph: f64,
        rainfall: f64,
    ) -> Self {
        Self {
            crop: crop.into(),
            nitrogen,
            phosphorus,
            potassium,
            temperature,
            humidity,
            ph,
            rainfall,
        }
    }

    /// N + P + K.
    #[inline]
    pub fn total_nutrients(&self) -> f64 {
        self.nitrogen + self.phosphorus + self.potassium
    }

    fn numeric(&self) -> [(Feature, f64); 7] {
        [
            (Feature::Nitrogen, self.nitrogen),
            (Feature::Phosphorus, self.phosphorus),
            (Feature::Potassium, self.potassium),
            (Feature::Temperature, self.temperature),
            (Feature::Humidity, self.humidity),
            (Feature::Ph, self.ph),
            (Feature::Rainfall, self.rainfall),
        ]
    }
}

// =============================================================================
// FeatureVector
// =============================================================================

/// One model input row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Wrap values that are already in [`Feature::ALL`] order.
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    #[inline]
    pub fn get(&self, feature: Feature) -> f64 {
        self.values[feature.index()]
    }

    #[inline]
    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    /// Row in the precision the tree ensemble compares against.
    pub fn to_f32_row(&self) -> [f32; FEATURE_COUNT] {
        self.values.map(|v| v as f32)
    }

    /// Crop index column.
    pub fn crop_index(&self) -> usize {
        self.get(Feature::CropIndex) as usize
    }
}

// =============================================================================
// Ranges
// =============================================================================

/// Inclusive bounds for a numeric feature. A missing bound is open.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl FeatureRange {
    pub const fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub const fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// NaN is never contained.
    pub fn contains(&self, value: f64) -> bool {
        !value.is_nan()
            && self.min.map_or(true, |min| value >= min)
            && self.max.map_or(true, |max| value <= max)
    }
}

impl fmt::Display for FeatureRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) => write!(f, "[{min}, {max}]"),
            (Some(min), None) => write!(f, "[{min}, inf)"),
            (None, Some(max)) => write!(f, "(-inf, {max}]"),
            (None, None) => f.write_str("(-inf, inf)"),
        }
    }
}

/// A numeric input fell outside its configured range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{feature} = {value} outside allowed range {range}")]
pub struct FeatureRangeError {
    pub feature: Feature,
    pub value: f64,
    pub range: FeatureRange,
}

/// Per-field range policy. `None` means the field is passed through unchecked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeatureRanges {
    pub nitrogen: Option<FeatureRange>,
    pub phosphorus: Option<FeatureRange>,
    pub potassium: Option<FeatureRange>,
    pub temperature: Option<FeatureRange>,
    pub humidity: Option<FeatureRange>,
    pub ph: Option<FeatureRange>,
    pub rainfall: Option<FeatureRange>,
}

impl FeatureRanges {
    /// No checks: every value reaches the model unchanged.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Domain used by the dashboard inputs.
    pub fn agronomic() -> Self {
        Self {
            nitrogen: Some(FeatureRange::between(0.0, 140.0)),
            phosphorus: Some(FeatureRange::between(0.0, 145.0)),
            potassium: Some(FeatureRange::between(0.0, 205.0)),
            temperature: None,
            humidity: Some(FeatureRange::between(0.0, 100.0)),
            ph: Some(FeatureRange::between(0.0, 14.0)),
            rainfall: Some(FeatureRange::at_least(0.0)),
        }
    }

    /// Range for `feature`. The crop index is never range-checked.
    pub fn get(&self, feature: Feature) -> Option<&FeatureRange> {
        match feature {
            Feature::Nitrogen => self.nitrogen.as_ref(),
            Feature::Phosphorus => self.phosphorus.as_ref(),
            Feature::Potassium => self.potassium.as_ref(),
            Feature::Temperature => self.temperature.as_ref(),
            Feature::Humidity => self.humidity.as_ref(),
            Feature::Ph => self.ph.as_ref(),
            Feature::Rainfall => self.rainfall.as_ref(),
            Feature::CropIndex => None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        Feature::ALL.iter().all(|&f| self.get(f).is_none())
    }

    /// Check one value against its range.
    ///
    /// NaN and infinities are rejected under every policy, including
    /// [`unbounded`](Self::unbounded).
    pub fn check(&self, feature: Feature, value: f64) -> std::result::Result<(), FeatureRangeError> {
        let range = self.get(feature).copied().unwrap_or_default();
        if value.is_finite() && range.contains(value) {
            Ok(())
        } else {
            Err(FeatureRangeError {
                feature,
                value,
                range,
            })
        }
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Packs [`FieldParameters`] into a [`FeatureVector`].
#[derive(Debug, Clone)]
pub struct FeatureVectorBuilder<'c> {
    codec: &'c LabelCodec,
    ranges: FeatureRanges,
}

impl<'c> FeatureVectorBuilder<'c> {
    /// Builder with the pass-through range policy.
    pub fn new(codec: &'c LabelCodec) -> Self {
        Self {
            codec,
            ranges: FeatureRanges::unbounded(),
        }
    }

    pub fn with_ranges(mut self, ranges: FeatureRanges) -> Self {
        self.ranges = ranges;
        self
    }

    pub fn ranges(&self) -> &FeatureRanges {
        &self.ranges
    }

    /// Resolve the crop and pack the eight columns.
    ///
    /// # Errors
    ///
    /// - [`CodecError::UnknownCrop`](crate::CodecError::UnknownCrop) if the crop is
    ///   not in the vocabulary. No substitution happens here.
    /// - [`FeatureRangeError`] for the first field outside its configured range.
    pub fn build(&self, params: &FieldParameters) -> Result<FeatureVector> {
        let crop_index = self.codec.encode(&params.crop)?;

        let mut values = [0.0; FEATURE_COUNT];
        for (feature, value) in params.numeric() {
            self.ranges.check(feature, value)?;
            values[feature.index()] = value;
        }
        values[Feature::CropIndex.index()] = crop_index as f64;

        Ok(FeatureVector::from_values(values))
    }
}
