//! ecoyield: crop yield inference and nutrient-efficiency scoring.
//!
//! Estimates agricultural yield from soil-nutrient and weather measurements
//! with a fitted tree-ensemble regressor, then turns the estimate into a
//! sustainability signal: yield produced per unit of applied N+P+K.
//!
//! # Key Types
//!
//! - [`LabelCodec`] - Crop name <-> integer index
//! - [`ArtifactCache`] - Lazily loaded, shared model + codec
//! - [`FeatureVectorBuilder`] / [`FeatureVector`] - Model input assembly
//! - [`YieldPredictor`] - Model invocation
//! - [`SustainabilityScorer`] / [`SustainabilityResult`] - Banded efficiency score
//! - [`EcoYield`] - The whole pipeline behind one facade
//!
//! # Pipeline
//!
//! ```ignore
//! use ecoyield::{ArtifactStore, EcoYield, FieldParameters};
//!
//! let eco = EcoYield::new(ArtifactStore::new("models"));
//! let params = FieldParameters::new("rice", 80.0, 40.0, 40.0, 25.0, 70.0, 6.5, 200.0);
//! let result = eco.evaluate(&params)?;
//! println!("{}: {:.4}", result.band(), result.efficiency());
//! ```

// Re-export approx traits for users who want to compare scores
pub use approx;

pub mod artifacts;
pub mod codec;
pub mod config;
pub mod error;
pub mod features;
pub mod inference;
pub mod model;
pub mod persist;
pub mod pipeline;
pub mod repr;
pub mod scoring;
pub mod testing;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use artifacts::{ArtifactCache, ArtifactError, ArtifactKind, ArtifactStore, Artifacts};
pub use codec::{CodecError, LabelCodec};
pub use config::{ConfigError, EcoYieldConfig};
pub use error::{Error, Result};
pub use features::{
    Feature, FeatureRange, FeatureRangeError, FeatureRanges, FeatureVector, FeatureVectorBuilder,
    FieldParameters, FEATURE_COUNT,
};
pub use inference::{PredictionError, YieldEstimate, YieldPredictor};
pub use model::{ModelMeta, YieldModel};
pub use pipeline::EcoYield;
pub use scoring::{
    ScoringConfig, ScoringConfigError, SustainabilityBand, SustainabilityResult,
    SustainabilityScorer,
};
