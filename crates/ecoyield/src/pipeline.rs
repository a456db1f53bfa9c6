//! End-to-end request handling.
//!
//! [`EcoYield`] strings the stages together for one request:
//!
//! ```text
//! FieldParameters -> FeatureVector -> YieldEstimate -> SustainabilityResult
//!                 (codec, ranges)    (model)          (scorer)
//! ```
//!
//! Every stage failure propagates as an [`Error`](crate::Error); no partial
//! result is ever returned.

use std::sync::Arc;

use tracing::debug;

use crate::artifacts::{ArtifactCache, ArtifactStore, Artifacts};
use crate::config::EcoYieldConfig;
use crate::error::Result;
use crate::features::{FeatureRanges, FeatureVector, FeatureVectorBuilder, FieldParameters};
use crate::inference::{YieldEstimate, YieldPredictor};
use crate::scoring::{SustainabilityResult, SustainabilityScorer};

/// Inference and scoring facade over a shared [`ArtifactCache`].
///
/// Cheap to clone; clones share the cache.
#[derive(Debug, Clone)]
pub struct EcoYield {
    cache: Arc<ArtifactCache>,
    ranges: FeatureRanges,
    scorer: SustainabilityScorer,
}

impl EcoYield {
    /// Pipeline loading lazily from `store`, with default thresholds and no
    /// range checks.
    pub fn new(store: ArtifactStore) -> Self {
        Self::from_cache(Arc::new(ArtifactCache::new(store)))
    }

    /// Pipeline sharing an existing cache.
    pub fn from_cache(cache: Arc<ArtifactCache>) -> Self {
        Self {
            cache,
            ranges: FeatureRanges::unbounded(),
            scorer: SustainabilityScorer::default(),
        }
    }

    /// Pipeline described by a loaded config.
    pub fn from_config(config: &EcoYieldConfig) -> Self {
        Self::new(config.store())
            .with_ranges(config.ranges())
            .with_scorer(SustainabilityScorer::new(config.scoring.clone()))
    }

    pub fn with_ranges(mut self, ranges: FeatureRanges) -> Self {
        self.ranges = ranges;
        self
    }

    pub fn with_scorer(mut self, scorer: SustainabilityScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn cache(&self) -> &Arc<ArtifactCache> {
        &self.cache
    }

    pub fn ranges(&self) -> &FeatureRanges {
        &self.ranges
    }

    pub fn scorer(&self) -> &SustainabilityScorer {
        &self.scorer
    }

    /// Loaded artifacts, loading on first use.
    pub fn artifacts(&self) -> Result<&Artifacts> {
        Ok(self.cache.get()?)
    }

    /// Crop vocabulary in training order.
    pub fn vocabulary(&self) -> Result<&[String]> {
        Ok(self.artifacts()?.codec().classes())
    }

    /// Resolve and pack the model input for `params`.
    pub fn build_features(&self, params: &FieldParameters) -> Result<FeatureVector> {
        let codec = self.artifacts()?.codec();
        FeatureVectorBuilder::new(codec)
            .with_ranges(self.ranges.clone())
            .build(params)
    }

    /// Predict yield for `params`.
    pub fn predict(&self, params: &FieldParameters) -> Result<YieldEstimate> {
        let vector = self.build_features(params)?;
        let model = self.artifacts()?.model();
        Ok(YieldPredictor::new(model).predict(&vector)?)
    }

    /// Predict and score `params`.
    pub fn evaluate(&self, params: &FieldParameters) -> Result<SustainabilityResult> {
        let estimate = self.predict(params)?;
        debug!(crop = %params.crop, %estimate, "predicted");
        Ok(self.score(estimate, params))
    }

    /// Evaluate several requests, preserving order.
    ///
    /// Fails on the first invalid request; nothing is scored in that case.
    pub fn evaluate_batch(&self, batch: &[FieldParameters]) -> Result<Vec<SustainabilityResult>> {
        let vectors = batch
            .iter()
            .map(|params| self.build_features(params))
            .collect::<Result<Vec<_>>>()?;

        let model = self.artifacts()?.model();
        let estimates = YieldPredictor::new(model).predict_batch(&vectors)?;

        Ok(estimates
            .into_iter()
            .zip(batch)
            .map(|(estimate, params)| self.score(estimate, params))
            .collect())
    }

    fn score(&self, estimate: YieldEstimate, params: &FieldParameters) -> SustainabilityResult {
        self.scorer.score(
            estimate,
            params.nitrogen,
            params.phosphorus,
            params.potassium,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecError;
    use crate::error::Error;
    use crate::scoring::SustainabilityBand;
    use crate::testing;

    fn pipeline() -> EcoYield {
        let artifacts = Artifacts::new(testing::reference_model(), testing::reference_codec());
        let cache = ArtifactCache::preloaded(ArtifactStore::new("unused"), artifacts);
        EcoYield::from_cache(Arc::new(cache))
    }

    fn rice() -> FieldParameters {
        FieldParameters::new("rice", 80.0, 40.0, 40.0, 25.0, 70.0, 6.5, 200.0)
    }

    #[test]
    fn evaluate_rice() {
        let result = pipeline().evaluate(&rice()).unwrap();
        assert_eq!(result.yield_estimate(), 12.0);
        assert_eq!(result.total_nutrients(), 160.0);
        assert_eq!(result.efficiency(), 0.075);
        assert_eq!(result.band(), SustainabilityBand::Unsustainable);
    }

    #[test]
    fn unknown_crop_fails_without_substitution() {
        let mut params = rice();
        params.crop = "quinoa".into();
        let err = pipeline().evaluate(&params).unwrap_err();
        assert!(matches!(err, Error::Codec(CodecError::UnknownCrop { .. })));
    }

    #[test]
    fn batch_matches_single_and_fails_atomically() {
        let eco = pipeline();
        let maize = FieldParameters::new("maize", 40.0, 20.0, 20.0, 25.0, 70.0, 6.5, 300.0);
        let batch = [rice(), maize.clone()];
        let results = eco.evaluate_batch(&batch).unwrap();
        assert_eq!(results[0], eco.evaluate(&batch[0]).unwrap());
        assert_eq!(results[1], eco.evaluate(&maize).unwrap());

        let mut bad = maize;
        bad.crop = "Rice".into();
        assert!(eco.evaluate_batch(&[rice(), bad]).is_err());
    }

    #[test]
    fn strict_ranges_reject_before_inference() {
        let eco = pipeline().with_ranges(FeatureRanges::agronomic());
        let mut params = rice();
        params.humidity = 120.0;
        assert!(matches!(eco.evaluate(&params), Err(Error::FeatureRange(_))));
    }

    #[test]
    fn vocabulary_is_training_order() {
        let eco = pipeline();
        let vocab = eco.vocabulary().unwrap();
        assert_eq!(vocab.len(), 22);
        assert_eq!(vocab[0], "apple");
        assert_eq!(vocab[20], "rice");
    }
}
