//! Sustainability scoring.
//!
//! Converts a yield estimate into partial factor productivity (yield per kg of
//! applied N+P+K) and classifies it into a [`SustainabilityBand`].
//!
//! # Bands
//!
//! Comparisons are strict, so a score sitting exactly on a threshold belongs
//! to the lower band:
//!
//! | efficiency | band |
//! |---|---|
//! | `> sustainable_above` | [`Sustainable`](SustainabilityBand::Sustainable) |
//! | `> moderate_above` | [`Moderate`](SustainabilityBand::Moderate) |
//! | otherwise | [`Unsustainable`](SustainabilityBand::Unsustainable) |
//!
//! # Example
//!
//! ```
//! use ecoyield::scoring::{SustainabilityBand, SustainabilityScorer};
//!
//! let scorer = SustainabilityScorer::default();
//! let result = scorer.score(24.0, 40.0, 20.0, 20.0);
//! assert_eq!(result.band(), SustainabilityBand::Sustainable);
//! assert!((result.efficiency() - 0.30).abs() < 1e-12);
//! ```

use std::fmt;

use bon::Builder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::inference::YieldEstimate;

// =============================================================================
// SustainabilityBand
// =============================================================================

/// Discrete sustainability classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SustainabilityBand {
    Sustainable,
    Moderate,
    Unsustainable,
}

impl SustainabilityBand {
    /// Status label shown to users.
    pub fn label(self) -> &'static str {
        match self {
            Self::Sustainable => "SUSTAINABLE (Eco-Friendly)",
            Self::Moderate => "MODERATE (Standard)",
            Self::Unsustainable => "UNSUSTAINABLE (Excessive Chemicals)",
        }
    }

    /// Colour hint for presentation adapters.
    pub fn color(self) -> &'static str {
        match self {
            Self::Sustainable => "green",
            Self::Moderate => "orange",
            Self::Unsustainable => "red",
        }
    }

    /// Advice attached to the band.
    pub fn recommendation(self) -> &'static str {
        match self {
            Self::Sustainable => "Excellent balance! Maintain current practices.",
            Self::Moderate => {
                "Efficiency is acceptable. Consider reducing nitrogen input by about 10% to improve it."
            }
            Self::Unsustainable => {
                "Chemical usage is too high for this yield. Reduce fertilizer application, starting with a 10% cut in nitrogen."
            }
        }
    }
}

impl fmt::Display for SustainabilityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sustainable => "SUSTAINABLE",
            Self::Moderate => "MODERATE",
            Self::Unsustainable => "UNSUSTAINABLE",
        })
    }
}

// =============================================================================
// ScoringConfig
// =============================================================================

/// Errors from [`ScoringConfig`] validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringConfigError {
    #[error("{field} must be finite, got {value}")]
    NonFiniteThreshold { field: &'static str, value: f64 },

    #[error("moderate_above ({moderate_above}) must be below sustainable_above ({sustainable_above})")]
    InvertedThresholds {
        moderate_above: f64,
        sustainable_above: f64,
    },
}

/// Band thresholds.
///
/// These are calibration policy, not physics. Build with
/// [`ScoringConfig::builder`]; `build()` validates.
///
/// ```
/// use ecoyield::scoring::ScoringConfig;
///
/// let config = ScoringConfig::builder()
///     .sustainable_above(0.2)
///     .build()
///     .unwrap();
/// assert_eq!(config.moderate_above, 0.08);
/// ```
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    /// Efficiency strictly above this is sustainable. Default: 0.15.
    #[builder(default = 0.15)]
    pub sustainable_above: f64,

    /// Efficiency strictly above this (and not sustainable) is moderate. Default: 0.08.
    #[builder(default = 0.08)]
    pub moderate_above: f64,
}

/// Custom finishing function that validates the config.
impl<S: scoring_config_builder::IsComplete> ScoringConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// [`ScoringConfigError`] if a threshold is not finite or
    /// `moderate_above >= sustainable_above`.
    pub fn build(self) -> Result<ScoringConfig, ScoringConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl ScoringConfig {
    /// Validate thresholds. Needed for configs that came in through serde.
    pub fn validate(&self) -> Result<(), ScoringConfigError> {
        for (field, value) in [
            ("sustainable_above", self.sustainable_above),
            ("moderate_above", self.moderate_above),
        ] {
            if !value.is_finite() {
                return Err(ScoringConfigError::NonFiniteThreshold { field, value });
            }
        }
        if self.moderate_above >= self.sustainable_above {
            return Err(ScoringConfigError::InvertedThresholds {
                moderate_above: self.moderate_above,
                sustainable_above: self.sustainable_above,
            });
        }
        Ok(())
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::builder().build().expect("default config is valid")
    }
}

// =============================================================================
// SustainabilityResult
// =============================================================================

/// Score for one prediction. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SustainabilityResult {
    yield_estimate: f64,
    total_nutrients: f64,
    efficiency: f64,
    band: SustainabilityBand,
    recommendation: String,
}

impl SustainabilityResult {
    /// Predicted yield, t/ha.
    pub fn yield_estimate(&self) -> f64 {
        self.yield_estimate
    }

    /// N + P + K as supplied, kg/ha. Not clamped.
    pub fn total_nutrients(&self) -> f64 {
        self.total_nutrients
    }

    /// Yield per unit of nutrient.
    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }

    pub fn band(&self) -> SustainabilityBand {
        self.band
    }

    pub fn recommendation(&self) -> &str {
        &self.recommendation
    }

    /// Nutrient input in hundreds of kg/ha, on the same visual scale as yield.
    pub fn chemical_input_scaled(&self) -> f64 {
        self.total_nutrients / 100.0
    }
}

// =============================================================================
// SustainabilityScorer
// =============================================================================

/// Computes [`SustainabilityResult`]s under a [`ScoringConfig`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SustainabilityScorer {
    config: ScoringConfig,
}

impl SustainabilityScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Divisor used for the efficiency ratio.
    ///
    /// A non-positive total would divide by zero (or flip the sign), so it is
    /// replaced by 1 and the efficiency equals the yield. NaN is kept so the
    /// efficiency stays NaN and lands in the lowest band.
    #[inline]
    pub fn nutrient_divisor(total_nutrients: f64) -> f64 {
        if total_nutrients > 0.0 || total_nutrients.is_nan() {
            total_nutrients
        } else {
            1.0
        }
    }

    /// Band for an efficiency value. NaN is unsustainable.
    pub fn classify(&self, efficiency: f64) -> SustainabilityBand {
        if efficiency > self.config.sustainable_above {
            SustainabilityBand::Sustainable
        } else if efficiency > self.config.moderate_above {
            SustainabilityBand::Moderate
        } else {
            SustainabilityBand::Unsustainable
        }
    }

    /// Score a yield estimate against the nutrients applied to reach it.
    pub fn score(
        &self,
        yield_estimate: impl Into<f64>,
        nitrogen: f64,
        phosphorus: f64,
        potassium: f64,
    ) -> SustainabilityResult {
        let yield_estimate = yield_estimate.into();
        let total_nutrients = nitrogen + phosphorus + potassium;
        let efficiency = yield_estimate / Self::nutrient_divisor(total_nutrients);
        let band = self.classify(efficiency);

        debug!(yield_estimate, total_nutrients, efficiency, %band, "scored");

        SustainabilityResult {
            yield_estimate,
            total_nutrients,
            efficiency,
            band,
            recommendation: band.recommendation().to_owned(),
        }
    }
}

impl From<YieldEstimate> for f64 {
    fn from(estimate: YieldEstimate) -> Self {
        estimate.value()
    }
}
