//! Schema types for artifact serialization.
//!
//! These types provide a stable on-disk format independent of runtime types:
//! - The schema can evolve independently of the runtime representation
//! - Validation happens once, during schema -> runtime conversion
//! - Version tags give a clear migration path

use serde::{Deserialize, Serialize};

/// Current artifact format version.
pub const FORMAT_VERSION: u32 = 1;

/// Model type tag for tree-ensemble regressors.
pub const FOREST_MODEL_TYPE: &str = "forest";

/// Tree aggregation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationSchema {
    #[default]
    Sum,
    Mean,
}

/// Comparison used at split nodes.
///
/// scikit-learn exports use `less_or_equal`; the default matches the
/// histogram-GBDT convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitRuleSchema {
    #[default]
    LessThan,
    LessOrEqual,
}

/// Model metadata schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetaSchema {
    /// Number of features.
    pub num_features: usize,
    /// Feature names (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

/// Tree schema (SoA layout).
///
/// A node is a leaf when its `children_left` entry is 0 (the root can never
/// be a child).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSchema {
    /// Number of nodes (internal + leaves).
    pub num_nodes: u32,
    /// Split feature index for each node.
    pub split_indices: Vec<u32>,
    /// Split threshold for each node.
    pub thresholds: Vec<f64>,
    /// Left child index for each node (0 = leaf).
    pub children_left: Vec<u32>,
    /// Right child index for each node.
    pub children_right: Vec<u32>,
    /// Default direction (true = left) for missing values.
    pub default_left: Vec<bool>,
    /// Leaf value for each node (ignored for internal nodes).
    pub leaf_values: Vec<f64>,
}

/// Forest schema (collection of trees).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestSchema {
    /// How tree outputs are combined.
    #[serde(default)]
    pub aggregation: AggregationSchema,
    /// Which side a value equal to a threshold takes.
    #[serde(default)]
    pub split_rule: SplitRuleSchema,
    /// Constant added to every prediction.
    #[serde(default)]
    pub base_score: f64,
    /// Trees in iteration order.
    pub trees: Vec<TreeSchema>,
}

/// Full yield model schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YieldModelSchema {
    pub meta: ModelMetaSchema,
    pub forest: ForestSchema,
}

/// Top-level model artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEnvelope {
    pub format_version: u32,
    pub model_type: String,
    pub model: YieldModelSchema,
}

/// Crop label codec artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodecSchema {
    pub format_version: u32,
    /// Crop names in training order; position is the encoded index.
    pub classes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregation_serde() {
        let json = serde_json::to_string(&AggregationSchema::Mean).unwrap();
        assert_eq!(json, r#""mean""#);
        let parsed: AggregationSchema = serde_json::from_str(r#""sum""#).unwrap();
        assert_eq!(parsed, AggregationSchema::Sum);
    }

    #[test]
    fn split_rule_serde() {
        let json = serde_json::to_string(&SplitRuleSchema::LessOrEqual).unwrap();
        assert_eq!(json, r#""less_or_equal""#);
    }

    #[test]
    fn forest_defaults() {
        let forest: ForestSchema = serde_json::from_str(r#"{"trees": []}"#).unwrap();
        assert_eq!(forest.aggregation, AggregationSchema::Sum);
        assert_eq!(forest.split_rule, SplitRuleSchema::LessThan);
        assert_eq!(forest.base_score, 0.0);
    }

    #[test]
    fn meta_skips_missing_feature_names() {
        let meta = ModelMetaSchema {
            num_features: 8,
            feature_names: None,
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert!(!json.contains("feature_names"));
    }
}
