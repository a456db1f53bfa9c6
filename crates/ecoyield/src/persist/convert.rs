//! Conversions between runtime types and schema types.
//!
//! Runtime -> schema is infallible (`From`); schema -> runtime validates and
//! reports failures as [`ReadError::Validation`].

use super::schema::{
    AggregationSchema, CodecSchema, ForestSchema, ModelEnvelope, ModelMetaSchema,
    SplitRuleSchema, TreeSchema, YieldModelSchema, FORMAT_VERSION, FOREST_MODEL_TYPE,
};
use super::ReadError;
use crate::codec::LabelCodec;
use crate::model::{ModelMeta, YieldModel};
use crate::repr::{Aggregation, Forest, SplitRule, Tree, TreeView};

// =============================================================================
// Aggregation / meta
// =============================================================================

impl From<Aggregation> for AggregationSchema {
    fn from(a: Aggregation) -> Self {
        match a {
            Aggregation::Sum => Self::Sum,
            Aggregation::Mean => Self::Mean,
        }
    }
}

impl From<AggregationSchema> for Aggregation {
    fn from(a: AggregationSchema) -> Self {
        match a {
            AggregationSchema::Sum => Self::Sum,
            AggregationSchema::Mean => Self::Mean,
        }
    }
}

impl From<SplitRule> for SplitRuleSchema {
    fn from(rule: SplitRule) -> Self {
        match rule {
            SplitRule::LessThan => Self::LessThan,
            SplitRule::LessOrEqual => Self::LessOrEqual,
        }
    }
}

impl From<SplitRuleSchema> for SplitRule {
    fn from(rule: SplitRuleSchema) -> Self {
        match rule {
            SplitRuleSchema::LessThan => Self::LessThan,
            SplitRuleSchema::LessOrEqual => Self::LessOrEqual,
        }
    }
}

impl From<&ModelMeta> for ModelMetaSchema {
    fn from(meta: &ModelMeta) -> Self {
        Self {
            num_features: meta.n_features,
            feature_names: meta.feature_names.clone(),
        }
    }
}

impl TryFrom<ModelMetaSchema> for ModelMeta {
    type Error = ReadError;

    fn try_from(schema: ModelMetaSchema) -> Result<Self, Self::Error> {
        if let Some(names) = &schema.feature_names {
            if names.len() != schema.num_features {
                return Err(ReadError::Validation(format!(
                    "{} feature names for {} features",
                    names.len(),
                    schema.num_features
                )));
            }
        }
        Ok(ModelMeta {
            n_features: schema.num_features,
            feature_names: schema.feature_names,
        })
    }
}

// =============================================================================
// Tree conversions
// =============================================================================

impl From<&Tree> for TreeSchema {
    fn from(tree: &Tree) -> Self {
        // Leaves are encoded by a zero left child.
        let children_left = (0..tree.n_nodes() as u32)
            .map(|n| if tree.is_leaf(n) { 0 } else { tree.left_child(n) })
            .collect();

        TreeSchema {
            num_nodes: tree.n_nodes() as u32,
            split_indices: tree.split_indices().to_vec(),
            thresholds: tree.split_thresholds().to_vec(),
            children_left,
            children_right: tree.right_children().to_vec(),
            default_left: tree.default_left_flags().to_vec(),
            leaf_values: tree.leaf_values().to_vec(),
        }
    }
}

impl TryFrom<TreeSchema> for Tree {
    type Error = ReadError;

    fn try_from(schema: TreeSchema) -> Result<Self, Self::Error> {
        let n_nodes = schema.num_nodes as usize;
        if schema.split_indices.len() != n_nodes {
            return Err(ReadError::Validation(format!(
                "split_indices has {} entries, num_nodes is {n_nodes}",
                schema.split_indices.len()
            )));
        }

        let is_leaf: Vec<bool> = schema.children_left.iter().map(|&left| left == 0).collect();

        let tree = Tree::new(
            schema.split_indices,
            schema.thresholds,
            schema.children_left,
            schema.children_right,
            schema.default_left,
            is_leaf,
            schema.leaf_values,
        )
        .map_err(|e| ReadError::Validation(e.to_string()))?;

        tree.validate()
            .map_err(|e| ReadError::Validation(e.to_string()))?;

        Ok(tree)
    }
}

// =============================================================================
// Forest conversions
// =============================================================================

impl From<&Forest> for ForestSchema {
    fn from(forest: &Forest) -> Self {
        ForestSchema {
            aggregation: forest.aggregation().into(),
            split_rule: forest.split_rule().into(),
            base_score: forest.base_score(),
            trees: forest.trees().map(TreeSchema::from).collect(),
        }
    }
}

impl TryFrom<ForestSchema> for Forest {
    type Error = ReadError;

    fn try_from(schema: ForestSchema) -> Result<Self, Self::Error> {
        let mut forest = Forest::new(schema.aggregation.into())
            .with_split_rule(schema.split_rule.into())
            .with_base_score(schema.base_score);

        for (i, tree_schema) in schema.trees.into_iter().enumerate() {
            let tree = Tree::try_from(tree_schema).map_err(|e| match e {
                ReadError::Validation(msg) => ReadError::Validation(format!("tree {i}: {msg}")),
                other => other,
            })?;
            forest.push_tree(tree);
        }

        Ok(forest)
    }
}

// =============================================================================
// Model conversions
// =============================================================================

impl From<&YieldModel> for YieldModelSchema {
    fn from(model: &YieldModel) -> Self {
        Self {
            meta: model.meta().into(),
            forest: model.forest().into(),
        }
    }
}

impl TryFrom<YieldModelSchema> for YieldModel {
    type Error = ReadError;

    fn try_from(schema: YieldModelSchema) -> Result<Self, Self::Error> {
        let meta = ModelMeta::try_from(schema.meta)?;
        let forest = Forest::try_from(schema.forest)?;
        YieldModel::new(forest, meta).map_err(|e| ReadError::Validation(e.to_string()))
    }
}

impl From<&YieldModel> for ModelEnvelope {
    fn from(model: &YieldModel) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            model_type: FOREST_MODEL_TYPE.to_owned(),
            model: model.into(),
        }
    }
}

impl TryFrom<ModelEnvelope> for YieldModel {
    type Error = ReadError;

    fn try_from(envelope: ModelEnvelope) -> Result<Self, Self::Error> {
        check_version(envelope.format_version)?;
        if envelope.model_type != FOREST_MODEL_TYPE {
            return Err(ReadError::UnexpectedModelType(envelope.model_type));
        }
        YieldModel::try_from(envelope.model)
    }
}

// =============================================================================
// Codec conversions
// =============================================================================

impl From<&LabelCodec> for CodecSchema {
    fn from(codec: &LabelCodec) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            classes: codec.classes().to_vec(),
        }
    }
}

impl TryFrom<CodecSchema> for LabelCodec {
    type Error = ReadError;

    fn try_from(schema: CodecSchema) -> Result<Self, Self::Error> {
        check_version(schema.format_version)?;
        if schema.classes.is_empty() {
            return Err(ReadError::Validation("codec vocabulary is empty".into()));
        }
        LabelCodec::new(schema.classes).map_err(|e| ReadError::Validation(e.to_string()))
    }
}

fn check_version(found: u32) -> Result<(), ReadError> {
    if found == FORMAT_VERSION {
        Ok(())
    } else {
        Err(ReadError::UnsupportedVersion {
            found,
            supported: FORMAT_VERSION,
        })
    }
}
