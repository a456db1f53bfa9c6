//! Canonical forest representation (collection of regression trees).

use super::tree::{SplitRule, TreeValidationError};
use super::Tree;

/// How per-tree outputs are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aggregation {
    /// Boosted ensembles: `base_score + Σ leaf`.
    #[default]
    Sum,
    /// Bagged ensembles (random forests): `base_score + mean(leaf)`.
    Mean,
}

/// Structural validation errors for [`Forest`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForestValidationError {
    #[error("forest has no trees")]
    Empty,
    #[error("base score is not finite")]
    NonFiniteBaseScore,
    #[error("tree {tree_idx}: {error}")]
    InvalidTree {
        tree_idx: usize,
        error: TreeValidationError,
    },
}

/// Single-output regression forest.
#[derive(Debug, Clone, PartialEq)]
pub struct Forest {
    trees: Vec<Tree>,
    aggregation: Aggregation,
    split_rule: SplitRule,
    base_score: f64,
}

impl Forest {
    /// Create an empty forest.
    pub fn new(aggregation: Aggregation) -> Self {
        Self {
            trees: Vec::new(),
            aggregation,
            split_rule: SplitRule::default(),
            base_score: 0.0,
        }
    }

    /// Set the base score added to every prediction.
    pub fn with_base_score(mut self, base_score: f64) -> Self {
        self.base_score = base_score;
        self
    }

    /// Set the comparison every split uses.
    pub fn with_split_rule(mut self, split_rule: SplitRule) -> Self {
        self.split_rule = split_rule;
        self
    }

    /// Add a tree to the forest.
    pub fn push_tree(&mut self, tree: Tree) {
        self.trees.push(tree);
    }

    /// Number of trees.
    #[inline]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    #[inline]
    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    #[inline]
    pub fn split_rule(&self) -> SplitRule {
        self.split_rule
    }

    #[inline]
    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    /// Get a reference to a specific tree.
    #[inline]
    pub fn tree(&self, idx: usize) -> &Tree {
        &self.trees[idx]
    }

    /// Iterate over trees.
    pub fn trees(&self) -> impl Iterator<Item = &Tree> {
        self.trees.iter()
    }

    /// Validate structural invariants for every tree.
    pub fn validate(&self) -> Result<(), ForestValidationError> {
        if self.trees.is_empty() {
            return Err(ForestValidationError::Empty);
        }
        if !self.base_score.is_finite() {
            return Err(ForestValidationError::NonFiniteBaseScore);
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate()
                .map_err(|e| ForestValidationError::InvalidTree { tree_idx: i, error: e })?;
        }
        Ok(())
    }

    /// Check every split against the model's feature count.
    pub fn validate_features(&self, n_features: usize) -> Result<(), ForestValidationError> {
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate_features(n_features)
                .map_err(|e| ForestValidationError::InvalidTree { tree_idx: i, error: e })?;
        }
        Ok(())
    }

    /// Predict for a single row of features.
    ///
    /// Leaves are summed in tree order.
    pub fn predict_row(&self, features: &[f32]) -> f64 {
        let total: f64 = self
            .trees
            .iter()
            .map(|tree| tree.predict_row(features, self.split_rule))
            .sum();

        let combined = match self.aggregation {
            Aggregation::Sum => total,
            Aggregation::Mean if self.trees.is_empty() => 0.0,
            Aggregation::Mean => total / self.trees.len() as f64,
        };

        self.base_score + combined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::TreeBuilder;
    use approx::assert_abs_diff_eq;

    fn stump(threshold: f64, left: f64, right: f64) -> Tree {
        let mut b = TreeBuilder::with_n_nodes(3);
        b.set_split(0, 0, threshold, true, 1, 2);
        b.set_leaf(1, left);
        b.set_leaf(2, right);
        b.build().unwrap()
    }

    #[test]
    fn sum_aggregation_adds_base_score() {
        let mut forest = Forest::new(Aggregation::Sum).with_base_score(0.5);
        forest.push_tree(stump(1.0, 1.0, 2.0));
        forest.push_tree(stump(2.0, 10.0, 20.0));

        assert_abs_diff_eq!(forest.predict_row(&[0.0]), 11.5);
        assert_abs_diff_eq!(forest.predict_row(&[1.5]), 12.5);
        assert_abs_diff_eq!(forest.predict_row(&[3.0]), 22.5);
    }

    #[test]
    fn mean_aggregation_averages_trees() {
        let mut forest = Forest::new(Aggregation::Mean);
        forest.push_tree(stump(1.0, 1.0, 2.0));
        forest.push_tree(stump(1.0, 3.0, 4.0));

        assert_abs_diff_eq!(forest.predict_row(&[0.0]), 2.0);
        assert_abs_diff_eq!(forest.predict_row(&[5.0]), 3.0);
    }

    #[test]
    fn split_rule_applies_to_every_tree() {
        let mut forest = Forest::new(Aggregation::Mean).with_split_rule(SplitRule::LessOrEqual);
        forest.push_tree(stump(1.0, 1.0, 2.0));
        forest.push_tree(stump(1.0, 3.0, 4.0));
        assert_eq!(forest.split_rule(), SplitRule::LessOrEqual);
        assert_abs_diff_eq!(forest.predict_row(&[1.0]), 2.0);

        let forest = forest.with_split_rule(SplitRule::LessThan);
        assert_abs_diff_eq!(forest.predict_row(&[1.0]), 3.0);
    }

    #[test]
    fn empty_forest_is_invalid() {
        let forest = Forest::new(Aggregation::Mean);
        assert_eq!(forest.validate(), Err(ForestValidationError::Empty));
        assert_eq!(forest.predict_row(&[1.0]), 0.0);
    }

    #[test]
    fn validate_reports_tree_index() {
        let mut forest = Forest::new(Aggregation::Sum);
        forest.push_tree(stump(1.0, 1.0, 2.0));
        forest.push_tree(stump(1.0, 1.0, 2.0));
        assert!(forest.validate().is_ok());
        assert!(forest.validate_features(1).is_ok());
        assert!(matches!(
            forest.validate_features(0),
            Err(ForestValidationError::InvalidTree { tree_idx: 0, .. })
        ));
    }

    #[test]
    fn non_finite_base_score_is_invalid() {
        let mut forest = Forest::new(Aggregation::Sum).with_base_score(f64::NAN);
        forest.push_tree(Tree::leaf(1.0));
        assert_eq!(forest.validate(), Err(ForestValidationError::NonFiniteBaseScore));
    }
}
