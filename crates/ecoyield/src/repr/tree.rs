//! Canonical regression tree (SoA) and read-only tree interface.
//!
//! This module provides:
//! - [`Tree`]: Immutable SoA tree storage for traversal
//! - [`TreeView`]: Read-only trait for tree access
//! - [`TreeBuilder`]: Node-by-node construction for fixtures and converters
//! - [`SplitRule`]: Which side of a split a value equal to the threshold takes
//! - [`TreeValidationError`]: Structural validation errors
//!
//! Inputs are `f32` rows, the precision float32-trained ensembles see at
//! prediction time. Thresholds and leaf values are kept as `f64` so exported
//! models predict exactly what they predicted in the trainer.

use super::NodeId;

// ============================================================================
// SplitRule
// ============================================================================

/// Comparison used at every split node of an ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitRule {
    /// `value < threshold` goes left (histogram GBDT exports).
    #[default]
    LessThan,
    /// `value <= threshold` goes left (scikit-learn CART exports).
    LessOrEqual,
}

impl SplitRule {
    #[inline]
    pub fn goes_left(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::LessThan => value < threshold,
            Self::LessOrEqual => value <= threshold,
        }
    }
}

// ============================================================================
// TreeView Trait
// ============================================================================

/// Read-only view of a tree for traversal.
///
/// Provides the minimal interface needed to walk from root to leaf. Splits are
/// numeric and compare under a [`SplitRule`]; NaN values follow the node's
/// default direction.
pub trait TreeView {
    /// Number of nodes in the tree.
    fn n_nodes(&self) -> usize;

    /// Check if a node is a leaf.
    fn is_leaf(&self, node: NodeId) -> bool;

    /// Get the feature index for a split node.
    fn split_index(&self, node: NodeId) -> u32;

    /// Get the split threshold.
    fn split_threshold(&self, node: NodeId) -> f64;

    /// Get the left child node index.
    fn left_child(&self, node: NodeId) -> NodeId;

    /// Get the right child node index.
    fn right_child(&self, node: NodeId) -> NodeId;

    /// Get the default direction for missing values.
    fn default_left(&self, node: NodeId) -> bool;

    /// Get the leaf value at a leaf node.
    fn leaf_value(&self, node: NodeId) -> f64;

    /// Traverse the tree to find the leaf node for a sample.
    ///
    /// Features missing from `sample` are treated as NaN.
    #[inline]
    fn traverse_to_leaf(&self, sample: &[f32], rule: SplitRule) -> NodeId {
        let mut node: NodeId = 0;

        while !self.is_leaf(node) {
            let feat_idx = self.split_index(node) as usize;
            let fvalue = sample.get(feat_idx).copied().unwrap_or(f32::NAN);

            node = if fvalue.is_nan() {
                if self.default_left(node) {
                    self.left_child(node)
                } else {
                    self.right_child(node)
                }
            } else if rule.goes_left(f64::from(fvalue), self.split_threshold(node)) {
                self.left_child(node)
            } else {
                self.right_child(node)
            };
        }

        node
    }
}

// ============================================================================
// TreeValidationError
// ============================================================================

/// Structural validation errors for [`Tree`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeValidationError {
    /// Tree has no nodes.
    #[error("tree has no nodes")]
    EmptyTree,
    /// Per-node arrays disagree on the node count.
    #[error("array '{field}' has length {len}, expected {n_nodes}")]
    LengthMismatch {
        field: &'static str,
        len: usize,
        n_nodes: usize,
    },
    /// A child pointer references an out-of-bounds node.
    #[error("node {node}: {side} child {child} out of bounds ({n_nodes} nodes)")]
    ChildOutOfBounds {
        node: NodeId,
        side: &'static str,
        child: NodeId,
        n_nodes: usize,
    },
    /// A node references itself as a child.
    #[error("node {node} references itself")]
    SelfLoop { node: NodeId },
    /// A node was reached by more than one path.
    #[error("node {node} reached by more than one path")]
    DuplicateVisit { node: NodeId },
    /// A cycle was detected during traversal.
    #[error("cycle detected at node {node}")]
    CycleDetected { node: NodeId },
    /// A node exists in storage but is unreachable from the root.
    #[error("node {node} unreachable from root")]
    UnreachableNode { node: NodeId },
    /// A split uses a feature the model does not have.
    #[error("node {node} splits on feature {feature}, model has {n_features}")]
    FeatureOutOfRange {
        node: NodeId,
        feature: u32,
        n_features: usize,
    },
    /// A leaf value or threshold is NaN or infinite.
    #[error("node {node} has a non-finite {field}")]
    NonFinite { node: NodeId, field: &'static str },
}

// ============================================================================
// Tree
// ============================================================================

/// Structure-of-Arrays tree storage.
///
/// Child indices are local to this tree (0 = root).
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    split_indices: Box<[u32]>,
    split_thresholds: Box<[f64]>,
    left_children: Box<[u32]>,
    right_children: Box<[u32]>,
    default_left: Box<[bool]>,
    is_leaf: Box<[bool]>,
    leaf_values: Box<[f64]>,
}

impl Tree {
    /// Create a tree from parallel arrays.
    ///
    /// Arrays are checked for equal length; call [`validate`](Self::validate)
    /// for the full structural check.
    pub fn new(
        split_indices: Vec<u32>,
        split_thresholds: Vec<f64>,
        left_children: Vec<u32>,
        right_children: Vec<u32>,
        default_left: Vec<bool>,
        is_leaf: Vec<bool>,
        leaf_values: Vec<f64>,
    ) -> Result<Self, TreeValidationError> {
        let n_nodes = split_indices.len();
        for (field, len) in [
            ("split_thresholds", split_thresholds.len()),
            ("left_children", left_children.len()),
            ("right_children", right_children.len()),
            ("default_left", default_left.len()),
            ("is_leaf", is_leaf.len()),
            ("leaf_values", leaf_values.len()),
        ] {
            if len != n_nodes {
                return Err(TreeValidationError::LengthMismatch { field, len, n_nodes });
            }
        }

        Ok(Self {
            split_indices: split_indices.into_boxed_slice(),
            split_thresholds: split_thresholds.into_boxed_slice(),
            left_children: left_children.into_boxed_slice(),
            right_children: right_children.into_boxed_slice(),
            default_left: default_left.into_boxed_slice(),
            is_leaf: is_leaf.into_boxed_slice(),
            leaf_values: leaf_values.into_boxed_slice(),
        })
    }

    /// A single-leaf tree that always predicts `value`.
    pub fn leaf(value: f64) -> Self {
        Self {
            split_indices: Box::new([0]),
            split_thresholds: Box::new([0.0]),
            left_children: Box::new([0]),
            right_children: Box::new([0]),
            default_left: Box::new([true]),
            is_leaf: Box::new([true]),
            leaf_values: Box::new([value]),
        }
    }

    // =========================================================================
    // Raw array access (for persistence)
    // =========================================================================

    pub fn split_indices(&self) -> &[u32] {
        &self.split_indices
    }

    pub fn split_thresholds(&self) -> &[f64] {
        &self.split_thresholds
    }

    pub fn left_children(&self) -> &[u32] {
        &self.left_children
    }

    pub fn right_children(&self) -> &[u32] {
        &self.right_children
    }

    pub fn default_left_flags(&self) -> &[bool] {
        &self.default_left
    }

    pub fn leaf_values(&self) -> &[f64] {
        &self.leaf_values
    }

    /// Highest feature index used by any split, if the tree has splits.
    pub fn max_split_index(&self) -> Option<u32> {
        (0..self.n_nodes() as NodeId)
            .filter(|&n| !self.is_leaf(n))
            .map(|n| self.split_index(n))
            .max()
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Validate structural invariants for this tree.
    ///
    /// Every node must be reachable from the root by exactly one path, children
    /// must be in bounds, and thresholds/leaf values must be finite.
    pub fn validate(&self) -> Result<(), TreeValidationError> {
        let n_nodes = self.n_nodes();
        if n_nodes == 0 {
            return Err(TreeValidationError::EmptyTree);
        }

        // Iterative DFS with color marking.
        // 0 = unvisited, 1 = visiting, 2 = done
        let mut color = vec![0u8; n_nodes];
        let mut stack: Vec<(NodeId, u8)> = vec![(0, 0)];

        while let Some((node, phase)) = stack.pop() {
            let node_usize = node as usize;

            match phase {
                0 => {
                    match color[node_usize] {
                        0 => {}
                        1 => return Err(TreeValidationError::CycleDetected { node }),
                        _ => return Err(TreeValidationError::DuplicateVisit { node }),
                    }

                    color[node_usize] = 1;
                    stack.push((node, 1));

                    if self.is_leaf(node) {
                        if !self.leaf_value(node).is_finite() {
                            return Err(TreeValidationError::NonFinite {
                                node,
                                field: "leaf value",
                            });
                        }
                        continue;
                    }

                    if !self.split_threshold(node).is_finite() {
                        return Err(TreeValidationError::NonFinite {
                            node,
                            field: "threshold",
                        });
                    }

                    let left = self.left_child(node);
                    let right = self.right_child(node);

                    if left == node || right == node {
                        return Err(TreeValidationError::SelfLoop { node });
                    }
                    for (side, child) in [("left", left), ("right", right)] {
                        if child as usize >= n_nodes {
                            return Err(TreeValidationError::ChildOutOfBounds {
                                node,
                                side,
                                child,
                                n_nodes,
                            });
                        }
                    }

                    stack.push((right, 0));
                    stack.push((left, 0));
                }
                _ => {
                    color[node_usize] = 2;
                }
            }
        }

        if let Some(i) = color.iter().position(|&c| c == 0) {
            return Err(TreeValidationError::UnreachableNode { node: i as NodeId });
        }

        Ok(())
    }

    /// Check that every split refers to one of the first `n_features` features.
    pub fn validate_features(&self, n_features: usize) -> Result<(), TreeValidationError> {
        for node in 0..self.n_nodes() as NodeId {
            if self.is_leaf(node) {
                continue;
            }
            let feature = self.split_index(node);
            if feature as usize >= n_features {
                return Err(TreeValidationError::FeatureOutOfRange {
                    node,
                    feature,
                    n_features,
                });
            }
        }
        Ok(())
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    /// Leaf value reached by `features`.
    #[inline]
    pub fn predict_row(&self, features: &[f32], rule: SplitRule) -> f64 {
        let leaf_id = self.traverse_to_leaf(features, rule);
        self.leaf_value(leaf_id)
    }
}

impl TreeView for Tree {
    #[inline]
    fn n_nodes(&self) -> usize {
        self.split_indices.len()
    }

    #[inline]
    fn is_leaf(&self, node: NodeId) -> bool {
        self.is_leaf[node as usize]
    }

    #[inline]
    fn split_index(&self, node: NodeId) -> u32 {
        self.split_indices[node as usize]
    }

    #[inline]
    fn split_threshold(&self, node: NodeId) -> f64 {
        self.split_thresholds[node as usize]
    }

    #[inline]
    fn left_child(&self, node: NodeId) -> NodeId {
        self.left_children[node as usize]
    }

    #[inline]
    fn right_child(&self, node: NodeId) -> NodeId {
        self.right_children[node as usize]
    }

    #[inline]
    fn default_left(&self, node: NodeId) -> bool {
        self.default_left[node as usize]
    }

    #[inline]
    fn leaf_value(&self, node: NodeId) -> f64 {
        self.leaf_values[node as usize]
    }
}

// ============================================================================
// TreeBuilder
// ============================================================================

/// Node-by-node tree construction.
///
/// Nodes start out as zero-valued leaves; set splits and leaf values, then
/// [`build`](Self::build) validates the result.
///
/// ```
/// use ecoyield::repr::{SplitRule, TreeBuilder};
///
/// let mut b = TreeBuilder::with_n_nodes(3);
/// b.set_split(0, 6, 150.0, true, 1, 2);
/// b.set_leaf(1, 2.5);
/// b.set_leaf(2, 6.0);
/// let tree = b.build().unwrap();
/// let row = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 200.0, 0.0];
/// assert_eq!(tree.predict_row(&row, SplitRule::LessThan), 6.0);
/// ```
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    split_indices: Vec<u32>,
    split_thresholds: Vec<f64>,
    left_children: Vec<u32>,
    right_children: Vec<u32>,
    default_left: Vec<bool>,
    is_leaf: Vec<bool>,
    leaf_values: Vec<f64>,
}

impl TreeBuilder {
    /// Start a tree with `n_nodes` leaf nodes.
    pub fn with_n_nodes(n_nodes: usize) -> Self {
        Self {
            split_indices: vec![0; n_nodes],
            split_thresholds: vec![0.0; n_nodes],
            left_children: vec![0; n_nodes],
            right_children: vec![0; n_nodes],
            default_left: vec![true; n_nodes],
            is_leaf: vec![true; n_nodes],
            leaf_values: vec![0.0; n_nodes],
        }
    }

    /// Turn `node` into a numeric split.
    pub fn set_split(
        &mut self,
        node: NodeId,
        feature: u32,
        threshold: f64,
        default_left: bool,
        left: NodeId,
        right: NodeId,
    ) -> &mut Self {
        let i = node as usize;
        self.split_indices[i] = feature;
        self.split_thresholds[i] = threshold;
        self.default_left[i] = default_left;
        self.left_children[i] = left;
        self.right_children[i] = right;
        self.is_leaf[i] = false;
        self
    }

    /// Turn `node` into a leaf with `value`.
    pub fn set_leaf(&mut self, node: NodeId, value: f64) -> &mut Self {
        let i = node as usize;
        self.is_leaf[i] = true;
        self.leaf_values[i] = value;
        self.left_children[i] = 0;
        self.right_children[i] = 0;
        self
    }

    /// Freeze into a validated [`Tree`].
    pub fn build(self) -> Result<Tree, TreeValidationError> {
        let tree = Tree::new(
            self.split_indices,
            self.split_thresholds,
            self.left_children,
            self.right_children,
            self.default_left,
            self.is_leaf,
            self.leaf_values,
        )?;
        tree.validate()?;
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> Tree {
        let mut b = TreeBuilder::with_n_nodes(3);
        b.set_split(0, 0, 0.5, false, 1, 2);
        b.set_leaf(1, 1.0);
        b.set_leaf(2, 2.0);
        b.build().unwrap()
    }

    const LT: SplitRule = SplitRule::LessThan;
    const LE: SplitRule = SplitRule::LessOrEqual;

    #[test]
    fn split_goes_left_below_threshold() {
        let tree = stump();
        assert_eq!(tree.predict_row(&[0.4], LT), 1.0);
        assert_eq!(tree.predict_row(&[0.5], LT), 2.0);
        assert_eq!(tree.predict_row(&[0.9], LT), 2.0);
    }

    #[test]
    fn value_on_threshold_follows_rule() {
        let mut b = TreeBuilder::with_n_nodes(3);
        b.set_split(0, 0, 80.5, false, 1, 2);
        b.set_leaf(1, 1.0);
        b.set_leaf(2, 2.0);
        let tree = b.build().unwrap();

        assert_eq!(tree.predict_row(&[80.5], LE), 1.0);
        assert_eq!(tree.predict_row(&[80.5], LT), 2.0);
        assert_eq!(tree.predict_row(&[80.4], LE), 1.0);
        assert_eq!(tree.predict_row(&[80.6], LE), 2.0);
    }

    #[test]
    fn thresholds_compare_in_double_precision() {
        // Midpoint between two adjacent f32 values: not representable in f32.
        let lo = 0.1f32;
        let hi = f32::from_bits(lo.to_bits() + 1);
        let mid = (f64::from(lo) + f64::from(hi)) / 2.0;

        let mut b = TreeBuilder::with_n_nodes(3);
        b.set_split(0, 0, mid, false, 1, 2);
        b.set_leaf(1, 0.123_456_789_012_345);
        b.set_leaf(2, 2.0);
        let tree = b.build().unwrap();

        assert_eq!(tree.predict_row(&[lo], LE), 0.123_456_789_012_345);
        assert_eq!(tree.predict_row(&[hi], LE), 2.0);
    }

    #[test]
    fn nan_follows_default_direction() {
        let tree = stump();
        assert_eq!(tree.predict_row(&[f32::NAN], LE), 2.0);
        // Missing feature is NaN too.
        assert_eq!(tree.predict_row(&[], LT), 2.0);
    }

    #[test]
    fn single_leaf() {
        let tree = Tree::leaf(3.5);
        assert!(tree.validate().is_ok());
        assert_eq!(tree.predict_row(&[1.0, 2.0], LT), 3.5);
        assert_eq!(tree.max_split_index(), None);
    }

    #[test]
    fn length_mismatch_rejected() {
        let err = Tree::new(
            vec![0, 0],
            vec![0.0],
            vec![0, 0],
            vec![0, 0],
            vec![true, true],
            vec![true, true],
            vec![0.0, 0.0],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TreeValidationError::LengthMismatch {
                field: "split_thresholds",
                ..
            }
        ));
    }

    #[test]
    fn validate_detects_self_loop() {
        let mut b = TreeBuilder::with_n_nodes(3);
        b.set_split(0, 0, 0.5, true, 0, 2);
        assert_eq!(b.build().unwrap_err(), TreeValidationError::SelfLoop { node: 0 });
    }

    #[test]
    fn validate_detects_out_of_bounds_child() {
        let mut b = TreeBuilder::with_n_nodes(3);
        b.set_split(0, 0, 0.5, true, 1, 7);
        assert!(matches!(
            b.build().unwrap_err(),
            TreeValidationError::ChildOutOfBounds { side: "right", child: 7, .. }
        ));
    }

    #[test]
    fn validate_detects_shared_child() {
        let mut b = TreeBuilder::with_n_nodes(3);
        b.set_split(0, 0, 0.5, true, 1, 1);
        assert!(matches!(
            b.build().unwrap_err(),
            TreeValidationError::DuplicateVisit { node: 1 }
        ));
    }

    #[test]
    fn validate_detects_unreachable_node() {
        let mut b = TreeBuilder::with_n_nodes(4);
        b.set_split(0, 0, 0.5, true, 1, 2);
        assert_eq!(
            b.build().unwrap_err(),
            TreeValidationError::UnreachableNode { node: 3 }
        );
    }

    #[test]
    fn validate_detects_non_finite_leaf() {
        let mut b = TreeBuilder::with_n_nodes(1);
        b.set_leaf(0, f64::INFINITY);
        assert!(matches!(
            b.build().unwrap_err(),
            TreeValidationError::NonFinite { node: 0, .. }
        ));
    }

    #[test]
    fn validate_features_bounds_split_index() {
        let tree = stump();
        assert!(tree.validate_features(1).is_ok());

        let mut b = TreeBuilder::with_n_nodes(3);
        b.set_split(0, 9, 0.5, true, 1, 2);
        let tree = b.build().unwrap();
        assert_eq!(tree.max_split_index(), Some(9));
        assert!(matches!(
            tree.validate_features(8),
            Err(TreeValidationError::FeatureOutOfRange { feature: 9, .. })
        ));
    }
}
