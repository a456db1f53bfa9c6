//! Canonical tree-ensemble representations used for yield regression.

/// Canonical node identifier.
///
/// Internally this is just an index into the tree's SoA arrays.
pub type NodeId = u32;

pub mod forest;
pub mod tree;

pub use forest::{Aggregation, Forest, ForestValidationError};
pub use tree::{SplitRule, Tree, TreeBuilder, TreeValidationError, TreeView};
