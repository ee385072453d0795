//! Error types for tree validation

use thiserror::Error;

/// Result type alias using the tree engine's error type
pub type Result<T> = std::result::Result<T, TreeError>;

/// Structural problems found by [`Tree::validate`](crate::Tree::validate)
/// or by consumers that require an optimized tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The tree has nodes but no root
    #[error("Tree has {len} nodes but no root")]
    MissingRoot { len: usize },

    /// The root points past the end of the node array
    #[error("Root index {root} is out of range for {len} nodes")]
    RootOutOfRange { root: usize, len: usize },

    /// An operation references a node that does not exist
    #[error("Node {node} references child {child}, but the tree has {len} nodes")]
    ChildOutOfRange { node: usize, child: usize, len: usize },

    /// A node is reachable from itself
    #[error("Node {node} is its own ancestor")]
    Cycle { node: usize },

    /// The operation needs the dependency-ordered layout produced by `optimize`
    #[error("Tree is not in dependency order; call optimize() first")]
    NotOptimized,
}
