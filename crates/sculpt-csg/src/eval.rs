//! Signed distance evaluation
//!
//! Two evaluators produce the same numbers:
//!
//! - [`Tree::evaluate`] walks the tree recursively from the root and works
//!   on any well-formed tree.
//! - [`evaluate_flat`] makes one forward pass over a dependency-ordered node
//!   slice, storing every node's value in a scratch buffer. This is the form
//!   meant for raymarching loops and for porting to shaders.

use glam::Vec3;
use sculpt_math::{lerp, smooth_max, smooth_min};

use crate::tree::{Node, NodeKind, Operation, Tree};

/// Distance reported for an empty tree.
pub const EMPTY_DISTANCE: f32 = f32::MAX;

/// Blend the first child's distance `f` with the second child's `g`.
///
/// - `blend >= 0`: `lerp(f, smooth_min(f, g, softness), blend)`
/// - `blend < 0`: `lerp(f, smooth_max(f, -g, softness), -blend)`
///
/// A zero blend returns `f` unchanged.
#[inline]
pub fn combine(f: f32, g: f32, operation: &Operation) -> f32 {
    if operation.blend >= 0.0 {
        lerp(f, smooth_min(f, g, operation.softness), operation.blend)
    } else {
        lerp(f, smooth_max(f, -g, operation.softness), -operation.blend)
    }
}

impl Tree {
    /// Recursive evaluation from the root.
    ///
    /// Stack use grows with tree depth, and a long run of edits to one name
    /// builds a very deep tree. Front ends should optimize and use a
    /// [`FlatEvaluator`] instead.
    pub fn evaluate(&self, p: Vec3) -> f32 {
        match self.root {
            Some(root) => self.evaluate_node(root, p),
            None => EMPTY_DISTANCE,
        }
    }

    fn evaluate_node(&self, index: usize, p: Vec3) -> f32 {
        match &self.nodes[index].kind {
            NodeKind::Primitive(primitive) => primitive.distance(p),
            NodeKind::Operation {
                operation,
                children: [x, y],
            } => {
                let f = self.evaluate_node(*x, p);
                let g = self.evaluate_node(*y, p);
                combine(f, g, operation)
            }
        }
    }

    /// Flat evaluation with a temporary scratch buffer.
    ///
    /// The tree must be optimized. Use a [`FlatEvaluator`] when sampling
    /// many points to avoid reallocating the buffer.
    pub fn evaluate_flat(&self, p: Vec3) -> f32 {
        debug_assert!(self.is_optimized(), "flat evaluation needs an optimized tree");
        let mut values = vec![0.0; self.nodes.len()];
        evaluate_flat(&mut values, &self.nodes, p)
    }
}

/// Evaluate a dependency-ordered node slice in a single forward pass.
///
/// Every child index must be smaller than its parent's, and the last node
/// is the root. `values` must hold at least `nodes.len()` entries; pass
/// `&tree.nodes[..count]` to evaluate a prefix.
pub fn evaluate_flat(values: &mut [f32], nodes: &[Node], p: Vec3) -> f32 {
    assert!(
        values.len() >= nodes.len(),
        "scratch buffer holds {} values but {} nodes were given",
        values.len(),
        nodes.len()
    );

    for (i, node) in nodes.iter().enumerate() {
        values[i] = match &node.kind {
            NodeKind::Primitive(primitive) => primitive.distance(p),
            NodeKind::Operation {
                operation,
                children: [x, y],
            } => combine(values[*x], values[*y], operation),
        };
    }

    match nodes.len() {
        0 => EMPTY_DISTANCE,
        n => values[n - 1],
    }
}

/// Reusable scratch space for [`evaluate_flat`].
#[derive(Debug, Clone, Default)]
pub struct FlatEvaluator {
    values: Vec<f32>,
}

impl FlatEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size the buffer for trees of up to `nodes` nodes.
    pub fn with_capacity(nodes: usize) -> Self {
        Self {
            values: vec![0.0; nodes],
        }
    }

    /// Distance from `p` to an optimized `tree`.
    pub fn distance(&mut self, tree: &Tree, p: Vec3) -> f32 {
        debug_assert!(tree.is_optimized(), "flat evaluation needs an optimized tree");
        if self.values.len() < tree.nodes.len() {
            self.values.resize(tree.nodes.len(), 0.0);
        }
        evaluate_flat(&mut self.values, &tree.nodes, p)
    }

    /// Per-node values left by the last call, indexed like the tree.
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}
