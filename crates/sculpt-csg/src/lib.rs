//! Sculpt CSG - constructive solid geometry over signed distance fields
//!
//! A [`Tree`] is a flat arena of nodes. Leaves are [`Primitive`] shapes,
//! interior nodes blend two children with an [`Operation`] (smooth union or
//! smooth subtraction at a chosen strength).
//!
//! ## Key Types
//!
//! - [`Tree`] - node arena with construction, evaluation and [`Tree::optimize`]
//! - [`FlatEvaluator`] - reusable scratch buffer for non-recursive evaluation
//! - [`GpuNode`] - `bytemuck` record for uploading a tree to the GPU
//! - [`WgslGenerator`] - unrolls an optimized tree into WGSL
//!
//! ## Example
//!
//! ```rust
//! use glam::Vec3;
//! use sculpt_csg::{FlatEvaluator, Operation, Primitive, Tree};
//!
//! let mut tree = Tree::new();
//! let outer = tree.add_primitive(Primitive::sphere(Vec3::ZERO, 2.0));
//! let inner = tree.add_primitive(Primitive::sphere(Vec3::ZERO, 1.0));
//! tree.root = Some(tree.add_operation(Operation::subtract(), [outer, inner]));
//! tree.optimize();
//!
//! let mut evaluator = FlatEvaluator::new();
//! assert_eq!(evaluator.distance(&tree, Vec3::ZERO), tree.evaluate(Vec3::ZERO));
//! ```

mod dot;
mod error;
mod eval;
mod gpu;
mod optimize;
mod tree;
mod wgsl_gen;

pub use dot::to_dot;
pub use error::{Result, TreeError};
pub use eval::{EMPTY_DISTANCE, FlatEvaluator, combine, evaluate_flat};
pub use gpu::{GpuNode, as_bytes, to_gpu_nodes};
pub use tree::{NUM_PARAMS, Node, NodeKind, Operation, Primitive, PrimitiveKind, Tree};
pub use wgsl_gen::{WgslGenerator, build_shader};

pub use sculpt_math::{lerp, smooth_max, smooth_min};
