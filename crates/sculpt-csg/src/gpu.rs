//! GPU-facing node layout
//!
//! [`GpuNode`] is the 32-byte per-node record a renderer uploads into a
//! storage buffer. Leaves and operations share the parameter block: for an
//! operation `params[0]` is the blend and `params[1]` the softness.

use bytemuck::{Pod, Zeroable};

use crate::tree::{NUM_PARAMS, Node, NodeKind, PrimitiveKind, Tree};

/// Plain-old-data mirror of one [`Node`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuNode {
    /// `[-1, -1]` for leaves
    pub children: [i32; 2],
    pub params: [f32; NUM_PARAMS],
    pub kind: u32,
}

impl GpuNode {
    pub const KIND_SPHERE: u32 = 0;
    pub const KIND_BOX: u32 = 1;
    /// Stored on operation nodes
    pub const KIND_NONE: u32 = 2;

    pub const LEAF_CHILDREN: [i32; 2] = [-1, -1];

    pub fn is_leaf(&self) -> bool {
        self.children == Self::LEAF_CHILDREN
    }

    pub fn blend(&self) -> f32 {
        self.params[0]
    }

    pub fn softness(&self) -> f32 {
        self.params[1]
    }
}

impl From<&Node> for GpuNode {
    fn from(node: &Node) -> Self {
        match &node.kind {
            NodeKind::Primitive(primitive) => Self {
                children: Self::LEAF_CHILDREN,
                params: primitive.params,
                kind: match primitive.kind {
                    PrimitiveKind::Sphere => Self::KIND_SPHERE,
                    PrimitiveKind::Box => Self::KIND_BOX,
                },
            },
            NodeKind::Operation {
                operation,
                children,
            } => Self {
                children: [children[0] as i32, children[1] as i32],
                params: [operation.blend, operation.softness, 0.0, 0.0, 0.0],
                kind: Self::KIND_NONE,
            },
        }
    }
}

/// Flatten a tree into upload-ready records, one per node in tree order.
pub fn to_gpu_nodes(tree: &Tree) -> Vec<GpuNode> {
    tree.nodes.iter().map(GpuNode::from).collect()
}

/// View a node slice as raw bytes for a buffer upload.
pub fn as_bytes(nodes: &[GpuNode]) -> &[u8] {
    bytemuck::cast_slice(nodes)
}
