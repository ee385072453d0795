//! CSG tree data model
//!
//! A [`Tree`] is an arena of [`Node`]s addressed by index. Leaves carry a
//! [`Primitive`], interior nodes carry an [`Operation`] plus the indices of
//! their two children. Construction only ever appends, so an index handed
//! out by [`Tree::add_primitive`] or [`Tree::add_operation`] stays valid
//! until [`Tree::optimize`] rebuilds the arena.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TreeError};

/// Number of parameter slots carried by every primitive.
pub const NUM_PARAMS: usize = 5;

/// Shape of a leaf node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    /// `params[0..3]` center, `params[3]` radius
    Sphere,
    /// `params[0..3]` center, `params[3]` half size of an axis-aligned cube
    Box,
}

impl PrimitiveKind {
    /// Keyword used for this kind in scripts and debug output.
    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveKind::Sphere => "sphere",
            PrimitiveKind::Box => "cube",
        }
    }

    /// Number of parameters a script supplies for this kind.
    pub fn param_count(self) -> usize {
        match self {
            PrimitiveKind::Sphere | PrimitiveKind::Box => 4,
        }
    }

    /// Look up a primitive kind by its script keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "sphere" => Some(PrimitiveKind::Sphere),
            "cube" => Some(PrimitiveKind::Box),
            _ => None,
        }
    }
}

/// A leaf shape: a kind tag plus a fixed block of parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    pub kind: PrimitiveKind,
    pub params: [f32; NUM_PARAMS],
}

impl Primitive {
    /// Build a primitive from the leading parameters; unused slots are zero.
    pub fn new(kind: PrimitiveKind, params: &[f32]) -> Self {
        let mut slots = [0.0; NUM_PARAMS];
        for (slot, value) in slots.iter_mut().zip(params) {
            *slot = *value;
        }
        Self {
            kind,
            params: slots,
        }
    }

    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Self::new(PrimitiveKind::Sphere, &[center.x, center.y, center.z, radius])
    }

    /// Axis-aligned cube, `half_size` from the center to each face.
    pub fn cube(center: Vec3, half_size: f32) -> Self {
        Self::new(PrimitiveKind::Box, &[center.x, center.y, center.z, half_size])
    }

    pub fn center(&self) -> Vec3 {
        Vec3::new(self.params[0], self.params[1], self.params[2])
    }

    /// Signed distance from `p` to this shape.
    #[inline]
    pub fn distance(&self, p: Vec3) -> f32 {
        match self.kind {
            PrimitiveKind::Sphere => sculpt_math::sd_sphere(p, self.center(), self.params[3]),
            PrimitiveKind::Box => {
                sculpt_math::sd_box(p, self.center(), Vec3::splat(self.params[3]))
            }
        }
    }
}

/// Blend between two child distances.
///
/// `blend >= 0` is a union at `blend` strength, `blend < 0` subtracts the
/// second child at `-blend` strength. `softness` is the smoothing radius,
/// zero meaning a hard boolean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub blend: f32,
    pub softness: f32,
}

impl Operation {
    pub fn new(blend: f32, softness: f32) -> Self {
        Self { blend, softness }
    }

    /// Full-strength hard union.
    pub fn union() -> Self {
        Self::new(1.0, 0.0)
    }

    /// Full-strength hard subtraction.
    pub fn subtract() -> Self {
        Self::new(-1.0, 0.0)
    }

    pub fn is_subtraction(&self) -> bool {
        self.blend < 0.0
    }

    /// Combine the distance `f` of the first child with `g` of the second.
    #[inline]
    pub fn combine(&self, f: f32, g: f32) -> f32 {
        crate::eval::combine(f, g, self)
    }
}

impl Default for Operation {
    fn default() -> Self {
        Self::union()
    }
}

/// Payload of a node: either a leaf shape or an operation over two children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Primitive(Primitive),
    Operation {
        operation: Operation,
        children: [usize; 2],
    },
}

/// One entry of the tree arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Display name, only used for diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub kind: NodeKind,
}

impl Node {
    pub fn primitive(primitive: Primitive) -> Self {
        Self {
            name: None,
            kind: NodeKind::Primitive(primitive),
        }
    }

    pub fn operation(operation: Operation, children: [usize; 2]) -> Self {
        Self {
            name: None,
            kind: NodeKind::Operation {
                operation,
                children,
            },
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Child indices of an interior node, `None` for leaves.
    pub fn children(&self) -> Option<[usize; 2]> {
        match self.kind {
            NodeKind::Primitive(_) => None,
            NodeKind::Operation { children, .. } => Some(children),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Primitive(_))
    }
}

/// An ordered node arena plus the index of the root node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
    /// `None` only while the tree is still empty
    pub root: Option<usize>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a leaf and return its index.
    pub fn add_primitive(&mut self, primitive: Primitive) -> usize {
        self.nodes.push(Node::primitive(primitive));
        self.nodes.len() - 1
    }

    /// Append an interior node and return its index.
    ///
    /// The children are not checked here; see [`Tree::validate`].
    pub fn add_operation(&mut self, operation: Operation, children: [usize; 2]) -> usize {
        self.nodes.push(Node::operation(operation, children));
        self.nodes.len() - 1
    }

    /// Turn the node at `parent` into `operation(old payload, operand)`
    /// without changing its index.
    ///
    /// The previous payload of `parent` (name included) moves to a freshly
    /// appended node which becomes the first child; `operand` becomes the
    /// second. Returns the index of the relocated payload.
    pub fn splice(&mut self, parent: usize, operation: Operation, operand: usize) -> usize {
        let relocated = self.nodes[parent].clone();
        let relocated_index = self.nodes.len();
        self.nodes.push(relocated);
        self.nodes[parent].kind = NodeKind::Operation {
            operation,
            children: [relocated_index, operand],
        };
        relocated_index
    }

    /// The root node, if any.
    pub fn root_node(&self) -> Option<&Node> {
        self.root.and_then(|root| self.nodes.get(root))
    }

    /// True when every child precedes its parent and the root is the last
    /// node, the layout [`evaluate_flat`](crate::evaluate_flat) relies on.
    pub fn is_optimized(&self) -> bool {
        match self.root {
            None => self.nodes.is_empty(),
            Some(root) => {
                root + 1 == self.nodes.len()
                    && self.nodes.iter().enumerate().all(|(i, node)| {
                        node.children().is_none_or(|[x, y]| x < i && y < i)
                    })
            }
        }
    }

    /// Check the structural invariants: a root that exists, children that
    /// exist, and no node that is its own ancestor.
    pub fn validate(&self) -> Result<()> {
        let len = self.nodes.len();
        match self.root {
            None if len > 0 => return Err(TreeError::MissingRoot { len }),
            Some(root) if root >= len => return Err(TreeError::RootOutOfRange { root, len }),
            _ => {}
        }

        for (node, entry) in self.nodes.iter().enumerate() {
            if let Some(children) = entry.children() {
                if let Some(&child) = children.iter().find(|&&c| c >= len) {
                    return Err(TreeError::ChildOutOfRange { node, child, len });
                }
            }
        }

        self.check_acyclic()
    }

    /// Iterative three-colour depth-first search over every node.
    fn check_acyclic(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Open,
            Done,
        }

        let mut marks = vec![Mark::New; self.nodes.len()];
        let mut stack = Vec::new();

        for start in 0..self.nodes.len() {
            if marks[start] != Mark::New {
                continue;
            }
            stack.push((start, false));
            while let Some((index, expanded)) = stack.pop() {
                if expanded {
                    marks[index] = Mark::Done;
                    continue;
                }
                match marks[index] {
                    Mark::Done => continue,
                    Mark::Open => return Err(TreeError::Cycle { node: index }),
                    Mark::New => {}
                }
                marks[index] = Mark::Open;
                stack.push((index, true));
                if let Some(children) = self.nodes[index].children() {
                    for child in children {
                        match marks[child] {
                            Mark::Open => return Err(TreeError::Cycle { node: child }),
                            Mark::New => stack.push((child, false)),
                            Mark::Done => {}
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
