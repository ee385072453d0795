//! Tree compaction
//!
//! [`Tree::optimize`] rebuilds the arena in post order from the root: each
//! node is emitted after both of its children, nodes unreachable from the
//! root are dropped, and the root ends up as the last node. The result is
//! the layout required by [`evaluate_flat`](crate::evaluate_flat).

use crate::tree::{Node, NodeKind, Tree};

impl Tree {
    /// Compact the tree in place. Any node index held before this call is
    /// invalidated.
    pub fn optimize(&mut self) {
        *self = self.optimized();
    }

    /// Return a compacted copy of the tree, leaving `self` untouched.
    pub fn optimized(&self) -> Tree {
        let Some(root) = self.root else {
            return Tree::new();
        };

        let mut nodes: Vec<Node> = Vec::with_capacity(self.nodes.len());
        let mut mapping: Vec<Option<usize>> = vec![None; self.nodes.len()];
        let mut open = vec![false; self.nodes.len()];
        let mut stack = vec![(root, false)];

        while let Some((index, expanded)) = stack.pop() {
            if mapping[index].is_some() {
                continue;
            }
            let node = &self.nodes[index];

            let kind = match &node.kind {
                NodeKind::Primitive(primitive) => NodeKind::Primitive(*primitive),
                NodeKind::Operation {
                    operation,
                    children: [x, y],
                } => {
                    if !expanded {
                        assert!(!open[index], "node {index} is its own ancestor");
                        open[index] = true;
                        stack.push((index, true));
                        stack.push((*y, false));
                        stack.push((*x, false));
                        continue;
                    }
                    let (Some(new_x), Some(new_y)) = (mapping[*x], mapping[*y]) else {
                        unreachable!("children of node {index} were not emitted");
                    };
                    NodeKind::Operation {
                        operation: *operation,
                        children: [new_x, new_y],
                    }
                }
            };

            mapping[index] = Some(nodes.len());
            nodes.push(Node {
                name: node.name.clone(),
                kind,
            });
        }

        let dropped = self.nodes.len() - nodes.len();
        if dropped > 0 {
            tracing::trace!(dropped, "removed nodes unreachable from the root");
        }

        let root = nodes.len() - 1;
        Tree {
            nodes,
            root: Some(root),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::tree::{Operation, Primitive, Tree};
    use approx::assert_relative_eq;
    use glam::Vec3;

    /// Parse-order tree: the root sits at index 0 with children after it,
    /// plus one node nothing refers to.
    fn parse_order_tree() -> Tree {
        let mut tree = Tree::new();
        let a = tree.add_primitive(Primitive::sphere(Vec3::ZERO, 1.0));
        tree.root = Some(a);
        let b = tree.add_primitive(Primitive::sphere(Vec3::X, 1.0));
        tree.add_primitive(Primitive::cube(Vec3::splat(5.0), 1.0));
        let c = tree.add_primitive(Primitive::cube(Vec3::Y, 0.5));
        tree.splice(a, Operation::new(1.0, 0.25), b);
        tree.splice(a, Operation::new(-0.5, 0.0), c);
        tree
    }

    fn assert_dependency_order(tree: &Tree) {
        assert_eq!(tree.root, Some(tree.len() - 1));
        for (i, node) in tree.nodes.iter().enumerate() {
            if let Some([x, y]) = node.children() {
                assert!(x < i && y < i, "node {i} has children {x}, {y}");
            }
        }
    }

    #[test]
    fn orders_children_before_parents() {
        let optimized = parse_order_tree().optimized();
        assert_dependency_order(&optimized);
        assert!(optimized.is_optimized());
    }

    #[test]
    fn drops_unreachable_nodes() {
        let tree = parse_order_tree();
        assert_eq!(tree.len(), 6);
        let optimized = tree.optimized();
        assert_eq!(optimized.len(), 5);

        let dead = crate::NodeKind::Primitive(Primitive::cube(Vec3::splat(5.0), 1.0));
        assert!(optimized.nodes.iter().all(|n| n.kind != dead));
    }

    #[test]
    fn preserves_distances() {
        let tree = parse_order_tree();
        let optimized = tree.optimized();
        for i in -5..=5 {
            let p = Vec3::new(i as f32 * 0.4, 0.3, -0.2);
            assert_relative_eq!(tree.evaluate(p), optimized.evaluate(p), epsilon = 1e-6);
            assert_relative_eq!(optimized.evaluate(p), optimized.evaluate_flat(p), epsilon = 1e-6);
        }
    }

    #[test]
    fn is_idempotent() {
        let once = parse_order_tree().optimized();
        let twice = once.optimized();
        assert_eq!(once, twice);
    }

    #[test]
    fn keeps_names() {
        let mut tree = parse_order_tree();
        tree.nodes[0].name = Some("a".into());
        tree.optimize();
        assert_eq!(tree.root_node().and_then(|n| n.name.as_deref()), Some("a"));
    }

    #[test]
    fn shared_children_are_emitted_once() {
        let mut tree = Tree::new();
        let a = tree.add_primitive(Primitive::sphere(Vec3::ZERO, 1.0));
        let u = tree.add_operation(Operation::union(), [a, a]);
        let root = tree.add_operation(Operation::union(), [u, a]);
        tree.root = Some(root);

        let optimized = tree.optimized();
        assert_eq!(optimized.len(), 3);
        assert_dependency_order(&optimized);
    }

    #[test]
    fn empty_tree_stays_empty() {
        assert_eq!(Tree::new().optimized(), Tree::new());
    }

    #[test]
    fn long_chains_do_not_recurse() {
        let mut tree = Tree::new();
        let root = tree.add_primitive(Primitive::sphere(Vec3::ZERO, 1.0));
        tree.root = Some(root);
        for i in 0..50_000 {
            let operand = tree.add_primitive(Primitive::sphere(Vec3::new(i as f32, 0.0, 0.0), 0.5));
            tree.splice(root, Operation::union(), operand);
        }
        let optimized = tree.optimized();
        assert_eq!(optimized.len(), tree.len());
        assert!(optimized.is_optimized());
    }
}
