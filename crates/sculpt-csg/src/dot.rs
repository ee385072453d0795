//! Graphviz export for inspecting a tree
//!
//! Render the output with `dot -Tpng tree.dot > tree.png`.

// String writing is infallible, so .unwrap() is safe here
#![allow(clippy::unwrap_used)]

use std::fmt::Write;

use crate::tree::{NodeKind, Tree};

/// Describe `tree` as an undirected Graphviz graph.
///
/// Leaves are labelled with their kind and the four shape parameters,
/// operations with their name, blend and softness. The root is drawn with
/// a heavier outline.
pub fn to_dot(tree: &Tree) -> String {
    let mut out = String::new();
    writeln!(out, "graph csg {{").unwrap();
    writeln!(out, "    forcelabels=true").unwrap();
    writeln!(out, "    node [style=filled fillcolor=\"0.0 0.0 0.8\" fontcolor=white]").unwrap();

    for (i, node) in tree.nodes.iter().enumerate() {
        let name = node.name.as_deref().map(escape).unwrap_or_default();
        let outline = if tree.root == Some(i) { " penwidth=3" } else { "" };

        match &node.kind {
            NodeKind::Primitive(primitive) => {
                let [x, y, z, size, _] = primitive.params;
                writeln!(
                    out,
                    "    {} [label=\"{}\\n{:.1} {:.1} {:.1} {:.1}\"{}]",
                    i,
                    primitive.kind.keyword(),
                    x,
                    y,
                    z,
                    size,
                    outline
                )
                .unwrap();
            }
            NodeKind::Operation {
                operation,
                children: [a, b],
            } => {
                writeln!(
                    out,
                    "    {} [label=\"{}\\n{:.1} {:.1}\"{}]",
                    i, name, operation.blend, operation.softness, outline
                )
                .unwrap();
                writeln!(out, "    {} -- {}", i, a).unwrap();
                writeln!(out, "    {} -- {}", i, b).unwrap();
            }
        }
    }

    writeln!(out, "}}").unwrap();
    out
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
