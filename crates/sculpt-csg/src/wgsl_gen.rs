//! Tree to WGSL code generator
//!
//! Unrolls an optimized tree into a straight-line `scene_sdf` function, one
//! `let` per node, in the same order the flat evaluator visits them.

// String writing is infallible, so .unwrap() is safe here
#![allow(clippy::unwrap_used)]

use std::fmt::Write;

use crate::error::{Result, TreeError};
use crate::tree::{NodeKind, PrimitiveKind, Tree};

/// Generate WGSL code for an optimized tree
#[derive(Debug, Clone)]
pub struct WgslGenerator {
    function_name: String,
}

impl WgslGenerator {
    pub fn new() -> Self {
        Self {
            function_name: "scene_sdf".to_string(),
        }
    }

    /// Emit the function under a different name.
    pub fn with_function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = name.into();
        self
    }

    /// Generate the distance function. Fails unless the tree is optimized.
    pub fn generate(&self, tree: &Tree) -> Result<String> {
        if !tree.is_optimized() {
            return Err(TreeError::NotOptimized);
        }

        let mut code = String::new();
        writeln!(code, "fn {}(p: vec3<f32>) -> f32 {{", self.function_name).unwrap();

        for (i, node) in tree.nodes.iter().enumerate() {
            match &node.kind {
                NodeKind::Primitive(primitive) => {
                    let [x, y, z, size, _] = primitive.params;
                    let call = match primitive.kind {
                        PrimitiveKind::Sphere => format!(
                            "sd_sphere(p, vec3<f32>({:.6}, {:.6}, {:.6}), {:.6})",
                            x, y, z, size
                        ),
                        PrimitiveKind::Box => format!(
                            "sd_box(p, vec3<f32>({:.6}, {:.6}, {:.6}), vec3<f32>({:.6}))",
                            x, y, z, size
                        ),
                    };
                    writeln!(code, "    let d{} = {};", i, call).unwrap();
                }
                NodeKind::Operation {
                    operation,
                    children: [a, b],
                } => {
                    writeln!(
                        code,
                        "    let d{} = csg_combine(d{}, d{}, {:.6}, {:.6});",
                        i, a, b, operation.blend, operation.softness
                    )
                    .unwrap();
                }
            }
        }

        match tree.root {
            Some(root) => writeln!(code, "    return d{};", root).unwrap(),
            None => writeln!(code, "    return {:e};", f32::MAX).unwrap(),
        }
        writeln!(code, "}}").unwrap();

        Ok(code)
    }

    /// Formula library followed by the generated function.
    pub fn build_shader(&self, tree: &Tree) -> Result<String> {
        let body = self.generate(tree)?;
        Ok(format!("{}\n{}", sculpt_math::get_wgsl_code(), body))
    }
}

impl Default for WgslGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Formula library followed by the generated `scene_sdf`.
pub fn build_shader(tree: &Tree) -> Result<String> {
    WgslGenerator::new().build_shader(tree)
}
