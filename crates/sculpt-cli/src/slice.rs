//! Planar slices through a tree
//!
//! Samples the distance field on a square grid at a fixed `z` and renders
//! the result either as terminal text or as a PNG heat map.

use glam::Vec3;
use image::{Rgb, RgbImage};
use rayon::prelude::*;
use sculpt_csg::{FlatEvaluator, Tree};

/// Distances sampled on a `resolution` x `resolution` grid, row 0 at the top.
#[derive(Debug, Clone)]
pub struct Slice {
    pub resolution: usize,
    pub extent: f32,
    pub z: f32,
    pub distances: Vec<f32>,
}

impl Slice {
    /// Sample the plane `z` over `[-extent, extent]` on both axes.
    ///
    /// Rows are evaluated in parallel, each worker with its own scratch
    /// buffer. `tree` must be optimized.
    pub fn sample(tree: &Tree, resolution: usize, extent: f32, z: f32) -> Self {
        let n = resolution.max(1);
        let mut distances = vec![0.0; n * n];

        distances.par_chunks_mut(n).enumerate().for_each_init(
            || FlatEvaluator::with_capacity(tree.len()),
            |evaluator, (row, out)| {
                let y = -axis(row, n, extent);
                for (col, d) in out.iter_mut().enumerate() {
                    let x = axis(col, n, extent);
                    *d = evaluator.distance(tree, Vec3::new(x, y, z));
                }
            },
        );

        Self {
            resolution: n,
            extent,
            z,
            distances,
        }
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.distances[row * self.resolution + col]
    }

    /// Render with `ramp`, densest character first. Each sample is printed
    /// twice to make up for tall terminal cells.
    pub fn to_ascii(&self, ramp: &[char]) -> String {
        let last = ramp.len().saturating_sub(1);
        let mut out = String::with_capacity(self.resolution * (2 * self.resolution + 1));
        for row in self.distances.chunks(self.resolution) {
            for &d in row {
                let t = (0.5 + 0.5 * d / self.extent).clamp(0.0, 1.0);
                let c = ramp.get((t * last as f32).round() as usize).copied().unwrap_or(' ');
                out.push(c);
                out.push(c);
            }
            out.push('\n');
        }
        out
    }

    /// Heat map: blue inside, orange outside, iso bands every
    /// `extent / 8` and a white zero crossing.
    pub fn to_image(&self) -> RgbImage {
        let n = self.resolution as u32;
        RgbImage::from_fn(n, n, |x, y| heat(self.get(y as usize, x as usize), self.extent))
    }
}

/// Cell center along one axis.
fn axis(i: usize, n: usize, extent: f32) -> f32 {
    -extent + (i as f32 + 0.5) * (2.0 * extent / n as f32)
}

fn heat(d: f32, extent: f32) -> Rgb<u8> {
    let base = if d > 0.0 {
        Vec3::new(0.9, 0.6, 0.3)
    } else {
        Vec3::new(0.65, 0.85, 1.0)
    };
    let s = d / extent;
    let mut color = base * (1.0 - (-6.0 * s.abs()).exp());
    color *= 0.8 + 0.2 * (50.0 * s).cos();
    if s.abs() < 0.01 {
        color = Vec3::ONE;
    }
    let [r, g, b] = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).to_array();
    Rgb([r as u8, g as u8, b as u8])
}
