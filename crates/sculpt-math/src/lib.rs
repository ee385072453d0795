//! Sculpt Math - the scalar formulas behind CSG evaluation
//!
//! Every formula here exists twice: once as Rust for the CPU evaluators and
//! once as WGSL text (see [`get_wgsl_code`]) for shaders generated from an
//! optimized tree. The two must stay in sync; the test module pins the Rust
//! side to known values.
//!
//! # Example
//!
//! ```rust
//! use sculpt_math::{smooth_min, sd_sphere};
//! use glam::Vec3;
//!
//! let d = sd_sphere(Vec3::new(2.0, 0.0, 0.0), Vec3::ZERO, 1.0);
//! assert_eq!(d, 1.0);
//! assert_eq!(smooth_min(1.0, 2.0, 0.0), 1.0);
//! ```

use glam::Vec3;

/// Linear interpolation from `a` (at `t = 0`) to `b` (at `t = 1`).
///
/// Both endpoints are returned exactly, even when `a` and `b` differ by
/// many orders of magnitude.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// Polynomial smooth minimum with blend radius `k`.
///
/// - `k == 0` is the hard minimum, bit for bit
/// - matches `min(a, b)` whenever `|a - b| >= k`
/// - never exceeds `min(a, b)` for `k >= 0`
#[inline]
pub fn smooth_min(a: f32, b: f32, k: f32) -> f32 {
    if k == 0.0 {
        return a.min(b);
    }
    let h = (k - (a - b).abs()).max(0.0) / k;
    a.min(b) - h * h * k * 0.25
}

/// Polynomial smooth maximum, the mirror of [`smooth_min`].
#[inline]
pub fn smooth_max(a: f32, b: f32, k: f32) -> f32 {
    if k == 0.0 {
        return a.max(b);
    }
    let h = (k - (a - b).abs()).max(0.0) / k;
    a.max(b) + h * h * k * 0.25
}

/// Sphere SDF: negative inside, zero on the surface, positive outside.
#[inline]
pub fn sd_sphere(p: Vec3, center: Vec3, radius: f32) -> f32 {
    (p - center).length() - radius
}

/// Axis-aligned box SDF with the given half extents.
#[inline]
pub fn sd_box(p: Vec3, center: Vec3, half_extents: Vec3) -> f32 {
    let q = (p - center).abs() - half_extents;
    q.max(Vec3::ZERO).length() + q.x.max(q.y.max(q.z)).min(0.0)
}

/// WGSL versions of the formulas above, meant to be pasted ahead of any
/// generated `scene_sdf` function.
pub fn get_wgsl_code() -> &'static str {
    WGSL_FORMULAS
}

const WGSL_FORMULAS: &str = r#"fn csg_smooth_min(a: f32, b: f32, k: f32) -> f32 {
    if (k == 0.0) {
        return min(a, b);
    }
    let h = max(k - abs(a - b), 0.0) / k;
    return min(a, b) - h * h * k * 0.25;
}

fn csg_smooth_max(a: f32, b: f32, k: f32) -> f32 {
    if (k == 0.0) {
        return max(a, b);
    }
    let h = max(k - abs(a - b), 0.0) / k;
    return max(a, b) + h * h * k * 0.25;
}

fn csg_combine(f: f32, g: f32, blend: f32, softness: f32) -> f32 {
    if (blend >= 0.0) {
        return mix(f, csg_smooth_min(f, g, softness), blend);
    }
    return mix(f, csg_smooth_max(f, -g, softness), -blend);
}

fn sd_sphere(p: vec3<f32>, center: vec3<f32>, radius: f32) -> f32 {
    return length(p - center) - radius;
}

fn sd_box(p: vec3<f32>, center: vec3<f32>, half_extents: vec3<f32>) -> f32 {
    let q = abs(p - center) - half_extents;
    return length(max(q, vec3<f32>(0.0))) + min(max(q.x, max(q.y, q.z)), 0.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn lerp_endpoints() {
        assert_eq!(lerp(2.0, 5.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 5.0, 1.0), 5.0);
        assert_relative_eq!(lerp(2.0, 5.0, 0.5), 3.5);
    }

    #[test]
    fn lerp_endpoints_exact_across_magnitudes() {
        assert_eq!(lerp(1e8, -1.0, 1.0), -1.0);
        assert_eq!(lerp(1000.0, 0.001, 1.0), 0.001);
        assert_eq!(lerp(0.001, 1e8, 0.0), 0.001);
    }

    #[test]
    fn smooth_min_zero_k_is_hard_min() {
        for (a, b) in [(0.0, 1.0), (-3.5, 2.25), (7.0, -7.0), (1e-6, 1e-6)] {
            assert_eq!(smooth_min(a, b, 0.0), a.min(b));
            assert_eq!(smooth_max(a, b, 0.0), a.max(b));
        }
    }

    #[test]
    fn smooth_min_never_above_hard_min() {
        let ks = [0.0, 0.1, 0.5, 1.0, 4.0];
        for i in -20..=20 {
            for j in -20..=20 {
                let a = i as f32 * 0.25;
                let b = j as f32 * 0.25;
                for k in ks {
                    assert!(smooth_min(a, b, k) <= a.min(b));
                    assert!(smooth_max(a, b, k) >= a.max(b));
                }
            }
        }
    }

    #[test]
    fn smooth_min_matches_hard_min_far_apart() {
        assert_eq!(smooth_min(0.0, 10.0, 1.0), 0.0);
        assert_eq!(smooth_max(0.0, 10.0, 1.0), 10.0);
    }

    #[test]
    fn smooth_min_equal_inputs() {
        // h = 1, so the join is pulled in by k / 4
        assert_relative_eq!(smooth_min(1.0, 1.0, 0.4), 0.9, epsilon = 1e-6);
        assert_relative_eq!(smooth_max(1.0, 1.0, 0.4), 1.1, epsilon = 1e-6);
    }

    #[test]
    fn sphere_distance() {
        let c = Vec3::new(1.0, 2.0, 3.0);
        assert_relative_eq!(sd_sphere(c, c, 0.5), -0.5);
        assert_relative_eq!(sd_sphere(Vec3::new(1.0, 2.0, 5.0), c, 0.5), 1.5);
    }

    #[test]
    fn box_distance() {
        let h = Vec3::splat(1.0);
        assert_relative_eq!(sd_box(Vec3::ZERO, Vec3::ZERO, h), -1.0);
        assert_relative_eq!(sd_box(Vec3::new(2.0, 0.0, 0.0), Vec3::ZERO, h), 1.0);
        assert_relative_eq!(
            sd_box(Vec3::new(2.0, 2.0, 0.0), Vec3::ZERO, h),
            2.0_f32.sqrt(),
            epsilon = 1e-6
        );
        assert_relative_eq!(sd_box(Vec3::new(6.0, 0.5, 0.0), Vec3::new(5.0, 0.0, 0.0), h), 0.0);
    }

    #[test]
    fn wgsl_code_contains_every_formula() {
        let wgsl = get_wgsl_code();
        for name in ["csg_smooth_min", "csg_smooth_max", "csg_combine", "sd_sphere", "sd_box"] {
            assert!(wgsl.contains(&format!("fn {}(", name)), "missing {}", name);
        }
    }
}
