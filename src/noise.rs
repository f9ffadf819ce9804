// Value noise + 3-octave fractal noise. Pure functions of a 2D coordinate.
// Visual: the flicker in the physics pass and the rising texture in the colour pass.

use cgmath::{vec2, Vector2};

/// Pseudo-random scalar in [0,1) for a coordinate. Same input, same output.
#[inline]
pub fn hash(p: Vector2<f32>) -> f32 {
    let s = (p.x * 12.9898 + p.y * 78.233).sin() * 43758.5453;
    let f = s - s.floor();
    // Tiny negative inputs round `1 - eps` up to exactly 1.0 in f32.
    if f >= 1.0 { 0.0 } else { f }
}

#[inline]
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Hermite step between two edges. `edge0 > edge1` gives a falling ramp.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Bilinear blend of the four surrounding lattice hashes, eased by 3t²−2t³.
pub fn value_noise(p: Vector2<f32>) -> f32 {
    let i = vec2(p.x.floor(), p.y.floor());
    let f = p - i;
    let u = vec2(f.x * f.x * (3.0 - 2.0 * f.x), f.y * f.y * (3.0 - 2.0 * f.y));

    let a = hash(i);
    let b = hash(i + vec2(1.0, 0.0));
    let c = hash(i + vec2(0.0, 1.0));
    let d = hash(i + vec2(1.0, 1.0));

    mix(mix(a, b, u.x), mix(c, d, u.x), u.y)
}

/// Three octaves, weights 0.5 / 0.25 / 0.125. The odd lacunarity (2.02, 2.03)
/// keeps the octaves off each other's lattice.
pub fn fractal_noise(p: Vector2<f32>) -> f32 {
    let mut p = p;
    let mut v = 0.5 * value_noise(p);
    p *= 2.02;
    v += 0.25 * value_noise(p);
    p *= 2.03;
    v += 0.125 * value_noise(p);
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn hash_is_deterministic_and_in_unit_range() {
        for j in -40..40 {
            for i in -40..40 {
                let p = vec2(i as f32 * 0.37, j as f32 * 1.91);
                let h = hash(p);
                assert!((0.0..1.0).contains(&h), "hash({p:?}) = {h}");
                assert_eq!(h, hash(p));
            }
        }
    }

    #[test]
    fn value_noise_hits_lattice_hashes() {
        for &(x, y) in &[(0.0, 0.0), (3.0, 7.0), (-2.0, 5.0), (11.0, -4.0)] {
            assert_abs_diff_eq!(value_noise(vec2(x, y)), hash(vec2(x, y)), epsilon = 1e-6);
        }
    }

    #[test]
    fn value_noise_is_continuous_across_cells() {
        let eps = 1e-3;
        let left = value_noise(vec2(5.0 - eps, 2.3));
        let right = value_noise(vec2(5.0 + eps, 2.3));
        assert_abs_diff_eq!(left, right, epsilon = 1e-2);
    }

    #[test]
    fn smoothstep_handles_both_directions() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert_abs_diff_eq!(smoothstep(0.0, 1.0, 0.5), 0.5, epsilon = 1e-6);
        // falling: full at 0, nothing at the first edge
        assert_eq!(smoothstep(0.05, 0.0, 0.0), 1.0);
        assert_eq!(smoothstep(0.05, 0.0, 0.05), 0.0);
    }

    #[test]
    fn fractal_noise_stays_under_weight_sum() {
        for j in 0..64 {
            for i in 0..64 {
                let v = fractal_noise(vec2(i as f32 * 0.13, j as f32 * 0.29));
                assert!((0.0..0.875).contains(&v));
            }
        }
    }
}
