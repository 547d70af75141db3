//! Fractal value-noise height function.
//!
//! Every step runs in `f32` with `libm` rounding so a given world position maps to
//! the same height on every platform and through every dispatch path. Chunk edges
//! computed independently therefore meet without seams.

use glam::Vec2;
use noise::NoiseFn;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Largest lattice offset (per axis) that a non-zero seed can shift the domain by.
const MAX_SEED_OFFSET: i32 = 256;

/// Constants of the fbm height function.
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseParams {
    /// World seed. Zero leaves the domain untranslated.
    pub seed: u64,
    /// Multiplier applied to world positions before sampling. Default: 0.01.
    pub domain_scale: f32,
    /// Multiplier applied to the fbm sum. Default: 100.0.
    pub amplitude: f32,
    /// Number of value-noise octaves. Default: 4.
    pub octaves: u32,
    /// Amplitude of the first octave. Default: 0.5.
    pub octave_amplitude: f32,
    /// Frequency of the first octave. Default: 1.0.
    pub octave_frequency: f32,
    /// Frequency multiplier between octaves. Default: 2.0.
    pub lacunarity: f32,
    /// Amplitude multiplier between octaves. Default: 0.5.
    pub gain: f32,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            seed: 0,
            domain_scale: 0.01,
            amplitude: 100.0,
            octaves: 4,
            octave_amplitude: 0.5,
            octave_frequency: 1.0,
            lacunarity: 2.0,
            gain: 0.5,
        }
    }
}

/// `x - floor(x)`, in `[0, 1)` for finite input.
#[inline]
fn fract(x: f32) -> f32 {
    x - libm::floorf(x)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Hermite smoothing `3t² - 2t³`.
#[inline]
fn smooth(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// Pseudo-random scalar in `[0, 1)` for a 2D point.
///
/// Scrambles the fractional parts of the scaled coordinates, perturbs them by
/// their dot product with a shifted copy, then takes the fractional part of the
/// product.
#[inline]
pub fn hash(p: Vec2) -> f32 {
    let mut x = fract(p.x * 123.34);
    let mut y = fract(p.y * 456.21);
    let d = x * (x + 45.32) + y * (y + 45.32);
    x += d;
    y += d;
    fract(x * y)
}

/// Bilinear interpolation of [`hash`] over the four lattice corners around `p`,
/// with smoothed weights.
#[inline]
pub fn value_noise(p: Vec2) -> f32 {
    let ix = libm::floorf(p.x);
    let iy = libm::floorf(p.y);
    let ux = smooth(p.x - ix);
    let uy = smooth(p.y - iy);

    let a = hash(Vec2::new(ix, iy));
    let b = hash(Vec2::new(ix + 1.0, iy));
    let c = hash(Vec2::new(ix, iy + 1.0));
    let d = hash(Vec2::new(ix + 1.0, iy + 1.0));

    lerp(lerp(a, b, ux), lerp(c, d, ux), uy)
}

/// Deterministic terrain height function built from octaves of [`value_noise`].
#[derive(Clone, Debug)]
pub struct TerrainNoise {
    params: NoiseParams,
    /// Lattice-aligned domain translation derived from the seed.
    offset: Vec2,
}

impl TerrainNoise {
    /// Create a height function with the given parameters.
    pub fn new(params: NoiseParams) -> Self {
        let offset = seed_offset(params.seed);
        Self { params, offset }
    }

    /// Fractal sum of value noise at a point already in noise space.
    pub fn fbm(&self, p: Vec2) -> f32 {
        let mut total = 0.0;
        let mut amplitude = self.params.octave_amplitude;
        let mut frequency = self.params.octave_frequency;

        for _ in 0..self.params.octaves {
            total += amplitude * value_noise(Vec2::new(p.x * frequency, p.y * frequency));
            frequency *= self.params.lacunarity;
            amplitude *= self.params.gain;
        }

        total
    }

    /// Terrain height at a world-space ground position.
    #[inline]
    pub fn height(&self, world_pos: Vec2) -> f32 {
        let scale = self.params.domain_scale;
        let p = Vec2::new(
            world_pos.x * scale + self.offset.x,
            world_pos.y * scale + self.offset.y,
        );
        self.fbm(p) * self.params.amplitude
    }

    /// Upper bound of [`height`](Self::height) for a non-negative amplitude
    /// (the octave amplitudes summed).
    pub fn max_height(&self) -> f32 {
        let mut sum = 0.0;
        let mut amp = self.params.octave_amplitude;
        for _ in 0..self.params.octaves {
            sum += amp;
            amp *= self.params.gain;
        }
        sum * self.params.amplitude
    }

    /// Domain translation applied for this seed.
    pub fn seed_offset(&self) -> Vec2 {
        self.offset
    }

    /// Return a reference to the current parameters.
    pub fn params(&self) -> &NoiseParams {
        &self.params
    }
}

impl NoiseFn<f64, 2> for TerrainNoise {
    fn get(&self, point: [f64; 2]) -> f64 {
        self.height(Vec2::new(point[0] as f32, point[1] as f32)) as f64
    }
}

/// Integer lattice offset for `seed`; zero for seed zero.
fn seed_offset(seed: u64) -> Vec2 {
    if seed == 0 {
        return Vec2::ZERO;
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let x = rng.random_range(-MAX_SEED_OFFSET..=MAX_SEED_OFFSET);
    let y = rng.random_range(-MAX_SEED_OFFSET..=MAX_SEED_OFFSET);
    Vec2::new(x as f32, y as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> TerrainNoise {
        TerrainNoise::new(NoiseParams::default())
    }

    #[test]
    fn test_hash_in_unit_interval() {
        for i in -50..50 {
            for j in -50..50 {
                let h = hash(Vec2::new(i as f32 * 0.37, j as f32 * 1.13));
                assert!((0.0..1.0).contains(&h), "hash {h} escaped [0, 1) at ({i}, {j})");
            }
        }
    }

    #[test]
    fn test_hash_known_value() {
        // fract(0) = 0 on both axes, so the dot term is 0 and the product is 0.
        assert_eq!(hash(Vec2::ZERO), 0.0);
    }

    #[test]
    fn test_value_noise_matches_hash_on_lattice() {
        for (x, y) in [(0.0, 0.0), (3.0, -2.0), (-7.0, 11.0)] {
            let p = Vec2::new(x, y);
            assert_eq!(
                value_noise(p),
                hash(p),
                "smoothstep weights are zero on lattice points"
            );
        }
    }

    #[test]
    fn test_value_noise_is_not_flat() {
        let values: Vec<f32> = (0..64)
            .map(|i| value_noise(Vec2::new(i as f32 * 0.73, i as f32 * 0.29)))
            .collect();
        let min = values.iter().copied().fold(f32::INFINITY, f32::min);
        let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        assert!(max - min > 0.1, "noise should vary, got range [{min}, {max}]");
    }

    #[test]
    fn test_height_is_deterministic() {
        let a = reference();
        let b = reference();
        for p in [Vec2::new(0.0, 0.0), Vec2::new(123.5, -987.25), Vec2::new(1e4, 3e3)] {
            assert_eq!(a.height(p).to_bits(), a.height(p).to_bits());
            assert_eq!(a.height(p).to_bits(), b.height(p).to_bits());
        }
    }

    #[test]
    fn test_height_within_amplitude_bound() {
        let noise = reference();
        let max = noise.max_height();
        assert_eq!(max, 93.75);
        for i in 0..200 {
            let p = Vec2::new(i as f32 * 17.3 - 1500.0, i as f32 * -9.1 + 400.0);
            let h = noise.height(p);
            assert!((0.0..=max).contains(&h), "height {h} outside [0, {max}] at {p}");
        }
    }

    #[test]
    fn test_height_is_continuous() {
        let noise = reference();
        let step = 0.05;
        for i in 0..4_000 {
            let x = i as f32 * step;
            let a = noise.height(Vec2::new(x, 13.0));
            let b = noise.height(Vec2::new(x + step, 13.0));
            assert!((a - b).abs() < 2.0, "jump of {} at x={x}", (a - b).abs());
        }
    }

    #[test]
    fn test_domain_scale_and_amplitude_are_applied() {
        let base = reference();
        let stretched = TerrainNoise::new(NoiseParams {
            domain_scale: 0.02,
            amplitude: 50.0,
            ..Default::default()
        });
        let p = Vec2::new(40.0, 80.0);
        let expected = base.fbm(Vec2::new(p.x * 0.02, p.y * 0.02)) * 50.0;
        assert_eq!(stretched.height(p), expected);
    }

    #[test]
    fn test_zero_amplitude_is_flat() {
        let noise = TerrainNoise::new(NoiseParams {
            amplitude: 0.0,
            ..Default::default()
        });
        assert_eq!(noise.height(Vec2::new(321.0, 654.0)), 0.0);
    }

    #[test]
    fn test_seed_zero_keeps_reference_field() {
        assert_eq!(reference().seed_offset(), Vec2::ZERO);
    }

    #[test]
    fn test_seed_offset_is_lattice_aligned_and_repeatable() {
        let a = TerrainNoise::new(NoiseParams {
            seed: 42,
            ..Default::default()
        });
        let b = TerrainNoise::new(NoiseParams {
            seed: 42,
            ..Default::default()
        });
        let offset = a.seed_offset();
        assert_eq!(offset, b.seed_offset());
        assert_eq!(offset, offset.floor(), "seed offsets must be whole lattice steps");
        assert!(offset.abs().max_element() <= MAX_SEED_OFFSET as f32);
    }

    #[test]
    fn test_different_seeds_differ() {
        let p = Vec2::new(500.0, 500.0);
        let heights: Vec<f32> = (1..=4)
            .map(|seed| {
                TerrainNoise::new(NoiseParams {
                    seed,
                    ..Default::default()
                })
                .height(p)
            })
            .collect();
        assert!(
            heights.windows(2).any(|w| w[0] != w[1]),
            "distinct seeds should not all agree: {heights:?}"
        );
    }

    #[test]
    fn test_noise_fn_matches_height() {
        let noise = reference();
        let direct = noise.height(Vec2::new(75.0, -25.0)) as f64;
        assert_eq!(noise.get([75.0, -25.0]), direct);

        let scaled: noise::ScaleBias<f64, &TerrainNoise, 2> = noise::ScaleBias::new(&noise)
            .set_scale(2.0)
            .set_bias(1.0);
        assert_eq!(scaled.get([75.0, -25.0]), direct * 2.0 + 1.0);
    }
}
