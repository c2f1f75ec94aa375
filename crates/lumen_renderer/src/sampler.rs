//! Random numbers and sample patterns.
//!
//! All randomness in a render derives from one `u64` seed: the pixel sample
//! pattern and one seed per tile. Each tile owns a [`SmallRng`], so output
//! does not depend on which thread renders which tile.

use lumen_math::Vec2;
use rand::rngs::{SmallRng, StdRng};
use rand::{Rng, RngCore, SeedableRng};

/// Uniform float in `[0, 1)` with 24 bits of precision.
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    (rng.next_u32() >> 8) as f32 * (1.0 / (1u32 << 24) as f32)
}

/// Jittered sub-pixel offsets in `[-1, 1]²`, one per ray per pixel.
///
/// Samples are stratified over a `ceil(sqrt(count))²` grid filled row by row.
/// A single sample has zero offset.
pub fn sample_offsets(count: u32, seed: u64) -> Vec<Vec2> {
    if count <= 1 {
        return vec![Vec2::ZERO; count as usize];
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let cells = (count as f32).sqrt().ceil() as u32;
    let cell_size = 1.0 / cells as f32;

    (0..count)
        .map(|i| {
            let cell = Vec2::new((i % cells) as f32, (i / cells) as f32);
            let jitter = Vec2::new(gen_f32(&mut rng), gen_f32(&mut rng));
            (cell + jitter) * cell_size * 2.0 - Vec2::ONE
        })
        .collect()
}

/// One independent seed per tile, derived from the render seed.
pub fn tile_seeds(count: usize, seed: u64) -> Vec<u64> {
    // Offset so tile streams do not replay the sample pattern stream
    let mut rng = StdRng::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15);
    (0..count).map(|_| rng.gen()).collect()
}

/// Private random series for one tile.
pub fn tile_rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gen_f32_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..10_000 {
            let v = gen_f32(&mut rng);
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_single_sample_is_centred() {
        assert_eq!(sample_offsets(1, 42), vec![Vec2::ZERO]);
    }

    #[test]
    fn test_offsets_are_stratified_and_in_range() {
        let offsets = sample_offsets(16, 42);
        assert_eq!(offsets.len(), 16);

        let mut cells = [false; 16];
        for o in &offsets {
            assert!(o.x >= -1.0 && o.x <= 1.0 && o.y >= -1.0 && o.y <= 1.0);
            let cx = (((o.x + 1.0) * 2.0) as usize).min(3);
            let cy = (((o.y + 1.0) * 2.0) as usize).min(3);
            cells[cy * 4 + cx] = true;
        }
        assert!(cells.iter().all(|&c| c), "Every 4x4 cell should hold one sample");
    }

    #[test]
    fn test_offsets_are_deterministic() {
        assert_eq!(sample_offsets(8, 7), sample_offsets(8, 7));
        assert_ne!(sample_offsets(8, 7), sample_offsets(8, 8));
    }

    #[test]
    fn test_tile_seeds_are_distinct() {
        let seeds = tile_seeds(256, 42);
        let mut sorted = seeds.clone();
        sorted.sort_unstable();
        sorted.dedup();

        assert_eq!(sorted.len(), 256);
        assert_eq!(seeds, tile_seeds(256, 42));
    }

    #[test]
    fn test_tile_rng_is_reproducible() {
        let mut a = tile_rng(3);
        let mut b = tile_rng(3);

        for _ in 0..4 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }
}
