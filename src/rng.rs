//! Portable seeded random source for layout generation.
//!
//! `SmallRng` from `rand` is fast but its algorithm differs between 32-bit and
//! 64-bit targets and may change between `rand` releases, so a seed would not
//! replay the same layout everywhere. `Mulberry32` is a tiny 32-bit generator
//! whose output depends only on the seed and the number of calls.
//!
//! It implements [`RngCore`] and [`SeedableRng`], so it can also be handed to
//! anything that accepts a `rand::Rng` (for example the match-3 bag shuffle).
use rand::{Error, RngCore, SeedableRng};

const GOLDEN_STEP: u32 = 0x6D2B_79F5;
const UNIT_SCALE: f64 = 4_294_967_296.0; // 2^32

/// Mulberry32 pseudo-random generator.
///
/// # Examples
/// ```
/// use tile_puzzles::rng::Mulberry32;
/// let mut a = Mulberry32::new(42);
/// let mut b = Mulberry32::new(42);
/// assert_eq!(a.next_raw(), b.next_raw());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    /// Creates a generator from a 32-bit seed.
    pub fn new(seed: u32) -> Self {
        Mulberry32 {
            state: seed.wrapping_add(GOLDEN_STEP),
        }
    }

    /// Advances the state and returns the next 32-bit output.
    pub fn next_raw(&mut self) -> u32 {
        self.state = self.state.wrapping_add(GOLDEN_STEP);
        let mut x = self.state;
        x = (x ^ (x >> 15)).wrapping_mul(x | 1);
        x ^= x.wrapping_add((x ^ (x >> 7)).wrapping_mul(x | 61));
        x ^ (x >> 14)
    }

    /// Returns a value in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        f64::from(self.next_raw()) / UNIT_SCALE
    }

    /// Returns an integer in the inclusive range `[min, max]`.
    ///
    /// If `max < min` the range collapses to `min`.
    pub fn int_in(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            // Still consume a value so the call sequence stays aligned.
            self.next_raw();
            return min;
        }
        let span = f64::from(max - min) + 1.0;
        min + (self.next_unit() * span).floor() as u32
    }

    /// Fisher-Yates shuffle, scanning from the end of the slice.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = (self.next_unit() * (i as f64 + 1.0)).floor() as usize;
            items.swap(i, j.min(i));
        }
    }
}

impl RngCore for Mulberry32 {
    fn next_u32(&mut self) -> u32 {
        self.next_raw()
    }

    fn next_u64(&mut self) -> u64 {
        let lo = u64::from(self.next_raw());
        let hi = u64::from(self.next_raw());
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_raw().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Mulberry32 {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Mulberry32::new(u32::from_le_bytes(seed))
    }
}
