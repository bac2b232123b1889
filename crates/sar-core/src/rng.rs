//! Deterministic per-drone and simulation-level RNG wrappers.
//!
//! # Determinism strategy
//!
//! Each drone gets its own independent `SmallRng` seeded by:
//!
//!   seed = global_seed XOR (drone_id * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive drone IDs uniformly across the seed space. This
//! is a stable function of the id alone — it does not depend on hash-map
//! iteration order or process layout, so replays of the same seed always
//! reproduce the same per-drone draws.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::DroneId;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

// ── DroneRng ────────────────────────────────────────────────────────────────

/// Per-drone deterministic RNG.
///
/// Created once per drone at simulation init and owned by that drone for its
/// whole lifetime — drones never share RNG state, so ticking them in any
/// order (or in parallel) never disturbs determinism.
pub struct DroneRng(SmallRng);

impl DroneRng {
    /// Seed deterministically from the run's global seed and a drone id.
    pub fn new(global_seed: u64, drone: DroneId) -> Self {
        let seed = global_seed ^ (drone.0 as u64).wrapping_mul(MIXING_CONSTANT);
        DroneRng(SmallRng::seed_from_u64(seed))
    }

    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    /// Sample a uniformly distributed value of any `Standard`-distributed type.
    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.0.r#gen()
    }

    /// Generate a value uniformly in `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Shuffle a mutable slice in-place (Fisher-Yates).
    #[inline]
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.0);
    }
}

// ── SimRng ────────────────────────────────────────────────────────────────────

/// Simulation-level RNG used by the driver for world initialization (target
/// placement, drone start-position shuffling).
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    /// Shuffle a mutable slice in-place (Fisher-Yates).
    #[inline]
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.0);
    }
}
