//! Deterministic PRNG for race simulation (qualifying noise, lap variance,
//! pit and overtake rolls).
//!
//! The simulator never touches ambient random state. It draws from a
//! [`RaceRng`] passed in by the caller, so a race is reproducible from its
//! seed and tests can swap in a source with no noise at all.

/// Source of randomness consumed by the race simulator.
pub trait RaceRng {
    /// Uniform sample from `[low, high)`.
    fn uniform(&mut self, low: f64, high: f64) -> f64;

    /// Returns `true` with the given probability.
    ///
    /// - probability <= 0 always returns false
    /// - probability >= 1 always returns true
    fn chance(&mut self, probability: f64) -> bool;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize;
}

/// SplitMix64 pseudo-random number generator.
///
/// Fast, 8 bytes of state and identical output on every platform.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    /// Create a new RNG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Derive an independent stream for one race of a season.
    ///
    /// Mixing the race id through one SplitMix64 round keeps per-race output
    /// stable no matter which order (or thread) races are simulated in.
    pub fn for_race(season_seed: u64, race_id: u32) -> Self {
        let id = u64::from(race_id);
        let mut mixer = Self::new(season_seed ^ ((id << 32) | id));
        Self::new(mixer.next_u64())
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform `f64` in `[0, 1)` built from the top 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Get the internal state (for logging a reproducible run).
    pub fn state(&self) -> u64 {
        self.state
    }
}

impl RaceRng for SimRng {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }

    fn chance(&mut self, probability: f64) -> bool {
        if probability <= 0.0 {
            return false;
        }
        if probability >= 1.0 {
            return true;
        }
        self.next_f64() < probability
    }

    fn index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "index() needs a non-empty range");
        // Multiply-shift keeps the bias below 2^-32 for any realistic grid.
        let upper = self.next_u64() >> 32;
        ((upper * len as u64) >> 32) as usize
    }
}
