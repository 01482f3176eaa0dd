//! ## trafikk-core::random
//! **Injected random sources for the update rules**
//!
//! The update engine never touches a global generator. Every random decision
//! (cell occupancy at initialization, the slow-down draw per vehicle) is pulled
//! from a [`RandomSource`] handed in by the caller, so a run is reproducible
//! from its seed and tests can script the exact draws.
//!
//! ### Sources:
//! - [`SeededSource`]: seedable `SmallRng`, one instance per run.
//! - [`ScriptedSource`]: replays a fixed list of draws, cycling when exhausted.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Capability yielding independent uniform draws in `[0, 1)`.
pub trait RandomSource {
    /// Next uniform value in `[0, 1)`.
    fn next_uniform(&mut self) -> f64;

    /// Bernoulli trial succeeding with `probability`.
    ///
    /// Consumes exactly one draw, even for `probability` of 0 or 1, so the
    /// draw sequence depends only on how many trials were asked for.
    fn chance(&mut self, probability: f64) -> bool {
        self.next_uniform() < probability
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_uniform(&mut self) -> f64 {
        (**self).next_uniform()
    }
}

/// Seeded pseudo-random source. Two sources built from the same seed yield
/// identical draw sequences.
#[derive(Debug, Clone)]
pub struct SeededSource {
    seed: u64,
    rng: SmallRng,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Seed this source was created from.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SeededSource {
    fn next_uniform(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Replays a fixed sequence of draws. Once the script runs out it starts over.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    draws: Vec<f64>,
    cursor: usize,
}

impl ScriptedSource {
    /// Panics if `draws` is empty or holds a value outside `[0, 1)`.
    pub fn new(draws: Vec<f64>) -> Self {
        assert!(!draws.is_empty(), "scripted source needs at least one draw");
        assert!(
            draws.iter().all(|d| (0.0..1.0).contains(d)),
            "scripted draws must lie in [0, 1)"
        );
        Self { draws, cursor: 0 }
    }

    /// Source that returns `value` forever.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// Number of draws consumed so far.
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedSource {
    fn next_uniform(&mut self) -> f64 {
        let value = self.draws[self.cursor % self.draws.len()];
        self.cursor += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_source_is_reproducible() {
        let mut a = SeededSource::new(7);
        let mut b = SeededSource::new(7);
        for _ in 0..1_000 {
            assert_eq!(a.next_uniform().to_bits(), b.next_uniform().to_bits());
        }
    }

    #[test]
    fn test_seeded_source_stays_in_unit_interval() {
        let mut source = SeededSource::new(42);
        for _ in 0..10_000 {
            let draw = source.next_uniform();
            assert!((0.0..1.0).contains(&draw));
        }
    }

    #[test]
    fn test_chance_frequency() {
        let mut source = SeededSource::new(3);
        let trials = 10_000;
        let hits = (0..trials).filter(|_| source.chance(0.3)).count();
        let observed = hits as f64 / trials as f64;
        assert!((observed - 0.3).abs() < 0.03);
    }

    #[test]
    fn test_chance_edges() {
        let mut source = ScriptedSource::new(vec![0.0, 0.999_999]);
        assert!(!source.chance(0.0));
        assert!(!source.chance(0.0));
        assert!(source.chance(1.0));
        assert!(source.chance(1.0));
        assert_eq!(source.consumed(), 4);
    }

    #[test]
    fn test_scripted_source_cycles() {
        let mut source = ScriptedSource::new(vec![0.1, 0.2]);
        let draws: Vec<f64> = (0..5).map(|_| source.next_uniform()).collect();
        assert_eq!(draws, vec![0.1, 0.2, 0.1, 0.2, 0.1]);
    }

    #[test]
    #[should_panic]
    fn test_scripted_source_rejects_out_of_range() {
        ScriptedSource::new(vec![1.0]);
    }
}
