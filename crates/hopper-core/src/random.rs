//! Seeded random-number service.
//!
//! All stochastic decisions in a run (move proposals, Metropolis tests,
//! injection and drain trials, setup disorder) draw from one
//! [`RandomService`]. It wraps a ChaCha8 stream so that:
//!
//! - identical seeds produce identical sample sequences on every platform
//!   and for both evaluator paths (evaluation itself draws nothing);
//! - the exact stream position can be captured and restored for
//!   checkpoints via [`RngState`].
//!
//! Seeding is explicit. [`RandomService::new`] takes a seed, and seed `0`
//! is replaced by the fixed [`RandomService::ZERO_SEED_SUBSTITUTE`] so
//! that "zero" is still reproducible. Only [`RandomService::from_clock`]
//! consults wall-clock time.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::RestoreError;

/// Captured generator position, sufficient to resume the exact stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RngState {
    /// Resolved seed the stream was created from.
    pub seed: u64,
    /// Word position within the ChaCha keystream.
    pub word_pos: u128,
    /// The next `u64` the stream will produce; checked on restore.
    pub fingerprint: u64,
}

/// Deterministic random-number service for one simulation run.
#[derive(Clone, Debug)]
pub struct RandomService {
    seed: u64,
    rng: ChaCha8Rng,
}

impl RandomService {
    /// Seed used in place of a requested seed of `0`.
    pub const ZERO_SEED_SUBSTITUTE: u64 = 0x5DEE_CE66_D1CE_B00C;

    /// Create a service from an explicit seed.
    ///
    /// A seed of `0` maps to [`Self::ZERO_SEED_SUBSTITUTE`]; it never
    /// falls back to the clock.
    pub fn new(seed: u64) -> Self {
        let seed = if seed == 0 {
            Self::ZERO_SEED_SUBSTITUTE
        } else {
            seed
        };
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Create a service seeded from the system clock.
    ///
    /// The resolved seed is available from [`seed()`](Self::seed) so the
    /// run can still be reproduced afterwards.
    pub fn from_clock() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::new(nanos)
    }

    /// Create from an optional seed: `None` seeds from the clock.
    pub fn from_option(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => Self::new(s),
            None => Self::from_clock(),
        }
    }

    /// The resolved seed this stream was created from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Reseed in place. Same mapping rules as [`new()`](Self::new).
    pub fn reseed(&mut self, seed: u64) {
        *self = Self::new(seed);
    }

    /// Uniform sample in `[0, 1)`.
    #[inline]
    pub fn random(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// Uniform sample in `[lo, hi)`.
    #[inline]
    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.random()
    }

    /// Normal sample with the given mean and standard deviation.
    ///
    /// Box-Muller transform; consumes two uniforms per call.
    pub fn normal(&mut self, mean: f64, sigma: f64) -> f64 {
        let u1 = self.random().max(1e-300);
        let u2 = self.random();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + sigma * z
    }

    /// Uniform integer in the inclusive range `[lo, hi]`.
    ///
    /// Returns `lo` without drawing if `hi <= lo`.
    pub fn integer(&mut self, lo: i64, hi: i64) -> i64 {
        if hi <= lo {
            return lo;
        }
        self.rng.random_range(lo..=hi)
    }

    /// Uniform index in `[0, len)`. `len` must be non-zero.
    #[inline]
    pub fn index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "index() on empty range");
        self.rng.random_range(0..len)
    }

    /// Uniformly chosen element, or `None` for an empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let i = self.index(items.len());
        items.get(i)
    }

    /// Metropolis criterion.
    ///
    /// Favourable moves (`de <= 0`) are accepted without drawing.
    /// Otherwise the move is accepted with probability
    /// `exp(-de * inv_kt)`.
    pub fn metropolis(&mut self, de: f64, inv_kt: f64) -> bool {
        if de <= 0.0 {
            return true;
        }
        self.random() < (-de * inv_kt).exp()
    }

    /// Metropolis criterion scaled by a coupling factor.
    ///
    /// Favourable moves are accepted with probability `coupling`;
    /// unfavourable ones with `(1 - coupling) * exp(-de * inv_kt)`.
    /// Always draws exactly one uniform.
    pub fn metropolis_with_coupling(&mut self, de: f64, inv_kt: f64, coupling: f64) -> bool {
        let u = self.random();
        if de <= 0.0 {
            u < coupling
        } else {
            u < (1.0 - coupling) * (-de * inv_kt).exp()
        }
    }

    /// Bernoulli trial: `true` with probability `p`.
    #[inline]
    pub fn choose_yes(&mut self, p: f64) -> bool {
        self.random() < p
    }

    /// Bernoulli trial: `true` with probability `1 - p`.
    #[inline]
    pub fn choose_no(&mut self, p: f64) -> bool {
        self.random() >= p
    }

    /// Capture the current stream position.
    pub fn state(&self) -> RngState {
        let mut probe = self.rng.clone();
        RngState {
            seed: self.seed,
            word_pos: self.rng.get_word_pos(),
            fingerprint: probe.next_u64(),
        }
    }

    /// Rebuild a service at a captured stream position.
    ///
    /// # Errors
    ///
    /// Returns [`RestoreError::ReproducibilityViolation`] if the rebuilt
    /// stream does not produce the recorded fingerprint.
    pub fn restore(state: RngState) -> Result<Self, RestoreError> {
        let mut service = Self::new(state.seed);
        if service.seed != state.seed {
            return Err(RestoreError::ReproducibilityViolation {
                reason: format!("seed {} cannot be restored verbatim", state.seed),
            });
        }
        service.rng.set_word_pos(state.word_pos);
        let mut probe = service.rng.clone();
        let next = probe.next_u64();
        if next != state.fingerprint {
            return Err(RestoreError::ReproducibilityViolation {
                reason: format!(
                    "stream fingerprint mismatch: recorded {:#018x}, restored {:#018x}",
                    state.fingerprint, next
                ),
            });
        }
        Ok(service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = RandomService::new(42);
        let mut b = RandomService::new(42);
        for _ in 0..1000 {
            assert_eq!(a.random().to_bits(), b.random().to_bits());
        }
    }

    #[test]
    fn zero_seed_is_fixed_not_clock() {
        let a = RandomService::new(0);
        let b = RandomService::new(0);
        assert_eq!(a.seed(), RandomService::ZERO_SEED_SUBSTITUTE);
        assert_eq!(a.state(), b.state());
    }

    #[test]
    fn reseed_restarts_stream() {
        let mut a = RandomService::new(9);
        let first = a.random();
        a.random();
        a.reseed(9);
        assert_eq!(a.random(), first);
    }

    #[test]
    fn metropolis_converges_to_boltzmann_factor() {
        let mut rng = RandomService::new(7);
        let (de, inv_kt) = (0.05, 20.0);
        let n = 200_000;
        let accepted = (0..n).filter(|_| rng.metropolis(de, inv_kt)).count();
        let rate = accepted as f64 / n as f64;
        let expected = (-de * inv_kt).exp();
        assert!(
            (rate - expected).abs() < 0.01,
            "acceptance {rate} vs exp(-dE/kT) {expected}"
        );
    }

    #[test]
    fn metropolis_accepts_favourable_and_infinite_temperature() {
        let mut rng = RandomService::new(3);
        assert!(rng.metropolis(-1.0, 40.0));
        assert!(rng.metropolis(0.0, 40.0));
        for _ in 0..1000 {
            assert!(rng.metropolis(5.0, 0.0));
        }
    }

    #[test]
    fn coupling_scales_both_branches() {
        let mut rng = RandomService::new(11);
        let n = 100_000;
        let fav = (0..n)
            .filter(|_| rng.metropolis_with_coupling(-1.0, 1.0, 0.3))
            .count() as f64
            / n as f64;
        assert!((fav - 0.3).abs() < 0.01, "favourable rate {fav}");
        let unfav = (0..n)
            .filter(|_| rng.metropolis_with_coupling(1.0, 1.0, 0.3))
            .count() as f64
            / n as f64;
        let expected = 0.7 * (-1.0f64).exp();
        assert!((unfav - expected).abs() < 0.01, "unfavourable rate {unfav}");
    }

    #[test]
    fn normal_moments() {
        let mut rng = RandomService::new(5);
        let n = 100_000;
        let samples: Vec<f64> = (0..n).map(|_| rng.normal(2.0, 0.5)).collect();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n as f64;
        assert!((mean - 2.0).abs() < 0.01, "mean {mean}");
        assert!((var.sqrt() - 0.5).abs() < 0.01, "sigma {}", var.sqrt());
    }

    #[test]
    fn choose_handles_empty() {
        let mut rng = RandomService::new(1);
        let empty: [u8; 0] = [];
        assert!(rng.choose(&empty).is_none());
        assert_eq!(rng.choose(&[5]), Some(&5));
    }

    #[test]
    fn state_round_trip_resumes_stream() {
        let mut rng = RandomService::new(1234);
        for _ in 0..37 {
            rng.random();
        }
        let state = rng.state();
        let mut restored = RandomService::restore(state).unwrap();
        for _ in 0..100 {
            assert_eq!(rng.random().to_bits(), restored.random().to_bits());
        }
    }

    #[test]
    fn restore_detects_tampered_fingerprint() {
        let rng = RandomService::new(77);
        let mut state = rng.state();
        state.fingerprint ^= 1;
        assert!(matches!(
            RandomService::restore(state),
            Err(RestoreError::ReproducibilityViolation { .. })
        ));
    }

    #[test]
    fn restore_rejects_zero_seed_record() {
        let state = RngState {
            seed: 0,
            word_pos: 0,
            fingerprint: 0,
        };
        assert!(matches!(
            RandomService::restore(state),
            Err(RestoreError::ReproducibilityViolation { .. })
        ));
    }

    proptest! {
        #[test]
        fn range_stays_in_bounds(seed in 1u64..u64::MAX, lo in -100.0f64..100.0, width in 0.001f64..50.0) {
            let mut rng = RandomService::new(seed);
            for _ in 0..50 {
                let v = rng.range(lo, lo + width);
                prop_assert!(v >= lo && v < lo + width);
            }
        }

        #[test]
        fn integer_is_inclusive(seed in 1u64..u64::MAX, lo in -20i64..20, span in 0i64..5) {
            let mut rng = RandomService::new(seed);
            for _ in 0..50 {
                let v = rng.integer(lo, lo + span);
                prop_assert!(v >= lo && v <= lo + span);
            }
        }
    }
}
