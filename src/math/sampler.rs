//! Noise and randomness sampling.
//!
//! All randomness is drawn from a seedable ChaCha20 stream so that protocol
//! tests can be made deterministic. Error terms use a rounded Gaussian;
//! secrets are ternary.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Discrete-Gaussian-style sampler backed by a CSPRNG.
///
/// # Example
///
/// ```
/// use kspir::math::sampler::GaussianSampler;
///
/// let mut sampler = GaussianSampler::from_seed(3.2, [7u8; 32]);
/// let e = sampler.sample();
/// assert!(e.abs() < 40);
/// ```
pub struct GaussianSampler {
    rng: ChaCha20Rng,
    sigma: f64,
}

impl GaussianSampler {
    /// Creates a sampler with entropy from the OS.
    pub fn new(sigma: f64) -> Self {
        Self {
            rng: ChaCha20Rng::from_entropy(),
            sigma,
        }
    }

    /// Creates a deterministic sampler from a fixed seed.
    pub fn from_seed(sigma: f64, seed: [u8; 32]) -> Self {
        Self {
            rng: ChaCha20Rng::from_seed(seed),
            sigma,
        }
    }

    /// Samples one error term: a continuous Gaussian rounded to the nearest
    /// integer (Box-Muller over the ChaCha stream).
    pub fn sample(&mut self) -> i64 {
        let u1: f64 = loop {
            let v = self.rng.gen::<f64>();
            if v > f64::EPSILON {
                break v;
            }
        };
        let u2: f64 = self.rng.gen();
        let mag = self.sigma * (-2.0 * u1.ln()).sqrt();
        (mag * (2.0 * std::f64::consts::PI * u2).cos()).round() as i64
    }

    /// Samples `dim` error terms lifted into [0, m).
    pub fn sample_vec_centered(&mut self, dim: usize, m: u64) -> Vec<u64> {
        (0..dim)
            .map(|_| {
                let e = self.sample();
                crate::math::modular::ModArith::from_signed(e, m)
            })
            .collect()
    }

    /// Samples a ternary coefficient in {-1, 0, 1}.
    pub fn sample_ternary(&mut self) -> i64 {
        self.rng.gen_range(-1i64..=1)
    }

    /// Samples a uniform residue in [0, m).
    pub fn sample_uniform(&mut self, m: u64) -> u64 {
        self.rng.gen_range(0..m)
    }

    /// Fills `out` with uniform residues in [0, m).
    pub fn sample_uniform_vec(&mut self, out: &mut [u64], m: u64) {
        for v in out.iter_mut() {
            *v = self.rng.gen_range(0..m);
        }
    }
}
