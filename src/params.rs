//! Parameter sets for the BSGS PIR scheme.
//!
//! Everything is keyed by a frozen [`ParamSet`] selector: the ring dimension,
//! the two ~28-bit NTT-friendly ciphertext primes q1 and q2 (Q = q1·q2), the
//! ~24-bit auxiliary key-switching modulus p_bs, and the plaintext modulus p
//! of the BSGS path. Derived constants (Δ, N2, modular inverses, roots of
//! unity) are computed at startup, never hard-coded.
//!
//! # Example
//!
//! ```
//! use kspir::params::{ParamSet, PirParams};
//!
//! let params = PirParams::new(ParamSet::N256, 2, 8).unwrap();
//! assert_eq!(params.n2, 16);
//! assert!(params.delta() > 1 << 40);
//! ```

use serde::{Deserialize, Serialize};

use crate::math::crt::RnsContext;
use crate::math::permute::PermTables;

/// First ciphertext prime, 2^28 - 2^16 + 1 (≡ 1 mod 2N for N up to 2^15).
pub const Q1: u64 = 268369921;
/// Second ciphertext prime for N ≤ 2048, 2^28 - 2^21 - 2^12 + 1.
pub const Q2: u64 = 249561089;
/// Second ciphertext prime for N = 4096, 2^28 - 2^16 - 2^13 + 1.
///
/// 249561089 - 1 has 2-adic valuation 12, so no length-4096 negacyclic NTT
/// exists for it; the N4096 set uses this ≡ 1 (mod 8192) prime instead.
pub const Q2_4096: u64 = 268361729;
/// Auxiliary key-switching modulus, 2^24 - 2^14 + 1.
pub const P_BS: u64 = 16760833;

/// Frozen parameter-set selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamSet {
    /// N = 256, test-sized rings.
    N256,
    /// N = 2048.
    N2048,
    /// N = 4096, the default production set.
    N4096,
}

impl ParamSet {
    /// Ring dimension.
    pub fn ring_dim(&self) -> usize {
        match self {
            ParamSet::N256 => 256,
            ParamSet::N2048 => 2048,
            ParamSet::N4096 => 4096,
        }
    }

    /// Plaintext modulus of the BSGS path for this set.
    pub fn plaintext_modulus(&self) -> u64 {
        match self {
            ParamSet::N256 => 7681,
            ParamSet::N2048 => 40961,
            ParamSet::N4096 => 65537,
        }
    }

    /// The ciphertext prime pair (q1, q2) for this set.
    pub fn moduli(&self) -> (u64, u64) {
        match self {
            ParamSet::N256 | ParamSet::N2048 => (Q1, Q2),
            ParamSet::N4096 => (Q1, Q2_4096),
        }
    }
}

/// Gadget decomposition configuration: `len` digits of `bg_bits` bits each,
/// aligned to the top of the target modulus (bits below the window are
/// rounded away).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GadgetConfig {
    /// Number of digits ℓ.
    pub len: usize,
    /// Digit width in bits (B_g = 2^bg_bits).
    pub bg_bits: u32,
}

/// Validated protocol parameters.
///
/// Cheap to clone; the heavyweight shared state (NTT tables, permutation
/// tables) lives in [`RnsContext`] / [`PermTables`] built once through
/// [`PirParams::build_context`] and [`PirParams::build_perm_tables`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PirParams {
    /// Selected parameter set.
    pub set: ParamSet,
    /// Ring dimension N.
    pub n: usize,
    /// Baby-step count N1.
    pub n1: usize,
    /// Giant-step count N2 = N / (2·N1).
    pub n2: usize,
    /// Number of packed database matrices.
    pub r: usize,
    /// Plaintext modulus p.
    pub p: u64,
    /// Gaussian parameter for error sampling.
    pub sigma: f64,
    /// Gadget for the BSGS automorphism keys.
    pub auto_gadget: GadgetConfig,
    /// Gadget for the RGSW column query.
    pub rgsw_gadget: GadgetConfig,
    /// Gadget for the packing key.
    pub pack_gadget: GadgetConfig,
    /// Worker-pool width for the server kernel.
    pub threads: usize,
}

impl PirParams {
    /// Creates and validates parameters for `set` with `r` packed matrices
    /// and baby-step count `n1`.
    ///
    /// # Errors
    ///
    /// Returns a description of the violated constraint: N1 must divide N/2
    /// exactly, r must be a power of two dividing N.
    pub fn new(set: ParamSet, r: usize, n1: usize) -> Result<Self, &'static str> {
        let n = set.ring_dim();
        let params = Self {
            set,
            n,
            n1,
            n2: if n1 > 0 { n / 2 / n1 } else { 0 },
            r,
            p: set.plaintext_modulus(),
            sigma: 3.2,
            auto_gadget: GadgetConfig { len: 3, bg_bits: 17 },
            rgsw_gadget: GadgetConfig { len: 2, bg_bits: 18 },
            pack_gadget: GadgetConfig { len: 4, bg_bits: 14 },
            threads: 16,
        };
        params.validate()?;
        Ok(params)
    }

    /// Checks every structural constraint.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.n.is_power_of_two() {
            return Err("N must be a power of two");
        }
        if self.n1 == 0 || self.n1 > self.n / 2 {
            return Err("N1 must be in [1, N/2]");
        }
        if (self.n / 2) % self.n1 != 0 {
            return Err("N1 must divide N/2 exactly");
        }
        if self.r == 0 || !self.r.is_power_of_two() {
            return Err("r must be a nonzero power of two");
        }
        if self.n % self.r != 0 {
            return Err("r must divide N");
        }
        if self.r > self.n / 4 {
            return Err("r too large for the packing tree");
        }
        let two_n = 2 * self.n as u64;
        let (q1, q2) = self.set.moduli();
        if q1 % two_n != 1 || q2 % two_n != 1 || P_BS % two_n != 1 {
            return Err("moduli must be ≡ 1 (mod 2N)");
        }
        if self.p % two_n != 1 {
            return Err("plaintext modulus must be ≡ 1 (mod 2N)");
        }
        Ok(())
    }

    /// The composed ciphertext modulus Q = q1·q2.
    pub fn big_q(&self) -> u64 {
        let (q1, q2) = self.set.moduli();
        q1 * q2
    }

    /// Scaling factor Δ = ⌊Q/p⌋.
    pub fn delta(&self) -> u64 {
        self.big_q() / self.p
    }

    /// Builds the shared RNS/NTT context for this parameter set.
    pub fn build_context(&self) -> RnsContext {
        let (q1, q2) = self.set.moduli();
        RnsContext::new(self.n, q1, q2, P_BS)
    }

    /// Builds the permutation tables for this ring dimension.
    pub fn build_perm_tables(&self) -> PermTables {
        PermTables::new(self.n)
    }
}
