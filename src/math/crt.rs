//! CRT/RNS layer over the (q1, q2) ciphertext moduli and the auxiliary
//! key-switching modulus p_bs.
//!
//! The ciphertext modulus Q = q1·q2 never exists as a single machine word in
//! hot paths; polynomials mod Q live as (q1, q2) residue channels and are
//! recomposed only where coefficient-domain values are needed (gadget
//! decomposition, decoding). Key switching extends precision to Q·p_bs and
//! folds back down by an exact rescale with centered p_bs remainders.

use super::modular::{two64_mod, ModArith};
use super::ntt::NttTable;

/// Computes a modular inverse by the extended Euclidean algorithm.
///
/// Returns `x` such that `(a * x) % modulus == 1`.
///
/// # Panics
///
/// Panics if `a` is not invertible modulo `modulus`.
pub fn mod_inverse(a: u64, modulus: u64) -> u64 {
    let mut t: i128 = 0;
    let mut new_t: i128 = 1;
    let mut r: i128 = modulus as i128;
    let mut new_r: i128 = (a % modulus) as i128;

    while new_r != 0 {
        let quotient = r / new_r;
        let tmp_t = t - quotient * new_t;
        t = new_t;
        new_t = tmp_t;

        let tmp_r = r - quotient * new_r;
        r = new_r;
        new_r = tmp_r;
    }

    if r != 1 {
        panic!("mod_inverse: value is not invertible");
    }
    if t < 0 {
        t += modulus as i128;
    }
    t as u64
}

/// Composes two CRT residues into a value modulo q0·q1.
///
/// Formula: `x = a0 + q0 * ((a1 - a0) * q0^(-1) mod q1)`.
pub fn crt_compose_2(a0: u64, a1: u64, q0: u64, q1: u64, q0_inv_mod_q1: u64) -> u64 {
    let a0_mod_q1 = a0 % q1;
    let diff = if a1 >= a0_mod_q1 {
        a1 - a0_mod_q1
    } else {
        a1 + q1 - a0_mod_q1
    };
    let t = ((diff as u128 * q0_inv_mod_q1 as u128) % q1 as u128) as u64;
    a0 + q0 * t
}

/// Splits a value modulo q0·q1 into its two residues.
#[inline]
pub fn crt_split_2(value: u64, q0: u64, q1: u64) -> (u64, u64) {
    (value % q0, value % q1)
}

/// Shared RNS context: the two Q channels, the auxiliary channel, their NTT
/// tables and every derived constant the kernel needs. Built once per
/// parameter set and shared behind the `Params` record.
#[derive(Clone)]
pub struct RnsContext {
    n: usize,
    q1: u64,
    q2: u64,
    /// Q = q1·q2, fits in a u64 for all supported sets.
    big_q: u64,
    p_bs: u64,
    q1_inv_mod_q2: u64,
    /// Q^(-1) mod p_bs, for lifting into the Q·p_bs channel pair.
    q_inv_mod_bs: u64,
    /// p_bs^(-1) mod Q, for folding Q·p_bs back down to Q.
    bs_inv_mod_q: u64,
    /// 2^64 mod q1 / q2 for 128-bit accumulator reduction.
    two64_q1: u64,
    two64_q2: u64,
    ntt_q1: NttTable,
    ntt_q2: NttTable,
    ntt_bs: NttTable,
}

impl RnsContext {
    /// Builds the context for dimension `n` over moduli (q1, q2, p_bs).
    ///
    /// All inverse and reduction constants are derived here rather than
    /// carried as opaque numbers.
    ///
    /// # Panics
    ///
    /// Panics if any modulus is not ≡ 1 (mod 2n) or the moduli are not
    /// pairwise coprime.
    pub fn new(n: usize, q1: u64, q2: u64, p_bs: u64) -> Self {
        let big_q = q1
            .checked_mul(q2)
            .expect("q1*q2 must fit in a u64");

        let q1_inv_mod_q2 = mod_inverse(q1, q2);
        let q_inv_mod_bs = mod_inverse(big_q % p_bs, p_bs);
        let bs_inv_mod_q = {
            // CRT over the channels: p_bs^(-1) mod q1 and mod q2, recomposed.
            let inv1 = mod_inverse(p_bs % q1, q1);
            let inv2 = mod_inverse(p_bs % q2, q2);
            crt_compose_2(inv1, inv2, q1, q2, q1_inv_mod_q2)
        };

        Self {
            n,
            q1,
            q2,
            big_q,
            p_bs,
            q1_inv_mod_q2,
            q_inv_mod_bs,
            bs_inv_mod_q,
            two64_q1: two64_mod(q1),
            two64_q2: two64_mod(q2),
            ntt_q1: NttTable::new(n, q1),
            ntt_q2: NttTable::new(n, q2),
            ntt_bs: NttTable::new(n, p_bs),
        }
    }

    pub fn dimension(&self) -> usize {
        self.n
    }

    pub fn q1(&self) -> u64 {
        self.q1
    }

    pub fn q2(&self) -> u64 {
        self.q2
    }

    /// The composed ciphertext modulus Q = q1·q2.
    pub fn big_q(&self) -> u64 {
        self.big_q
    }

    /// The auxiliary key-switching modulus.
    pub fn p_bs(&self) -> u64 {
        self.p_bs
    }

    pub fn ntt_q1(&self) -> &NttTable {
        &self.ntt_q1
    }

    pub fn ntt_q2(&self) -> &NttTable {
        &self.ntt_q2
    }

    pub fn ntt_bs(&self) -> &NttTable {
        &self.ntt_bs
    }

    /// 2^64 mod q1 (for [`crate::math::modular::reduce_u128`]).
    pub fn two64_q1(&self) -> u64 {
        self.two64_q1
    }

    /// 2^64 mod q2.
    pub fn two64_q2(&self) -> u64 {
        self.two64_q2
    }

    /// Splits a value mod Q into its (q1, q2) residues.
    #[inline]
    pub fn split(&self, value: u64) -> (u64, u64) {
        debug_assert!(value < self.big_q, "value must be reduced mod Q");
        crt_split_2(value, self.q1, self.q2)
    }

    /// Recomposes (x mod q1, y mod q2) into the value mod Q.
    #[inline]
    pub fn compose(&self, x: u64, y: u64) -> u64 {
        crt_compose_2(x, y, self.q1, self.q2, self.q1_inv_mod_q2)
    }

    /// Lifts (value mod Q, value mod p_bs) into the unique value mod Q·p_bs.
    #[inline]
    pub fn compose_q_bs(&self, x_q: u64, x_bs: u64) -> u128 {
        let x_q_mod_bs = x_q % self.p_bs;
        let diff = ModArith::sub(x_bs, x_q_mod_bs, self.p_bs);
        let t = ModArith::mul(diff, self.q_inv_mod_bs, self.p_bs);
        x_q as u128 + self.big_q as u128 * t as u128
    }

    /// Folds a Q·p_bs residue pair down to Q: computes round(X / p_bs) mod Q
    /// where X is the composed value, via the centered p_bs remainder.
    #[inline]
    pub fn rescale_q_bs(&self, x_q: u64, x_bs: u64) -> u64 {
        let centered = ModArith::to_signed(x_bs, self.p_bs);
        let lifted = ModArith::from_signed(centered, self.big_q);
        let diff = ModArith::sub(x_q, lifted, self.big_q);
        ModArith::mul(diff, self.bs_inv_mod_q, self.big_q)
    }

    /// Centered reduction of a mod-Q value into the p_bs channel.
    #[inline]
    pub fn reduce_to_bs(&self, x_q: u64) -> u64 {
        let centered = ModArith::to_signed(x_q, self.big_q);
        ModArith::from_signed(centered, self.p_bs)
    }
}
