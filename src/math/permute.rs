//! Index permutation tables for NTT-form automorphisms.
//!
//! Under the slot ordering of [`crate::math::ntt`] (slot k holds the
//! evaluation at ψ^(2·bitrev(k)+1)), the ring automorphism x ↦ x^t is a pure
//! permutation of slots: the output slot at exponent e takes the input slot
//! at exponent e·t mod 2N. These tables are computed once per (N, N1) and
//! reused across every query.
//!
//! The tables also expose the logical register view used by the BSGS layout:
//! the odd residues mod 2N split into the two orbits {5^k} and {-5^k} of the
//! subgroup generated by 5, each of size N/2. Position k of an orbit is the
//! slot whose exponent is ±5^k; x ↦ x^5 rotates both orbits by one position
//! simultaneously.

use super::modular::ModArith;
use super::ntt::bit_reverse;
use super::poly::{Poly, PolyForm};

/// Precomputed permutation machinery for one ring dimension.
#[derive(Clone)]
pub struct PermTables {
    n: usize,
    log_n: u32,
    /// Slot index -> evaluation exponent (odd, in [0, 2N)).
    slot_to_exp: Vec<usize>,
    /// Odd exponent e -> slot index, indexed by e >> 1.
    exp_to_slot: Vec<usize>,
    /// 5^k mod 2N for k in [0, N/2).
    pow5: Vec<usize>,
    /// Slot index -> (negative orbit?, position within orbit).
    slot_to_logical: Vec<(bool, usize)>,
}

impl PermTables {
    /// Builds the tables for ring dimension `n` (a power of two, ≥ 8).
    pub fn new(n: usize) -> Self {
        assert!(n.is_power_of_two() && n >= 8, "n must be a power of two ≥ 8");
        let log_n = n.trailing_zeros();
        let two_n = 2 * n;

        let mut slot_to_exp = vec![0usize; n];
        let mut exp_to_slot = vec![0usize; n];
        for slot in 0..n {
            let exp = (2 * bit_reverse(slot as u64, log_n) + 1) as usize;
            slot_to_exp[slot] = exp;
            exp_to_slot[exp >> 1] = slot;
        }

        let half = n / 2;
        let mut pow5 = vec![0usize; half];
        let mut acc = 1usize;
        for p in pow5.iter_mut() {
            *p = acc;
            acc = acc * 5 % two_n;
        }

        let mut slot_to_logical = vec![(false, 0usize); n];
        for (pos, &g) in pow5.iter().enumerate() {
            slot_to_logical[exp_to_slot[g >> 1]] = (false, pos);
            let neg = two_n - g;
            slot_to_logical[exp_to_slot[neg >> 1]] = (true, pos);
        }

        Self {
            n,
            log_n,
            slot_to_exp,
            exp_to_slot,
            pow5,
            slot_to_logical,
        }
    }

    pub fn dimension(&self) -> usize {
        self.n
    }

    /// The evaluation exponent of slot `i` (the `hexl_ntt_index` table:
    /// `bitrev(i) << 1 | 1`).
    #[inline]
    pub fn slot_exponent(&self, i: usize) -> usize {
        self.slot_to_exp[i]
    }

    /// 5^k mod 2N.
    #[inline]
    pub fn pow5(&self, k: usize) -> usize {
        self.pow5[k % (self.n / 2)]
    }

    /// Slot holding the logical register position `pos` of the given orbit.
    #[inline]
    pub fn slot_of_logical(&self, negative_orbit: bool, pos: usize) -> usize {
        let g = self.pow5[pos];
        let exp = if negative_orbit { 2 * self.n - g } else { g };
        self.exp_to_slot[exp >> 1]
    }

    /// Inverse of [`slot_of_logical`](Self::slot_of_logical).
    #[inline]
    pub fn logical_of_slot(&self, slot: usize) -> (bool, usize) {
        self.slot_to_logical[slot]
    }

    /// Builds the slot permutation for x ↦ x^t (t odd): `out[i] = in[perm[i]]`.
    pub fn permutation(&self, t: usize) -> Vec<u32> {
        let two_n = 2 * self.n;
        assert!(t % 2 == 1 && t < two_n, "automorphism index must be odd and < 2N");
        let mut perm = vec![0u32; self.n];
        for (i, p) in perm.iter_mut().enumerate() {
            let src_exp = self.slot_to_exp[i] * t % two_n;
            *p = self.exp_to_slot[src_exp >> 1] as u32;
        }
        perm
    }

    /// Permutation matrix for the baby steps: row i is the permutation for
    /// x ↦ x^(5^i), i in [0, n1). Row 0 is the identity.
    pub fn permutation_matrix(&self, n1: usize) -> Vec<Vec<u32>> {
        (0..n1).map(|i| self.permutation(self.pow5(i))).collect()
    }
}

/// Applies a slot permutation to every channel of an NTT-form polynomial.
pub fn permute_ntt(poly: &Poly, perm: &[u32]) -> Poly {
    assert_eq!(poly.form(), PolyForm::Ntt, "permutation needs NTT form");
    let n = poly.dimension();
    assert_eq!(perm.len(), n, "permutation length mismatch");

    let channels = poly.moduli().channels();
    let mut vals = vec![0u64; poly.vals().len()];
    for c in 0..channels {
        let src = &poly.vals()[c * n..(c + 1) * n];
        let dst = &mut vals[c * n..(c + 1) * n];
        for i in 0..n {
            dst[i] = src[perm[i] as usize];
        }
    }
    Poly::from_ntt_vals(vals, n, poly.moduli())
}

/// Coefficient-domain automorphism x ↦ x^t: index map with negacyclic sign
/// flips. Used on secrets at key generation and on the packing path.
pub fn automorphism_coeff(poly: &Poly, t: usize) -> Poly {
    assert_eq!(poly.form(), PolyForm::Coeff, "expected coefficient form");
    let n = poly.dimension();
    let q = poly.modulus();
    let two_n = 2 * n;
    debug_assert!(t % 2 == 1, "automorphism index must be odd");

    let mut out = vec![0u64; n];
    for i in 0..n {
        let c = poly.coeff(i);
        if c == 0 {
            continue;
        }
        let idx = i * t % two_n;
        if idx < n {
            out[idx] = ModArith::add(out[idx], c, q);
        } else {
            out[idx - n] = ModArith::sub(out[idx - n], c, q);
        }
    }
    Poly::from_coeffs(out, poly.moduli())
}
