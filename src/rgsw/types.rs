//! RGSW ciphertexts and gadget decomposition.
//!
//! The gadget is a top-aligned digit window: ℓ digits of B_g bits each,
//! starting `offset` bits up from the bottom of the target modulus. Bits
//! below the window are rounded away (the approximate gadget the column
//! query uses: ℓ=2, B_g=2^18 over Q leaves a 2^20 cutoff). Digits are
//! balanced, in [-B_g/2, B_g/2).

use serde::{Deserialize, Serialize};

use crate::math::crt::RnsContext;
use crate::math::modular::ModArith;
use crate::math::poly::{Moduli, Poly, PolyForm};
use crate::math::sampler::GaussianSampler;
use crate::params::GadgetConfig;
use crate::rlwe::types::{RlweCiphertext, RlweSecretKey};

/// Gadget vector g_i = 2^offset · B_g^i, i in [0, ℓ).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GadgetVector {
    /// Number of digits ℓ.
    pub len: usize,
    /// Digit width in bits.
    pub bg_bits: u32,
    /// Low cutoff in bits; rounding error is bounded by 2^(offset-1).
    pub offset_bits: u32,
}

impl GadgetVector {
    /// Builds the gadget for a target modulus of `modulus_bits` bits: the
    /// digit window is aligned to the top, the cutoff absorbs the rest.
    pub fn for_modulus_bits(config: GadgetConfig, modulus_bits: u32) -> Self {
        let window = config.len as u32 * config.bg_bits;
        Self {
            len: config.len,
            bg_bits: config.bg_bits,
            offset_bits: modulus_bits.saturating_sub(window),
        }
    }

    /// The digit base B_g.
    #[inline]
    pub fn base(&self) -> i128 {
        1i128 << self.bg_bits
    }

    /// g_i reduced mod m.
    pub fn power_mod(&self, i: usize, m: u64) -> u64 {
        let shift = self.offset_bits + i as u32 * self.bg_bits;
        ModArith::pow(2, shift as u64, m)
    }

    /// All ℓ powers reduced mod m.
    pub fn powers_mod(&self, m: u64) -> Vec<u64> {
        (0..self.len).map(|i| self.power_mod(i, m)).collect()
    }

    /// Balanced digits of a centered value: returns ℓ digits d_i with
    /// Σ d_i·g_i = x - rounding, |rounding| ≤ 2^(offset-1).
    pub fn decompose_value(&self, x: i128) -> Vec<i64> {
        let half_step = if self.offset_bits > 0 {
            1i128 << (self.offset_bits - 1)
        } else {
            0
        };
        let mut shifted = (x + half_step) >> self.offset_bits;

        let base = self.base();
        let half = base >> 1;
        let mut digits = vec![0i64; self.len];
        for d in digits.iter_mut() {
            let mut digit = shifted.rem_euclid(base);
            if digit >= half {
                digit -= base;
            }
            *d = digit as i64;
            shifted = (shifted - digit) / base;
        }
        // Residual carry from the balanced representation folds into the
        // top digit (costs at most one extra base in magnitude).
        if shifted != 0 {
            digits[self.len - 1] += (shifted * base) as i64;
        }
        digits
    }
}

/// Decomposes a coefficient-form polynomial into ℓ digit polynomials with
/// coefficients lifted into the polynomial's own modulus.
pub fn gadget_decompose(poly: &Poly, gadget: &GadgetVector) -> Vec<Poly> {
    assert_eq!(poly.form(), PolyForm::Coeff, "decompose needs coefficient form");
    let dim = poly.dimension();
    let q = poly.modulus();
    let moduli = poly.moduli();

    let mut digit_coeffs = vec![vec![0u64; dim]; gadget.len];
    for j in 0..dim {
        let centered = ModArith::to_signed(poly.coeff(j), q) as i128;
        let digits = gadget.decompose_value(centered);
        for (i, &d) in digits.iter().enumerate() {
            digit_coeffs[i][j] = ModArith::from_signed(d, q);
        }
    }
    digit_coeffs
        .into_iter()
        .map(|c| Poly::from_coeffs(c, moduli))
        .collect()
}

/// RGSW ciphertext: 2ℓ RLWE rows.
///
/// Rows 0..ℓ decrypt to msg·g_i·s (the message rides on the `a` part), rows
/// ℓ..2ℓ decrypt to msg·g_i. This layout makes the external product a plain
/// digit contraction against the rows.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RgswCiphertext {
    pub rows: Vec<RlweCiphertext>,
    pub gadget: GadgetVector,
}

impl RgswCiphertext {
    /// Encrypts a message polynomial (typically a signed monomial X^(-w)).
    pub fn encrypt(
        sk: &RlweSecretKey,
        message: &Poly,
        gadget: GadgetVector,
        ctx: &RnsContext,
        sampler: &mut GaussianSampler,
    ) -> Self {
        let dim = sk.ring_dim();
        let moduli = message.moduli();
        let q = moduli.composed();
        let ell = gadget.len;
        let powers = gadget.powers_mod(q);

        let mut rows = Vec::with_capacity(2 * ell);

        for i in 0..ell {
            let a_rand = Poly::random(dim, moduli, sampler);
            let e = Poly::sample_gaussian(dim, moduli, sampler);
            let a_s = a_rand.mul_ntt(&sk.poly, ctx);
            let b = &(-&a_s) + &e;
            let a = &a_rand + &message.scalar_mul(powers[i]);
            rows.push(RlweCiphertext::from_parts(a, b));
        }

        for i in 0..ell {
            let a = Poly::random(dim, moduli, sampler);
            let e = Poly::sample_gaussian(dim, moduli, sampler);
            let a_s = a.mul_ntt(&sk.poly, ctx);
            let b = &(&(-&a_s) + &e) + &message.scalar_mul(powers[i]);
            rows.push(RlweCiphertext::from_parts(a, b));
        }

        Self { rows, gadget }
    }

    pub fn ring_dim(&self) -> usize {
        self.rows[0].ring_dim()
    }

    pub fn gadget_len(&self) -> usize {
        self.gadget.len
    }

    /// Interop bytes: 2ℓ RLWEs in row order, each a‖b.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for row in &self.rows {
            out.extend_from_slice(&row.to_bytes());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const Q1: u64 = 268369921;
    const Q2: u64 = 249561089;
    const PBS: u64 = 16760833;

    fn ctx() -> RnsContext {
        RnsContext::new(256, Q1, Q2, PBS)
    }

    fn modulus_bits(q: u64) -> u32 {
        64 - q.leading_zeros()
    }

    #[test]
    fn test_gadget_offset_derivation() {
        let q = Q1 * Q2;
        // The column-query gadget: 2 digits of 18 bits over a 56-bit Q
        // leaves the 2^20 cutoff.
        let g = GadgetVector::for_modulus_bits(GadgetConfig { len: 2, bg_bits: 18 }, modulus_bits(q));
        assert_eq!(g.offset_bits, 20);
        // The packing gadget covers Q fully.
        let g = GadgetVector::for_modulus_bits(GadgetConfig { len: 4, bg_bits: 14 }, modulus_bits(q));
        assert_eq!(g.offset_bits, 0);
    }

    #[test]
    fn test_decompose_value_bounds() {
        let g = GadgetVector {
            len: 3,
            bg_bits: 17,
            offset_bits: 5,
        };
        for x in [0i128, 1, -1, 123456789, -987654321, (1i128 << 55) - 3] {
            let digits = g.decompose_value(x);
            assert_eq!(digits.len(), 3);
            let mut acc: i128 = 0;
            for (i, &d) in digits.iter().enumerate() {
                acc += d as i128 * (1i128 << (5 + 17 * i as u32));
                if i < 2 {
                    assert!(d.unsigned_abs() <= 1 << 16, "digit {d} too large");
                }
            }
            assert!((acc - x).abs() <= 1 << 4, "rounding too large for {x}");
        }
    }

    #[test]
    fn test_gadget_decompose_reconstructs() {
        let ctx = ctx();
        let m = Moduli::for_big_q(&ctx);
        let q = ctx.big_q();
        let g = GadgetVector::for_modulus_bits(GadgetConfig { len: 4, bg_bits: 14 }, modulus_bits(q));

        let mut sampler = GaussianSampler::from_seed(3.2, [31u8; 32]);
        let poly = Poly::random(256, m, &mut sampler);
        let digits = gadget_decompose(&poly, &g);

        let mut acc = Poly::zero(256, m);
        for (i, dp) in digits.iter().enumerate() {
            acc += &dp.scalar_mul(g.power_mod(i, q));
        }
        let diff = &acc - &poly;
        // offset 0: the reconstruction is exact.
        assert!(diff.is_zero(), "max err {}", diff.linf_norm());
    }

    #[test]
    fn test_rgsw_row_structure() {
        let ctx = ctx();
        let m = Moduli::for_big_q(&ctx);
        let q = ctx.big_q();
        let g = GadgetVector::for_modulus_bits(GadgetConfig { len: 2, bg_bits: 18 }, modulus_bits(q));
        let mut sampler = GaussianSampler::from_seed(3.2, [32u8; 32]);
        let sk = RlweSecretKey::generate(&ctx, &mut sampler);

        let msg = Poly::monomial(1, 256, m);
        let rgsw = RgswCiphertext::encrypt(&sk, &msg, g, &ctx, &mut sampler);
        assert_eq!(rgsw.rows.len(), 4);

        // Rows ℓ..2ℓ decrypt to msg·g_i + e.
        for i in 0..2 {
            let phase = crate::rlwe::enc::decrypt_phase(&rgsw.rows[2 + i], &sk, &ctx);
            let expected = msg.scalar_mul(g.power_mod(i, q));
            let diff = &phase - &expected;
            assert!(diff.linf_norm() < 64, "row {i} noise {}", diff.linf_norm());
        }
    }
}
