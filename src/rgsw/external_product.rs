//! External product RGSW ⊠ RLWE → RLWE.

use crate::math::crt::RnsContext;
use crate::math::poly::{Poly, PolyForm};
use crate::rlwe::types::RlweCiphertext;

use super::types::{gadget_decompose, RgswCiphertext};

/// Computes RLWE(μ) ⊠ RGSW(m) → RLWE(μ·m).
///
/// Both parts of the input are gadget-decomposed and contracted against the
/// 2ℓ rows: digits of `a` against rows 0..ℓ, digits of `b` against rows
/// ℓ..2ℓ. The result carries μ·m with noise bounded by the digit size times
/// the row noise plus the cutoff rounding.
///
/// # Panics
///
/// Panics if the input is not in coefficient form or dimensions mismatch.
pub fn external_product(
    rlwe: &RlweCiphertext,
    rgsw: &RgswCiphertext,
    ctx: &RnsContext,
) -> RlweCiphertext {
    assert_eq!(rlwe.form(), PolyForm::Coeff, "external product needs coefficient form");
    let dim = rlwe.ring_dim();
    assert_eq!(rgsw.ring_dim(), dim, "RGSW dimension mismatch");
    let ell = rgsw.gadget_len();
    assert_eq!(rgsw.rows.len(), 2 * ell, "RGSW must have 2ℓ rows");

    let a_digits = gadget_decompose(&rlwe.a, &rgsw.gadget);
    let b_digits = gadget_decompose(&rlwe.b, &rgsw.gadget);

    let mut result_a = Poly::zero(dim, rlwe.moduli());
    let mut result_b = Poly::zero(dim, rlwe.moduli());

    for i in 0..ell {
        let row_a = &rgsw.rows[i];
        result_a += &a_digits[i].mul_ntt(&row_a.a, ctx);
        result_b += &a_digits[i].mul_ntt(&row_a.b, ctx);

        let row_b = &rgsw.rows[ell + i];
        result_a += &b_digits[i].mul_ntt(&row_b.a, ctx);
        result_b += &b_digits[i].mul_ntt(&row_b.b, ctx);
    }

    RlweCiphertext::from_parts(result_a, result_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::crt::RnsContext;
    use crate::math::poly::Moduli;
    use crate::math::sampler::GaussianSampler;
    use crate::params::GadgetConfig;
    use crate::rgsw::types::GadgetVector;
    use crate::rlwe::enc::{decrypt, encrypt};
    use crate::rlwe::types::RlweSecretKey;

    const Q1: u64 = 268369921;
    const Q2: u64 = 249561089;
    const PBS: u64 = 16760833;
    const P: u64 = 7681;

    fn setup() -> (RnsContext, RlweSecretKey, GaussianSampler, GadgetVector) {
        let ctx = RnsContext::new(256, Q1, Q2, PBS);
        let mut sampler = GaussianSampler::from_seed(3.2, [41u8; 32]);
        let sk = RlweSecretKey::generate(&ctx, &mut sampler);
        let bits = 64 - (Q1 * Q2).leading_zeros();
        let gadget = GadgetVector::for_modulus_bits(GadgetConfig { len: 2, bg_bits: 18 }, bits);
        (ctx, sk, sampler, gadget)
    }

    #[test]
    fn test_external_product_by_one() {
        let (ctx, sk, mut sampler, gadget) = setup();
        let m = Moduli::for_big_q(&ctx);
        let delta = ctx.big_q() / P;

        let values: Vec<u64> = (0..256u64).map(|i| i % P).collect();
        let msg = Poly::from_coeffs(values.iter().map(|&v| v * delta).collect(), m);
        let ct = encrypt(&sk, &msg, &ctx, &mut sampler);

        let one = Poly::constant(1, 256, m);
        let rgsw = crate::rgsw::types::RgswCiphertext::encrypt(&sk, &one, gadget, &ctx, &mut sampler);

        let out = external_product(&ct, &rgsw, &ctx);
        assert_eq!(decrypt(&out, &sk, P, &ctx), values);
    }

    #[test]
    fn test_external_product_inverse_monomial_shift() {
        // RGSW(X^(-w)) rotates coefficients down by w with negacyclic wrap.
        let (ctx, sk, mut sampler, gadget) = setup();
        let m = Moduli::for_big_q(&ctx);
        let delta = ctx.big_q() / P;
        let w = 3usize;

        let values: Vec<u64> = (0..256u64).map(|i| (i * 11) % P).collect();
        let msg = Poly::from_coeffs(values.iter().map(|&v| v * delta).collect(), m);
        let ct = encrypt(&sk, &msg, &ctx, &mut sampler);

        // X^(-w) = -X^(256-w).
        let inv_mono = Poly::monomial(2 * 256 - w, 256, m);
        let rgsw =
            crate::rgsw::types::RgswCiphertext::encrypt(&sk, &inv_mono, gadget, &ctx, &mut sampler);

        let out = external_product(&ct, &rgsw, &ctx);
        let decoded = decrypt(&out, &sk, P, &ctx);

        for i in 0..256 {
            let src = (i + w) % 256;
            let negate = i + w >= 256;
            let expected = if negate {
                (P - values[src]) % P
            } else {
                values[src]
            };
            assert_eq!(decoded[i], expected, "coefficient {i}");
        }
    }

    #[test]
    fn test_external_product_by_zero() {
        let (ctx, sk, mut sampler, gadget) = setup();
        let m = Moduli::for_big_q(&ctx);
        let delta = ctx.big_q() / P;

        let msg = Poly::from_coeffs((0..256u64).map(|v| (v % P) * delta).collect(), m);
        let ct = encrypt(&sk, &msg, &ctx, &mut sampler);

        let zero = Poly::zero(256, m);
        let rgsw = crate::rgsw::types::RgswCiphertext::encrypt(&sk, &zero, gadget, &ctx, &mut sampler);

        let out = external_product(&ct, &rgsw, &ctx);
        let decoded = decrypt(&out, &sk, P, &ctx);
        assert!(decoded.iter().all(|&v| v == 0));
    }
}
