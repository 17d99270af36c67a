//! Packing r RLWE ciphertexts into one.
//!
//! Recursive pairwise combine: at depth d the two halves A (even leaves) and
//! B (odd leaves) merge as u + τ_t(v) with u = A + X^(2^d)·B,
//! v = A - X^(2^d)·B, where t is the depth's automorphism index
//! (5^(N/2^(d+2)), whose τ fixes every exponent multiple of 2^(d+1) and
//! negates X^(2^d) times them). Leaf k's coefficients at multiples of r
//! survive, scaled by r, at positions ≡ k (mod r).

use crate::ks::setup::PackingKey;
use crate::ks::switch::eval_auto;
use crate::math::crt::RnsContext;
use crate::math::modular::ModArith;
use crate::math::permute::PermTables;
use crate::math::poly::{Poly, PolyForm};
use crate::rlwe::types::RlweCiphertext;

use super::error::{pir_err, Result};

/// Multiplies a coefficient-form polynomial by X^shift.
fn shift_poly(poly: &Poly, shift: usize) -> Poly {
    assert_eq!(poly.form(), PolyForm::Coeff, "shift needs coefficient form");
    let n = poly.dimension();
    let q = poly.modulus();
    let mut out = vec![0u64; n];
    for i in 0..n {
        let target = i + shift;
        if target < n {
            out[target] = poly.coeff(i);
        } else {
            out[target - n] = ModArith::neg(poly.coeff(i), q);
        }
    }
    Poly::from_coeffs(out, poly.moduli())
}

fn shift_ciphertext(ct: &RlweCiphertext, shift: usize) -> RlweCiphertext {
    RlweCiphertext::from_parts(shift_poly(&ct.a, shift), shift_poly(&ct.b, shift))
}

fn pack_level(
    cts: &[RlweCiphertext],
    depth: usize,
    key: &PackingKey,
    tables: &PermTables,
    ctx: &RnsContext,
) -> RlweCiphertext {
    if cts.len() == 1 {
        return cts[0].clone();
    }
    let evens: Vec<RlweCiphertext> = cts.iter().step_by(2).cloned().collect();
    let odds: Vec<RlweCiphertext> = cts.iter().skip(1).step_by(2).cloned().collect();

    let a = pack_level(&evens, depth + 1, key, tables, ctx);
    let b = pack_level(&odds, depth + 1, key, tables, ctx);

    let shifted = shift_ciphertext(&b, 1 << depth);
    let u = a.add(&shifted);
    let v = a.sub(&shifted);

    let t = key.depth_indices[depth];
    let ks = key
        .auto_key
        .get(t)
        .expect("packing key missing a depth index");
    u.add(&eval_auto(&v, t, ks, tables, ctx))
}

/// Packs r = 2^d coefficient-form ciphertexts into one.
///
/// # Errors
///
/// Rejects a count that is not a power of two or does not match the key.
pub fn pack_rlwes(
    cts: &[RlweCiphertext],
    key: &PackingKey,
    tables: &PermTables,
    ctx: &RnsContext,
) -> Result<RlweCiphertext> {
    if cts.is_empty() || !cts.len().is_power_of_two() {
        return Err(pir_err!("can only pack a power-of-two count, got {}", cts.len()));
    }
    if cts.len().trailing_zeros() as usize != key.depth_indices.len() {
        return Err(pir_err!(
            "packing key supports 2^{} inputs, got {}",
            key.depth_indices.len(),
            cts.len()
        ));
    }
    if cts.iter().any(|ct| ct.is_ntt()) {
        return Err(pir_err!("packing expects coefficient-form inputs"));
    }
    Ok(pack_level(cts, 0, key, tables, ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::poly::Moduli;
    use crate::math::sampler::GaussianSampler;
    use crate::params::{ParamSet, PirParams};
    use crate::rlwe::enc::encrypt;
    use crate::rlwe::types::RlweSecretKey;

    fn setup(r: usize) -> (PirParams, RnsContext, PermTables, RlweSecretKey, GaussianSampler) {
        let params = PirParams::new(ParamSet::N256, r, 8).unwrap();
        let ctx = params.build_context();
        let tables = params.build_perm_tables();
        let mut sampler = GaussianSampler::from_seed(3.2, [95u8; 32]);
        let sk = RlweSecretKey::generate(&ctx, &mut sampler);
        (params, ctx, tables, sk, sampler)
    }

    fn encrypt_values(
        values: &[u64],
        params: &PirParams,
        sk: &RlweSecretKey,
        ctx: &RnsContext,
        sampler: &mut GaussianSampler,
    ) -> RlweCiphertext {
        let m = Moduli::for_big_q(ctx);
        let msg = Poly::from_coeffs(values.iter().map(|&v| v * params.delta()).collect(), m);
        encrypt(sk, &msg, ctx, sampler)
    }

    #[test]
    fn test_shift_poly_wraps_negacyclically() {
        let params = PirParams::new(ParamSet::N256, 2, 8).unwrap();
        let ctx = params.build_context();
        let m = Moduli::for_big_q(&ctx);
        let p = Poly::from_coeffs((1..=256u64).collect(), m);
        let s = shift_poly(&p, 2);
        assert_eq!(s.coeff(2), 1);
        assert_eq!(s.coeff(0), ctx.big_q() - 255);
        assert_eq!(s.coeff(1), ctx.big_q() - 256);
    }

    #[test]
    fn test_pack_two() {
        let (params, ctx, tables, sk, mut sampler) = setup(2);
        let key = PackingKey::generate(&sk, &params, &tables, &ctx, &mut sampler);

        let v0: Vec<u64> = (0..256u64).map(|i| (i * 3 + 1) % params.p).collect();
        let v1: Vec<u64> = (0..256u64).map(|i| (i * 5 + 2) % params.p).collect();
        let cts = vec![
            encrypt_values(&v0, &params, &sk, &ctx, &mut sampler),
            encrypt_values(&v1, &params, &sk, &ctx, &mut sampler),
        ];

        let packed = pack_rlwes(&cts, &key, &tables, &ctx).unwrap();
        let decoded = crate::pir::extract::decode_response(&params, &sk, &packed, &ctx);

        for m in 0..128 {
            assert_eq!(decoded[2 * m], v0[2 * m], "even position {m}");
            assert_eq!(decoded[2 * m + 1], v1[2 * m], "odd position {m}");
        }
    }

    #[test]
    fn test_pack_four_interleaves_in_order() {
        let (params, ctx, tables, sk, mut sampler) = setup(4);
        let key = PackingKey::generate(&sk, &params, &tables, &ctx, &mut sampler);

        let values: Vec<Vec<u64>> = (0..4u64)
            .map(|k| (0..256u64).map(|i| (i * 7 + k * 11) % params.p).collect())
            .collect();
        let cts: Vec<RlweCiphertext> = values
            .iter()
            .map(|v| encrypt_values(v, &params, &sk, &ctx, &mut sampler))
            .collect();

        let packed = pack_rlwes(&cts, &key, &tables, &ctx).unwrap();
        let decoded = crate::pir::extract::decode_response(&params, &sk, &packed, &ctx);

        for m in 0..64 {
            for k in 0..4 {
                assert_eq!(decoded[4 * m + k], values[k][4 * m], "slot {k} block {m}");
            }
        }
    }

    #[test]
    fn test_pack_rejects_wrong_count() {
        let (params, ctx, tables, sk, mut sampler) = setup(4);
        let key = PackingKey::generate(&sk, &params, &tables, &ctx, &mut sampler);
        let cts = vec![RlweCiphertext::zero(256, Moduli::for_big_q(&ctx)); 2];
        assert!(pack_rlwes(&cts, &key, &tables, &ctx).is_err());
    }
}
