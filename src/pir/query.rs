//! Client query encoding.
//!
//! The column query is an RLWE (Q, p_bs) pair encrypting Δ times the
//! selector that is one-hot, in the evaluation domain, at the target
//! column's logical position in both orbits. The packing-row query is an
//! RGSW encryption of X^(-w).

use crate::math::crt::RnsContext;
use crate::math::permute::PermTables;
use crate::math::poly::{Moduli, Poly};
use crate::math::sampler::GaussianSampler;
use crate::params::PirParams;
use crate::rgsw::types::{GadgetVector, RgswCiphertext};
use crate::rlwe::enc::encrypt_rns;
use crate::rlwe::types::{RlweSecretKey, RnsRlweCiphertext};

use super::error::{pir_err, Result};

/// Encodes the column selector for `target_col` in [0, N/2).
///
/// Returns the pair in NTT form, ready for the kernel.
pub fn encode_query(
    params: &PirParams,
    sk: &RlweSecretKey,
    target_col: usize,
    ctx: &RnsContext,
    tables: &PermTables,
    sampler: &mut GaussianSampler,
) -> Result<RnsRlweCiphertext> {
    let n = params.n;
    if target_col >= n / 2 {
        return Err(pir_err!("target column {target_col} out of range"));
    }

    // Δ at the target's slot in both orbits, zero elsewhere; the message is
    // the inverse NTT of that slot vector.
    let delta = params.delta();
    let (q1, q2) = (ctx.q1(), ctx.q2());
    let mut slots = vec![0u64; 2 * n];
    for neg in [false, true] {
        let slot = tables.slot_of_logical(neg, target_col);
        slots[slot] = delta % q1;
        slots[n + slot] = delta % q2;
    }
    let mut msg = Poly::from_ntt_vals(slots, n, Moduli::for_big_q(ctx));
    msg.from_ntt(ctx);

    let mut pair = encrypt_rns(sk, &msg, ctx, sampler);
    pair.to_ntt(ctx);
    Ok(pair)
}

/// Encodes the packing-row selector: RGSW(X^(-w)) for w in [0, r).
pub fn encode_rgsw_query(
    params: &PirParams,
    sk: &RlweSecretKey,
    target_row: usize,
    ctx: &RnsContext,
    sampler: &mut GaussianSampler,
) -> Result<RgswCiphertext> {
    if target_row >= params.r {
        return Err(pir_err!("target packing row {target_row} out of range"));
    }

    let moduli = Moduli::for_big_q(ctx);
    let inv_mono = if target_row == 0 {
        Poly::constant(1, params.n, moduli)
    } else {
        Poly::monomial(2 * params.n - target_row, params.n, moduli)
    };

    let bits = 64 - ctx.big_q().leading_zeros();
    let gadget = GadgetVector::for_modulus_bits(params.rgsw_gadget, bits);
    Ok(RgswCiphertext::encrypt(sk, &inv_mono, gadget, ctx, sampler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamSet;
    use crate::rlwe::enc::{decrypt_phase, fold_rns};

    fn setup() -> (PirParams, RnsContext, PermTables, RlweSecretKey, GaussianSampler) {
        let params = PirParams::new(ParamSet::N256, 2, 8).unwrap();
        let ctx = params.build_context();
        let tables = params.build_perm_tables();
        let mut sampler = GaussianSampler::from_seed(3.2, [81u8; 32]);
        let sk = RlweSecretKey::generate(&ctx, &mut sampler);
        (params, ctx, tables, sk, sampler)
    }

    #[test]
    fn test_query_slots_are_one_hot() {
        let (params, ctx, tables, sk, mut sampler) = setup();
        let col = 29usize;
        let query = encode_query(&params, &sk, col, &ctx, &tables, &mut sampler).unwrap();

        // Fold to Q, decrypt the phase, look at the slot values.
        let mut pair = query.clone();
        pair.q.from_ntt(&ctx);
        pair.bs.from_ntt(&ctx);
        let folded = fold_rns(&pair, &ctx);
        let mut phase = decrypt_phase(&folded, &sk, &ctx);
        phase.to_ntt(&ctx);

        let delta = params.delta();
        let hot = [
            tables.slot_of_logical(false, col),
            tables.slot_of_logical(true, col),
        ];
        for slot in 0..params.n {
            let v = phase.channel(0)[slot];
            let centered = crate::math::modular::ModArith::to_signed(v, ctx.q1());
            if hot.contains(&slot) {
                let diff = (centered - (delta % ctx.q1()) as i64).unsigned_abs();
                // Slot values mix the whole noise polynomial, so the margin
                // is loose but far below Δ.
                assert!(diff < 1 << 20 || diff > ctx.q1() - (1 << 20));
            }
        }
    }

    #[test]
    fn test_query_rejects_bad_column() {
        let (params, ctx, tables, sk, mut sampler) = setup();
        assert!(encode_query(&params, &sk, 128, &ctx, &tables, &mut sampler).is_err());
    }

    #[test]
    fn test_rgsw_query_rejects_bad_row() {
        let (params, ctx, _tables, sk, mut sampler) = setup();
        assert!(encode_rgsw_query(&params, &sk, params.r, &ctx, &mut sampler).is_err());
    }
}
