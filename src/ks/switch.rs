//! Automorphism evaluation with key switching.
//!
//! Three paths share the same skeleton (permute, decompose the mapped `a`,
//! contract digits against key rows, re-attach the mapped `b`):
//!
//! * [`eval_auto`]: single-modulus over Q.
//! * [`eval_auto_rns`]: the ciphertext is a (Q, p_bs) pair and stays one;
//!   digits are taken from the composed value over Q·p_bs. Used for the
//!   baby-step chain, which folds to Q only once at the end.
//! * [`eval_auto_fold`]: mod-Q in, mod-Q out; the hint is accumulated in
//!   both channels against p_bs-scaled keys and rescaled on the way out, so
//!   the switching noise arrives divided by p_bs. Used per giant step.

use crate::math::crt::RnsContext;
use crate::math::modular::ModArith;
use crate::math::permute::{permute_ntt, PermTables};
use crate::math::poly::{Moduli, Poly};
use crate::rgsw::types::gadget_decompose;
use crate::rlwe::automorphism::automorphism_ciphertext;
use crate::rlwe::types::{RlweCiphertext, RnsRlweCiphertext};

use super::setup::{KsKey, KsKeyRns};

/// Applies x ↦ x^t to a mod-Q ciphertext and switches back to s.
///
/// Accepts either form; the output matches the input's form.
pub fn eval_auto(
    ct: &RlweCiphertext,
    t: usize,
    key: &KsKey,
    tables: &PermTables,
    ctx: &RnsContext,
) -> RlweCiphertext {
    let input_ntt = ct.is_ntt();
    let mapped = automorphism_ciphertext(ct, t, tables);

    let mut a_tilde = mapped.a.clone();
    a_tilde.from_ntt(ctx);
    let digits = gadget_decompose(&a_tilde, &key.gadget);

    let dim = ct.ring_dim();
    let moduli = ct.moduli();
    let mut hint_a = Poly::zero_ntt(dim, moduli);
    let mut hint_b = Poly::zero_ntt(dim, moduli);
    for (i, digit) in digits.into_iter().enumerate() {
        let d_ntt = digit.to_ntt_new(ctx);
        hint_a += &d_ntt.pointwise_mul(&key.rows[i].a);
        hint_b += &d_ntt.pointwise_mul(&key.rows[i].b);
    }

    let b_tilde = if mapped.b.is_ntt() {
        mapped.b
    } else {
        mapped.b.to_ntt_new(ctx)
    };
    let mut out = RlweCiphertext::from_parts(hint_a, &hint_b + &b_tilde);
    if !input_ntt {
        out.from_ntt(ctx);
    }
    out
}

/// One baby-step rotation on an RNS-resident pair: both channels are
/// permuted, the digits come from the composed Q·p_bs value, and the result
/// stays in RNS. Input and output are in NTT form.
pub fn eval_auto_rns(
    pair: &RnsRlweCiphertext,
    t: usize,
    key: &KsKeyRns,
    tables: &PermTables,
    ctx: &RnsContext,
) -> RnsRlweCiphertext {
    assert!(!key.scaled, "baby-step switching expects unscaled keys");
    assert!(pair.q.is_ntt() && pair.bs.is_ntt(), "pair must be in NTT form");

    let perm = tables.permutation(t);
    let a_q = permute_ntt(&pair.q.a, &perm);
    let b_q = permute_ntt(&pair.q.b, &perm);
    let a_bs = permute_ntt(&pair.bs.a, &perm);
    let b_bs = permute_ntt(&pair.bs.b, &perm);

    let a_q_coeff = a_q.from_ntt_new(ctx);
    let a_bs_coeff = a_bs.from_ntt_new(ctx);

    let dim = pair.ring_dim();
    let qp = ctx.big_q() as u128 * ctx.p_bs() as u128;
    let signed_digits: Vec<Vec<i64>> = (0..dim)
        .map(|j| {
            let x = ctx.compose_q_bs(a_q_coeff.coeff(j), a_bs_coeff.coeff(j));
            let centered = if x > qp / 2 {
                x as i128 - qp as i128
            } else {
                x as i128
            };
            key.gadget.decompose_value(centered)
        })
        .collect();

    let (hint_qa, hint_qb) = contract(&signed_digits, &key.q_rows, Moduli::for_big_q(ctx), ctx);
    let (hint_ba, hint_bb) = contract(
        &signed_digits,
        &key.bs_rows,
        Moduli::Single(ctx.p_bs()),
        ctx,
    );

    RnsRlweCiphertext {
        q: RlweCiphertext::from_parts(hint_qa, &hint_qb + &b_q),
        bs: RlweCiphertext::from_parts(hint_ba, &hint_bb + &b_bs),
    }
}

/// One giant-step rotation: mod-Q NTT-form in, mod-Q NTT-form out, with the
/// hint carried through both channels against p_bs-scaled keys and folded
/// back by the exact rescale.
pub fn eval_auto_fold(
    ct: &RlweCiphertext,
    t: usize,
    key: &KsKeyRns,
    tables: &PermTables,
    ctx: &RnsContext,
) -> RlweCiphertext {
    assert!(key.scaled, "giant-step switching expects p_bs-scaled keys");
    assert!(ct.is_ntt(), "giant-step input must be in NTT form");

    let perm = tables.permutation(t);
    let a_t = permute_ntt(&ct.a, &perm);
    let b_t = permute_ntt(&ct.b, &perm);

    let a_coeff = a_t.from_ntt_new(ctx);
    let q = ctx.big_q();
    let signed_digits: Vec<Vec<i64>> = (0..ct.ring_dim())
        .map(|j| {
            let centered = ModArith::to_signed(a_coeff.coeff(j), q) as i128;
            key.gadget.decompose_value(centered)
        })
        .collect();

    let (hint_qa, hint_qb) = contract(&signed_digits, &key.q_rows, Moduli::for_big_q(ctx), ctx);
    let (hint_ba, hint_bb) = contract(
        &signed_digits,
        &key.bs_rows,
        Moduli::Single(ctx.p_bs()),
        ctx,
    );

    // The mapped b joins the Q channel scaled by p_bs (it vanishes mod p_bs).
    let x_qb = &hint_qb + &b_t.scalar_mul(ctx.p_bs() % q);

    let folded_a = fold_channels(&hint_qa, &hint_ba, ctx);
    let folded_b = fold_channels(&x_qb, &hint_bb, ctx);
    let mut out = RlweCiphertext::from_parts(folded_a, folded_b);
    out.to_ntt(ctx);
    out
}

/// Digit contraction against key rows in one channel family; digits arrive
/// as signed values and are lifted per channel.
fn contract(
    signed_digits: &[Vec<i64>],
    rows: &[RlweCiphertext],
    moduli: Moduli,
    ctx: &RnsContext,
) -> (Poly, Poly) {
    let dim = signed_digits.len();
    let m = moduli.composed();
    let ell = rows.len();

    let mut hint_a = Poly::zero_ntt(dim, moduli);
    let mut hint_b = Poly::zero_ntt(dim, moduli);
    for (i, row) in rows.iter().enumerate().take(ell) {
        let digit = Poly::from_coeffs(
            (0..dim)
                .map(|j| ModArith::from_signed(signed_digits[j][i], m))
                .collect(),
            moduli,
        );
        let d_ntt = digit.to_ntt_new(ctx);
        hint_a += &d_ntt.pointwise_mul(&row.a);
        hint_b += &d_ntt.pointwise_mul(&row.b);
    }
    (hint_a, hint_b)
}

/// Rescales an NTT-form (Q-channel, p_bs-channel) value pair down to a
/// coefficient-form mod-Q polynomial.
fn fold_channels(x_q: &Poly, x_bs: &Poly, ctx: &RnsContext) -> Poly {
    let q_coeff = x_q.from_ntt_new(ctx);
    let bs_coeff = x_bs.from_ntt_new(ctx);
    let dim = q_coeff.dimension();
    Poly::from_coeffs(
        (0..dim)
            .map(|j| ctx.rescale_q_bs(q_coeff.coeff(j), bs_coeff.coeff(j)))
            .collect(),
        q_coeff.moduli(),
    )
}
