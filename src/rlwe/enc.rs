//! RLWE encryption and decryption.
//!
//! Single-channel encryption over Q, and the RNS variant that produces the
//! (Q, p_bs) companion pair: the Q channel carries p_bs·μ, the p_bs channel
//! carries 0, both under the same error polynomial, so the CRT-composed
//! value over Q·p_bs is p_bs·μ + e. Folding the pair back to Q divides the
//! accumulated noise by p_bs.

use crate::math::crt::RnsContext;
use crate::math::modular::ModArith;
use crate::math::poly::{Moduli, Poly, PolyForm};
use crate::math::sampler::GaussianSampler;

use super::types::{RlweCiphertext, RlweSecretKey, RnsRlweCiphertext};

/// Encrypts a coefficient-form message under `sk`: (a, -a·s + e + msg).
pub fn encrypt(
    sk: &RlweSecretKey,
    msg: &Poly,
    ctx: &RnsContext,
    sampler: &mut GaussianSampler,
) -> RlweCiphertext {
    assert_eq!(msg.form(), PolyForm::Coeff, "message must be coefficient form");
    let dim = msg.dimension();
    let moduli = msg.moduli();

    let a = Poly::random(dim, moduli, sampler);
    let e = Poly::sample_gaussian(dim, moduli, sampler);
    let a_s = a.mul_ntt(&sk.poly, ctx);
    let b = &(&(-&a_s) + &e) + msg;
    RlweCiphertext::from_parts(a, b)
}

/// Decrypts to the raw phase b + a·s (message plus noise, coefficient form).
pub fn decrypt_phase(ct: &RlweCiphertext, sk: &RlweSecretKey, ctx: &RnsContext) -> Poly {
    match ct.form() {
        PolyForm::Coeff => {
            let a_s = ct.a.mul_ntt(&sk.poly, ctx);
            &ct.b + &a_s
        }
        PolyForm::Ntt => {
            let s = sk.ntt_for(ct.moduli());
            let a_s = ct.a.pointwise_mul(s);
            let mut phase = &ct.b + &a_s;
            phase.from_ntt(ctx);
            phase
        }
    }
}

/// Rounds a decrypted phase to plaintext: round(x·p/Q) mod p per coefficient.
pub fn decode_rounded(phase: &Poly, p: u64) -> Vec<u64> {
    assert_eq!(phase.form(), PolyForm::Coeff, "decode needs coefficient form");
    let q = phase.modulus();
    (0..phase.dimension())
        .map(|i| {
            let centered = ModArith::to_signed(phase.coeff(i), q);
            let num = centered as i128 * p as i128;
            let half = q as i128 / 2;
            let rounded = if num >= 0 {
                (num + half) / q as i128
            } else {
                (num - half) / q as i128
            };
            rounded.rem_euclid(p as i128) as u64
        })
        .collect()
}

/// Decrypts and rounds in one step.
pub fn decrypt(ct: &RlweCiphertext, sk: &RlweSecretKey, p: u64, ctx: &RnsContext) -> Vec<u64> {
    decode_rounded(&decrypt_phase(ct, sk, ctx), p)
}

/// Encrypts μ into the (Q, p_bs) companion pair.
///
/// The Q channel's message is p_bs·μ mod Q and the p_bs channel's message is
/// zero; the error polynomial is shared so the pair is the RNS image of one
/// ciphertext over Q·p_bs encrypting p_bs·μ.
pub fn encrypt_rns(
    sk: &RlweSecretKey,
    msg: &Poly,
    ctx: &RnsContext,
    sampler: &mut GaussianSampler,
) -> RnsRlweCiphertext {
    assert_eq!(msg.form(), PolyForm::Coeff, "message must be coefficient form");
    assert_eq!(msg.modulus(), ctx.big_q(), "message must live mod Q");
    let dim = msg.dimension();
    let q_moduli = Moduli::for_big_q(ctx);
    let bs_moduli = Moduli::Single(ctx.p_bs());

    // One error polynomial, reduced into both channels.
    let e_signed: Vec<i64> = (0..dim).map(|_| sampler.sample()).collect();
    let e_q = Poly::from_coeffs(
        e_signed
            .iter()
            .map(|&v| ModArith::from_signed(v, ctx.big_q()))
            .collect(),
        q_moduli,
    );
    let e_bs = Poly::from_coeffs(
        e_signed
            .iter()
            .map(|&v| ModArith::from_signed(v, ctx.p_bs()))
            .collect(),
        bs_moduli,
    );

    let scaled_msg = msg.scalar_mul(ctx.p_bs() % ctx.big_q());

    let a_q = Poly::random(dim, q_moduli, sampler);
    let a_q_s = a_q.mul_ntt(&sk.poly, ctx);
    let b_q = &(&(-&a_q_s) + &e_q) + &scaled_msg;

    let a_bs = Poly::random(dim, bs_moduli, sampler);
    let mut s_bs = sk.ntt_bs.clone();
    s_bs.from_ntt(ctx);
    let a_bs_s = a_bs.mul_ntt(&s_bs, ctx);
    let b_bs = &(-&a_bs_s) + &e_bs;

    RnsRlweCiphertext {
        q: RlweCiphertext::from_parts(a_q, b_q),
        bs: RlweCiphertext::from_parts(a_bs, b_bs),
    }
}

/// Folds the (Q, p_bs) pair down to a mod-Q ciphertext: both parts are
/// rescaled by p_bs with centered remainders, which divides the pair's
/// accumulated noise by p_bs.
pub fn fold_rns(pair: &RnsRlweCiphertext, ctx: &RnsContext) -> RlweCiphertext {
    assert_eq!(pair.q.form(), PolyForm::Coeff, "fold needs coefficient form");
    assert_eq!(pair.bs.form(), PolyForm::Coeff, "fold needs coefficient form");
    let dim = pair.ring_dim();
    let q_moduli = pair.q.moduli();

    let fold_poly = |p_q: &Poly, p_bs: &Poly| -> Poly {
        let coeffs = (0..dim)
            .map(|i| ctx.rescale_q_bs(p_q.coeff(i), p_bs.coeff(i)))
            .collect();
        Poly::from_coeffs(coeffs, q_moduli)
    };

    RlweCiphertext::from_parts(
        fold_poly(&pair.q.a, &pair.bs.a),
        fold_poly(&pair.q.b, &pair.bs.b),
    )
}
