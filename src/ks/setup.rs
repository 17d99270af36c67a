//! Key-switching key generation.
//!
//! Three key flavors:
//!
//! * [`KsKey`]: single-modulus matrix over Q for one automorphism index,
//!   used by the packing tree and the naive reference kernel.
//! * [`KsKeyRns`] with `scaled = false`: rows held in both the Q and p_bs
//!   channels, gadget spanning Q·p_bs. Baby-step rotations switch with these
//!   while the ciphertext pair stays resident in RNS.
//! * [`KsKeyRns`] with `scaled = true`: rows encrypt p_bs·g_i·τ_t(s); the
//!   giant-step path computes its hint against these in both channels and
//!   folds back to Q, dividing the switching noise by p_bs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::math::crt::RnsContext;
use crate::math::modular::ModArith;
use crate::math::permute::{automorphism_coeff, PermTables};
use crate::math::poly::{Moduli, Poly};
use crate::math::sampler::GaussianSampler;
use crate::params::{GadgetConfig, PirParams};
use crate::rgsw::types::GadgetVector;
use crate::rlwe::types::{RlweCiphertext, RlweSecretKey};

/// Single-modulus key-switching matrix for x ↦ x^t: ℓ rows
/// (a_i, -a_i·s + e_i + g_i·τ_t(s)), stored in NTT form.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KsKey {
    pub rows: Vec<RlweCiphertext>,
    pub gadget: GadgetVector,
}

impl KsKey {
    /// Generates the matrix for automorphism index `t`.
    pub fn generate(
        sk: &RlweSecretKey,
        t: usize,
        gadget: GadgetVector,
        ctx: &RnsContext,
        sampler: &mut GaussianSampler,
    ) -> Self {
        let dim = sk.ring_dim();
        let moduli = Moduli::for_big_q(ctx);
        let q = ctx.big_q();
        let tau_s = automorphism_coeff(&sk.poly, t);

        let rows = (0..gadget.len)
            .map(|i| {
                let a = Poly::random(dim, moduli, sampler);
                let e = Poly::sample_gaussian(dim, moduli, sampler);
                let a_s = a.mul_ntt(&sk.poly, ctx);
                let b = &(&(-&a_s) + &e) + &tau_s.scalar_mul(gadget.power_mod(i, q));
                let mut row = RlweCiphertext::from_parts(a, b);
                row.to_ntt(ctx);
                row
            })
            .collect();

        Self { rows, gadget }
    }
}

/// RNS key-switching matrix: each row held in both the Q channels and the
/// p_bs channel, all in NTT form.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KsKeyRns {
    pub q_rows: Vec<RlweCiphertext>,
    pub bs_rows: Vec<RlweCiphertext>,
    pub gadget: GadgetVector,
    /// Whether the row messages carry the p_bs factor (giant-step keys).
    pub scaled: bool,
}

impl KsKeyRns {
    /// Generates the RNS matrix for automorphism index `t`.
    ///
    /// With `scaled`, rows encrypt p_bs·g_i·τ_t(s) (which vanishes in the
    /// p_bs channel); otherwise g_i·τ_t(s) with the gadget spanning Q·p_bs.
    pub fn generate(
        sk: &RlweSecretKey,
        t: usize,
        gadget: GadgetVector,
        scaled: bool,
        ctx: &RnsContext,
        sampler: &mut GaussianSampler,
    ) -> Self {
        let dim = sk.ring_dim();
        let q_moduli = Moduli::for_big_q(ctx);
        let bs_moduli = Moduli::Single(ctx.p_bs());
        let q = ctx.big_q();
        let p_bs = ctx.p_bs();

        let tau_s_q = automorphism_coeff(&sk.poly, t);
        let tau_s_bs = Poly::from_coeffs(
            (0..dim)
                .map(|i| {
                    let signed = ModArith::to_signed(tau_s_q.coeff(i), q);
                    ModArith::from_signed(signed, p_bs)
                })
                .collect(),
            bs_moduli,
        );

        let mut s_bs = sk.ntt_bs.clone();
        s_bs.from_ntt(ctx);

        let mut q_rows = Vec::with_capacity(gadget.len);
        let mut bs_rows = Vec::with_capacity(gadget.len);

        for i in 0..gadget.len {
            // Row message factor per channel: g_i (optionally ·p_bs),
            // reduced into each modulus.
            let factor_q = if scaled {
                ModArith::mul(gadget.power_mod(i, q), p_bs % q, q)
            } else {
                gadget.power_mod(i, q)
            };
            let factor_bs = if scaled {
                0
            } else {
                gadget.power_mod(i, p_bs)
            };

            let e_signed: Vec<i64> = (0..dim).map(|_| sampler.sample()).collect();
            let e_q = Poly::from_coeffs(
                e_signed.iter().map(|&v| ModArith::from_signed(v, q)).collect(),
                q_moduli,
            );
            let e_bs = Poly::from_coeffs(
                e_signed
                    .iter()
                    .map(|&v| ModArith::from_signed(v, p_bs))
                    .collect(),
                bs_moduli,
            );

            let a_q = Poly::random(dim, q_moduli, sampler);
            let a_q_s = a_q.mul_ntt(&sk.poly, ctx);
            let b_q = &(&(-&a_q_s) + &e_q) + &tau_s_q.scalar_mul(factor_q);
            let mut row_q = RlweCiphertext::from_parts(a_q, b_q);
            row_q.to_ntt(ctx);
            q_rows.push(row_q);

            let a_bs = Poly::random(dim, bs_moduli, sampler);
            let a_bs_s = a_bs.mul_ntt(&s_bs, ctx);
            let b_bs = &(&(-&a_bs_s) + &e_bs) + &tau_s_bs.scalar_mul(factor_bs);
            let mut row_bs = RlweCiphertext::from_parts(a_bs, b_bs);
            row_bs.to_ntt(ctx);
            bs_rows.push(row_bs);
        }

        Self {
            q_rows,
            bs_rows,
            gadget,
            scaled,
        }
    }
}

/// Map of single-modulus keys by automorphism index (packing and the naive
/// reference path).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AutoKey {
    pub keys: HashMap<usize, KsKey>,
}

impl AutoKey {
    /// Generates keys for every index in `indices`.
    pub fn generate(
        sk: &RlweSecretKey,
        indices: &[usize],
        config: GadgetConfig,
        ctx: &RnsContext,
        sampler: &mut GaussianSampler,
    ) -> Self {
        let bits = 64 - ctx.big_q().leading_zeros();
        let gadget = GadgetVector::for_modulus_bits(config, bits);
        let keys = indices
            .iter()
            .map(|&t| (t, KsKey::generate(sk, t, gadget, ctx, sampler)))
            .collect();
        Self { keys }
    }

    pub fn get(&self, t: usize) -> Option<&KsKey> {
        self.keys.get(&t)
    }
}

/// The BSGS automorphism key bundle: baby-step keys for
/// {5^i : 1 ≤ i ≤ N1/2} and giant-step keys for {5^(N1·j) : 1 ≤ j < N2}.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BsgsAutoKey {
    pub baby: HashMap<usize, KsKeyRns>,
    pub giant: HashMap<usize, KsKeyRns>,
    pub n1: usize,
}

impl BsgsAutoKey {
    /// Generates the full bundle for the parameter set.
    pub fn generate(
        sk: &RlweSecretKey,
        params: &PirParams,
        tables: &PermTables,
        ctx: &RnsContext,
        sampler: &mut GaussianSampler,
    ) -> Self {
        let qp_bits = 128 - (ctx.big_q() as u128 * ctx.p_bs() as u128).leading_zeros();
        let baby_gadget = GadgetVector::for_modulus_bits(params.auto_gadget, qp_bits);
        let q_bits = 64 - ctx.big_q().leading_zeros();
        let giant_gadget = GadgetVector::for_modulus_bits(params.auto_gadget, q_bits);

        let baby = (1..=params.n1 / 2)
            .map(|i| {
                let t = tables.pow5(i);
                (
                    t,
                    KsKeyRns::generate(sk, t, baby_gadget, false, ctx, sampler),
                )
            })
            .collect();

        let giant = (1..params.n2)
            .map(|j| {
                let t = tables.pow5(params.n1 * j);
                (
                    t,
                    KsKeyRns::generate(sk, t, giant_gadget, true, ctx, sampler),
                )
            })
            .collect();

        Self {
            baby,
            giant,
            n1: params.n1,
        }
    }
}

/// Packing key: one single-modulus key per tree depth, for the automorphism
/// indices 5^(N/2^(d+2)) mod 2N, d in [0, log2(r)).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PackingKey {
    pub auto_key: AutoKey,
    /// Automorphism index per depth.
    pub depth_indices: Vec<usize>,
}

impl PackingKey {
    /// Generates the log2(r) keys the packing tree needs.
    pub fn generate(
        sk: &RlweSecretKey,
        params: &PirParams,
        tables: &PermTables,
        ctx: &RnsContext,
        sampler: &mut GaussianSampler,
    ) -> Self {
        let depth = params.r.trailing_zeros() as usize;
        let n = params.n;
        let depth_indices: Vec<usize> = (0..depth)
            .map(|d| tables.pow5(n >> (d + 2)))
            .collect();
        let auto_key = AutoKey::generate(sk, &depth_indices, params.pack_gadget, ctx, sampler);
        Self {
            auto_key,
            depth_indices,
        }
    }
}
