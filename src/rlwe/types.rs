//! RLWE key and ciphertext types.
//!
//! Ring-LWE over R_Q = Z_Q[X]/(X^N + 1) with Q = q1·q2, plus the auxiliary
//! p_bs channel used by the RNS key-switching path. The encryption
//! convention throughout the crate is b = -a·s + e + msg.

use serde::{Deserialize, Serialize};

use crate::math::crt::RnsContext;
use crate::math::modular::ModArith;
use crate::math::poly::{Moduli, Poly, PolyForm};
use crate::math::sampler::GaussianSampler;

/// RLWE secret key: ternary polynomial, with cached NTT forms for the Q
/// channels and the p_bs channel.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RlweSecretKey {
    /// Secret in coefficient form over Q.
    pub poly: Poly,
    /// Secret in NTT form over the (q1, q2) channels.
    pub ntt_q: Poly,
    /// Secret lifted into p_bs, NTT form.
    pub ntt_bs: Poly,
}

impl RlweSecretKey {
    /// Samples a fresh ternary secret.
    pub fn generate(ctx: &RnsContext, sampler: &mut GaussianSampler) -> Self {
        let n = ctx.dimension();
        let signed: Vec<i64> = (0..n).map(|_| sampler.sample_ternary()).collect();
        Self::from_signed(&signed, ctx)
    }

    /// Builds the key and its cached channel forms from signed coefficients.
    pub fn from_signed(signed: &[i64], ctx: &RnsContext) -> Self {
        let q_moduli = Moduli::for_big_q(ctx);
        let coeffs_q: Vec<u64> = signed
            .iter()
            .map(|&v| ModArith::from_signed(v, ctx.big_q()))
            .collect();
        let coeffs_bs: Vec<u64> = signed
            .iter()
            .map(|&v| ModArith::from_signed(v, ctx.p_bs()))
            .collect();

        let poly = Poly::from_coeffs(coeffs_q, q_moduli);
        let ntt_q = poly.to_ntt_new(ctx);
        let ntt_bs = Poly::from_coeffs(coeffs_bs, Moduli::Single(ctx.p_bs())).to_ntt_new(ctx);

        Self { poly, ntt_q, ntt_bs }
    }

    pub fn ring_dim(&self) -> usize {
        self.poly.dimension()
    }

    /// The secret's NTT form for the channel family of `moduli`.
    pub fn ntt_for(&self, moduli: Moduli) -> &Poly {
        match moduli {
            Moduli::Pair { .. } => &self.ntt_q,
            Moduli::Single(_) => &self.ntt_bs,
        }
    }
}

/// RLWE ciphertext (a, b) with b = -a·s + e + msg.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RlweCiphertext {
    pub a: Poly,
    pub b: Poly,
}

impl RlweCiphertext {
    /// Builds a ciphertext from its parts.
    ///
    /// # Panics
    ///
    /// Debug-asserts matching dimension, moduli and form.
    pub fn from_parts(a: Poly, b: Poly) -> Self {
        debug_assert_eq!(a.dimension(), b.dimension(), "part dimensions differ");
        debug_assert_eq!(a.moduli(), b.moduli(), "part moduli differ");
        debug_assert_eq!(a.form(), b.form(), "part forms differ");
        Self { a, b }
    }

    /// Zero ciphertext in coefficient form.
    pub fn zero(dim: usize, moduli: Moduli) -> Self {
        Self {
            a: Poly::zero(dim, moduli),
            b: Poly::zero(dim, moduli),
        }
    }

    pub fn ring_dim(&self) -> usize {
        self.a.dimension()
    }

    pub fn moduli(&self) -> Moduli {
        self.a.moduli()
    }

    pub fn form(&self) -> PolyForm {
        self.a.form()
    }

    pub fn is_ntt(&self) -> bool {
        self.a.is_ntt()
    }

    /// Converts both parts to NTT form in place.
    pub fn to_ntt(&mut self, ctx: &RnsContext) {
        self.a.to_ntt(ctx);
        self.b.to_ntt(ctx);
    }

    /// Converts both parts to coefficient form in place.
    pub fn from_ntt(&mut self, ctx: &RnsContext) {
        self.a.from_ntt(ctx);
        self.b.from_ntt(ctx);
    }

    /// Component-wise sum.
    pub fn add(&self, other: &Self) -> Self {
        Self {
            a: &self.a + &other.a,
            b: &self.b + &other.b,
        }
    }

    pub fn add_assign(&mut self, other: &Self) {
        self.a += &other.a;
        self.b += &other.b;
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self {
            a: &self.a - &other.a,
            b: &self.b - &other.b,
        }
    }

    /// Interop byte layout: a then b, each little-endian u64[N]
    /// (coefficient form only).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.a.to_bytes();
        out.extend_from_slice(&self.b.to_bytes());
        out
    }

    /// Inverse of [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(bytes: &[u8], dim: usize, moduli: Moduli) -> Self {
        assert_eq!(bytes.len(), dim * 16, "expected 2·N little-endian u64s");
        let (a_bytes, b_bytes) = bytes.split_at(dim * 8);
        Self {
            a: Poly::from_bytes(a_bytes, moduli),
            b: Poly::from_bytes(b_bytes, moduli),
        }
    }
}

/// The (Q, p_bs) companion pair carried through the baby-step rotation
/// chain. The Q channel encrypts p_bs·μ; the p_bs channel encrypts 0 with
/// the same underlying randomness, so the composed value over Q·p_bs is
/// exactly p_bs·μ plus noise.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RnsRlweCiphertext {
    /// Channel over Q = q1·q2.
    pub q: RlweCiphertext,
    /// Channel over p_bs.
    pub bs: RlweCiphertext,
}

impl RnsRlweCiphertext {
    /// Checks the pair is structurally coherent: same dimension, same form,
    /// the expected moduli on each side.
    pub fn check_coherent(&self, ctx: &RnsContext) -> Result<(), &'static str> {
        if self.q.ring_dim() != self.bs.ring_dim() {
            return Err("query channels disagree on ring dimension");
        }
        if self.q.form() != self.bs.form() {
            return Err("query channels disagree on form");
        }
        if self.q.moduli().composed() != ctx.big_q() {
            return Err("Q channel has the wrong modulus");
        }
        if self.bs.moduli() != Moduli::Single(ctx.p_bs()) {
            return Err("p_bs channel has the wrong modulus");
        }
        Ok(())
    }

    pub fn ring_dim(&self) -> usize {
        self.q.ring_dim()
    }

    pub fn to_ntt(&mut self, ctx: &RnsContext) {
        self.q.to_ntt(ctx);
        self.bs.to_ntt(ctx);
    }
}
