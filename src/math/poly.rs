//! Polynomials over R_m = Z_m[X]/(X^N + 1) with explicit form tags.
//!
//! A polynomial is either in coefficient form (N residues mod m) or in NTT
//! form. Over the composed modulus Q = q1·q2 the NTT form is stored planar:
//! the q1 channel's N slots followed by the q2 channel's N slots. Primitives
//! refuse mixed-form or mixed-modulus inputs.

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use super::crt::RnsContext;
use super::modular::ModArith;
use super::sampler::GaussianSampler;

/// Representation tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolyForm {
    /// N coefficients reduced mod m, natural order.
    Coeff,
    /// Evaluation form; see [`crate::math::ntt`] for the slot ordering.
    Ntt,
}

/// Modulus descriptor: a single prime channel or the composed Q = q1·q2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Moduli {
    Single(u64),
    Pair { q1: u64, q2: u64, q: u64 },
}

impl Moduli {
    /// The composed modulus.
    #[inline]
    pub fn composed(&self) -> u64 {
        match *self {
            Moduli::Single(q) => q,
            Moduli::Pair { q, .. } => q,
        }
    }

    /// Number of NTT channels.
    #[inline]
    pub fn channels(&self) -> usize {
        match self {
            Moduli::Single(_) => 1,
            Moduli::Pair { .. } => 2,
        }
    }

    /// Modulus of NTT channel `c`.
    #[inline]
    pub fn channel_modulus(&self, c: usize) -> u64 {
        match *self {
            Moduli::Single(q) => {
                debug_assert_eq!(c, 0);
                q
            }
            Moduli::Pair { q1, q2, .. } => match c {
                0 => q1,
                1 => q2,
                _ => panic!("channel out of range"),
            },
        }
    }

    /// The pair descriptor for a context's Q channels.
    pub fn for_big_q(ctx: &RnsContext) -> Self {
        Moduli::Pair {
            q1: ctx.q1(),
            q2: ctx.q2(),
            q: ctx.big_q(),
        }
    }
}

/// Polynomial in R_m with an explicit form tag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poly {
    vals: Vec<u64>,
    moduli: Moduli,
    form: PolyForm,
}

impl Poly {
    /// Zero polynomial in coefficient form.
    pub fn zero(dim: usize, moduli: Moduli) -> Self {
        Self {
            vals: vec![0; dim],
            moduli,
            form: PolyForm::Coeff,
        }
    }

    /// Zero polynomial already tagged as NTT form.
    pub fn zero_ntt(dim: usize, moduli: Moduli) -> Self {
        Self {
            vals: vec![0; dim * moduli.channels()],
            moduli,
            form: PolyForm::Ntt,
        }
    }

    /// Builds from coefficients, reducing each into [0, m).
    pub fn from_coeffs(mut coeffs: Vec<u64>, moduli: Moduli) -> Self {
        let q = moduli.composed();
        for c in coeffs.iter_mut() {
            *c %= q;
        }
        Self {
            vals: coeffs,
            moduli,
            form: PolyForm::Coeff,
        }
    }

    /// Rebuilds an NTT-form polynomial from raw channel slots.
    ///
    /// # Panics
    ///
    /// Panics if the slot count does not match `dim * channels`.
    pub fn from_ntt_vals(vals: Vec<u64>, dim: usize, moduli: Moduli) -> Self {
        assert_eq!(vals.len(), dim * moduli.channels(), "slot count mismatch");
        Self {
            vals,
            moduli,
            form: PolyForm::Ntt,
        }
    }

    /// Constant polynomial `value`.
    pub fn constant(value: u64, dim: usize, moduli: Moduli) -> Self {
        let mut coeffs = vec![0; dim];
        coeffs[0] = value % moduli.composed();
        Self {
            vals: coeffs,
            moduli,
            form: PolyForm::Coeff,
        }
    }

    /// Monomial ±X^k reduced into the ring: `X^power` for power < dim,
    /// `-X^(power-dim)` for power in [dim, 2·dim).
    pub fn monomial(power: usize, dim: usize, moduli: Moduli) -> Self {
        let q = moduli.composed();
        let mut coeffs = vec![0u64; dim];
        let power = power % (2 * dim);
        if power < dim {
            coeffs[power] = 1;
        } else {
            coeffs[power - dim] = q - 1;
        }
        Self {
            vals: coeffs,
            moduli,
            form: PolyForm::Coeff,
        }
    }

    /// Uniformly random coefficients.
    pub fn random(dim: usize, moduli: Moduli, sampler: &mut GaussianSampler) -> Self {
        let q = moduli.composed();
        let mut coeffs = vec![0u64; dim];
        sampler.sample_uniform_vec(&mut coeffs, q);
        Self {
            vals: coeffs,
            moduli,
            form: PolyForm::Coeff,
        }
    }

    /// Gaussian error polynomial, coefficients lifted into [0, m).
    pub fn sample_gaussian(dim: usize, moduli: Moduli, sampler: &mut GaussianSampler) -> Self {
        let coeffs = sampler.sample_vec_centered(dim, moduli.composed());
        Self {
            vals: coeffs,
            moduli,
            form: PolyForm::Coeff,
        }
    }

    /// Ring dimension (number of coefficients, not slots).
    pub fn dimension(&self) -> usize {
        match self.form {
            PolyForm::Coeff => self.vals.len(),
            PolyForm::Ntt => self.vals.len() / self.moduli.channels(),
        }
    }

    pub fn moduli(&self) -> Moduli {
        self.moduli
    }

    /// The composed modulus.
    pub fn modulus(&self) -> u64 {
        self.moduli.composed()
    }

    pub fn form(&self) -> PolyForm {
        self.form
    }

    pub fn is_ntt(&self) -> bool {
        self.form == PolyForm::Ntt
    }

    /// Coefficient accessor; coefficient form only.
    pub fn coeff(&self, i: usize) -> u64 {
        assert_eq!(self.form, PolyForm::Coeff, "coefficient access in NTT form");
        self.vals[i]
    }

    /// Coefficient setter; coefficient form only.
    pub fn set_coeff(&mut self, i: usize, value: u64) {
        assert_eq!(self.form, PolyForm::Coeff, "coefficient access in NTT form");
        self.vals[i] = value % self.moduli.composed();
    }

    /// Raw value slice (coefficients or slots, per the form tag).
    pub fn vals(&self) -> &[u64] {
        &self.vals
    }

    pub fn vals_mut(&mut self) -> &mut [u64] {
        &mut self.vals
    }

    /// Slot slice of NTT channel `c`.
    pub fn channel(&self, c: usize) -> &[u64] {
        assert_eq!(self.form, PolyForm::Ntt, "channel access in coefficient form");
        let n = self.dimension();
        &self.vals[c * n..(c + 1) * n]
    }

    pub fn channel_mut(&mut self, c: usize) -> &mut [u64] {
        assert_eq!(self.form, PolyForm::Ntt, "channel access in coefficient form");
        let n = self.dimension();
        &mut self.vals[c * n..(c + 1) * n]
    }

    /// Converts to NTT form in place. No-op if already there.
    pub fn to_ntt(&mut self, ctx: &RnsContext) {
        if self.form == PolyForm::Ntt {
            return;
        }
        let n = self.vals.len();
        assert_eq!(n, ctx.dimension(), "dimension mismatch with context");
        match self.moduli {
            Moduli::Single(q) => {
                let table = table_for(ctx, q);
                table.forward(&mut self.vals);
            }
            Moduli::Pair { q1, q2, .. } => {
                debug_assert_eq!(q1, ctx.q1());
                debug_assert_eq!(q2, ctx.q2());
                let mut slots = vec![0u64; 2 * n];
                for i in 0..n {
                    slots[i] = self.vals[i] % q1;
                    slots[n + i] = self.vals[i] % q2;
                }
                ctx.ntt_q1().forward(&mut slots[..n]);
                ctx.ntt_q2().forward(&mut slots[n..]);
                self.vals = slots;
            }
        }
        self.form = PolyForm::Ntt;
    }

    /// Converts to coefficient form in place. No-op if already there.
    pub fn from_ntt(&mut self, ctx: &RnsContext) {
        if self.form == PolyForm::Coeff {
            return;
        }
        match self.moduli {
            Moduli::Single(q) => {
                let table = table_for(ctx, q);
                table.inverse(&mut self.vals);
            }
            Moduli::Pair { .. } => {
                let n = self.vals.len() / 2;
                let (lo, hi) = self.vals.split_at_mut(n);
                ctx.ntt_q1().inverse(lo);
                ctx.ntt_q2().inverse(hi);
                let mut coeffs = vec![0u64; n];
                for i in 0..n {
                    coeffs[i] = ctx.compose(lo[i], hi[i]);
                }
                self.vals = coeffs;
            }
        }
        self.form = PolyForm::Coeff;
    }

    /// Copy converted to NTT form.
    pub fn to_ntt_new(&self, ctx: &RnsContext) -> Self {
        let mut out = self.clone();
        out.to_ntt(ctx);
        out
    }

    /// Copy converted to coefficient form.
    pub fn from_ntt_new(&self, ctx: &RnsContext) -> Self {
        let mut out = self.clone();
        out.from_ntt(ctx);
        out
    }

    /// Slot-wise product; both operands must be NTT form over equal moduli.
    pub fn pointwise_mul(&self, other: &Self) -> Self {
        assert_eq!(self.form, PolyForm::Ntt, "pointwise product needs NTT form");
        assert_eq!(other.form, PolyForm::Ntt, "pointwise product needs NTT form");
        assert_eq!(self.moduli, other.moduli, "moduli must match");
        assert_eq!(self.vals.len(), other.vals.len(), "slot counts must match");

        let n = self.dimension();
        let mut vals = vec![0u64; self.vals.len()];
        for c in 0..self.moduli.channels() {
            let m = self.moduli.channel_modulus(c);
            for i in 0..n {
                let idx = c * n + i;
                vals[idx] = ModArith::mul(self.vals[idx], other.vals[idx], m);
            }
        }
        Self {
            vals,
            moduli: self.moduli,
            form: PolyForm::Ntt,
        }
    }

    /// Full ring product through the NTT.
    pub fn mul_ntt(&self, other: &Self, ctx: &RnsContext) -> Self {
        let a = self.to_ntt_new(ctx);
        let b = other.to_ntt_new(ctx);
        let mut prod = a.pointwise_mul(&b);
        prod.from_ntt(ctx);
        prod
    }

    /// Scalar product, valid in either form.
    pub fn scalar_mul(&self, scalar: u64) -> Self {
        let mut out = self.clone();
        out.scalar_mul_assign(scalar);
        out
    }

    pub fn scalar_mul_assign(&mut self, scalar: u64) {
        match (self.form, self.moduli) {
            (PolyForm::Ntt, Moduli::Pair { q1, q2, .. }) => {
                let n = self.dimension();
                let (s1, s2) = (scalar % q1, scalar % q2);
                for i in 0..n {
                    self.vals[i] = ModArith::mul(self.vals[i], s1, q1);
                    self.vals[n + i] = ModArith::mul(self.vals[n + i], s2, q2);
                }
            }
            _ => {
                let q = self.moduli.composed();
                let s = scalar % q;
                for v in self.vals.iter_mut() {
                    *v = ModArith::mul(*v, s, q);
                }
            }
        }
    }

    pub fn is_zero(&self) -> bool {
        self.vals.iter().all(|&v| v == 0)
    }

    /// Max absolute coefficient in centered representation; coefficient form.
    pub fn linf_norm(&self) -> u64 {
        assert_eq!(self.form, PolyForm::Coeff, "norm needs coefficient form");
        let q = self.moduli.composed();
        self.vals
            .iter()
            .map(|&c| ModArith::to_signed(c, q).unsigned_abs())
            .max()
            .unwrap_or(0)
    }

    /// Little-endian u64 byte dump; coefficient form only (the interop
    /// layout: each polynomial is `u64[N]` LE).
    pub fn to_bytes(&self) -> Vec<u8> {
        assert_eq!(self.form, PolyForm::Coeff, "serialize coefficient form");
        let mut out = Vec::with_capacity(self.vals.len() * 8);
        for &v in &self.vals {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    /// Inverse of [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(bytes: &[u8], moduli: Moduli) -> Self {
        assert_eq!(bytes.len() % 8, 0, "byte length must be a multiple of 8");
        let coeffs = bytes
            .chunks_exact(8)
            .map(|c| u64::from_le_bytes(c.try_into().unwrap()))
            .collect();
        Self::from_coeffs(coeffs, moduli)
    }

    fn binop(&self, rhs: &Self, f: impl Fn(u64, u64, u64) -> u64) -> Self {
        assert_eq!(self.moduli, rhs.moduli, "moduli must match");
        assert_eq!(self.form, rhs.form, "forms must match");
        assert_eq!(self.vals.len(), rhs.vals.len(), "lengths must match");

        let n = self.dimension();
        let channels = if self.form == PolyForm::Ntt {
            self.moduli.channels()
        } else {
            1
        };
        let mut vals = vec![0u64; self.vals.len()];
        for c in 0..channels {
            let m = if self.form == PolyForm::Ntt {
                self.moduli.channel_modulus(c)
            } else {
                self.moduli.composed()
            };
            for i in 0..n {
                let idx = c * n + i;
                vals[idx] = f(self.vals[idx], rhs.vals[idx], m);
            }
        }
        Self {
            vals,
            moduli: self.moduli,
            form: self.form,
        }
    }
}

fn table_for<'a>(ctx: &'a RnsContext, q: u64) -> &'a super::ntt::NttTable {
    if q == ctx.q1() {
        ctx.ntt_q1()
    } else if q == ctx.q2() {
        ctx.ntt_q2()
    } else if q == ctx.p_bs() {
        ctx.ntt_bs()
    } else {
        panic!("no NTT table for modulus {q}");
    }
}

impl Add for &Poly {
    type Output = Poly;
    fn add(self, rhs: Self) -> Poly {
        self.binop(rhs, ModArith::add)
    }
}

impl Sub for &Poly {
    type Output = Poly;
    fn sub(self, rhs: Self) -> Poly {
        self.binop(rhs, ModArith::sub)
    }
}

impl AddAssign<&Poly> for Poly {
    fn add_assign(&mut self, rhs: &Poly) {
        *self = &*self + rhs;
    }
}

impl SubAssign<&Poly> for Poly {
    fn sub_assign(&mut self, rhs: &Poly) {
        *self = &*self - rhs;
    }
}

impl Neg for &Poly {
    type Output = Poly;
    fn neg(self) -> Poly {
        let n = self.dimension();
        let channels = if self.form == PolyForm::Ntt {
            self.moduli.channels()
        } else {
            1
        };
        let mut vals = vec![0u64; self.vals.len()];
        for c in 0..channels {
            let m = if self.form == PolyForm::Ntt {
                self.moduli.channel_modulus(c)
            } else {
                self.moduli.composed()
            };
            for i in 0..n {
                vals[c * n + i] = ModArith::neg(self.vals[c * n + i], m);
            }
        }
        Poly {
            vals,
            moduli: self.moduli,
            form: self.form,
        }
    }
}

impl Neg for Poly {
    type Output = Poly;
    fn neg(self) -> Poly {
        -&self
    }
}
