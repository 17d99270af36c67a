//! Mathematical primitives: modular arithmetic, NTT, CRT/RNS, polynomials,
//! permutation tables, sampling.
//!
//! Everything cryptographic in the crate is built on these pieces. The NTT
//! slot ordering and the permutation tables are a matched pair; see
//! [`ntt`] and [`permute`] for the contract.

pub mod crt;
pub mod modular;
pub mod ntt;
pub mod permute;
pub mod poly;
pub mod sampler;

pub use crt::{mod_inverse, RnsContext};
pub use modular::ModArith;
pub use ntt::NttTable;
pub use permute::PermTables;
pub use poly::{Moduli, Poly, PolyForm};
pub use sampler::GaussianSampler;
