//! Single-server private information retrieval from Ring-LWE / Ring-GSW.
//!
//! A client holding a secret key retrieves one element of a server-side
//! N × (N/2) matrix database (r of them, packed) without revealing the
//! coordinate. The server's core is a Baby-step/Giant-step homomorphic
//! matrix-vector product over a CRT-interleaved, NTT-form database, followed
//! by an RGSW external product selecting the packing row and an RLWE packing
//! step compressing the r results into one response.
//!
//! Key components:
//! - `math`: modular/NTT/CRT primitives, permutation tables, sampling
//! - `rlwe`, `rgsw`: ciphertext types, encryption, external product
//! - `ks`: automorphism key switching (plain, RNS-resident, folding)
//! - `pir`: database encoding, the BSGS kernel, query/answer/decode

pub mod ks;
pub mod math;
pub mod params;
pub mod pir;
pub mod rgsw;
pub mod rlwe;

pub use params::{ParamSet, PirParams};
pub use pir::{
    answer, decode_kernel_output, decode_response, encode_query, encode_rgsw_query,
    matrix_vector_mul_bsgs, pack_rlwes, preprocess_database, DbBlob,
};
pub use rgsw::RgswCiphertext;
pub use rlwe::{RlweCiphertext, RlweSecretKey, RnsRlweCiphertext};
