//! The server's full answer path: BSGS matrix-vector kernel, external
//! product with the packing-row query, response packing.

use rayon::prelude::*;
use tracing::info_span;

use crate::ks::setup::{BsgsAutoKey, PackingKey};
use crate::math::crt::RnsContext;
use crate::math::permute::PermTables;
use crate::params::PirParams;
use crate::rgsw::external_product::external_product;
use crate::rgsw::types::RgswCiphertext;
use crate::rlwe::types::{RlweCiphertext, RnsRlweCiphertext};

use super::bsgs::matrix_vector_mul_bsgs;
use super::encode_db::DbBlob;
use super::error::Result;
use super::packing::pack_rlwes;

/// Answers one query: returns a single RLWE ciphertext whose decryption
/// interleaves the r selected column vectors at positions ≡ k (mod r).
pub fn answer(
    params: &PirParams,
    query: &RnsRlweCiphertext,
    rgsw_query: &RgswCiphertext,
    auto_keys: &BsgsAutoKey,
    packing_key: &PackingKey,
    db: &DbBlob,
    tables: &PermTables,
    ctx: &RnsContext,
) -> Result<RlweCiphertext> {
    let kernel_out = {
        let span = info_span!("matrix_vector");
        let _guard = span.enter();
        matrix_vector_mul_bsgs(query, db, auto_keys, tables, ctx, params)?
    };

    let selected: Vec<RlweCiphertext> = {
        let span = info_span!("external_product");
        let _guard = span.enter();
        kernel_out
            .into_par_iter()
            .map(|mut ct| {
                ct.from_ntt(ctx);
                external_product(&ct, rgsw_query, ctx)
            })
            .collect()
    };

    let span = info_span!("packing");
    let _guard = span.enter();
    pack_rlwes(&selected, packing_key, tables, ctx)
}
