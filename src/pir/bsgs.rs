//! The BSGS homomorphic matrix-vector kernel.
//!
//! Baby step: N1 rotations of the query built through the RNS chain
//! (rotations past N1/2 take a second hop, which is why the bundle only
//! carries N1/2 baby keys), folded to Q and laid out in a contiguous buffer.
//! Dim-1 inner product: per (matrix, giant index), a slot-wise
//! multiply-accumulate of the N1 rotated ciphertexts against the blob rows,
//! in 128-bit accumulators reduced on write-out. Giant step: each
//! accumulator is rotated by 5^(N1·i_g) through the folding key-switch and
//! summed.
//!
//! Work items are one per baby rotation and one per (giant index × matrix),
//! statically partitioned over a fixed-width rayon pool.

use rayon::prelude::*;
use tracing::{debug, info_span};

use crate::ks::setup::BsgsAutoKey;
use crate::ks::switch::{eval_auto_fold, eval_auto_rns};
use crate::math::crt::RnsContext;
use crate::math::modular::reduce_u128;
use crate::math::permute::PermTables;
use crate::math::poly::{Moduli, Poly};
use crate::params::PirParams;
use crate::rlwe::enc::fold_rns;
use crate::rlwe::types::{RlweCiphertext, RnsRlweCiphertext};

use super::encode_db::DbBlob;
use super::error::{pir_err, Result};

/// Builds the baby-step table: R[i] = Auto_{5^i}(query) for i in [0, N1),
/// folded to Q and in NTT form.
pub fn baby_step_table(
    query: &RnsRlweCiphertext,
    bundle: &BsgsAutoKey,
    tables: &PermTables,
    ctx: &RnsContext,
    n1: usize,
) -> Result<Vec<RlweCiphertext>> {
    let half = n1 / 2;

    let first: Vec<RnsRlweCiphertext> = (1..=half)
        .into_par_iter()
        .map(|i| {
            let t = tables.pow5(i);
            eval_auto_rns(query, t, &bundle.baby[&t], tables, ctx)
        })
        .collect();

    // Rotations past N1/2 hop once more through R[i - N1/2].
    let hop_t = tables.pow5(half.max(1));
    let second: Vec<RnsRlweCiphertext> = (half + 1..n1)
        .into_par_iter()
        .map(|i| {
            let src = &first[i - half - 1];
            eval_auto_rns(src, hop_t, &bundle.baby[&hop_t], tables, ctx)
        })
        .collect();

    let mut pairs = Vec::with_capacity(n1);
    pairs.push(query.clone());
    pairs.extend(first);
    pairs.extend(second);
    if pairs.len() != n1 {
        return Err(pir_err!("baby table has {} entries, wanted {n1}", pairs.len()));
    }

    let folded = pairs
        .into_par_iter()
        .map(|mut pair| {
            pair.q.from_ntt(ctx);
            pair.bs.from_ntt(ctx);
            let mut ct = fold_rns(&pair, ctx);
            ct.to_ntt(ctx);
            ct
        })
        .collect();
    Ok(folded)
}

/// Lays the baby table out contiguously: per rotation, the a plane then the
/// b plane, each N slots of adjacent [q1, q2] words.
pub fn reorient_ciphers(table: &[RlweCiphertext], n: usize) -> Vec<u64> {
    let mut buf = vec![0u64; table.len() * 4 * n];
    for (i_b, ct) in table.iter().enumerate() {
        for (part, poly) in [(0usize, &ct.a), (1usize, &ct.b)] {
            let base = (i_b * 2 + part) * 2 * n;
            let c1 = poly.channel(0);
            let c2 = poly.channel(1);
            for j in 0..n {
                buf[base + 2 * j] = c1[j];
                buf[base + 2 * j + 1] = c2[j];
            }
        }
    }
    buf
}

/// The hot loop: Acc = Σ_{i_b} R[i_b] · D[(i_b, i_g)] over matrix k,
/// slot-wise per residue channel, accumulated in u128 and reduced once.
fn inner_product(
    cipherbuf: &[u64],
    db: &DbBlob,
    k: usize,
    i_g: usize,
    n: usize,
    n1: usize,
    ctx: &RnsContext,
) -> RlweCiphertext {
    let mut acc_a = vec![0u128; 2 * n];
    let mut acc_b = vec![0u128; 2 * n];

    for i_b in 0..n1 {
        let row = db.row(k, i_g, i_b);
        let a_plane = &cipherbuf[(i_b * 2) * 2 * n..(i_b * 2 + 1) * 2 * n];
        let b_plane = &cipherbuf[(i_b * 2 + 1) * 2 * n..(i_b * 2 + 2) * 2 * n];
        for j in 0..2 * n {
            let d = row[j] as u128;
            acc_a[j] += a_plane[j] as u128 * d;
            acc_b[j] += b_plane[j] as u128 * d;
        }
    }

    let (q1, q2) = (ctx.q1(), ctx.q2());
    let (t1, t2) = (ctx.two64_q1(), ctx.two64_q2());
    let moduli = Moduli::for_big_q(ctx);
    let mut a_vals = vec![0u64; 2 * n];
    let mut b_vals = vec![0u64; 2 * n];
    for j in 0..n {
        a_vals[j] = reduce_u128(acc_a[2 * j], q1, t1);
        a_vals[n + j] = reduce_u128(acc_a[2 * j + 1], q2, t2);
        b_vals[j] = reduce_u128(acc_b[2 * j], q1, t1);
        b_vals[n + j] = reduce_u128(acc_b[2 * j + 1], q2, t2);
    }

    RlweCiphertext::from_parts(
        Poly::from_ntt_vals(a_vals, n, moduli),
        Poly::from_ntt_vals(b_vals, n, moduli),
    )
}

/// Runs the full kernel: r output ciphertexts over Q in NTT form, the k-th
/// holding the homomorphically selected column of matrix k.
pub fn matrix_vector_mul_bsgs(
    query: &RnsRlweCiphertext,
    db: &DbBlob,
    bundle: &BsgsAutoKey,
    tables: &PermTables,
    ctx: &RnsContext,
    params: &PirParams,
) -> Result<Vec<RlweCiphertext>> {
    query
        .check_coherent(ctx)
        .map_err(|e| pir_err!("malformed query: {e}"))?;
    if !query.q.is_ntt() {
        return Err(pir_err!("query must be in NTT form"));
    }
    if db.n() != params.n || db.n1() != params.n1 || db.r() != params.r {
        return Err(pir_err!("database blob does not match parameters"));
    }
    if bundle.n1 != params.n1 {
        return Err(pir_err!("key bundle does not match N1"));
    }

    let span = info_span!("bsgs_kernel", n = params.n, n1 = params.n1, r = params.r);
    let _guard = span.enter();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(params.threads)
        .build()
        .map_err(|e| pir_err!("worker pool: {e}"))?;

    pool.install(|| {
        let table = baby_step_table(query, bundle, tables, ctx, params.n1)?;
        let cipherbuf = reorient_ciphers(&table, params.n);
        debug!(entries = table.len(), "baby-step table ready");

        // One work item per (matrix, giant index); the final per-matrix sum
        // is associative mod Q, so any reduction order is fine.
        let contributions: Vec<(usize, RlweCiphertext)> = (0..params.r * params.n2)
            .into_par_iter()
            .map(|idx| {
                let k = idx / params.n2;
                let i_g = idx % params.n2;
                let acc = inner_product(&cipherbuf, db, k, i_g, params.n, params.n1, ctx);
                let rotated = if i_g == 0 {
                    acc
                } else {
                    let t = tables.pow5(params.n1 * i_g);
                    eval_auto_fold(&acc, t, &bundle.giant[&t], tables, ctx)
                };
                (k, rotated)
            })
            .collect();

        let mut results: Vec<Option<RlweCiphertext>> = vec![None; params.r];
        for (k, ct) in contributions {
            match &mut results[k] {
                Some(acc) => acc.add_assign(&ct),
                slot => *slot = Some(ct),
            }
        }
        Ok(results.into_iter().map(|c| c.expect("giant step missing")).collect())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::sampler::GaussianSampler;
    use crate::params::ParamSet;
    use crate::pir::encode_db::preprocess_database;
    use crate::pir::query::encode_query;
    use crate::rlwe::enc::{decode_rounded, decrypt_phase};
    use crate::rlwe::types::RlweSecretKey;

    fn run_kernel(
        params: &PirParams,
        db: &[Vec<Vec<u64>>],
        target_col: usize,
        seed: u8,
    ) -> (Vec<Vec<u64>>, RlweSecretKey) {
        let ctx = params.build_context();
        let tables = params.build_perm_tables();
        let mut sampler = GaussianSampler::from_seed(params.sigma, [seed; 32]);
        let sk = RlweSecretKey::generate(&ctx, &mut sampler);

        let blob = preprocess_database(params, db, &ctx, &tables).unwrap();
        let query = encode_query(params, &sk, target_col, &ctx, &tables, &mut sampler).unwrap();
        let bundle = BsgsAutoKey::generate(&sk, params, &tables, &ctx, &mut sampler);

        let results = matrix_vector_mul_bsgs(&query, &blob, &bundle, &tables, &ctx, params).unwrap();
        let decoded = results
            .iter()
            .map(|ct| decode_rounded(&decrypt_phase(ct, &sk, &ctx), params.p))
            .collect();
        (decoded, sk)
    }

    #[test]
    fn test_kernel_selects_column() {
        // Planted column: DB[row][col] = row + 1, zero elsewhere.
        let params = PirParams::new(ParamSet::N256, 2, 8).unwrap();
        let target_col = 3usize;
        let mut db = vec![vec![vec![0u64; 128]; 256]; 2];
        for k in 0..2 {
            for row in 0..256 {
                db[k][row][target_col] = (row as u64 + 1 + k as u64) % params.p;
            }
        }

        let (decoded, _) = run_kernel(&params, &db, target_col, 71);
        for k in 0..2 {
            for row in 0..256 {
                let expected = (row as u64 + 1 + k as u64) % params.p;
                assert_eq!(decoded[k][row], expected, "matrix {k} row {row}");
            }
        }
    }

    #[test]
    fn test_kernel_random_database() {
        let params = PirParams::new(ParamSet::N256, 2, 16).unwrap();
        let target_col = 77usize;
        let mut rng = GaussianSampler::from_seed(1.0, [72u8; 32]);
        let db: Vec<Vec<Vec<u64>>> = (0..2)
            .map(|_| {
                (0..256)
                    .map(|_| (0..128).map(|_| rng.sample_uniform(params.p)).collect())
                    .collect()
            })
            .collect();

        let (decoded, _) = run_kernel(&params, &db, target_col, 73);
        for k in 0..2 {
            for row in 0..256 {
                assert_eq!(decoded[k][row], db[k][row][target_col], "matrix {k} row {row}");
            }
        }
    }

    #[test]
    fn test_kernel_rejects_mismatched_blob() {
        let params = PirParams::new(ParamSet::N256, 2, 8).unwrap();
        let other = PirParams::new(ParamSet::N256, 2, 16).unwrap();
        let ctx = params.build_context();
        let tables = params.build_perm_tables();
        let mut sampler = GaussianSampler::from_seed(3.2, [74u8; 32]);
        let sk = RlweSecretKey::generate(&ctx, &mut sampler);

        let db = vec![vec![vec![0u64; 128]; 256]; 2];
        let blob = preprocess_database(&other, &db, &ctx, &tables).unwrap();
        let query = encode_query(&params, &sk, 0, &ctx, &tables, &mut sampler).unwrap();
        let bundle = BsgsAutoKey::generate(&sk, &params, &tables, &ctx, &mut sampler);

        assert!(matrix_vector_mul_bsgs(&query, &blob, &bundle, &tables, &ctx, &params).is_err());
    }
}
