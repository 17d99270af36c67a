//! Server-side kernel throughput.

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use kspir::ks::setup::{BsgsAutoKey, PackingKey};
use kspir::math::sampler::GaussianSampler;
use kspir::params::{ParamSet, PirParams};
use kspir::rlwe::types::RlweSecretKey;
use kspir::{answer, encode_query, encode_rgsw_query, matrix_vector_mul_bsgs, preprocess_database};

fn bench_kernel(c: &mut Criterion) {
    tracing_subscriber::fmt().with_target(false).try_init().ok();

    let params = PirParams::new(ParamSet::N256, 4, 8).unwrap();
    let ctx = params.build_context();
    let tables = params.build_perm_tables();
    let mut sampler = GaussianSampler::from_seed(params.sigma, [200u8; 32]);
    let sk = RlweSecretKey::generate(&ctx, &mut sampler);

    let mut rng = GaussianSampler::from_seed(1.0, [201u8; 32]);
    let db: Vec<Vec<Vec<u64>>> = (0..params.r)
        .map(|_| {
            (0..params.n)
                .map(|_| (0..params.n / 2).map(|_| rng.sample_uniform(params.p)).collect())
                .collect()
        })
        .collect();
    let blob = preprocess_database(&params, &db, &ctx, &tables).unwrap();
    let query = encode_query(&params, &sk, 17, &ctx, &tables, &mut sampler).unwrap();
    let rgsw = encode_rgsw_query(&params, &sk, 1, &ctx, &mut sampler).unwrap();
    let bundle = BsgsAutoKey::generate(&sk, &params, &tables, &ctx, &mut sampler);
    let pack_key = PackingKey::generate(&sk, &params, &tables, &ctx, &mut sampler);

    let db_bytes = (params.r * params.n * params.n / 2 * 8) as u64;

    let mut group = c.benchmark_group("server");
    group.throughput(Throughput::Bytes(db_bytes));
    group.sample_size(10);

    group.bench_function("matrix_vector_mul_bsgs", |b| {
        b.iter(|| {
            matrix_vector_mul_bsgs(&query, &blob, &bundle, &tables, &ctx, &params).unwrap()
        })
    });

    group.bench_function("answer", |b| {
        b.iter(|| {
            answer(
                &params, &query, &rgsw, &bundle, &pack_key, &blob, &tables, &ctx,
            )
            .unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_kernel);
criterion_main!(benches);
