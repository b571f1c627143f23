//! Criterion benchmarks for the entropy probe.
//!
//! Run with:
//!   cargo bench --bench probe

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn lcg_bytes(n: usize, mut seed: u64) -> Vec<u8> {
    (0..n)
        .map(|_| {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            (seed >> 33) as u8
        })
        .collect()
}

fn bench_estimate_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("probe_estimate");

    for &block_size in &[65_536usize, 262_144] {
        let inputs = [
            ("zeros", vec![0u8; block_size]),
            (
                "pattern",
                (0u8..=255).cycle().take(block_size).collect::<Vec<_>>(),
            ),
            ("noise", lcg_bytes(block_size, 1)),
        ];
        for (name, data) in &inputs {
            group.throughput(Throughput::Bytes(block_size as u64));
            group.bench_with_input(
                BenchmarkId::new(*name, block_size),
                data,
                |b, data| b.iter(|| btune::estimate_block(data)),
            );
        }
    }
    group.finish();
}

fn bench_probe_chunk(c: &mut Criterion) {
    let mut group = c.benchmark_group("probe_chunk");

    let chunk_size = 2 * 1024 * 1024;
    let data = lcg_bytes(chunk_size, 7);
    group.throughput(Throughput::Bytes(chunk_size as u64));
    group.bench_with_input(
        BenchmarkId::new("noise_64k_blocks", chunk_size),
        &data,
        |b, data| b.iter(|| btune::probe_chunk(data, 65_536)),
    );
    group.finish();
}

criterion_group!(benches, bench_estimate_block, bench_probe_chunk);
criterion_main!(benches);
