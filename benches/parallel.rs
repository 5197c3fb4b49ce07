#![cfg(feature = "parallel")]

use criterion::{Criterion, SamplingMode, criterion_group, criterion_main};
use seal_rsa::engines::generate_rsa_keys_with;
use seal_rsa::{KeyConfig, KeyPairContext, generate_rsa_key};

fn bench_batch_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("RSA-2048 x8");
    group.sampling_mode(SamplingMode::Flat);
    group.sample_size(10);

    group.bench_function("sequential", |b| {
        b.iter(|| {
            (0..8)
                .map(|_| generate_rsa_key(2048).unwrap())
                .collect::<Vec<_>>()
        });
    });

    for threads in [2usize, 4, 0] {
        let config = KeyConfig {
            max_parallel_keygen: threads,
            ..KeyConfig::default()
        };
        group.bench_function(format!("parallel threads={threads}"), |b| {
            b.iter(|| {
                let keys: Vec<KeyPairContext> = generate_rsa_keys_with(&config, 2048, 8).unwrap();
                keys
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_batch_generation);
criterion_main!(benches);
