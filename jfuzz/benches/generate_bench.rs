//! Program generation benchmarks using criterion.
//!
//! Run with: cargo bench --bench generate_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use jfuzz::tokens::Tokenizer;
use jfuzz::{generate_program, GenConfig};

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");

    let default = GenConfig::default();
    group.bench_function("default", |b| {
        let mut seed = 0u64;
        b.iter(|| {
            seed += 1;
            generate_program(black_box(&default), seed).unwrap()
        });
    });

    for depth in [2usize, 4, 6] {
        let config = GenConfig {
            max_expression_depth: depth,
            max_statement_depth: depth,
            ..GenConfig::default()
        };
        group.bench_with_input(BenchmarkId::new("depth", depth), &config, |b, config| {
            b.iter(|| generate_program(black_box(config), 7).unwrap());
        });
    }

    group.finish();
}

fn bench_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");

    let source = generate_program(&GenConfig::default(), 42).unwrap().source;
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_with_input(
        BenchmarkId::new("generated", source.len()),
        source.as_str(),
        |b, source| {
            b.iter(|| Tokenizer::new(black_box(source)).count());
        },
    );

    group.finish();
}

criterion_group!(benches, bench_generate, bench_tokenize);
criterion_main!(benches);
