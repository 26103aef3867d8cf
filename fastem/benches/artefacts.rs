use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use fastem::{ArtefactThreshold, Level, DEFAULT_PERCENTILE, DEFAULT_SCALE};

fn synthetic_level(size: u32, seed: u32) -> Level {
    let samples = (0..size * size)
        .map(|i| (i.wrapping_mul(2_654_435_761).wrapping_add(seed) >> 20) as u16)
        .collect();
    Level::new(size, size, samples).expect("sample count matches dimensions")
}

fn percentile_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_percentile");
    for size in [256u32, 1024] {
        let level = synthetic_level(size, 7);
        group.bench_with_input(BenchmarkId::from_parameter(size), &level, |b, level| {
            b.iter(|| level.percentile(DEFAULT_PERCENTILE).unwrap())
        });
    }
    group.finish();
}

fn threshold_benchmarks(c: &mut Criterion) {
    // A megafield's worth of coarsest levels.
    let reference: Vec<Level> = (0..196).map(|seed| synthetic_level(96, seed)).collect();

    c.bench_function("threshold_from_reference", |b| {
        b.iter(|| ArtefactThreshold::from_reference(&reference, DEFAULT_PERCENTILE).unwrap())
    });

    let threshold = ArtefactThreshold::from_reference(&reference, DEFAULT_PERCENTILE).unwrap();
    c.bench_function("classify_megafield", |b| {
        b.iter(|| {
            reference
                .iter()
                .filter(|level| threshold.is_artefact(*level, DEFAULT_SCALE).unwrap())
                .count()
        })
    });
}

criterion_group!(benches, percentile_benchmarks, threshold_benchmarks);
criterion_main!(benches);
