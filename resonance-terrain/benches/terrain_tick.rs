use criterion::{black_box, criterion_group, criterion_main, Criterion};
use resonance_terrain::prelude::*;

fn bench_noise(c: &mut Criterion) {
    let n = Simplex2::new(77);
    c.bench_function("simplex_sample_4096", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for k in 0..4096 {
                acc += n.sample(black_box(k as f64 * 0.013), black_box(k as f64 * 0.007));
            }
            acc
        })
    });
}

fn bench_tick(c: &mut Criterion) {
    let mut grid = TerrainGrid::default();
    c.bench_function("terrain_tick_128", |b| {
        b.iter(|| {
            grid.tick(black_box(1.0 / 60.0));
            grid.revision()
        })
    });
}

criterion_group!(benches, bench_noise, bench_tick);
criterion_main!(benches);
