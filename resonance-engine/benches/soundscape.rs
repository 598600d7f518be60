use criterion::{black_box, criterion_group, criterion_main, Criterion};
use resonance_engine::{Engine, EngineConfig, Soundscape};

fn bench_soundscape(c: &mut Criterion) {
    let cfg = EngineConfig::default();
    let sr = cfg.sample_rate;

    let mut all = Engine::new(Soundscape::new(&cfg).expect("config"), sr);
    for i in 0..5 {
        all.generator_mut().toggle(i).expect("layer");
    }
    let mut buf = vec![0.0f32; 512 * 2];

    c.bench_function("soundscape_all_layers_512_frames", |b| {
        b.iter(|| {
            all.render_interleaved(&mut buf, 2);
            black_box(buf[0]);
        })
    });

    let mut idle = Engine::new(Soundscape::new(&cfg).expect("config"), sr);
    c.bench_function("soundscape_idle_512_frames", |b| {
        b.iter(|| {
            idle.render_interleaved(&mut buf, 2);
            black_box(buf[0]);
        })
    });
}

criterion_group!(benches, bench_soundscape);
criterion_main!(benches);
