//! Full-engine polyphony benchmarks: voice allocation plus `render` fan-out
//! across the whole pool, the shape that matters for a realtime audio
//! callback budget.
//!
//! Run: `cargo bench --bench engine_render`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fm8::audio::engine::Engine;

fn bench_engine_polyphony_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_polyphony_scaling");

    for voices in [1usize, 4, 8, 16, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(voices), &voices, |b, &voices| {
            let mut engine = Engine::new(44100.0, voices);
            for i in 0..voices {
                engine.note_on(36 + i as u8, 100);
            }

            let mut left = vec![0.0f32; 256];
            let mut right = vec![0.0f32; 256];

            b.iter(|| {
                left.iter_mut().for_each(|s| *s = 0.0);
                right.iter_mut().for_each(|s| *s = 0.0);
                black_box(engine.render(&mut left, &mut right, 256));
            });
        });
    }

    group.finish();
}

/// Buffer-size scaling at a fixed, realistic polyphony count.
fn bench_engine_block_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_block_scaling");

    for block_size in [64usize, 128, 256, 512, 1024] {
        group.bench_with_input(
            BenchmarkId::from_parameter(block_size),
            &block_size,
            |b, &block_size| {
                let mut engine = Engine::new(44100.0, 16);
                for i in 0..16 {
                    engine.note_on(36 + i, 100);
                }

                let mut left = vec![0.0f32; block_size];
                let mut right = vec![0.0f32; block_size];

                b.iter(|| {
                    left.iter_mut().for_each(|s| *s = 0.0);
                    right.iter_mut().for_each(|s| *s = 0.0);
                    black_box(engine.render(&mut left, &mut right, block_size));
                });
            },
        );
    }

    group.finish();
}

/// Sustained churn: note-on/note-off every render call, exercising the
/// allocator and the release path alongside the inner loop instead of a
/// static chord.
fn bench_engine_note_churn(c: &mut Criterion) {
    let mut engine = Engine::new(44100.0, 16);
    let mut left = vec![0.0f32; 256];
    let mut right = vec![0.0f32; 256];
    let mut note = 36u8;

    c.bench_function("engine_note_churn", |b| {
        b.iter(|| {
            engine.note_off(note);
            note = 36 + (note + 1) % 24;
            engine.note_on(note, 100);
            left.iter_mut().for_each(|s| *s = 0.0);
            right.iter_mut().for_each(|s| *s = 0.0);
            black_box(engine.render(&mut left, &mut right, 256));
        });
    });
}

criterion_group!(
    engine_render_benches,
    bench_engine_polyphony_scaling,
    bench_engine_block_scaling,
    bench_engine_note_churn,
);
criterion_main!(engine_render_benches);
