//! Core DSP component benchmarks: the polynomial oscillator, the decimated
//! LFO, and a single voice's inner FM-matrix loop in isolation.
//!
//! Run: `cargo bench --bench inner_loop`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fm8::audio::voice::Voice;
use fm8::dsp::oscillator::{sin_approx, wrap_phase};
use fm8::dsp::Lfo;
use fm8::params::ParameterStore;

fn bench_sin_approx(c: &mut Criterion) {
    let mut phase = 0.0f32;
    c.bench_function("sin_approx", |b| {
        b.iter(|| {
            phase = wrap_phase(phase + 0.01);
            black_box(sin_approx(black_box(phase)))
        });
    });
}

fn bench_lfo_tick(c: &mut Criterion) {
    let mut lfo = Lfo::triggered(0.001);
    c.bench_function("lfo_tick", |b| {
        b.iter(|| black_box(lfo.tick()));
    });
}

/// One voice, fully triggered, rendering a realistic plugin buffer size.
/// This is the hottest loop in the engine: 8x8 cross-modulation, polynomial
/// sine, and per-operator envelope interpolation, once per sample.
fn bench_voice_render_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("voice_render_block");

    for block_size in [64usize, 256, 1024] {
        group.bench_function(format!("frames_{block_size}"), |b| {
            let params = ParameterStore::default();
            let mut left = vec![0.0f32; block_size];
            let mut right = vec![0.0f32; block_size];

            b.iter_batched(
                || {
                    let mut voice = Voice::new();
                    voice.trigger(&params, 69, 127, 1.0, 0.0, 1.0 / 44100.0, params.lfo_freq());
                    voice
                },
                |mut voice| {
                    left.iter_mut().for_each(|s| *s = 0.0);
                    right.iter_mut().for_each(|s| *s = 0.0);
                    voice.render(&params, &mut left, &mut right, block_size);
                    black_box((left[0], right[0]));
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// An 8-operator voice with every operator enabled as both a carrier and a
/// modulator of every other operator: the heaviest routing configuration
/// the FM matrix supports.
fn bench_voice_render_worst_case_routing(c: &mut Criterion) {
    let mut params = ParameterStore::default();
    for dst in 0..fm8::OPERATORS {
        params.set_parameter(fm8::params::ParamId::Carriers, dst, 1.0);
    }
    let mod_rows = [
        fm8::params::ParamId::ModToCarriers0,
        fm8::params::ParamId::ModToCarriers1,
        fm8::params::ParamId::ModToCarriers2,
        fm8::params::ParamId::ModToCarriers3,
        fm8::params::ParamId::ModToCarriers4,
        fm8::params::ParamId::ModToCarriers5,
        fm8::params::ParamId::ModToCarriers6,
        fm8::params::ParamId::ModToCarriers7,
    ];
    for row in mod_rows {
        for dst in 0..fm8::OPERATORS {
            params.set_parameter(row, dst, 0.3);
        }
    }

    let mut voice = Voice::new();
    voice.trigger(&params, 69, 127, 1.0, 0.0, 1.0 / 44100.0, params.lfo_freq());
    let mut left = vec![0.0f32; 256];
    let mut right = vec![0.0f32; 256];

    c.bench_function("voice_render_worst_case_routing", |b| {
        b.iter(|| {
            voice.render(&params, &mut left, &mut right, 256);
            black_box((left[0], right[0]))
        });
    });
}

criterion_group!(
    inner_loop_benches,
    bench_sin_approx,
    bench_lfo_tick,
    bench_voice_render_block,
    bench_voice_render_worst_case_routing,
);
criterion_main!(inner_loop_benches);
