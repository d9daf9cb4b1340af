use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use relprobe_core::{DisplaySurface, ResponseKey, ResponseLayout, StimulusRef, Verdict};
use relprobe_render::SkiaSurface;

fn harness() -> (SkiaSurface, ResponseLayout, Vec<u8>) {
    let width = 1280u32;
    let height = 900u32;
    let surface = SkiaSurface::new(width, height).expect("canvas");
    let layout = ResponseLayout::new(StimulusRef::from("missing/probe.png"));
    let fb = vec![0u8; (width * height * 4) as usize];
    (surface, layout, fb)
}

pub fn bench_trial_layout(c: &mut Criterion) {
    let mut g = c.benchmark_group("render_layout");
    g.sample_size(40);

    g.bench_function("show_trial", |b| {
        b.iter_batched(
            harness,
            |(mut s, layout, mut fb)| {
                s.show_trial(&layout);
                black_box(s.present(&mut fb));
            },
            BatchSize::SmallInput,
        )
    });

    g.bench_function("mark_feedback", |b| {
        b.iter_batched(
            || {
                let (mut s, layout, fb) = harness();
                s.show_trial(&layout);
                (s, fb)
            },
            |(mut s, mut fb)| {
                s.mark_response(ResponseKey::ArrowRight, Verdict::Incorrect);
                black_box(s.present(&mut fb));
            },
            BatchSize::SmallInput,
        )
    });

    g.finish();
}

criterion_group!(benches, bench_trial_layout);
criterion_main!(benches);
