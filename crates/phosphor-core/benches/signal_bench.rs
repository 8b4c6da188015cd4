use criterion::{black_box, criterion_group, criterion_main, Criterion};
use phosphor_core::{ChannelSpec, PeriodicSignal, SignalBuffer, Sample, TickWindow, Waveform};

fn lissajous() -> PeriodicSignal {
    PeriodicSignal::new(
        ChannelSpec::new(Waveform::Sinusoid, 1.0, 11000.0, 0.0),
        ChannelSpec::new(Waveform::Sinusoid, 1.0, 12000.0, 0.0).with_phase_drift(1.0),
    )
}

fn bench_regenerate_512(c: &mut Criterion) {
    let signal = lissajous();
    let mut buffer = SignalBuffer::new(512);
    let window = TickWindow::new(0.0, 1.0 / 60.0);
    c.bench_function("regenerate_512", |b| {
        b.iter(|| buffer.regenerate(black_box(&signal), black_box(&window)));
    });
}

fn bench_regenerate_40960(c: &mut Criterion) {
    let signal = lissajous();
    let mut buffer = SignalBuffer::new(40960);
    let window = TickWindow::new(0.0, 1.0 / 60.0);
    c.bench_function("regenerate_40960", |b| {
        b.iter(|| buffer.regenerate(black_box(&signal), black_box(&window)));
    });
}

fn bench_slide_push_40960(c: &mut Criterion) {
    let mut buffer = SignalBuffer::new(40960);
    c.bench_function("slide_push_1000_into_40960", |b| {
        b.iter(|| {
            for i in 0..1000 {
                buffer.slide_push(black_box(Sample::new(i as f32, 0.0)));
            }
        });
    });
}

criterion_group!(benches, bench_regenerate_512, bench_regenerate_40960, bench_slide_push_40960);
criterion_main!(benches);
