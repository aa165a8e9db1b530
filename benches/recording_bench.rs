// benches/recording_bench.rs
use std::hint::black_box;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use cycletrace::{SharedSink, ThreadId, TraceConfig, TraceRecorder};

fn bench_recording(c: &mut Criterion) {
    let config = TraceConfig {
        capacity: 1 << 16,
        drain_interval: Duration::from_millis(100),
        calibration_period: Duration::from_millis(10),
    };
    let recorder =
        TraceRecorder::initialize(Box::new(SharedSink::new()), config).expect("recorder");
    let thread = ThreadId::current();

    c.bench_function("point_event", |b| {
        b.iter(|| recorder.point_event(black_box(thread), "bench"));
    });

    c.bench_function("interval_round_trip", |b| {
        b.iter(|| {
            let id = recorder.start_interval(black_box(thread), "bench");
            recorder.stop_interval(thread, id, "bench");
        });
    });

    recorder.set_active(false);
    c.bench_function("disabled_point_event", |b| {
        b.iter(|| recorder.point_event(black_box(thread), "bench"));
    });

    recorder.shutdown().expect("shutdown");
}

criterion_group!(benches, bench_recording);
criterion_main!(benches);
