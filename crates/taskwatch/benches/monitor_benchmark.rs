//! Performance benchmarks for the liveness monitor hot paths.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use taskwatch::prelude::*;

fn table(tasks: usize) -> TaskTable {
    (0..tasks)
        .map(|i| TaskConfig::new(format!("task_{i}"), 1_000))
        .collect()
}

fn bench_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("report");

    group.bench_function("report_stats", |b| {
        let clock = ManualTick::new(0);
        let timer = SoftwareTimer::new(TimerConfig::default(), &clock);
        let Ok(mut monitor) = LivenessMonitor::builder(table(8), timer, &clock).build() else {
            return;
        };
        if monitor.init().and_then(|()| monitor.start()).is_err() {
            return;
        }
        b.iter(|| black_box(monitor.report(black_box(TaskId::new(3)))));
    });

    group.bench_function("report_noop", |b| {
        let clock = ManualTick::new(0);
        let timer = SoftwareTimer::new(TimerConfig::default(), &clock);
        let Ok(mut monitor) = LivenessMonitor::builder(table(8), timer, &clock)
            .recorder::<NoopRecorder>()
            .build()
        else {
            return;
        };
        if monitor.init().and_then(|()| monitor.start()).is_err() {
            return;
        }
        b.iter(|| black_box(monitor.report(black_box(TaskId::new(3)))));
    });

    group.finish();
}

fn bench_poll(c: &mut Criterion) {
    let mut group = c.benchmark_group("poll");

    for tasks in [1usize, 8, 64] {
        group.bench_with_input(BenchmarkId::new("poll_tasks", tasks), &tasks, |b, &tasks| {
            let clock = ManualTick::new(0);
            let timer = SoftwareTimer::new(TimerConfig::default(), &clock);
            let Ok(mut monitor) = LivenessMonitor::builder(table(tasks), timer, &clock).build()
            else {
                return;
            };
            if monitor.init().and_then(|()| monitor.start()).is_err() {
                return;
            }
            b.iter(|| black_box(monitor.poll()));
        });
    }

    group.finish();
}

fn bench_trace_push(c: &mut Criterion) {
    let mut trace = TraceBuffer::<32>::new();
    c.bench_function("trace_push", |b| {
        b.iter(|| trace.push(black_box(TaskId::new(1))));
    });
}

criterion_group!(benches, bench_report, bench_poll, bench_trace_push);
criterion_main!(benches);
