#[path = "../tests/fixtures/mod.rs"]
mod fixtures;

use crate::fixtures::load_ohlc;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use edge_spread::{SimConfig, Window, edge, edge_expanding, edge_rolling, simulate};
use rand::{SeedableRng, rngs::StdRng};
use std::{hint::black_box, time::Duration};

fn single_window_benchmarks(c: &mut Criterion) {
    let bars = load_ohlc();
    let mut group = c.benchmark_group("single");
    group.throughput(Throughput::Elements(bars.len() as u64));
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("edge300", |b| {
        b.iter(|| black_box(edge(&bars.open, &bars.high, &bars.low, &bars.close, false)));
    });

    group.finish();
}

fn rolling_benchmarks(c: &mut Criterion) {
    let config = SimConfig {
        periods: 10_000,
        trades: 100,
        prob: 0.5,
        ..Default::default()
    };
    let bars = simulate(&config, &mut StdRng::seed_from_u64(1)).expect("valid simulation config");
    let mut group = c.benchmark_group("rolling");
    group.throughput(Throughput::Elements(bars.len() as u64));
    group.measurement_time(Duration::from_secs(10));

    for width in [21, 252] {
        let window = Window::Fixed(width);
        group.bench_function(format!("fixed{width}"), |b| {
            b.iter(|| black_box(edge_rolling(&bars.open, &bars.high, &bars.low, &bars.close, &window, false, true)));
        });
    }
    group.bench_function("expanding", |b| {
        b.iter(|| black_box(edge_expanding(&bars.open, &bars.high, &bars.low, &bars.close, false, true)));
    });

    group.finish();
}

criterion_group!(benches, single_window_benchmarks, rolling_benchmarks);
criterion_main!(benches);
