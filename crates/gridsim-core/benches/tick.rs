//! Tick throughput benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gridsim_core::config::{BoundaryMode, GridConfig};
use gridsim_core::grid::SpatialGrid;
use gridsim_core::prelude::*;

fn benchmark_aggregation_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation_tick");

    for population in [500u32, 2000, 5000].iter() {
        let config = RunConfig::aggregation(AggregationConfig::default().with_population(*population))
            .with_grid(200, 200, BoundaryMode::Toroidal)
            .with_seed(42);
        let mut engine = SimulationEngine::start(config).unwrap();

        // Warm up
        engine.run(10).unwrap();

        group.bench_with_input(BenchmarkId::new("population", population), population, |b, _| {
            b.iter(|| engine.tick().unwrap());
        });
    }

    group.finish();
}

fn benchmark_mating_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("mating_tick");

    for population in [250u32, 1000].iter() {
        // Choosy agents with no closing time keep the population alive.
        let mating = MatingConfig::default()
            .with_population(*population, *population)
            .with_choosiness(20.0)
            .with_max_dates(0)
            .with_clustering(2, 0.25);
        let config = RunConfig::mating(mating)
            .with_grid(100, 100, BoundaryMode::Toroidal)
            .with_seed(42);
        let mut engine = SimulationEngine::start(config).unwrap();

        group.bench_with_input(BenchmarkId::new("population", population), population, |b, _| {
            b.iter(|| engine.tick().unwrap());
        });
    }

    group.finish();
}

fn benchmark_moore_query(c: &mut Criterion) {
    let grid_config = GridConfig::default();
    let config = RunConfig::aggregation(AggregationConfig::default().with_population(5000)).with_seed(7);
    let engine = SimulationEngine::start(config).unwrap();
    let grid: &SpatialGrid = &engine.context().grid;

    c.bench_function("moore_neighbors_r3", |b| {
        b.iter(|| {
            grid.neighbors(
                black_box(grid_config.width / 2),
                black_box(grid_config.height / 2),
                3,
                true,
            )
        });
    });
}

criterion_group!(
    benches,
    benchmark_aggregation_tick,
    benchmark_mating_tick,
    benchmark_moore_query
);
criterion_main!(benches);
