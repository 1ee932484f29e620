//! Workflow benchmarks over the memory and file gateways.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use linksync_bench::{generate_ids, unshared_facts};
use linksync_bus::{bootstrap, pull, BusCommand, ServiceConfig};
use linksync_core::MemoryGateway;
use linksync_store::{FileGateway, StoreConfig, StoreDir};
use std::sync::Arc;
use tempfile::TempDir;

/// Benchmark the pull service on an in-memory gateway.
fn bench_pull_service(c: &mut Criterion) {
    let mut group = c.benchmark_group("pull_service");
    let config = ServiceConfig::default();

    for count in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let facts = unshared_facts(count);
            let requested = generate_ids(count);
            b.iter(|| {
                let gateway = MemoryGateway::with_facts(facts.clone());
                let response = pull(&gateway, black_box(&requested), &config).unwrap();
                black_box(response);
            });
        });
    }
    group.finish();
}

/// Benchmark a batch pull dispatched through the bus.
fn bench_bus_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("bus_batch_pull");

    for count in [10, 100].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let facts = unshared_facts(count);
            let requested = generate_ids(count);
            b.iter(|| {
                let gateway = Arc::new(MemoryGateway::with_facts(facts.clone()));
                let bus = bootstrap(gateway, ServiceConfig::default()).unwrap();
                bus.handle(BusCommand::PullEntities {
                    requested: black_box(requested.clone()),
                })
                .unwrap();
            });
        });
    }
    group.finish();
}

/// Benchmark the pull service on a file gateway.
fn bench_file_pull(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_pull");
    group.sample_size(20);

    for count in [10, 100].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let temp = TempDir::new().unwrap();
            let facts = unshared_facts(count);
            let requested = generate_ids(count);
            let config = StoreConfig::new(temp.path()).with_pretty(false);
            b.iter(|| {
                StoreDir::open(temp.path(), true)
                    .unwrap()
                    .save(&facts, false)
                    .unwrap();
                let gateway = FileGateway::open(config.clone()).unwrap();
                let response = pull(&gateway, &requested, &ServiceConfig::default()).unwrap();
                black_box(response);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pull_service, bench_bus_batch, bench_file_pull);

criterion_main!(benches);
