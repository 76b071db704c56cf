//! Benchmarks for the hot paths: find-or-create, recording and correlation.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use datastore::{Datastore, NewQuery, QueryStatus, StoreConfig};

fn populated_store(domains: usize) -> Datastore {
    let mut store = Datastore::new(StoreConfig::default()).unwrap();
    for i in 0..domains {
        store.find_domain(&format!("d{}.example", i), false).unwrap();
        store
            .find_client(&format!("10.0.{}.{}", i / 256, i % 256), true, false)
            .unwrap();
    }
    store
}

fn bench_find_domain_hit(c: &mut Criterion) {
    let mut store = populated_store(5_000);
    c.bench_function("find_domain_hit_5k", |b| {
        b.iter(|| store.find_domain(black_box("d4999.example"), true).unwrap())
    });
}

fn bench_find_client_hit(c: &mut Criterion) {
    let mut store = populated_store(1_000);
    c.bench_function("find_client_hit_1k", |b| {
        b.iter(|| store.find_client(black_box("10.0.3.231"), false, false).unwrap())
    });
}

fn bench_add_query(c: &mut Criterion) {
    c.bench_function("add_query_and_forward", |b| {
        b.iter_batched(
            || populated_store(100),
            |mut store| {
                for id in 0..1_000 {
                    let q = store
                        .add_query(NewQuery::new(id, "d42.example", "10.0.0.42", 1))
                        .unwrap();
                    store.set_status(q, QueryStatus::Forwarded, false);
                }
                store
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_find_query(c: &mut Criterion) {
    let mut store = populated_store(10);
    for id in 0..10_000 {
        store
            .add_query(NewQuery::new(id, "d1.example", "10.0.0.1", 1))
            .unwrap();
    }
    c.bench_function("find_query_recent", |b| {
        b.iter(|| store.find_query(black_box(9_990)))
    });
    c.bench_function("find_query_miss", |b| {
        b.iter(|| store.find_query(black_box(-1)))
    });
}

criterion_group!(
    benches,
    bench_find_domain_hit,
    bench_find_client_hit,
    bench_add_query,
    bench_find_query,
);
criterion_main!(benches);
