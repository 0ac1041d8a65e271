//! Series cardinality read latency benchmark

use cardinality_provider::prelude::*;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use datafusion::execution::memory_pool::{MemoryPool, UnboundedMemoryPool};
use std::sync::Arc;

const ORG: OrgId = OrgId::new(10);
const BUCKET: BucketId = BucketId::new(1);

fn populated_provider(series: usize, shards: usize) -> Provider {
    let store = Arc::new(MemoryReadsStore::new(shards));
    for i in 0..series {
        let key = SeriesKey::new("cpu", "usage")
            .with_tag("host", format!("host-{}", i % 500))
            .with_tag("core", format!("{}", i / 500));
        store.write(ORG, BUCKET, &key, 1_500_000_000);
    }

    let buckets = Arc::new(LocalBucketLookup::new());
    buckets.insert(ORG, "bench", BUCKET);
    Provider::new(store, buckets)
}

fn benchmark_read(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ctx = ExecutionContext::new().with_request(Request::new(ORG));
    let pool: Arc<dyn MemoryPool> = Arc::new(UnboundedMemoryPool::default());
    let bounds = Bounds::from_nanos(1_000_000_000, 2_000_000_000);

    let mut group = c.benchmark_group("series_cardinality_read");
    group.throughput(Throughput::Elements(1));

    for (series, shards) in [(1_000, 1), (10_000, 1), (10_000, 8)] {
        let provider = populated_provider(series, shards);
        let reader = rt
            .block_on(provider.series_cardinality_reader_for(
                &ctx,
                &Config::bucket_name("bench"),
                &bounds,
                None,
            ))
            .unwrap();

        group.bench_function(format!("{series}_series_{shards}_shards"), |b| {
            b.to_async(&rt).iter(|| async {
                let mut value = 0;
                reader
                    .read(
                        &ctx,
                        &mut |table: &Table| -> Result<()> {
                            value = table.int64_column(VALUE_COLUMN).map_or(0, |c| c.value(0));
                            Ok(())
                        },
                        &pool,
                    )
                    .await
                    .unwrap();
                black_box(value);
            });
        });
    }

    group.finish();
}

fn benchmark_reader_construction(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ctx = ExecutionContext::new().with_request(Request::new(ORG));
    let provider = populated_provider(100, 1);
    let bounds = Bounds::from_nanos(1_000_000_000, 2_000_000_000);
    let predicate = Predicate::eq("_measurement", "cpu").and(Predicate::matches_regex("host", "^host-1"));

    let mut group = c.benchmark_group("series_cardinality_reader");
    group.throughput(Throughput::Elements(1));

    group.bench_function("by_name", |b| {
        b.to_async(&rt).iter(|| async {
            let reader = provider
                .series_cardinality_reader_for(
                    &ctx,
                    &Config::bucket_name("bench"),
                    &bounds,
                    Some(predicate.clone()),
                )
                .await
                .unwrap();
            black_box(reader);
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_read, benchmark_reader_construction);

criterion_main!(benches);
