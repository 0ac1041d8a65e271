//! End-to-end cardinality reads against the in-memory store
//!
//! Writes series into a sharded `MemoryReadsStore`, resolves buckets through
//! `LocalBucketLookup` and checks the counts a reader materializes.

use cardinality_provider::config::ComponentFactory;
use cardinality_provider::prelude::*;

use datafusion::execution::memory_pool::{MemoryPool, UnboundedMemoryPool};
use std::sync::Arc;

const ORG: OrgId = OrgId::new(10);
const OTHER_ORG: OrgId = OrgId::new(11);
const BUCKET: BucketId = BucketId::new(1);

const SECOND: i64 = 1_000_000_000;

fn cpu(host: &str) -> SeriesKey {
    SeriesKey::new("cpu", "usage").with_tag("host", host)
}

fn mem(host: &str) -> SeriesKey {
    SeriesKey::new("mem", "used").with_tag("host", host)
}

struct Harness {
    store: Arc<MemoryReadsStore>,
    provider: Provider,
    pool: Arc<dyn MemoryPool>,
}

impl Harness {
    fn new(shards: usize) -> Self {
        let store = Arc::new(MemoryReadsStore::new(shards));
        let buckets = Arc::new(LocalBucketLookup::new());
        buckets.insert(ORG, "telegraf", BUCKET);
        buckets.insert(OTHER_ORG, "telegraf", BucketId::new(2));

        let provider = Provider::new(store.clone(), buckets);
        Self {
            store,
            provider,
            pool: Arc::new(UnboundedMemoryPool::default()),
        }
    }

    fn seed(&self) {
        for host in ["a", "b", "c", "d"] {
            self.store.write(ORG, BUCKET, &cpu(host), SECOND + 10);
            // second point for the same series must not double count
            self.store.write(ORG, BUCKET, &cpu(host), SECOND + 20);
        }
        self.store.write(ORG, BUCKET, &mem("a"), SECOND + 30);
        self.store.write(ORG, BUCKET, &mem("z"), 3 * SECOND);
        self.store.write(OTHER_ORG, BucketId::new(2), &cpu("x"), SECOND + 10);
    }

    async fn count(&self, org: OrgId, bounds: Bounds, predicate: Option<Predicate>) -> Result<i64> {
        let ctx = ExecutionContext::new().with_request(Request::new(org));
        let reader = self
            .provider
            .series_cardinality_reader_for(&ctx, &Config::bucket_name("telegraf"), &bounds, predicate)
            .await?;

        let mut values = Vec::new();
        reader
            .read(
                &ctx,
                &mut |table: &Table| -> Result<()> {
                    assert_eq!(table.num_rows(), 1);
                    assert_eq!(table.schema().fields().len(), 1);
                    values.push(table.int64_column(VALUE_COLUMN).map_or(-1, |c| c.value(0)));
                    Ok(())
                },
                &self.pool,
            )
            .await?;

        assert_eq!(values.len(), 1, "exactly one table per read");
        Ok(values[0])
    }
}

fn one_to_two() -> Bounds {
    Bounds::from_nanos(SECOND, 2 * SECOND)
}

#[tokio::test]
async fn test_counts_distinct_series_in_range() {
    for shards in [1, 3, 16] {
        let harness = Harness::new(shards);
        harness.seed();

        let count = harness.count(ORG, one_to_two(), None).await.unwrap();
        assert_eq!(count, 5, "shards = {shards}");
        assert_eq!(harness.pool.reserved(), 0);
    }
}

#[tokio::test]
async fn test_range_is_half_open() {
    let harness = Harness::new(2);
    harness.seed();

    // mem,host=z sits exactly on the stop bound
    let count = harness
        .count(ORG, Bounds::from_nanos(SECOND, 3 * SECOND), None)
        .await
        .unwrap();
    assert_eq!(count, 5);

    let count = harness
        .count(ORG, Bounds::from_nanos(SECOND, 3 * SECOND + 1), None)
        .await
        .unwrap();
    assert_eq!(count, 6);
}

#[tokio::test]
async fn test_predicate_filters_series() {
    let harness = Harness::new(4);
    harness.seed();

    let only_cpu = Predicate::eq("_measurement", "cpu");
    assert_eq!(harness.count(ORG, one_to_two(), Some(only_cpu)).await.unwrap(), 4);

    let host_a = Predicate::eq("host", "a");
    assert_eq!(harness.count(ORG, one_to_two(), Some(host_a)).await.unwrap(), 2);

    let not_ab = Predicate::matches_regex("host", "^[ab]$").negate();
    assert_eq!(harness.count(ORG, one_to_two(), Some(not_ab)).await.unwrap(), 2);
}

#[tokio::test]
async fn test_bucket_names_are_per_org() {
    let harness = Harness::new(2);
    harness.seed();

    assert_eq!(harness.count(OTHER_ORG, one_to_two(), None).await.unwrap(), 1);
}

#[tokio::test]
async fn test_empty_bucket_counts_zero() {
    let harness = Harness::new(4);
    assert_eq!(harness.count(ORG, one_to_two(), None).await.unwrap(), 0);
}

#[tokio::test]
async fn test_disabled_capability_rejects_reader() {
    let harness = Harness::new(1);
    harness.seed();
    harness.store.set_supported(false);

    let err = harness.count(ORG, one_to_two(), None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert_eq!(harness.store.read_count(), 0);
}

#[tokio::test]
async fn test_invalid_regex_surfaces_at_read() {
    let harness = Harness::new(1);
    harness.seed();

    let err = harness
        .count(ORG, one_to_two(), Some(Predicate::matches_regex("host", "(")))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert!(err.to_string().starts_with("read series cardinality: "));
}

#[tokio::test]
async fn test_factory_wired_provider() {
    let store = ComponentFactory::reads_store_from("memory", Some("4")).unwrap();
    let buckets = ComponentFactory::bucket_lookup_from("local").unwrap();
    let pool = ComponentFactory::memory_pool_from("greedy", Some("65536")).unwrap();

    let provider = Provider::new(store, buckets);
    let ctx = ExecutionContext::new().with_request(Request::new(ORG));
    let reader = provider
        .series_cardinality_reader_for(&ctx, &Config::new(BUCKET), &one_to_two(), None)
        .await
        .unwrap();

    let mut tables = reader.tables(&ctx, &pool);
    let table = futures::StreamExt::next(&mut tables).await.unwrap().unwrap();
    assert_eq!(table.int64_column(VALUE_COLUMN).unwrap().value(0), 0);
    assert!(pool.reserved() > 0);
}
