//! In-memory storage backend for development and testing
//!
//! Series are partitioned across a fixed number of shards by the CRC32 of their
//! canonical key, so no series lives in two shards and the per-shard distinct
//! counts a read streams back sum to the exact cardinality.

use super::{Int64Stream, ReadsStore};
use crate::context::ExecutionContext;
use crate::ids::{BucketId, OrgId};
use crate::predicate::{FIELD_TAG, MEASUREMENT_TAG};
use crate::request::ReadSeriesCardinalityRequest;
use crate::source::{ProtoSourceCodec, SourceCodec};
use crate::{Error, Result};

use async_trait::async_trait;
use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Identity of a series: measurement, field and tag set
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesKey {
    tags: BTreeMap<String, String>,
}

impl SeriesKey {
    pub fn new(measurement: impl Into<String>, field: impl Into<String>) -> Self {
        let mut tags = BTreeMap::new();
        tags.insert(MEASUREMENT_TAG.to_string(), measurement.into());
        tags.insert(FIELD_TAG.to_string(), field.into());
        Self { tags }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Sorted `key=value` pairs joined by commas
    pub fn canonical(&self) -> String {
        self.tags
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[derive(Debug, Default)]
struct SeriesEntry {
    tags: BTreeMap<String, String>,
    timestamps: BTreeSet<i64>,
}

type Shard = HashMap<String, SeriesEntry>;

/// In-memory series store that answers cardinality reads
#[derive(Debug)]
pub struct MemoryReadsStore {
    codec: Arc<dyn SourceCodec>,
    shard_count: usize,
    buckets: DashMap<(OrgId, BucketId), Vec<Shard>>,
    supported: AtomicBool,
    probes: AtomicU64,
    reads: AtomicU64,
}

impl MemoryReadsStore {
    /// Create a store with `shard_count` shards per bucket (at least one)
    pub fn new(shard_count: usize) -> Self {
        Self::with_codec(shard_count, Arc::new(ProtoSourceCodec))
    }

    pub fn with_codec(shard_count: usize, codec: Arc<dyn SourceCodec>) -> Self {
        Self {
            codec,
            shard_count: shard_count.max(1),
            buckets: DashMap::new(),
            supported: AtomicBool::new(true),
            probes: AtomicU64::new(0),
            reads: AtomicU64::new(0),
        }
    }

    /// Toggle the series cardinality capability
    pub fn set_supported(&self, supported: bool) {
        self.supported.store(supported, Ordering::Relaxed);
    }

    pub fn shard_count(&self) -> usize {
        self.shard_count
    }

    /// Record a point for `series` at `timestamp` (unix nanoseconds)
    pub fn write(&self, org: OrgId, bucket: BucketId, series: &SeriesKey, timestamp: i64) {
        let canonical = series.canonical();
        let shard_idx = crc32fast::hash(canonical.as_bytes()) as usize % self.shard_count;

        let mut shards = self
            .buckets
            .entry((org, bucket))
            .or_insert_with(|| (0..self.shard_count).map(|_| Shard::new()).collect());
        let entry = shards[shard_idx]
            .entry(canonical)
            .or_insert_with(|| SeriesEntry {
                tags: series.tags.clone(),
                timestamps: BTreeSet::new(),
            });
        entry.timestamps.insert(timestamp);
    }

    /// Number of capability probes served
    pub fn probe_count(&self) -> u64 {
        self.probes.load(Ordering::Relaxed)
    }

    /// Number of cardinality reads started
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    fn count_shard(shard: &Shard, request: &ReadSeriesCardinalityRequest) -> Result<i64> {
        let range = request.range;
        let mut count = 0i64;
        for series in shard.values() {
            if series.timestamps.range(range.start()..range.end()).next().is_none() {
                continue;
            }
            if let Some(predicate) = &request.predicate {
                if !predicate.matches(&series.tags)? {
                    continue;
                }
            }
            count += 1;
        }
        Ok(count)
    }
}

impl Default for MemoryReadsStore {
    fn default() -> Self {
        Self::new(1)
    }
}

#[async_trait]
impl ReadsStore for MemoryReadsStore {
    async fn supports_series_cardinality(&self, _ctx: &ExecutionContext) -> bool {
        self.probes.fetch_add(1, Ordering::Relaxed);
        self.supported.load(Ordering::Relaxed)
    }

    async fn read_series_cardinality(
        &self,
        _ctx: &ExecutionContext,
        request: &ReadSeriesCardinalityRequest,
    ) -> Result<Int64Stream> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        if !self.supported.load(Ordering::Relaxed) {
            return Err(Error::Invalid(
                "series cardinality option is not supported".to_string(),
            ));
        }

        let source = self.codec.decode(&request.read_source)?;
        let counts = match self.buckets.get(&(source.org(), source.bucket())) {
            Some(shards) => shards
                .iter()
                .map(|shard| Self::count_shard(shard, request))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        debug!(
            org_id = %source.org(),
            bucket_id = %source.bucket(),
            partials = counts.len(),
            "Counted series"
        );

        Ok(stream::iter(counts.into_iter().map(Ok)).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::TimeRange;
    use crate::predicate::Predicate;
    use futures::TryStreamExt;

    const ORG: OrgId = OrgId::new(10);
    const BUCKET: BucketId = BucketId::new(1);

    fn request(start: i64, end: i64, predicate: Option<Predicate>) -> ReadSeriesCardinalityRequest {
        ReadSeriesCardinalityRequest {
            read_source: ProtoSourceCodec.encode(ORG, BUCKET).unwrap(),
            range: TimeRange::try_new(start, end).unwrap(),
            predicate,
        }
    }

    fn populated(shards: usize) -> MemoryReadsStore {
        let store = MemoryReadsStore::new(shards);
        for host in 0..20 {
            let series = SeriesKey::new("cpu", "usage").with_tag("host", format!("h{host}"));
            store.write(ORG, BUCKET, &series, 100);
            store.write(ORG, BUCKET, &series, 200);
        }
        let mem = SeriesKey::new("mem", "free").with_tag("host", "h0");
        store.write(ORG, BUCKET, &mem, 500);
        store
    }

    #[test]
    fn canonical_key_is_sorted() {
        let key = SeriesKey::new("cpu", "usage").with_tag("z", "1").with_tag("a", "2");
        assert_eq!(key.canonical(), "_field=usage,_measurement=cpu,a=2,z=1");
    }

    #[tokio::test]
    async fn partial_counts_sum_to_distinct_series() {
        let store = populated(4);
        let ctx = ExecutionContext::new();
        let counts: Vec<i64> = store
            .read_series_cardinality(&ctx, &request(0, 1_000, None))
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(counts.len(), 4);
        assert_eq!(counts.iter().sum::<i64>(), 21);
    }

    async fn total(store: &MemoryReadsStore, req: ReadSeriesCardinalityRequest) -> i64 {
        let counts: Vec<i64> = store
            .read_series_cardinality(&ExecutionContext::new(), &req)
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        counts.into_iter().sum()
    }

    #[tokio::test]
    async fn range_and_predicate_filter_series() {
        let store = populated(3);

        assert_eq!(total(&store, request(0, 300, None)).await, 20);
        assert_eq!(total(&store, request(200, 201, None)).await, 20);
        assert_eq!(total(&store, request(300, 500, None)).await, 0);
        assert_eq!(
            total(&store, request(0, 1_000, Some(Predicate::eq("host", "h0")))).await,
            2
        );
        assert_eq!(
            total(&store, request(0, 1_000, Some(Predicate::eq(MEASUREMENT_TAG, "mem")))).await,
            1
        );
    }

    #[tokio::test]
    async fn empty_range_counts_nothing() {
        let store = populated(2);
        assert_eq!(total(&store, request(100, 100, None)).await, 0);
        assert!(TimeRange::try_new(10, 0).is_err());
    }

    #[tokio::test]
    async fn unknown_bucket_streams_nothing() {
        let store = MemoryReadsStore::new(2);
        let ctx = ExecutionContext::new();
        let counts: Vec<i64> = store
            .read_series_cardinality(&ctx, &request(0, 10, None))
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert!(counts.is_empty());
    }

    #[tokio::test]
    async fn unsupported_store_refuses_reads() {
        let store = MemoryReadsStore::new(1);
        store.set_supported(false);
        let ctx = ExecutionContext::new();
        assert!(!store.supports_series_cardinality(&ctx).await);
        assert!(store
            .read_series_cardinality(&ctx, &request(0, 10, None))
            .await
            .is_err());
        assert_eq!(store.probe_count(), 1);
        assert_eq!(store.read_count(), 1);
    }
}
