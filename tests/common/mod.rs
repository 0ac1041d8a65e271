//! Shared test doubles for provider integration tests
//!
//! `StubStore` mirrors a storage backend whose behavior is supplied per test
//! as closures, and records every request it receives.

#![allow(dead_code)]

use cardinality_provider::context::ExecutionContext;
use cardinality_provider::ids::{BucketId, OrgId};
use cardinality_provider::request::ReadSeriesCardinalityRequest;
use cardinality_provider::storage::{Int64Stream, ReadsStore};
use cardinality_provider::{Error, Result};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const ORG_ID: OrgId = OrgId::new(10);
/// Bucket id that "my-bucket" resolves to for `ORG_ID`
pub const BUCKET_ID: BucketId = BucketId::new(1);

type ReadFn = dyn Fn(&ReadSeriesCardinalityRequest) -> Result<Int64Stream> + Send + Sync;

pub struct StubStore {
    supported: bool,
    read_fn: Box<ReadFn>,
    probes: AtomicUsize,
    reads: AtomicUsize,
    requests: Mutex<Vec<ReadSeriesCardinalityRequest>>,
}

impl StubStore {
    pub fn new(
        supported: bool,
        read_fn: impl Fn(&ReadSeriesCardinalityRequest) -> Result<Int64Stream> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            supported,
            read_fn: Box::new(read_fn),
            probes: AtomicUsize::new(0),
            reads: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Supported store that streams `counts` for every read
    pub fn with_counts(counts: Vec<i64>) -> Arc<Self> {
        Self::new(true, move |_| Ok(counts_stream(counts.clone())))
    }

    /// Store whose reads must never happen
    pub fn refusing(supported: bool) -> Arc<Self> {
        Self::new(supported, |_| Err(Error::Invalid("unexpected read".to_string())))
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ReadSeriesCardinalityRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReadsStore for StubStore {
    async fn supports_series_cardinality(&self, _ctx: &ExecutionContext) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.supported
    }

    async fn read_series_cardinality(
        &self,
        _ctx: &ExecutionContext,
        request: &ReadSeriesCardinalityRequest,
    ) -> Result<Int64Stream> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        (self.read_fn)(request)
    }
}

pub fn counts_stream(counts: Vec<i64>) -> Int64Stream {
    stream::iter(counts.into_iter().map(Ok)).boxed()
}
