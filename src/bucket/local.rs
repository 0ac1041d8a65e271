//! Local in-memory bucket directory for development and testing

use super::BucketLookup;
use crate::context::ExecutionContext;
use crate::ids::{BucketId, OrgId};
use crate::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory bucket directory keyed by `(organization, name)`
#[derive(Debug, Default)]
pub struct LocalBucketLookup {
    buckets: DashMap<(OrgId, String), BucketId>,
    lookups: AtomicU64,
}

impl LocalBucketLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a bucket name
    pub fn insert(&self, org: OrgId, name: impl Into<String>, id: BucketId) {
        self.buckets.insert((org, name.into()), id);
    }

    pub fn remove(&self, org: OrgId, name: &str) -> Option<BucketId> {
        self.buckets
            .remove(&(org, name.to_string()))
            .map(|(_, id)| id)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of lookups served so far
    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl BucketLookup for LocalBucketLookup {
    async fn lookup(
        &self,
        _ctx: &ExecutionContext,
        org: OrgId,
        name: &str,
    ) -> Result<Option<BucketId>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .buckets
            .get(&(org, name.to_string()))
            .map(|entry| *entry.value()))
    }
}
