//! Component factory for environment-based configuration
//!
//! Builds the provider's collaborators from environment variables so an
//! embedding query service can switch backends without code changes.

use crate::bucket::{BucketLookup, LocalBucketLookup};
use crate::provider::Provider;
use crate::storage::{MemoryReadsStore, ReadsStore};
use crate::{Error, Result};

use datafusion::execution::memory_pool::{GreedyMemoryPool, MemoryPool, UnboundedMemoryPool};
use std::sync::Arc;
use tracing::info;

pub struct ComponentFactory;

impl ComponentFactory {
    /// Create the storage backend from environment
    ///
    /// Environment variables:
    /// - READS_STORE: "memory" (default)
    /// - CARDINALITY_SHARDS: shards per bucket for the memory store (default: 1)
    pub fn create_reads_store() -> Result<Arc<dyn ReadsStore>> {
        let backend = std::env::var("READS_STORE").unwrap_or_else(|_| "memory".to_string());
        let shards = std::env::var("CARDINALITY_SHARDS").ok();
        Self::reads_store_from(&backend, shards.as_deref())
    }

    /// Create the bucket directory from environment
    ///
    /// Environment variables:
    /// - BUCKET_DIRECTORY: "local" (default)
    pub fn create_bucket_lookup() -> Result<Arc<dyn BucketLookup>> {
        let backend = std::env::var("BUCKET_DIRECTORY").unwrap_or_else(|_| "local".to_string());
        Self::bucket_lookup_from(&backend)
    }

    /// Create the memory pool tables are accounted against
    ///
    /// Environment variables:
    /// - CARDINALITY_MEMORY_POOL: "unbounded" (default) or "greedy"
    /// - CARDINALITY_MEMORY_LIMIT_BYTES: pool size (required for greedy)
    pub fn create_memory_pool() -> Result<Arc<dyn MemoryPool>> {
        let kind =
            std::env::var("CARDINALITY_MEMORY_POOL").unwrap_or_else(|_| "unbounded".to_string());
        let limit = std::env::var("CARDINALITY_MEMORY_LIMIT_BYTES").ok();
        Self::memory_pool_from(&kind, limit.as_deref())
    }

    /// Create a provider wired from environment
    pub fn create_provider() -> Result<Provider> {
        Ok(Provider::new(
            Self::create_reads_store()?,
            Self::create_bucket_lookup()?,
        ))
    }

    pub fn reads_store_from(backend: &str, shards: Option<&str>) -> Result<Arc<dyn ReadsStore>> {
        match backend.trim().to_ascii_lowercase().as_str() {
            "memory" => {
                let shards = match shards {
                    Some(raw) => parse_positive("CARDINALITY_SHARDS", raw)?,
                    None => 1,
                };
                info!(shards, "Using in-memory reads store (development mode)");
                Ok(Arc::new(MemoryReadsStore::new(shards)))
            }
            other => Err(Error::Invalid(format!(
                "Unknown READS_STORE: {}. Use 'memory'",
                other
            ))),
        }
    }

    pub fn bucket_lookup_from(backend: &str) -> Result<Arc<dyn BucketLookup>> {
        match backend.trim().to_ascii_lowercase().as_str() {
            "local" => {
                info!("Using LocalBucketLookup (development mode)");
                Ok(Arc::new(LocalBucketLookup::new()))
            }
            other => Err(Error::Invalid(format!(
                "Unknown BUCKET_DIRECTORY: {}. Use 'local'",
                other
            ))),
        }
    }

    pub fn memory_pool_from(kind: &str, limit: Option<&str>) -> Result<Arc<dyn MemoryPool>> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "unbounded" => Ok(Arc::new(UnboundedMemoryPool::default())),
            "greedy" => {
                let raw = limit.ok_or_else(|| {
                    Error::Invalid(
                        "CARDINALITY_MEMORY_LIMIT_BYTES required when CARDINALITY_MEMORY_POOL=greedy"
                            .to_string(),
                    )
                })?;
                let bytes = parse_positive("CARDINALITY_MEMORY_LIMIT_BYTES", raw)?;
                info!(limit_bytes = bytes, "Using greedy memory pool");
                Ok(Arc::new(GreedyMemoryPool::new(bytes)))
            }
            other => Err(Error::Invalid(format!(
                "Unknown CARDINALITY_MEMORY_POOL: {}. Use 'unbounded' or 'greedy'",
                other
            ))),
        }
    }
}

fn parse_positive(name: &str, raw: &str) -> Result<usize> {
    match raw.trim().parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(Error::Invalid(format!(
            "{name} must be a positive integer, got '{raw}'"
        ))),
    }
}
