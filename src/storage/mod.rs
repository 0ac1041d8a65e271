//! Storage backend interface
//!
//! The backend counts series; the provider only negotiates the capability,
//! hands over a request, and consumes the resulting stream of counts.

mod memory;

pub use memory::{MemoryReadsStore, SeriesKey};

use crate::context::ExecutionContext;
use crate::request::ReadSeriesCardinalityRequest;
use crate::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Stream of partial or total series counts
pub type Int64Stream = BoxStream<'static, Result<i64>>;

/// Storage backend interface for series cardinality reads
#[async_trait]
pub trait ReadsStore: Send + Sync {
    /// Whether the backend can count series server-side for this context
    async fn supports_series_cardinality(&self, ctx: &ExecutionContext) -> bool;

    /// Start counting the series matching `request`.
    ///
    /// The backend may deliver one total or several partial counts (for
    /// example one per shard); the consumer sums them. Dropping the stream
    /// closes it.
    async fn read_series_cardinality(
        &self,
        ctx: &ExecutionContext,
        request: &ReadSeriesCardinalityRequest,
    ) -> Result<Int64Stream>;
}
