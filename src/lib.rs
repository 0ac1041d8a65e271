//! # Cardinality Provider
//!
//! Answers "how many distinct series match this predicate in this time range,
//! for this organization and bucket?" by asking the storage backend to count
//! series server-side, instead of scanning raw data through the general query
//! path.
//!
//! ## Flow
//!
//! - **Provider**: checks the request organization, negotiates the backend
//!   capability, resolves the bucket and builds the request spec
//! - **Reader**: lazy handle; encodes the read source, drives the backend
//!   count stream and folds it when pulled
//! - **Table**: one-row `_value` Arrow table accounted against the caller's
//!   DataFusion memory pool
//!
//! ```no_run
//! use cardinality_provider::prelude::*;
//! use datafusion::execution::memory_pool::{MemoryPool, UnboundedMemoryPool};
//! use std::sync::Arc;
//!
//! # async fn run() -> cardinality_provider::Result<()> {
//! let store = Arc::new(MemoryReadsStore::new(4));
//! let buckets = Arc::new(LocalBucketLookup::new());
//! buckets.insert(OrgId::new(10), "my-bucket", BucketId::new(1));
//!
//! let provider = Provider::new(store, buckets);
//! let ctx = ExecutionContext::new().with_request(Request::new(OrgId::new(10)));
//! let reader = provider
//!     .series_cardinality_reader_for(
//!         &ctx,
//!         &Config::bucket_name("my-bucket"),
//!         &Bounds::from_nanos(1_000_000_000, 2_000_000_000),
//!         None,
//!     )
//!     .await?;
//!
//! let pool: Arc<dyn MemoryPool> = Arc::new(UnboundedMemoryPool::default());
//! reader
//!     .read(&ctx, &mut |table: &Table| -> Result<()> {
//!         println!("{:?}", table.int64_column(VALUE_COLUMN));
//!         Ok(())
//!     }, &pool)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod bounds;
pub mod bucket;
pub mod config;
pub mod context;
pub mod ids;
pub mod predicate;
pub mod provider;
pub mod reader;
pub mod request;
pub mod source;
pub mod storage;
pub mod table;

mod error;
mod telemetry;

pub use error::{Error, ErrorKind, Result, ResultExt};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::bounds::{Bounds, Time, TimeRange};
    pub use crate::bucket::{BucketLookup, LocalBucketLookup, NameOrId};
    pub use crate::context::{ExecutionContext, Request};
    pub use crate::ids::{BucketId, OrgId};
    pub use crate::predicate::Predicate;
    pub use crate::provider::{Config, Provider};
    pub use crate::reader::{SeriesCardinalityReader, TableReader};
    pub use crate::source::{ProtoSourceCodec, SourceCodec};
    pub use crate::storage::{MemoryReadsStore, ReadsStore, SeriesKey};
    pub use crate::table::{Table, TableSink, VALUE_COLUMN};
    pub use crate::{Error, ErrorKind, Result};
}
