//! Lazy table readers
//!
//! A reader is built by the provider without touching the backend. Work only
//! happens when its tables are pulled, either as a [`TableStream`] or through
//! a [`TableSink`].

mod consume;

pub use consume::{consume_cardinality, Cardinality};

use crate::bounds::TimeRange;
use crate::context::ExecutionContext;
use crate::ids::{BucketId, OrgId};
use crate::predicate::Predicate;
use crate::request::SeriesCardinalitySpec;
use crate::source::SourceCodec;
use crate::storage::ReadsStore;
use crate::table::{materialize_count, Table, TableSink, TableStream};
use crate::telemetry;
use crate::{ResultExt, Result};

use async_trait::async_trait;
use datafusion::execution::memory_pool::MemoryPool;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info_span, Instrument};

/// Something that produces tables on demand
#[async_trait]
pub trait TableReader: Send + Sync {
    /// Stream of the tables this reader produces, all memory drawn from
    /// `pool`. Nothing runs until the stream is polled; dropping it early
    /// abandons the remaining work.
    fn tables(&self, ctx: &ExecutionContext, pool: &Arc<dyn MemoryPool>) -> TableStream;

    /// Deliver each table to `sink` in order.
    ///
    /// Table `n + 1` is not produced until the sink has returned for table
    /// `n`. A sink error stops delivery and is returned as is.
    async fn read(
        &self,
        ctx: &ExecutionContext,
        sink: &mut dyn TableSink,
        pool: &Arc<dyn MemoryPool>,
    ) -> Result<()> {
        let mut tables = self.tables(ctx, pool);
        while let Some(table) = tables.next().await {
            let table = table?;
            sink.deliver(&table)?;
            telemetry::record_table_delivered();
        }
        Ok(())
    }
}

/// Reader for the number of distinct series matching a spec
#[derive(Clone)]
pub struct SeriesCardinalityReader {
    store: Arc<dyn ReadsStore>,
    codec: Arc<dyn SourceCodec>,
    spec: Arc<SeriesCardinalitySpec>,
}

impl SeriesCardinalityReader {
    pub(crate) fn new(
        store: Arc<dyn ReadsStore>,
        codec: Arc<dyn SourceCodec>,
        spec: SeriesCardinalitySpec,
    ) -> Self {
        Self {
            store,
            codec,
            spec: Arc::new(spec),
        }
    }

    pub fn spec(&self) -> &SeriesCardinalitySpec {
        &self.spec
    }

    pub fn org_id(&self) -> OrgId {
        self.spec.org_id
    }

    pub fn bucket_id(&self) -> BucketId {
        self.spec.bucket_id
    }

    pub fn range(&self) -> TimeRange {
        self.spec.range
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.spec.predicate.as_ref()
    }

    /// Run the backend read and fold its stream
    pub async fn count(&self, ctx: &ExecutionContext) -> Result<Cardinality> {
        let request = self.spec.to_request(self.codec.as_ref())?;
        let stream = ctx
            .run(self.store.read_series_cardinality(ctx, &request))
            .await
            .context("read series cardinality")?;
        consume_cardinality(ctx, stream).await
    }
}

impl std::fmt::Debug for SeriesCardinalityReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeriesCardinalityReader")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TableReader for SeriesCardinalityReader {
    fn tables(&self, ctx: &ExecutionContext, pool: &Arc<dyn MemoryPool>) -> TableStream {
        let reader = self.clone();
        let ctx = ctx.clone();
        let pool = pool.clone();
        let span = info_span!(
            "series_cardinality.read",
            org_id = %self.spec.org_id,
            bucket_id = %self.spec.bucket_id,
            start = self.spec.range.start(),
            end = self.spec.range.end(),
            has_predicate = self.spec.predicate.is_some()
        );

        stream::once(
            async move {
                let started = Instant::now();
                let mut partials = 0;
                let result: Result<Table> = async {
                    let cardinality = reader.count(&ctx).await?;
                    partials = cardinality.partials as u64;
                    debug!(
                        value = cardinality.value,
                        partials = cardinality.partials,
                        "Series cardinality consumed"
                    );
                    materialize_count(cardinality.value, &pool)
                }
                .await;

                telemetry::record_read(
                    result.as_ref().err(),
                    telemetry::ReadMetrics {
                        duration_seconds: started.elapsed().as_secs_f64(),
                        partials,
                    },
                );
                result
            }
            .instrument(span),
        )
        .boxed()
    }
}
