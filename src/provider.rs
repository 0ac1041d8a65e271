//! Series cardinality provider
//!
//! Entry point used by the query engine. The provider validates and resolves
//! everything it can up front, then hands back a lazy reader; no backend read
//! happens until that reader is pulled.

use crate::bounds::Bounds;
use crate::bucket::{resolve_bucket, BucketLookup, NameOrId};
use crate::context::ExecutionContext;
use crate::ids::OrgId;
use crate::predicate::Predicate;
use crate::reader::SeriesCardinalityReader;
use crate::request::SeriesCardinalitySpec;
use crate::source::{ProtoSourceCodec, SourceCodec};
use crate::storage::ReadsStore;
use crate::telemetry;
use crate::{Error, ResultExt, Result};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info_span, warn, Instrument};

/// Message returned when the backend cannot count series
pub const UNSUPPORTED_MESSAGE: &str = "series cardinality option is not supported";

/// Options of a series cardinality read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Bucket to count series in
    pub bucket: NameOrId,
}

impl Config {
    pub fn new(bucket: impl Into<NameOrId>) -> Self {
        Self {
            bucket: bucket.into(),
        }
    }

    pub fn bucket_name(name: impl Into<String>) -> Self {
        Self::new(NameOrId::name(name))
    }
}

impl From<NameOrId> for Config {
    fn from(bucket: NameOrId) -> Self {
        Self { bucket }
    }
}

/// Builds series cardinality readers against a storage backend
#[derive(Clone)]
pub struct Provider {
    store: Arc<dyn ReadsStore>,
    buckets: Arc<dyn BucketLookup>,
    codec: Arc<dyn SourceCodec>,
}

impl Provider {
    /// Create a provider using the protobuf read source codec
    pub fn new(store: Arc<dyn ReadsStore>, buckets: Arc<dyn BucketLookup>) -> Self {
        Self {
            store,
            buckets,
            codec: Arc::new(ProtoSourceCodec),
        }
    }

    /// Use a different read source codec (must match the backend's)
    pub fn with_codec(mut self, codec: Arc<dyn SourceCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Reader for the request organization carried by `ctx`.
    ///
    /// Fails with `missing request on context` before touching any
    /// collaborator when the context has no request.
    pub async fn series_cardinality_reader_for(
        &self,
        ctx: &ExecutionContext,
        config: &Config,
        bounds: &Bounds,
        predicate: Option<Predicate>,
    ) -> Result<SeriesCardinalityReader> {
        let org_id = match ctx.organization_id() {
            Ok(org_id) => org_id,
            Err(e) => {
                telemetry::record_reader_request(Some(&e));
                return Err(e);
            }
        };
        self.series_cardinality_reader_for_org(ctx, org_id, config, bounds, predicate)
            .await
    }

    /// Reader for an explicitly given organization
    pub async fn series_cardinality_reader_for_org(
        &self,
        ctx: &ExecutionContext,
        org_id: OrgId,
        config: &Config,
        bounds: &Bounds,
        predicate: Option<Predicate>,
    ) -> Result<SeriesCardinalityReader> {
        let span = info_span!("series_cardinality.reader_for", org_id = %org_id);
        let result = self
            .build_reader(ctx, org_id, config, bounds, predicate)
            .instrument(span)
            .await;
        telemetry::record_reader_request(result.as_ref().err());
        result
    }

    async fn build_reader(
        &self,
        ctx: &ExecutionContext,
        org_id: OrgId,
        config: &Config,
        bounds: &Bounds,
        predicate: Option<Predicate>,
    ) -> Result<SeriesCardinalityReader> {
        if !org_id.is_valid() {
            return Err(Error::Invalid(format!("invalid organization id {org_id}")));
        }

        let supported = ctx
            .run(async { Ok(self.store.supports_series_cardinality(ctx).await) })
            .await?;
        if !supported {
            warn!(org_id = %org_id, "Reads store does not support series cardinality");
            return Err(Error::Invalid(UNSUPPORTED_MESSAGE.to_string()));
        }

        let bucket_id = resolve_bucket(self.buckets.as_ref(), ctx, org_id, &config.bucket)
            .await
            .context("resolve bucket")?;
        if !bucket_id.is_valid() {
            return Err(Error::Invalid(format!("invalid bucket id {bucket_id}")));
        }

        let spec = SeriesCardinalitySpec::build(org_id, bucket_id, bounds, predicate)?;
        debug!(
            bucket_id = %bucket_id,
            start = spec.range.start(),
            end = spec.range.end(),
            "Built series cardinality reader"
        );

        Ok(SeriesCardinalityReader::new(
            self.store.clone(),
            self.codec.clone(),
            spec,
        ))
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}
