//! Series cardinality request construction

use crate::bounds::{Bounds, TimeRange};
use crate::ids::{BucketId, OrgId};
use crate::predicate::Predicate;
use crate::source::SourceCodec;
use crate::{ResultExt, Result};
use bytes::Bytes;

/// Resolved, backend-independent description of a cardinality read.
///
/// Built once per provider call; this is what a planner can inspect on a
/// reader before deciding to run it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesCardinalitySpec {
    pub org_id: OrgId,
    pub bucket_id: BucketId,
    pub range: TimeRange,
    pub predicate: Option<Predicate>,
}

impl SeriesCardinalitySpec {
    /// Resolve `bounds` to absolute nanoseconds and capture the predicate
    /// unmodified.
    pub fn build(
        org_id: OrgId,
        bucket_id: BucketId,
        bounds: &Bounds,
        predicate: Option<Predicate>,
    ) -> Result<Self> {
        let range = bounds.resolve()?;
        Ok(Self {
            org_id,
            bucket_id,
            range,
            predicate,
        })
    }

    /// Storage-level request for this spec, with the source encoded by `codec`
    pub fn to_request(&self, codec: &dyn SourceCodec) -> Result<ReadSeriesCardinalityRequest> {
        let read_source = codec
            .encode(self.org_id, self.bucket_id)
            .context("encode read source")?;
        Ok(ReadSeriesCardinalityRequest {
            read_source,
            range: self.range,
            predicate: self.predicate.clone(),
        })
    }
}

/// Request envelope handed to the storage backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadSeriesCardinalityRequest {
    /// Opaque source descriptor produced by a [`SourceCodec`]
    pub read_source: Bytes,
    pub range: TimeRange,
    pub predicate: Option<Predicate>,
}
