//! Bucket directory trait

use crate::context::ExecutionContext;
use crate::ids::{BucketId, OrgId};
use crate::Result;
use async_trait::async_trait;

/// Bucket directory interface
///
/// Abstracts the service that maps bucket names to ids within an
/// organization. Implementations may perform network I/O; callers race the
/// returned future against the execution context.
#[async_trait]
pub trait BucketLookup: Send + Sync {
    /// Find the bucket called `name` in `org`. `Ok(None)` means no such bucket.
    async fn lookup(
        &self,
        ctx: &ExecutionContext,
        org: OrgId,
        name: &str,
    ) -> Result<Option<BucketId>>;
}
