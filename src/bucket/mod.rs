//! Bucket references and their resolution
//!
//! A read names its bucket either by a human-readable name, which must be
//! looked up in the organization's bucket directory, or by an identifier that
//! is used as-is.

mod local;
mod lookup;

pub use local::LocalBucketLookup;
pub use lookup::BucketLookup;

use crate::context::ExecutionContext;
use crate::ids::{BucketId, OrgId};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Reference to a bucket by name or by id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameOrId {
    Name(String),
    Id(BucketId),
}

impl NameOrId {
    pub fn name(name: impl Into<String>) -> Self {
        NameOrId::Name(name.into())
    }

    pub fn id(id: BucketId) -> Self {
        NameOrId::Id(id)
    }

    /// Build from the loose `{name, id}` option pair the query layer carries.
    ///
    /// Exactly one of the two must be set.
    pub fn from_parts(name: Option<&str>, id: Option<&str>) -> Result<Self> {
        let name = name.filter(|n| !n.is_empty());
        let id = id.filter(|i| !i.is_empty());
        match (name, id) {
            (Some(_), Some(_)) => Err(Error::Invalid(
                "cannot specify both bucket name and bucket id".to_string(),
            )),
            (None, None) => Err(Error::Invalid(
                "must specify one of bucket name or bucket id".to_string(),
            )),
            (Some(name), None) => Ok(NameOrId::Name(name.to_string())),
            (None, Some(id)) => Ok(NameOrId::Id(id.parse()?)),
        }
    }
}

impl From<BucketId> for NameOrId {
    fn from(id: BucketId) -> Self {
        NameOrId::Id(id)
    }
}

/// Resolve a bucket reference within an organization.
///
/// Ids are returned unchanged without touching the directory. Names are looked
/// up on every call; the directory may change between calls.
pub async fn resolve_bucket(
    lookup: &dyn BucketLookup,
    ctx: &ExecutionContext,
    org: OrgId,
    bucket: &NameOrId,
) -> Result<BucketId> {
    match bucket {
        NameOrId::Id(id) => Ok(*id),
        NameOrId::Name(name) => {
            let found = ctx.run(lookup.lookup(ctx, org, name)).await?;
            match found {
                Some(id) => {
                    debug!(org_id = %org, bucket = %name, bucket_id = %id, "Resolved bucket name");
                    Ok(id)
                }
                None => Err(Error::NotFound(format!("bucket {:?} not found", name))),
            }
        }
    }
}
