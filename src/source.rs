//! Read source encoding
//!
//! The read source tells the storage backend which organization and bucket a
//! request targets. Its bytes are opaque to the provider; the backend adapter
//! owns the format through a [`SourceCodec`].

use crate::ids::{BucketId, OrgId};
use crate::{Error, Result};
use bytes::Bytes;
use prost::Message;

/// Wire form of the read source
#[derive(Clone, Copy, PartialEq, Message)]
pub struct ReadSource {
    #[prost(uint64, tag = "1")]
    pub bucket_id: u64,
    #[prost(uint64, tag = "2")]
    pub org_id: u64,
}

impl ReadSource {
    pub fn new(org: OrgId, bucket: BucketId) -> Self {
        Self {
            bucket_id: bucket.get(),
            org_id: org.get(),
        }
    }

    pub fn org(&self) -> OrgId {
        OrgId::new(self.org_id)
    }

    pub fn bucket(&self) -> BucketId {
        BucketId::new(self.bucket_id)
    }
}

/// Encodes organization and bucket identity into the backend source format
pub trait SourceCodec: Send + Sync + std::fmt::Debug {
    fn encode(&self, org: OrgId, bucket: BucketId) -> Result<Bytes>;

    fn decode(&self, raw: &[u8]) -> Result<ReadSource>;
}

/// Protobuf codec for [`ReadSource`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtoSourceCodec;

impl SourceCodec for ProtoSourceCodec {
    fn encode(&self, org: OrgId, bucket: BucketId) -> Result<Bytes> {
        if !org.is_valid() || !bucket.is_valid() {
            return Err(Error::Internal(format!(
                "cannot encode read source for org {org} bucket {bucket}"
            )));
        }
        Ok(Bytes::from(ReadSource::new(org, bucket).encode_to_vec()))
    }

    fn decode(&self, raw: &[u8]) -> Result<ReadSource> {
        let source = ReadSource::decode(raw)?;
        if source.org_id == 0 || source.bucket_id == 0 {
            return Err(Error::Internal(
                "read source is missing organization or bucket".to_string(),
            ));
        }
        Ok(source)
    }
}
