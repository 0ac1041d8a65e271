//! Organization and bucket identifiers
//!
//! Identifiers are opaque non-zero `u64` values. Their textual form is exactly
//! sixteen lowercase hex digits, which is what query options and read sources
//! carry over the wire.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const ID_HEX_LEN: usize = 16;

fn parse_id(kind: &str, raw: &str) -> Result<u64> {
    if raw.len() != ID_HEX_LEN {
        return Err(Error::Invalid(format!(
            "{kind} id must have a length of {ID_HEX_LEN} bytes, got '{raw}'"
        )));
    }
    let value = u64::from_str_radix(raw, 16)
        .map_err(|_| Error::Invalid(format!("{kind} id '{raw}' is not valid hex")))?;
    if value == 0 {
        return Err(Error::Invalid(format!("{kind} id cannot be zero")));
    }
    Ok(value)
}

macro_rules! platform_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(u64);

        impl $name {
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> u64 {
                self.0
            }

            pub const fn is_valid(self) -> bool {
                self.0 != 0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:016x}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(raw: &str) -> Result<Self> {
                parse_id($kind, raw).map(Self)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl TryFrom<String> for $name {
            type Error = Error;

            fn try_from(raw: String) -> Result<Self> {
                raw.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.to_string()
            }
        }
    };
}

platform_id!(
    /// Organization identity
    OrgId,
    "organization"
);

platform_id!(
    /// Bucket identity, unique across organizations
    BucketId,
    "bucket"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_zero_padded_hex() {
        assert_eq!(OrgId::new(10).to_string(), "000000000000000a");
        assert_eq!(BucketId::new(0xdead_beef).to_string(), "00000000deadbeef");
    }

    #[test]
    fn parse_accepts_display_form() {
        let id: BucketId = "00000000deadbeef".parse().unwrap();
        assert_eq!(id.get(), 0xdead_beef);
    }

    #[test]
    fn parse_rejects_bad_input() {
        for raw in ["", "abc", "000000000000000g", "0000000000000000", "00000000000000001"] {
            let err = raw.parse::<OrgId>().unwrap_err();
            assert!(matches!(err, Error::Invalid(_)), "{raw}: {err}");
        }
    }

    #[test]
    fn serde_uses_hex_string() {
        let json = serde_json::to_string(&BucketId::new(1)).unwrap();
        assert_eq!(json, "\"0000000000000001\"");
        let back: BucketId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, BucketId::new(1));
        assert!(serde_json::from_str::<BucketId>("\"0000000000000000\"").is_err());
    }
}
