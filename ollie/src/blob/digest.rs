//! Content digests used as blob keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};

use crate::error::Error;

/// SHA-256 digest of a blob, rendered as `sha256:<hex>`.
///
/// The same string is the remote storage key and the `@<digest>` placeholder
/// written into Modelfiles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobDigest {
    hex: String,
}

impl BlobDigest {
    /// Algorithm tag prefixed to every digest.
    pub const ALGORITHM: &'static str = "sha256";
    const HEX_LEN: usize = 64;

    /// Wrap a hex-encoded SHA-256 value. Uppercase input is lowercased.
    pub fn from_hex(hex: impl AsRef<str>) -> Result<Self, Error> {
        let hex = hex.as_ref();
        if hex.len() != Self::HEX_LEN || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidDigest(format!(
                "expected {} hex characters, got '{hex}'",
                Self::HEX_LEN
            )));
        }
        Ok(Self {
            hex: hex.to_ascii_lowercase(),
        })
    }

    /// Finish a running SHA-256 state.
    pub(crate) fn from_sha256(hasher: Sha256) -> Self {
        Self {
            hex: format!("{:x}", hasher.finalize()),
        }
    }

    /// Hex part without the algorithm tag.
    #[must_use]
    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// Algorithm tag.
    #[must_use]
    pub const fn algorithm(&self) -> &'static str {
        Self::ALGORITHM
    }
}

impl fmt::Display for BlobDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", Self::ALGORITHM, self.hex)
    }
}

impl FromStr for BlobDigest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (algorithm, hex) = s
            .split_once(':')
            .ok_or_else(|| Error::InvalidDigest(format!("missing algorithm tag in '{s}'")))?;
        if algorithm != Self::ALGORITHM {
            return Err(Error::InvalidDigest(format!(
                "unsupported algorithm '{algorithm}'"
            )));
        }
        Self::from_hex(hex)
    }
}

impl Serialize for BlobDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BlobDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
