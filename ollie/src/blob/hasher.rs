//! Streaming content hasher.

use std::path::Path;

use sha2::{Digest as _, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::Result;

use super::digest::BlobDigest;

/// Read size used when hashing and uploading files.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Hash the contents of the file at `path` without loading it into memory.
///
/// Missing files and permission failures surface as [`Error::Io`](crate::Error::Io).
pub async fn digest_file(path: impl AsRef<Path>) -> Result<BlobDigest> {
    let path = path.as_ref();
    let file = tokio::fs::File::open(path).await?;
    let digest = digest_reader(file).await?;
    tracing::debug!(path = %path.display(), %digest, "hashed file");
    Ok(digest)
}

/// Hash everything `reader` yields, [`CHUNK_SIZE`] bytes at a time.
pub async fn digest_reader<R>(mut reader: R) -> Result<BlobDigest>
where
    R: AsyncRead + Unpin,
{
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(BlobDigest::from_sha256(hasher))
}

/// Hash an in-memory buffer.
#[must_use]
pub fn digest_bytes(bytes: &[u8]) -> BlobDigest {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    BlobDigest::from_sha256(hasher)
}
