//! Content-addressed blob pipeline.
//!
//! Local model files become server-side blobs in three steps: hash the file
//! ([`digest_file`]), probe for the digest ([`Client::blob_exists`]), and
//! upload only when absent ([`Client::upload_blob`]).
//! [`Client::ensure_blob`] runs all three.
//!
//! [`Client::blob_exists`]: crate::Client::blob_exists
//! [`Client::upload_blob`]: crate::Client::upload_blob
//! [`Client::ensure_blob`]: crate::Client::ensure_blob

mod digest;
mod hasher;
mod remote;

pub use digest::BlobDigest;
pub use hasher::{CHUNK_SIZE, digest_bytes, digest_file, digest_reader};
