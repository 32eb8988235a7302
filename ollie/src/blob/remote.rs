//! Blob existence probes and uploads.
//!
//! Blobs are content addressed: the key is the SHA-256 of the bytes, so the
//! same file is uploaded at most once no matter how many models use it.

use std::path::Path;

use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tokio_util::io::ReaderStream;

use crate::cancel::CancelToken;
use crate::client::{Client, read_error_body};
use crate::error::{Error, Result};
use crate::stream::error_message;
use crate::types::FileRef;

use super::digest::BlobDigest;
use super::hasher::{CHUNK_SIZE, digest_file};

impl Client {
    /// Build the blob API URL.
    pub(crate) fn blob_url(&self, digest: &BlobDigest) -> String {
        self.url(&format!("/api/blobs/{digest}"))
    }

    /// Probe whether the server already stores `digest`.
    ///
    /// Any non-2xx answer counts as absent, including server errors; only
    /// transport failures and cancellation are raised.
    pub async fn blob_exists(&self, digest: &BlobDigest) -> Result<bool> {
        self.blob_exists_with_token(digest, self.cancel_token()).await
    }

    /// Like [`Client::blob_exists`], with a caller-supplied token.
    pub async fn blob_exists_with_token(
        &self,
        digest: &BlobDigest,
        token: CancelToken,
    ) -> Result<bool> {
        let request = self.http_client.head(self.blob_url(digest));
        let response = token.run(async { Ok(request.send().await?) }).await?;
        let exists = response.status().is_success();
        tracing::debug!(%digest, status = %response.status(), exists, "probed blob");
        Ok(exists)
    }

    /// Stream the file at `path` to the blob store under `digest`.
    ///
    /// The file is read in chunks and never held in memory as a whole. The
    /// digest is trusted; the server verifies it against the received bytes.
    pub async fn upload_blob(&self, path: impl AsRef<Path>, digest: &BlobDigest) -> Result<()> {
        self.upload_blob_with_token(path, digest, self.cancel_token())
            .await
    }

    /// Like [`Client::upload_blob`], with a caller-supplied token.
    pub async fn upload_blob_with_token(
        &self,
        path: impl AsRef<Path>,
        digest: &BlobDigest,
        token: CancelToken,
    ) -> Result<()> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path).await?;
        let body = reqwest::Body::wrap_stream(ReaderStream::with_capacity(file, CHUNK_SIZE));

        let request = self
            .http_client
            .post(self.blob_url(digest))
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(body);

        tracing::debug!(path = %path.display(), %digest, "uploading blob");
        token
            .run(async {
                let response = request.send().await?;
                let status = response.status();
                if status.is_success() {
                    return Ok(());
                }
                let text = read_error_body(response).await;
                let message = serde_json::from_str::<Value>(&text)
                    .ok()
                    .and_then(|doc| error_message(&doc))
                    .unwrap_or_else(|| format!("upload failed: {status}"));
                Err(Error::server_status(status.as_u16(), message))
            })
            .await
    }

    /// Make sure the blob for `file` exists on the server.
    ///
    /// Hashes the file unless a digest was supplied, probes the store, and
    /// uploads only when the probe says the blob is absent.
    pub async fn ensure_blob(&self, file: &FileRef) -> Result<BlobDigest> {
        self.ensure_blob_with_token(file, self.cancel_token()).await
    }

    /// Like [`Client::ensure_blob`], with a caller-supplied token.
    #[tracing::instrument(skip(self, file, token), fields(path = %file.path.display()))]
    pub async fn ensure_blob_with_token(
        &self,
        file: &FileRef,
        token: CancelToken,
    ) -> Result<BlobDigest> {
        let digest = match &file.digest {
            Some(digest) => digest.clone(),
            None => token.run(digest_file(&file.path)).await?,
        };

        if self.blob_exists_with_token(&digest, token.clone()).await? {
            tracing::debug!(%digest, "blob already present, skipping upload");
        } else {
            self.upload_blob_with_token(&file.path, &digest, token)
                .await?;
        }
        Ok(digest)
    }
}
