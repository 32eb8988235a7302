//! Model management: create from local files, pull, and push.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Serialize;

use crate::blob::BlobDigest;
use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::modelfile::{MODEL_FILE_EXTENSION, count_local_files, file_digest_map, rewrite_modelfile};
use crate::types::{CreateRequest, FileRef, ProgressResponse, TransferRequest};

use super::{Client, Reply};

/// Wire body of `POST /api/create`.
#[derive(Debug, Serialize)]
struct CreateBody<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    modelfile: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    files: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quantize: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    template: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license: Option<&'a str>,
    stream: bool,
}

/// A create request whose local inputs were checked before any network call.
#[derive(Debug)]
struct ResolvedCreate<'a> {
    /// Base model name, when `from` is not a local file.
    base: Option<&'a str>,
    /// Files to upload, in declaration order.
    files: Vec<FileRef>,
}

impl Client {
    /// Create a model, uploading local files first.
    ///
    /// Every local file is checked before the first request is sent; a
    /// missing file or a Modelfile pointing at files that were not supplied
    /// fails with [`Error::Validation`] and nothing touches the network.
    /// Files are then hashed, probed, and uploaded when absent, the Modelfile
    /// is rewritten to reference the digests, and `POST /api/create` is sent.
    pub async fn create(&self, request: &CreateRequest) -> Result<Reply<ProgressResponse>> {
        self.create_with_token(request, self.cancel_token()).await
    }

    /// Like [`Client::create`], with a caller-supplied token.
    #[tracing::instrument(skip(self, request, token), fields(model = %request.model))]
    pub async fn create_with_token(
        &self,
        request: &CreateRequest,
        token: CancelToken,
    ) -> Result<Reply<ProgressResponse>> {
        let resolved = resolve_create(request).await?;

        let mut digests: Vec<BlobDigest> = Vec::with_capacity(resolved.files.len());
        for file in &resolved.files {
            digests.push(self.ensure_blob_with_token(file, token.clone()).await?);
        }

        let modelfile = request
            .modelfile
            .as_deref()
            .map(|doc| rewrite_modelfile(doc, digests.as_slice()));
        let names: Vec<String> = resolved.files.iter().map(FileRef::name).collect();
        let files = file_digest_map(names.iter().map(String::as_str).zip(&digests));

        let body = CreateBody {
            model: &request.model,
            from: resolved.base,
            modelfile,
            files,
            quantize: request.quantize.as_deref(),
            template: request.template.as_deref(),
            system: request.system.as_deref(),
            license: request.license.as_deref(),
            stream: request.stream,
        };
        tracing::debug!(files = body.files.len(), "creating model");
        self.send_with_token("/api/create", &body, token).await
    }

    /// Download a model from a registry.
    pub async fn pull(&self, request: &TransferRequest) -> Result<Reply<ProgressResponse>> {
        self.send("/api/pull", request).await
    }

    /// Upload a model to a registry.
    pub async fn push(&self, request: &TransferRequest) -> Result<Reply<ProgressResponse>> {
        self.send("/api/push", request).await
    }
}

/// Validate local inputs of a create request.
async fn resolve_create(request: &CreateRequest) -> Result<ResolvedCreate<'_>> {
    if request.model.trim().is_empty() {
        return Err(Error::validation("model name must not be empty"));
    }

    let mut files = Vec::with_capacity(request.files.len() + 1);
    let mut base = None;
    if let Some(from) = request.from.as_deref() {
        if looks_like_local_path(from) && is_file(Path::new(from)).await {
            files.push(FileRef::new(from));
        } else if looks_like_model_file(from) {
            return Err(Error::validation(format!("file not found: {from}")));
        } else {
            base = Some(from);
        }
    }
    files.extend(request.files.iter().cloned());

    let mut names = BTreeSet::new();
    for file in &files {
        if !is_file(&file.path).await {
            return Err(Error::validation(format!(
                "file not found: {}",
                file.path.display()
            )));
        }
        let name = file.name();
        if !names.insert(name.clone()) {
            return Err(Error::validation(format!(
                "duplicate file name '{name}': files are keyed by basename"
            )));
        }
    }

    let referenced = request.modelfile.as_deref().map_or(0, count_local_files);
    if referenced > 0 && files.is_empty() {
        return Err(Error::validation(
            "no files supplied for the local paths referenced by the modelfile",
        ));
    }
    if referenced > files.len() {
        tracing::warn!(
            referenced,
            supplied = files.len(),
            "modelfile references more local files than supplied; extra paths stay unchanged"
        );
    }
    if base.is_none() && files.is_empty() && request.modelfile.is_none() {
        return Err(Error::validation(
            "no files supplied: set `from`, `files`, or `modelfile`",
        ));
    }

    Ok(ResolvedCreate { base, files })
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_file())
}

/// Whether `from` reads as a filesystem path rather than a model name.
///
/// Model names may contain `/` (`namespace/model`), so a match here still
/// needs the file to exist before it is treated as local.
fn looks_like_local_path(from: &str) -> bool {
    looks_like_model_file(from) || from.contains('/') || from.contains(std::path::MAIN_SEPARATOR)
}

fn looks_like_model_file(from: &str) -> bool {
    Path::new(from)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(MODEL_FILE_EXTENSION))
}
