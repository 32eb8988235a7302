//! Request and response types for model management endpoints.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::blob::BlobDigest;
use crate::stream::StreamMessage;

/// A local file to be uploaded as a blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    /// Path on the local filesystem.
    pub path: PathBuf,
    /// Digest supplied by the caller; skips hashing when set.
    pub digest: Option<BlobDigest>,
}

impl FileRef {
    /// Reference a file by path; its digest is computed on upload.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            digest: None,
        }
    }

    /// Supply a known digest for this file, skipping the hashing pass.
    ///
    /// The file must still exist: it is uploaded when the server lacks it.
    #[must_use]
    pub fn with_digest(mut self, digest: BlobDigest) -> Self {
        self.digest = Some(digest);
        self
    }

    /// Logical file name sent to the server: the path's final component.
    #[must_use]
    pub fn name(&self) -> String {
        self.path.file_name().map_or_else(
            || self.path.to_string_lossy().into_owned(),
            |name| name.to_string_lossy().into_owned(),
        )
    }
}

impl From<&str> for FileRef {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for FileRef {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl From<&Path> for FileRef {
    fn from(path: &Path) -> Self {
        Self::new(path)
    }
}

impl From<PathBuf> for FileRef {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

/// Parameters for creating a model.
///
/// `files` are hashed and uploaded before the create call. `from` may name a
/// base model or a local file; an existing local file is uploaded like any
/// entry of `files`.
#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    /// Name of the model to create.
    pub model: String,
    /// Base model name or local model file.
    pub from: Option<String>,
    /// Modelfile text; local model-file paths are rewritten to `@<digest>`.
    pub modelfile: Option<String>,
    /// Local files to upload, in declaration order.
    pub files: Vec<FileRef>,
    /// Quantization type to apply.
    pub quantize: Option<String>,
    /// Prompt template.
    pub template: Option<String>,
    /// System prompt.
    pub system: Option<String>,
    /// License text.
    pub license: Option<String>,
    /// Stream progress messages instead of waiting for completion.
    pub stream: bool,
}

impl CreateRequest {
    /// Start a request for `model`.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Set the base model or local model file.
    #[must_use]
    pub fn base(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Set the Modelfile text.
    #[must_use]
    pub fn modelfile(mut self, modelfile: impl Into<String>) -> Self {
        self.modelfile = Some(modelfile.into());
        self
    }

    /// Add a local file to upload.
    #[must_use]
    pub fn file(mut self, file: impl Into<FileRef>) -> Self {
        self.files.push(file.into());
        self
    }

    /// Set the quantization type.
    #[must_use]
    pub fn quantize(mut self, quantize: impl Into<String>) -> Self {
        self.quantize = Some(quantize.into());
        self
    }

    /// Set the prompt template.
    #[must_use]
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Set the system prompt.
    #[must_use]
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the license text.
    #[must_use]
    pub fn license(mut self, license: impl Into<String>) -> Self {
        self.license = Some(license.into());
        self
    }

    /// Request streamed progress.
    #[must_use]
    pub const fn stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}

/// Parameters for pulling or pushing a model.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransferRequest {
    /// Model name, optionally with namespace and tag.
    pub model: String,
    /// Allow insecure connections to the registry.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub insecure: bool,
    /// Stream progress messages instead of waiting for completion.
    pub stream: bool,
}

impl TransferRequest {
    /// Start a request for `model`.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Allow insecure registry connections.
    #[must_use]
    pub const fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Request streamed progress.
    #[must_use]
    pub const fn stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}

/// Progress message of create, pull, and push operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressResponse {
    /// Human-readable phase, `"success"` once finished.
    pub status: String,
    /// Blob being transferred.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// Total bytes of the current blob.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Bytes transferred so far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<u64>,
}

impl ProgressResponse {
    /// Fraction of the current blob transferred, when sizes are known.
    #[must_use]
    pub fn fraction(&self) -> Option<f64> {
        match (self.completed, self.total) {
            (Some(completed), Some(total)) if total > 0 => {
                Some((completed as f64 / total as f64).min(1.0))
            }
            _ => None,
        }
    }
}

impl StreamMessage for ProgressResponse {
    fn is_terminal(&self) -> bool {
        self.status == "success"
    }
}
