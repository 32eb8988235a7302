//! Prelude module for convenient imports.
//!
//! This module re-exports commonly used types and traits for easy access.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ollie::prelude::*;
//! ```

pub use crate::blob::BlobDigest;
pub use crate::cancel::CancelToken;
pub use crate::client::{Client, Reply};
pub use crate::config::ClientConfig;
pub use crate::error::{Error, Result};
pub use crate::stream::{MessageStream, StreamMessage};
pub use crate::types::{CreateRequest, FileRef, ProgressResponse, TransferRequest};

pub use futures::StreamExt;
