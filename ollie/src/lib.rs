//! Ollie - an async client for the Ollama inference server
//!
//! The crate covers the two parts of the client with real protocol weight:
//!
//! - the NDJSON streaming protocol shared by every long-running endpoint
//!   ([`stream`]), with per-client cancellation ([`cancel`])
//! - the content-addressed upload pipeline used to create models from local
//!   files ([`blob`], [`modelfile`])

pub mod blob;
pub mod cancel;
pub mod client;
pub mod config;
pub mod error;
pub mod modelfile;
pub mod prelude;
pub mod stream;
pub mod types;

pub use client::{Client, Reply};
pub use config::ClientConfig;
pub use error::{Error, Result};
