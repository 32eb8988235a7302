//! Streaming generation using the raw NDJSON endpoint.
//!
//! ```bash
//! ollama pull qwen3
//! cargo run --example generate_stream
//! ```

#![allow(clippy::print_stdout)]

use ollie::prelude::*;
use serde_json::{Value, json};
use std::io::{Write, stdout};

#[tokio::main]
async fn main() -> Result<()> {
    let client = Client::from_env()?;

    let body = json!({"model": "qwen3", "prompt": "Write a haiku about Rust."});
    let mut stream = client.stream::<Value>("/api/generate", &body).await?;

    while let Some(message) = stream.next().await {
        if let Some(text) = message?["response"].as_str() {
            print!("{text}");
            stdout().flush()?;
        }
    }
    println!();

    Ok(())
}
