//! Create a model from a local GGUF file.
//!
//! Identical weights are uploaded only once; run it twice to see the second
//! run skip the upload.
//!
//! ```bash
//! cargo run --example create_model -- ./model.gguf
//! ```

#![allow(clippy::print_stdout)]

use ollie::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("ollie=debug")
        .init();

    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| Error::validation("usage: create_model <path/to/model.gguf>"))?;
    let name = FileRef::new(&path).name();

    let request = CreateRequest::new("my-model")
        .file(path.as_str())
        .modelfile(format!("FROM ./{name}\nSYSTEM \"You are terse.\""))
        .stream(true);

    let client = Client::from_env()?;
    let mut stream = client.create(&request).await?.into_stream();
    while let Some(progress) = stream.next().await {
        let progress = progress?;
        match progress.fraction() {
            Some(fraction) => println!("{} {:.0}%", progress.status, fraction * 100.0),
            None => println!("{}", progress.status),
        }
    }

    Ok(())
}
