//! Pull a model with progress, aborting on Ctrl-C.
//!
//! ```bash
//! cargo run --example pull_model -- qwen3
//! ```

#![allow(clippy::print_stdout)]

use ollie::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let model = std::env::args().nth(1).unwrap_or_else(|| "qwen3".to_owned());
    let client = Client::from_env()?;

    let aborter = client.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            aborter.abort();
        }
    });

    let mut stream = client
        .pull(&TransferRequest::new(model).stream(true))
        .await?
        .into_stream();

    while let Some(progress) = stream.next().await {
        match progress {
            Ok(progress) => match progress.fraction() {
                Some(fraction) => println!("{} {:.1}%", progress.status, fraction * 100.0),
                None => println!("{}", progress.status),
            },
            Err(e) if e.is_cancelled() => {
                println!("pull aborted");
                break;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}
