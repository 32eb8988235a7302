//! NDJSON message parsing and the stream termination contract.

use std::pin::Pin;

use async_stream::try_stream;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde_json::Value;

use crate::cancel::CancelToken;
use crate::error::{Error, Result};

use super::decoder::LineDecoder;
use super::message::{StreamMessage, error_message};

/// Lazy, single-pass sequence of decoded messages.
pub type MessageStream<T> = Pin<Box<dyn Stream<Item = Result<T>> + Send>>;

/// Parse one NDJSON line.
///
/// - blank lines give `None`
/// - lines that are not JSON are logged and give `None`
/// - error documents give `Some(Err(Error::Server))`
/// - documents that do not fit `T` give `Some(Err(Error::Json))`
pub fn parse_line<T: StreamMessage>(line: &str) -> Option<Result<T>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let doc: Value = match serde_json::from_str(line) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!("Skipping malformed NDJSON line: {e}, line: {line}");
            return None;
        }
    };

    if let Some(message) = error_message(&doc) {
        return Some(Err(Error::server(message)));
    }

    Some(serde_json::from_value(doc).map_err(Error::from))
}

/// Decode a chunked byte stream into messages, one per NDJSON line.
///
/// The sequence ends when input ends; it does not enforce termination (see
/// [`until_terminal`] and [`expect_single`]). The first error document,
/// transport failure, or cancellation of `token` is raised and ends it.
pub fn decode_ndjson<S, E, T>(chunks: S, token: CancelToken) -> MessageStream<T>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Into<Error> + Send + 'static,
    T: StreamMessage + Send + 'static,
{
    Box::pin(try_stream! {
        let mut chunks = Box::pin(chunks);
        let mut decoder = LineDecoder::new();

        loop {
            let next = tokio::select! {
                biased;
                () = token.cancelled() => None,
                next = chunks.next() => Some(next),
            };
            let Some(next) = next else {
                Err::<(), Error>(Error::Cancelled)?;
                break;
            };
            let Some(chunk) = next else { break };
            let chunk = chunk.map_err(Into::<Error>::into)?;

            for line in decoder.feed(&chunk) {
                if let Some(message) = parse_line::<T>(&line) {
                    yield message?;
                }
            }
        }

        if let Some(line) = decoder.finish()
            && let Some(message) = parse_line::<T>(&line)
        {
            yield message?;
        }
    })
}

/// Enforce the streaming termination contract.
///
/// Yields messages up to and including the first terminal one, then stops.
/// If input runs out first, raises a protocol violation.
pub fn until_terminal<T>(mut messages: MessageStream<T>) -> MessageStream<T>
where
    T: StreamMessage + Send + 'static,
{
    Box::pin(try_stream! {
        let mut finished = false;
        while let Some(message) = messages.next().await {
            let message = message?;
            finished = message.is_terminal();
            yield message;
            if finished {
                break;
            }
        }
        if !finished {
            Err::<(), Error>(Error::protocol("stream ended without a terminal message"))?;
        }
    })
}

/// Pull exactly one message and require it to be terminal.
///
/// Used for non-streaming requests, where the whole answer is one document.
pub async fn expect_single<T>(mut messages: MessageStream<T>) -> Result<T>
where
    T: StreamMessage + Send + 'static,
{
    let message = messages
        .next()
        .await
        .ok_or_else(|| Error::protocol("missing body"))??;
    if message.is_terminal() {
        Ok(message)
    } else {
        Err(Error::protocol("expected a completed response"))
    }
}
