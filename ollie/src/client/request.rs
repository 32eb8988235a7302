//! Stream request orchestration.
//!
//! One call issues exactly one HTTP request; nothing is retried. The
//! request's `stream` flag decides what the caller gets back: the lazy
//! message sequence, or the single terminal message.

use futures::StreamExt;
use serde::Serialize;
use serde_json::Value;

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::stream::{
    MessageStream, StreamMessage, decode_ndjson, error_message, expect_single, until_terminal,
};

use super::Client;

/// Outcome of a request, shaped by its streaming flag.
pub enum Reply<T> {
    /// Lazy message sequence, ending with the terminal message.
    Stream(MessageStream<T>),
    /// The terminal message of a non-streaming request.
    Complete(T),
}

impl<T> std::fmt::Debug for Reply<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stream(_) => f.write_str("Reply::Stream(..)"),
            Self::Complete(message) => f.debug_tuple("Reply::Complete").field(message).finish(),
        }
    }
}

impl<T> Reply<T>
where
    T: Send + 'static,
{
    /// View the reply as a stream; a complete reply yields its one message.
    #[must_use]
    pub fn into_stream(self) -> MessageStream<T> {
        match self {
            Self::Stream(stream) => stream,
            Self::Complete(message) => Box::pin(futures::stream::once(async { Ok(message) })),
        }
    }

    /// Wait for the terminal message, draining a streamed reply.
    pub async fn into_final(self) -> Result<T> {
        match self {
            Self::Complete(message) => Ok(message),
            Self::Stream(mut stream) => {
                let mut last = None;
                while let Some(message) = stream.next().await {
                    last = Some(message?);
                }
                last.ok_or_else(|| Error::protocol("stream ended without a terminal message"))
            }
        }
    }
}

/// Streaming flag of a request body; absent or non-boolean means `false`.
pub(crate) fn streaming_flag(body: &Value) -> bool {
    body.get("stream").and_then(Value::as_bool).unwrap_or(false)
}

impl Client {
    /// POST `body` to `endpoint` under the client's current token.
    ///
    /// The body's `stream` field (default `false`) picks the reply shape.
    pub async fn send<T>(&self, endpoint: &str, body: &impl Serialize) -> Result<Reply<T>>
    where
        T: StreamMessage + Send + 'static,
    {
        self.send_with_token(endpoint, body, self.cancel_token()).await
    }

    /// Like [`Client::send`], with a caller-supplied token.
    pub async fn send_with_token<T>(
        &self,
        endpoint: &str,
        body: &impl Serialize,
        token: CancelToken,
    ) -> Result<Reply<T>>
    where
        T: StreamMessage + Send + 'static,
    {
        let body = serde_json::to_value(body)?;
        let streaming = streaming_flag(&body);
        let messages = self.post_ndjson(endpoint, &body, token).await?;
        if streaming {
            Ok(Reply::Stream(until_terminal(messages)))
        } else {
            Ok(Reply::Complete(expect_single(messages).await?))
        }
    }

    /// POST with `"stream": true` and return the message sequence.
    pub async fn stream<T>(&self, endpoint: &str, body: &impl Serialize) -> Result<MessageStream<T>>
    where
        T: StreamMessage + Send + 'static,
    {
        let mut body = serde_json::to_value(body)?;
        set_stream(&mut body, true)?;
        let messages = self.post_ndjson(endpoint, &body, self.cancel_token()).await?;
        Ok(until_terminal(messages))
    }

    /// POST with `"stream": false` and return the terminal message.
    pub async fn complete<T>(&self, endpoint: &str, body: &impl Serialize) -> Result<T>
    where
        T: StreamMessage + Send + 'static,
    {
        let mut body = serde_json::to_value(body)?;
        set_stream(&mut body, false)?;
        let messages = self.post_ndjson(endpoint, &body, self.cancel_token()).await?;
        expect_single(messages).await
    }

    /// Issue the request and decode the response body as NDJSON.
    async fn post_ndjson<T>(
        &self,
        endpoint: &str,
        body: &Value,
        token: CancelToken,
    ) -> Result<MessageStream<T>>
    where
        T: StreamMessage + Send + 'static,
    {
        let url = self.url(endpoint);
        tracing::debug!(
            %url,
            stream = streaming_flag(body),
            generation = token.generation(),
            "sending request"
        );

        let request = self.http_client.post(&url).json(body);
        let response = token
            .run(async {
                let response = request.send().await?;
                check_status(response).await
            })
            .await?;

        Ok(decode_ndjson(response.bytes_stream(), token))
    }
}

fn set_stream(body: &mut Value, stream: bool) -> Result<()> {
    let Value::Object(fields) = body else {
        return Err(Error::validation("request body must be a JSON object"));
    };
    fields.insert("stream".to_owned(), Value::Bool(stream));
    Ok(())
}

/// Map a non-2xx response to an error, preferring the server's message.
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = read_error_body(response).await;
    if let Ok(doc) = serde_json::from_str::<Value>(&body)
        && let Some(message) = error_message(&doc)
    {
        return Err(Error::server_status(status.as_u16(), message));
    }
    Err(Error::status(status.as_u16(), body))
}

/// Read the body of a failed response, logging and yielding `""` if the read
/// itself fails.
pub(crate) async fn read_error_body(response: reqwest::Response) -> String {
    let status = response.status();
    response.text().await.unwrap_or_else(|e| {
        tracing::debug!(%status, "Failed to read error response body: {e}");
        String::new()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn streaming_flag_defaults_to_false() {
        assert!(!streaming_flag(&json!({"model": "m"})));
        assert!(!streaming_flag(&json!({"stream": "yes"})));
        assert!(!streaming_flag(&json!({"stream": false})));
        assert!(streaming_flag(&json!({"stream": true})));
    }

    #[test]
    fn set_stream_overrides_flag() {
        let mut body = json!({"model": "m", "stream": false});
        set_stream(&mut body, true).unwrap();
        assert_eq!(body["stream"], true);
    }

    #[test]
    fn set_stream_rejects_non_objects() {
        let mut body = json!(["not", "an", "object"]);
        assert!(matches!(set_stream(&mut body, true), Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn complete_reply_as_stream() {
        let reply: Reply<Value> = Reply::Complete(json!({"done": true}));
        let items: Vec<Result<Value>> = reply.into_stream().collect().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap(), &json!({"done": true}));
    }

    #[tokio::test]
    async fn streamed_reply_final_is_last_message() {
        let messages: Vec<Result<Value>> = vec![Ok(json!({"a": 1})), Ok(json!({"done": true}))];
        let reply = Reply::Stream(Box::pin(futures::stream::iter(messages)));
        assert_eq!(reply.into_final().await.unwrap(), json!({"done": true}));
    }
}
