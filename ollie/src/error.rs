//! Unified error type for the ollie client.
//!
//! Errors fall into a small taxonomy so callers can decide what to do
//! without string matching:
//! - transport failures ([`Error::Transport`]),
//! - stream framing violations ([`Error::Protocol`]),
//! - errors reported by the server ([`Error::Server`], [`Error::Status`]),
//! - local precondition failures raised before any network call ([`Error::Validation`]),
//! - cancellation through a [`CancelToken`](crate::cancel::CancelToken) ([`Error::Cancelled`]).

/// Result type alias for ollie operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the ollie client.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The underlying HTTP call failed outright.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response stream violated the NDJSON framing contract.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// The server answered with an error document.
    #[error("{message}")]
    Server {
        /// HTTP status, when the error arrived as a non-2xx response.
        status: Option<u16>,
        /// Error text supplied by the server.
        message: String,
    },

    /// Non-2xx response without a recognisable error document.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// A local precondition failed; no request was sent.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The request was aborted through its cancellation token.
    #[error("request cancelled")]
    Cancelled,

    /// A digest string could not be parsed.
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    /// Client configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while reading local files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a protocol violation error.
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Create a server-reported error that arrived inside a stream.
    #[must_use]
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            status: None,
            message: message.into(),
        }
    }

    /// Create a server-reported error carried by a non-2xx response.
    #[must_use]
    pub fn server_status(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Create an HTTP status error.
    #[must_use]
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Create a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns `true` if the request was aborted through a cancellation token.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` for failures a caller may reasonably retry.
    ///
    /// The client itself never retries.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(err) => err.is_timeout() || err.is_connect(),
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// HTTP status attached to this error, if any.
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => *status,
            Self::Status { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod display {
        use super::*;

        #[test]
        fn server_error_shows_message_verbatim() {
            let err = Error::server("model 'x' not found");
            assert_eq!(err.to_string(), "model 'x' not found");
        }

        #[test]
        fn status_error_includes_code_and_body() {
            let err = Error::status(502, "bad gateway");
            assert_eq!(err.to_string(), "HTTP 502: bad gateway");
        }

        #[test]
        fn protocol_error_is_prefixed() {
            let err = Error::protocol("missing body");
            assert_eq!(err.to_string(), "protocol violation: missing body");
        }
    }

    mod classification {
        use super::*;

        #[test]
        fn cancelled_is_distinguishable() {
            assert!(Error::Cancelled.is_cancelled());
            assert!(!Error::protocol("x").is_cancelled());
            assert!(!Error::server("x").is_cancelled());
        }

        #[test]
        fn server_side_5xx_is_retryable() {
            assert!(Error::status(503, "").is_retryable());
            assert!(!Error::status(404, "").is_retryable());
            assert!(!Error::validation("no files").is_retryable());
        }

        #[test]
        fn http_status_is_exposed() {
            assert_eq!(Error::server_status(400, "bad").http_status(), Some(400));
            assert_eq!(Error::server("bad").http_status(), None);
            assert_eq!(Error::status(500, "").http_status(), Some(500));
        }
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
