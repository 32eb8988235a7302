//! Client configuration.

use url::Url;

use crate::error::{Error, Result};

/// Configuration for the [`Client`](crate::Client).
///
/// The host and the header bag are forwarded as-is; the client never
/// interprets header values.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address. Normalised by [`normalize_host`] when the client is built.
    pub host: String,
    /// Extra headers sent with every request.
    pub headers: Vec<(String, String)>,
    /// Request timeout in seconds. `None` disables the timeout, which is the
    /// sensible choice for long pulls and uploads.
    pub timeout_secs: Option<u64>,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl ClientConfig {
    /// Default server address.
    pub const DEFAULT_HOST: &'static str = "http://127.0.0.1:11434";
    /// Default port used when the host names neither a scheme nor a port.
    pub const DEFAULT_PORT: u16 = 11434;

    /// Creates a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// Reads from:
    /// - `OLLAMA_HOST` - Optional server address
    #[must_use]
    pub fn from_env() -> Self {
        let host = std::env::var("OLLAMA_HOST")
            .ok()
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| Self::DEFAULT_HOST.to_owned());

        Self {
            host,
            ..Self::default()
        }
    }

    /// Sets the server address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Adds a header forwarded on every request.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: Self::DEFAULT_HOST.to_owned(),
            headers: Vec::new(),
            timeout_secs: None,
            user_agent: format!("ollie/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Normalise a host string into a base URL without trailing slash.
///
/// - empty input gives [`ClientConfig::DEFAULT_HOST`]
/// - `:port` expands to `http://127.0.0.1:port`
/// - a missing scheme defaults to `http` and a missing port to 11434
/// - an explicit scheme without port uses 80 or 443
pub fn normalize_host(host: &str) -> Result<String> {
    let host = host.trim();
    if host.is_empty() {
        return Ok(ClientConfig::DEFAULT_HOST.to_owned());
    }

    let (raw, explicit_scheme) = if host.starts_with(':') {
        (format!("http://127.0.0.1{host}"), true)
    } else if host.contains("://") {
        (host.to_owned(), true)
    } else {
        (format!("http://{host}"), false)
    };

    let url = Url::parse(&raw).map_err(|e| Error::config(format!("invalid host '{host}': {e}")))?;
    let hostname = url
        .host_str()
        .ok_or_else(|| Error::config(format!("host '{host}' has no hostname")))?;

    let port = match url.port_or_known_default() {
        Some(port) if has_explicit_port(&raw) || explicit_scheme => port,
        _ if explicit_scheme => 80,
        _ => ClientConfig::DEFAULT_PORT,
    };

    let mut formatted = format!("{}://{hostname}:{port}{}", url.scheme(), url.path());
    while formatted.ends_with('/') {
        formatted.pop();
    }
    Ok(formatted)
}

/// Whether the authority part of `url` carries a `:port` suffix.
fn has_explicit_port(url: &str) -> bool {
    let rest = url.split_once("://").map_or(url, |(_, r)| r);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    // Bracketed IPv6 literals contain colons of their own.
    let tail = host_port.rsplit_once(']').map_or(host_port, |(_, t)| t);
    tail.rsplit_once(':')
        .is_some_and(|(_, port)| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod builder {
        use super::*;

        #[test]
        fn defaults() {
            let config = ClientConfig::new();
            assert_eq!(config.host, ClientConfig::DEFAULT_HOST);
            assert!(config.headers.is_empty());
            assert!(config.timeout_secs.is_none());
            assert!(config.user_agent.starts_with("ollie/"));
        }

        #[test]
        fn chained_setters() {
            let config = ClientConfig::new()
                .host("gpu-box:8080")
                .header("Authorization", "Bearer abc")
                .header("X-Trace", "1")
                .timeout(30)
                .user_agent("test");

            assert_eq!(config.host, "gpu-box:8080");
            assert_eq!(config.headers.len(), 2);
            assert_eq!(config.headers[0].0, "Authorization");
            assert_eq!(config.timeout_secs, Some(30));
            assert_eq!(config.user_agent, "test");
        }
    }

    mod normalize_host {
        use super::*;

        #[test]
        fn empty_uses_default() {
            assert_eq!(normalize_host("").unwrap(), ClientConfig::DEFAULT_HOST);
            assert_eq!(normalize_host("  ").unwrap(), ClientConfig::DEFAULT_HOST);
        }

        #[test]
        fn bare_hostname_gets_scheme_and_default_port() {
            assert_eq!(normalize_host("example.com").unwrap(), "http://example.com:11434");
        }

        #[test]
        fn bare_hostname_keeps_explicit_port() {
            assert_eq!(normalize_host("example.com:56789").unwrap(), "http://example.com:56789");
            assert_eq!(normalize_host("example.com:80").unwrap(), "http://example.com:80");
        }

        #[test]
        fn port_only() {
            assert_eq!(normalize_host(":56789").unwrap(), "http://127.0.0.1:56789");
        }

        #[test]
        fn explicit_scheme_uses_scheme_port() {
            assert_eq!(normalize_host("http://example.com").unwrap(), "http://example.com:80");
            assert_eq!(normalize_host("https://example.com").unwrap(), "https://example.com:443");
        }

        #[test]
        fn explicit_scheme_and_port() {
            assert_eq!(
                normalize_host("https://example.com:56789").unwrap(),
                "https://example.com:56789"
            );
        }

        #[test]
        fn trailing_slashes_are_removed() {
            assert_eq!(normalize_host("example.com/").unwrap(), "http://example.com:11434");
            assert_eq!(
                normalize_host("https://example.com/proxy/").unwrap(),
                "https://example.com:443/proxy"
            );
        }

        #[test]
        fn ipv6_literal() {
            assert_eq!(normalize_host("[::1]:8000").unwrap(), "http://[::1]:8000");
            assert_eq!(normalize_host("[::1]").unwrap(), "http://[::1]:11434");
        }

        #[test]
        fn garbage_is_config_error() {
            let err = normalize_host("http://exa mple.com").unwrap_err();
            assert!(matches!(err, Error::Config(_)));
        }
    }
}
