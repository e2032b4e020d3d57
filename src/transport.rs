//! HTTP transport.
//!
//! The client core never touches sockets: it hands a fully prefixed path
//! (`/api/v{version}/{api_key}{resource}`) to a [`Transport`] and gets
//! back a parsed JSON document. [`HttpTransport`] is the production
//! implementation on top of `reqwest`'s blocking client; tests plug in
//! their own.
//!
//! Transport failures (connection errors, timeouts, non-JSON bodies) are
//! reported as [`Error::Api`] with the underlying cause attached. A JSON
//! body is returned whatever the HTTP status, so the envelope's own
//! `error` message reaches the caller.

use serde_json::Value;
use std::time::Duration;

use crate::config::Config;
use crate::error::{Error, Result};

/// Executes one GET request and parses the body.
pub trait Transport: Send + Sync {
    /// `path` starts with `/api/`; the transport supplies scheme and host.
    fn get(&self, path: &str) -> Result<Value>;
}

/// Blocking HTTP transport.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
    debug: bool,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::transport("failed to build HTTP client", e))?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            debug: config.debug,
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Transport for HttpTransport {
    fn get(&self, path: &str) -> Result<Value> {
        let url = self.url_for(path);
        if self.debug {
            tracing::info!(%url, "request");
        } else {
            tracing::debug!(%url, "request");
        }

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| Error::transport(format!("request to {} failed", url), e))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| Error::transport("failed to read response body", e))?;
        tracing::debug!(status = status.as_u16(), bytes = body.len(), "response");

        parse_body(&body).map_err(|e| {
            if status.is_success() {
                e
            } else {
                Error::api(format!("HTTP {}: {}", status, body.trim()))
            }
        })
    }
}

/// Parse a response body as JSON, mapping failure to an API error.
pub fn parse_body(body: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(|e| Error::transport("response body is not JSON", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for() {
        let transport = HttpTransport::new(&Config::new("k").with_domain("api.example.test")).unwrap();
        assert_eq!(
            transport.url_for("/api/v2/k/tables/t/schema.json"),
            "http://api.example.test/api/v2/k/tables/t/schema.json"
        );
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body("{\"status\":\"ok\"}").unwrap()["status"], "ok");
        let err = parse_body("<html>oops</html>").unwrap_err();
        assert_eq!(err.api_message(), Some("response body is not JSON"));
    }
}
