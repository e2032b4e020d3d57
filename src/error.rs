//! Error types for the Factual client.
//!
//! Every fallible library call returns [`Result`], whose error is one of
//! the four fatal kinds below. Traversal failures inside a response are
//! *not* errors of this type: they are [`ResponseError`](crate::response::ResponseError)
//! values the caller inspects, and only become an [`Error::Api`] when the
//! caller propagates them with `?`.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Fatal client errors.
#[derive(Error, Debug)]
pub enum Error {
    /// The service answered with `status: "error"`, or the transport call
    /// itself failed (connection, timeout, body that is not JSON).
    #[error("API error: {message}")]
    Api {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A table schema document is structurally invalid.
    #[error("invalid schema: {0}")]
    Schema(String),

    /// A raw row does not carry enough columns for its schema.
    #[error("row has {actual} columns, schema requires {expected}")]
    Projection { expected: usize, actual: usize },

    /// The caller addressed a field or value the table cannot accept.
    #[error("invalid argument: {0}")]
    Argument(String),
}

impl Error {
    /// Create an error from a server-reported message.
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
            source: None,
        }
    }

    /// Create an API error wrapping a transport-level cause.
    pub fn transport(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Api {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument(message.into())
    }

    /// The server or transport message, for [`Error::Api`] only.
    pub fn api_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } => Some(message),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_api_message_only_for_api_errors() {
        assert_eq!(Error::api("bad query").api_message(), Some("bad query"));
        assert_eq!(Error::schema("x").api_message(), None);
    }

    #[test]
    fn test_transport_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = Error::transport("request failed", io);
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "API error: request failed");
    }

    #[test]
    fn test_projection_display() {
        let err = Error::Projection {
            expected: 3,
            actual: 2,
        };
        assert_eq!(err.to_string(), "row has 2 columns, schema requires 3");
    }
}
