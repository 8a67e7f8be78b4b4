//! Error types.

use thiserror::Error;

/// Result alias for fallible client operations.
pub type Result<T> = std::result::Result<T, WhoisError>;

/// Errors produced while querying an authority.
///
/// Lookups never return these directly. They are accumulated on the
/// [`Query`](crate::Query) session and attached to the
/// [`LookupResult`](crate::LookupResult) as display strings.
#[derive(Debug, Error)]
pub enum WhoisError {
    /// No server is configured for the query.
    #[error("No server specified")]
    NoServerConfigured,

    /// The connection could not be established after all retries, or the
    /// HTTP fetch failed.
    #[error("Connect failed to: {server}")]
    ConnectFailed {
        /// The server that could not be reached.
        server: String,
    },

    /// No handler is registered under the requested identity.
    #[error("handler not found for {id}")]
    HandlerNotFound {
        /// The handler identity.
        id: String,
    },

    /// A handler reported its own error while parsing.
    #[error("{0}")]
    HandlerReported(String),

    /// Filesystem or socket I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration values.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl WhoisError {
    /// Returns `true` if the error is a transport failure.
    #[must_use]
    pub const fn is_connect_failure(&self) -> bool {
        matches!(self, Self::ConnectFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_accumulated_messages() {
        assert_eq!(WhoisError::NoServerConfigured.to_string(), "No server specified");
        assert_eq!(
            WhoisError::ConnectFailed {
                server: "whois.example.net".into()
            }
            .to_string(),
            "Connect failed to: whois.example.net"
        );
        assert_eq!(
            WhoisError::HandlerNotFound { id: "acme".into() }.to_string(),
            "handler not found for acme"
        );
    }

    #[test]
    fn connect_failure_predicate() {
        assert!(WhoisError::ConnectFailed { server: "x".into() }.is_connect_failure());
        assert!(!WhoisError::NoServerConfigured.is_connect_failure());
    }
}
