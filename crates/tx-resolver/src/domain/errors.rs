//! # Domain Errors
//!
//! Error types for transaction resolution.
//!
//! "Not found" is deliberately missing from [`ClientError`]: an identifier the
//! indexer has not ingested yet is a fetch *outcome*, handled by the retry
//! loop, not a failure.

use thiserror::Error;

use super::value_objects::TransactionId;

/// Errors raised by the transaction data client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Transport failure (connect, timeout, TLS).
    #[error("Network error: {0}")]
    Network(String),

    /// Indexer base URL is unusable.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Indexer answered with a non-success status other than 404.
    #[error("Unexpected HTTP status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body (truncated)
        body: String,
    },
}

/// Errors surfaced by the resolver to its caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolverError {
    /// Hard failure fetching the primary transaction. Never retried.
    #[error("Failed to fetch transaction {id}: {source}")]
    Fetch {
        /// Identifier being resolved
        id: TransactionId,
        /// Underlying client failure
        #[source]
        source: ClientError,
    },

    /// The navigation parameter was empty.
    #[error("Invalid transaction identifier")]
    InvalidIdentifier,
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A field holds a value the resolver cannot run with.
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = ClientError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn test_fetch_error_keeps_id() {
        let err = ResolverError::Fetch {
            id: TransactionId::from("abc"),
            source: ClientError::Network("connection refused".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("abc"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            field: "max_not_found_attempts",
            reason: "must be at least 1".to_string(),
        };
        assert!(err.to_string().contains("max_not_found_attempts"));
    }
}
