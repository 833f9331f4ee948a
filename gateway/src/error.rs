//! Error types for the provider gateway.
//!
//! Every transport or provider-side fault is converted into one of these
//! variants at the gateway boundary; nothing panics across it.

use crate::provider::ProviderId;

/// Errors from gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No usable credential for the requested (or default) provider.
    #[error("provider {0} unavailable: no usable credential")]
    ProviderUnavailable(ProviderId),

    /// The reply could not be parsed as structured data, even after
    /// extracting the first brace-delimited substring.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The underlying call to the provider failed.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The provider returned a non-success status.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid gateway configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error reading or writing configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for gateway operations.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GatewayError::ProviderUnavailable(ProviderId::Claude);
        assert_eq!(
            err.to_string(),
            "provider claude unavailable: no usable credential"
        );
    }
}
