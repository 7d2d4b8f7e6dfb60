//! Error types for the Strata Provider SDK.
//!
//! [`ProviderError`] covers the SDK's own seams: serving, payload
//! (de)serialization, and the attribute value conversion contract. Handler
//! code does not return these; operational failures travel back to the
//! host as error diagnostics on the response object instead.

use thiserror::Error;

/// Errors produced by the SDK itself.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// An I/O error occurred (e.g., binding the listener).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A gRPC transport error occurred.
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The requested resource or data source type is not served by this provider.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A wire value did not match the expected attribute type.
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The attribute type the caller expected.
        expected: String,
        /// The attribute type actually found on the wire.
        actual: String,
    },

    /// An internal SDK error occurred.
    #[error("SDK error: {0}")]
    Sdk(String),
}

impl ProviderError {
    /// A type mismatch between an expected and an actual wire type.
    pub fn type_mismatch(
        expected: &crate::schema::AttributeType,
        actual: &crate::schema::AttributeType,
    ) -> Self {
        Self::TypeMismatch {
            expected: format!("{:?}", expected),
            actual: format!("{:?}", actual),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AttributeType;

    #[test]
    fn test_error_display() {
        let err = ProviderError::UnknownResource("custom_resource".to_string());
        assert_eq!(format!("{}", err), "Unknown resource type: custom_resource");

        let err = ProviderError::Sdk("dispatch failed".to_string());
        assert_eq!(format!("{}", err), "SDK error: dispatch failed");
    }

    #[test]
    fn test_type_mismatch_display() {
        let err = ProviderError::type_mismatch(&AttributeType::String, &AttributeType::Bool);
        assert_eq!(format!("{}", err), "Type mismatch: expected String, got Bool");
    }

    #[test]
    fn test_serialization_from() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: ProviderError = json_err.into();
        assert!(matches!(err, ProviderError::Serialization(_)));
    }
}
