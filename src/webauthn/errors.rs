//! `WebAuthn` payload error types
//!
//! This module defines the error kinds surfaced by the decoder, the
//! authenticator data parser and the client data normalizer.

use thiserror::Error;

/// Errors that can occur while decoding or normalizing `WebAuthn` payloads
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebAuthnError {
    /// CBOR structure does not match the expected major type at a given position
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Declared or required length exceeds the remaining bytes
    #[error("Length error: {0}")]
    LengthError(String),

    /// Expected map key is absent
    #[error("Missing field: {0}")]
    MissingField(String),

    /// Client data payload is not a flat string-keyed JSON object
    #[error("Bad data: {0}")]
    BadData(String),

    /// Re-encoding the normalized client data failed
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl WebAuthnError {
    /// Short name of the error kind, stable across message changes
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            WebAuthnError::DecodeError(_) => "decode",
            WebAuthnError::LengthError(_) => "length",
            WebAuthnError::MissingField(_) => "missing_field",
            WebAuthnError::BadData(_) => "bad_data",
            WebAuthnError::SerializationError(_) => "serialization",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = WebAuthnError::LengthError("need 4 bytes, 2 remaining".to_string());
        assert_eq!(err.to_string(), "Length error: need 4 bytes, 2 remaining");

        let err = WebAuthnError::MissingField("authData".to_string());
        assert_eq!(err.to_string(), "Missing field: authData");
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(WebAuthnError::DecodeError(String::new()).kind(), "decode");
        assert_eq!(WebAuthnError::BadData(String::new()).kind(), "bad_data");
        assert_eq!(
            WebAuthnError::SerializationError(String::new()).kind(),
            "serialization"
        );
    }
}
