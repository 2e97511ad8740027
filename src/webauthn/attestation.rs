//! Attestation and assertion object processing
//!
//! The platform returns a CBOR map holding the raw authenticator data under
//! `authData`, plus `fmt` and `attStmt` for attestations. This module locates
//! and parses those entries.

use log::error;

use super::authenticator_data::AuthenticatorData;
use super::cbor::{self, CborValue};
use super::errors::WebAuthnError;

/// Map key of the raw authenticator data
pub const AUTH_DATA_KEY: &str = "authData";
/// Map key of the attestation statement format
pub const FORMAT_KEY: &str = "fmt";
/// Map key of the attestation statement
pub const STATEMENT_KEY: &str = "attStmt";

/// Decoded attestation (or assertion) object
#[derive(Debug, Clone, PartialEq)]
pub struct AttestationObject {
    /// Statement format such as `none` or `packed`, absent for assertions
    pub format: Option<String>,
    /// Attestation statement map, left uninterpreted
    pub statement: Option<CborValue>,
    pub auth_data: AuthenticatorData,
    /// `authData` bytes exactly as received, for signature verification
    pub raw_auth_data: Vec<u8>,
}

impl AttestationObject {
    /// Decode an attestation or assertion object
    ///
    /// # Errors
    /// Returns `WebAuthnError::MissingField` if `authData` is absent,
    /// `WebAuthnError::DecodeError` if the object is not a string-keyed map or
    /// an entry has the wrong type, and any error from
    /// [`AuthenticatorData::parse`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WebAuthnError> {
        let result = Self::decode_fields(bytes);
        if let Err(e) = &result {
            error!("Failed to decode attestation/assertion object: {e}");
        }
        result
    }

    fn decode_fields(bytes: &[u8]) -> Result<Self, WebAuthnError> {
        let map = cbor::read_string_key_map(bytes)?;

        let raw_auth_data = map
            .require(AUTH_DATA_KEY)?
            .expect_bytes(AUTH_DATA_KEY)?
            .to_vec();
        let auth_data = AuthenticatorData::parse(&raw_auth_data)?;

        let format = map
            .get(FORMAT_KEY)
            .map(|value| value.expect_text(FORMAT_KEY).map(str::to_owned))
            .transpose()?;

        let statement = match map.get(STATEMENT_KEY) {
            Some(value) => {
                value.expect_map(STATEMENT_KEY)?;
                Some(value.clone())
            }
            None => None,
        };

        Ok(Self {
            format,
            statement,
            auth_data,
            raw_auth_data,
        })
    }
}

/// Extract the authenticator data from an attestation or assertion object
///
/// # Errors
/// Returns `WebAuthnError::MissingField` if there is no `authData` entry,
/// `WebAuthnError::DecodeError` if the object is not a string-keyed map or
/// `authData` is not a byte string, and any error from
/// [`AuthenticatorData::parse`]
pub fn extract_authenticator_data(object: &[u8]) -> Result<AuthenticatorData, WebAuthnError> {
    let result = cbor::read_string_key_map(object).and_then(|map| {
        let auth_data = map.require(AUTH_DATA_KEY)?.expect_bytes(AUTH_DATA_KEY)?;
        AuthenticatorData::parse(auth_data)
    });

    if let Err(e) = &result {
        error!("Failed to extract AuthenticatorData from attestation/assertion object: {e}");
    }

    result
}
