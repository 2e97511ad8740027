//! Test fixtures providing pre-built test objects
//!
//! Commonly used CBOR values and documents, so tests across modules build
//! the same realistic payloads.

use crate::webauthn::cbor::{self, CborValue};
use crate::webauthn::{AUTH_DATA_KEY, FORMAT_KEY, STATEMENT_KEY};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// AAGUID of a `YubiKey` 5 series authenticator
    pub const AAGUID: [u8; 16] = [
        0xee, 0x88, 0x28, 0x79, 0x72, 0x1c, 0x49, 0x13, 0x97, 0x75, 0x3d, 0xfc, 0xce, 0x97, 0x07,
        0x2a,
    ];

    /// EC2 P-256 COSE key with fixed coordinates
    #[must_use]
    pub fn es256_cose_key() -> CborValue {
        CborValue::Map(vec![
            (CborValue::from_int(1), CborValue::from_int(2)), // kty: EC2
            (CborValue::from_int(3), CborValue::from_int(-7)), // alg: ES256
            (CborValue::from_int(-1), CborValue::from_int(1)), // crv: P-256
            (CborValue::from_int(-2), CborValue::ByteString(vec![0x11; 32])),
            (CborValue::from_int(-3), CborValue::ByteString(vec![0x22; 32])),
        ])
    }

    /// Extension outputs map `{"credProtect": 2}`
    #[must_use]
    pub fn cred_protect_extensions() -> CborValue {
        CborValue::Map(vec![(
            CborValue::TextString("credProtect".to_string()),
            CborValue::UnsignedInt(2),
        )])
    }

    /// Attestation object with `none` format wrapping the given authenticator data
    #[must_use]
    pub fn attestation_object(auth_data: &[u8]) -> Vec<u8> {
        cbor::encode(&CborValue::Map(vec![
            (
                CborValue::TextString(FORMAT_KEY.to_string()),
                CborValue::TextString("none".to_string()),
            ),
            (
                CborValue::TextString(STATEMENT_KEY.to_string()),
                CborValue::Map(vec![]),
            ),
            (
                CborValue::TextString(AUTH_DATA_KEY.to_string()),
                CborValue::ByteString(auth_data.to_vec()),
            ),
        ]))
    }

    /// Assertion object carrying only the authenticator data
    #[must_use]
    pub fn assertion_object(auth_data: &[u8]) -> Vec<u8> {
        cbor::encode(&CborValue::Map(vec![(
            CborValue::TextString(AUTH_DATA_KEY.to_string()),
            CborValue::ByteString(auth_data.to_vec()),
        )]))
    }

    /// Client data as a platform authenticator returns it: always labelled
    /// `webauthn.create`, with the challenge encoded twice
    #[must_use]
    pub fn platform_client_data(encoded_challenge: &str, origin: &str) -> Vec<u8> {
        format!(
            r#"{{"type":"webauthn.create","challenge":"{encoded_challenge}","origin":"{origin}"}}"#
        )
        .into_bytes()
    }
}
