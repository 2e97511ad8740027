//! `WebAuthn` payload implementation
//!
//! This module decodes the binary payloads produced during `WebAuthn`
//! ceremonies and corrects the client data a platform authenticator returns.
//! It has no knowledge of sessions, storage or transport, and it does not
//! verify signatures.

mod attestation;
pub mod authenticator_data;
pub mod cbor;
mod client_data;
mod errors;
mod preferences;

// Re-exports for public use
pub use attestation::{
    extract_authenticator_data, AttestationObject, AUTH_DATA_KEY, FORMAT_KEY, STATEMENT_KEY,
};
pub use authenticator_data::{AttestedCredentialData, AuthenticatorData, AuthenticatorFlags};
pub use cbor::{CborValue, StringKeyMap};
pub use client_data::{
    encode_challenge, normalize, normalize_for_ceremony, CeremonyType, CHALLENGE_KEY, TYPE_KEY,
};
pub use errors::WebAuthnError;
pub use preferences::{AttestationPreference, UserVerification};
