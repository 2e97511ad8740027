#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the webauthn-payload crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod settings;
pub mod utils;
pub mod webauthn;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use settings::PayloadSettings;
pub use webauthn::{
    extract_authenticator_data, normalize, AttestationObject, AuthenticatorData, CborValue,
    CeremonyType, WebAuthnError,
};
