//! Testing utilities for webauthn-payload
//!
//! ## Organization
//!
//! - [`fixtures`] - Pre-built test data (COSE keys, extension maps, CBOR objects)
//! - [`builders`] - Fluent builders for authenticator data
//!
//! ## Usage
//!
//! ```rust,ignore
//! use webauthn_payload::testing::{AuthenticatorDataBuilder, TestFixtures};
//!
//! let auth_data = AuthenticatorDataBuilder::new()
//!     .rp_id("example.com")
//!     .sign_count(7)
//!     .build();
//! let object = TestFixtures::attestation_object(&auth_data.to_bytes().unwrap());
//! assert!(!object.is_empty());
//! ```

pub mod builders;
pub mod fixtures;

// Re-export commonly used items for convenience
pub use builders::AuthenticatorDataBuilder;
pub use fixtures::TestFixtures;

/// Common test constants
pub mod constants {
    /// Default relying party ID
    pub const TEST_RP_ID: &str = "example.com";

    /// Default relying party origin
    pub const TEST_ORIGIN: &str = "https://example.com";

    /// Raw challenge issued by the relying party
    pub const TEST_RAW_CHALLENGE: &str = "abc123";

    /// Unpadded URL-safe base64 of [`TEST_RAW_CHALLENGE`]
    pub const TEST_ENCODED_CHALLENGE: &str = "YWJjMTIz";
}
