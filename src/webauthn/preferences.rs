//! Preference mapping
//!
//! Converts the abstract user verification and attestation preferences into
//! the enumerations used to build credential requests. This is the only place
//! that knows about the request-side types.

use serde::{Deserialize, Serialize};
use webauthn_rs_proto::{AttestationConveyancePreference, UserVerificationPolicy};

/// How strongly the relying party wants the user to be verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserVerification {
    #[default]
    Preferred,
    Required,
    Discouraged,
}

/// Which attestation statement the relying party asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttestationPreference {
    #[default]
    None,
    Direct,
    Indirect,
}

impl UserVerification {
    #[must_use]
    pub fn to_native(self) -> UserVerificationPolicy {
        match self {
            UserVerification::Preferred => UserVerificationPolicy::Preferred,
            UserVerification::Required => UserVerificationPolicy::Required,
            UserVerification::Discouraged => UserVerificationPolicy::Discouraged_DO_NOT_USE,
        }
    }

    /// Parse the lowercase name used in configuration
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "preferred" => Some(UserVerification::Preferred),
            "required" => Some(UserVerification::Required),
            "discouraged" => Some(UserVerification::Discouraged),
            _ => None,
        }
    }
}

impl AttestationPreference {
    #[must_use]
    pub fn to_native(self) -> AttestationConveyancePreference {
        match self {
            AttestationPreference::None => AttestationConveyancePreference::None,
            AttestationPreference::Direct => AttestationConveyancePreference::Direct,
            AttestationPreference::Indirect => AttestationConveyancePreference::Indirect,
        }
    }

    /// Parse the lowercase name used in configuration
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "none" => Some(AttestationPreference::None),
            "direct" => Some(AttestationPreference::Direct),
            "indirect" => Some(AttestationPreference::Indirect),
            _ => None,
        }
    }
}

impl From<UserVerification> for UserVerificationPolicy {
    fn from(value: UserVerification) -> Self {
        value.to_native()
    }
}

impl From<AttestationPreference> for AttestationConveyancePreference {
    fn from(value: AttestationPreference) -> Self {
        value.to_native()
    }
}
