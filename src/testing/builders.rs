//! Fluent builders for creating customizable test objects

use sha2::{Digest, Sha256};

use crate::webauthn::authenticator_data::RP_ID_HASH_LEN;
use crate::webauthn::{AttestedCredentialData, AuthenticatorData, AuthenticatorFlags, CborValue};

use super::constants::TEST_RP_ID;

/// Builder for authenticator data records
///
/// The AT and ED flag bits always follow the optional fields that were set,
/// so the built record is the one `AuthenticatorData::parse` would return.
pub struct AuthenticatorDataBuilder {
    rp_id_hash: [u8; RP_ID_HASH_LEN],
    flags: AuthenticatorFlags,
    sign_count: u32,
    attested_credential_data: Option<AttestedCredentialData>,
    extensions: Option<CborValue>,
}

impl AuthenticatorDataBuilder {
    /// User-present authenticator data for the default test RP
    #[must_use]
    pub fn new() -> Self {
        Self {
            rp_id_hash: rp_id_hash(TEST_RP_ID),
            flags: AuthenticatorFlags::USER_PRESENT,
            sign_count: 0,
            attested_credential_data: None,
            extensions: None,
        }
    }

    #[must_use]
    pub fn rp_id(mut self, rp_id: &str) -> Self {
        self.rp_id_hash = rp_id_hash(rp_id);
        self
    }

    #[must_use]
    pub fn flags(mut self, flags: AuthenticatorFlags) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn sign_count(mut self, sign_count: u32) -> Self {
        self.sign_count = sign_count;
        self
    }

    #[must_use]
    pub fn attested_credential(
        mut self,
        aaguid: [u8; 16],
        credential_id: Vec<u8>,
        credential_public_key: CborValue,
    ) -> Self {
        self.attested_credential_data = Some(AttestedCredentialData {
            aaguid,
            credential_id,
            credential_public_key,
        });
        self
    }

    #[must_use]
    pub fn extensions(mut self, extensions: CborValue) -> Self {
        self.extensions = Some(extensions);
        self
    }

    #[must_use]
    pub fn build(self) -> AuthenticatorData {
        let flags = self
            .flags
            .with(
                AuthenticatorFlags::ATTESTED_CREDENTIAL_DATA,
                self.attested_credential_data.is_some(),
            )
            .with(
                AuthenticatorFlags::EXTENSION_DATA,
                self.extensions.is_some(),
            );

        AuthenticatorData {
            rp_id_hash: self.rp_id_hash,
            flags,
            sign_count: self.sign_count,
            attested_credential_data: self.attested_credential_data,
            extensions: self.extensions,
        }
    }
}

impl Default for AuthenticatorDataBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn rp_id_hash(rp_id: &str) -> [u8; RP_ID_HASH_LEN] {
    Sha256::digest(rp_id.as_bytes()).into()
}
