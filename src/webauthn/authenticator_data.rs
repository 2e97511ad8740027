//! Authenticator data parsing
//!
//! Layout of the structure returned by an authenticator:
//! - 32 bytes: RP ID hash
//! - 1 byte: flags
//! - 4 bytes: signature counter (big-endian)
//! - variable: attested credential data (if the AT flag is set)
//!   - 16 bytes: AAGUID
//!   - 2 bytes: credential ID length (L, big-endian)
//!   - L bytes: credential ID
//!   - variable: COSE public key (one CBOR item)
//! - variable: extensions (one CBOR map, if the ED flag is set)

use std::ops::BitOr;

use log::debug;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::cbor::{self, CborValue};
use super::errors::WebAuthnError;

/// Length of the RP ID hash
pub const RP_ID_HASH_LEN: usize = 32;
/// Length of the fixed header (RP ID hash, flags, counter)
pub const HEADER_LEN: usize = 37;
/// Length of the authenticator AAGUID
pub const AAGUID_LEN: usize = 16;

/// Flags byte of authenticator data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AuthenticatorFlags(u8);

impl AuthenticatorFlags {
    /// Bit 0: user present (UP)
    pub const USER_PRESENT: Self = Self(0x01);
    /// Bit 2: user verified (UV)
    pub const USER_VERIFIED: Self = Self(0x04);
    /// Bit 3: backup eligible (BE)
    pub const BACKUP_ELIGIBLE: Self = Self(0x08);
    /// Bit 4: backup state (BS)
    pub const BACKUP_STATE: Self = Self(0x10);
    /// Bit 6: attested credential data included (AT)
    pub const ATTESTED_CREDENTIAL_DATA: Self = Self(0x40);
    /// Bit 7: extension data included (ED)
    pub const EXTENSION_DATA: Self = Self(0x80);

    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether every bit of `other` is set
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Copy with the bits of `other` set or cleared
    #[must_use]
    pub const fn with(self, other: Self, enabled: bool) -> Self {
        if enabled {
            Self(self.0 | other.0)
        } else {
            Self(self.0 & !other.0)
        }
    }

    #[must_use]
    pub const fn user_present(self) -> bool {
        self.contains(Self::USER_PRESENT)
    }

    #[must_use]
    pub const fn user_verified(self) -> bool {
        self.contains(Self::USER_VERIFIED)
    }

    #[must_use]
    pub const fn backup_eligible(self) -> bool {
        self.contains(Self::BACKUP_ELIGIBLE)
    }

    #[must_use]
    pub const fn backup_state(self) -> bool {
        self.contains(Self::BACKUP_STATE)
    }

    #[must_use]
    pub const fn attested_credential_data_included(self) -> bool {
        self.contains(Self::ATTESTED_CREDENTIAL_DATA)
    }

    #[must_use]
    pub const fn extension_data_included(self) -> bool {
        self.contains(Self::EXTENSION_DATA)
    }

    /// Names of the set flags, lowest bit first
    #[must_use]
    pub fn names(self) -> Vec<&'static str> {
        [
            (Self::USER_PRESENT, "UP"),
            (Self::USER_VERIFIED, "UV"),
            (Self::BACKUP_ELIGIBLE, "BE"),
            (Self::BACKUP_STATE, "BS"),
            (Self::ATTESTED_CREDENTIAL_DATA, "AT"),
            (Self::EXTENSION_DATA, "ED"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect()
    }
}

impl BitOr for AuthenticatorFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Credential data attached during registration
#[derive(Debug, Clone, PartialEq)]
pub struct AttestedCredentialData {
    pub aaguid: [u8; AAGUID_LEN],
    pub credential_id: Vec<u8>,
    /// COSE-encoded public key, left uninterpreted
    pub credential_public_key: CborValue,
}

impl AttestedCredentialData {
    /// AAGUID in UUID form, as published in authenticator metadata
    #[must_use]
    pub fn aaguid_uuid(&self) -> Uuid {
        Uuid::from_bytes(self.aaguid)
    }
}

/// Parsed authenticator data
///
/// The optional tail fields are present exactly when the matching flag bit
/// was set in the parsed buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatorData {
    pub rp_id_hash: [u8; RP_ID_HASH_LEN],
    pub flags: AuthenticatorFlags,
    pub sign_count: u32,
    pub attested_credential_data: Option<AttestedCredentialData>,
    /// Extension outputs, always a CBOR map
    pub extensions: Option<CborValue>,
}

impl AuthenticatorData {
    /// Parse raw authenticator data
    ///
    /// # Errors
    /// Returns `WebAuthnError::LengthError` if any field runs past the end of
    /// the buffer or bytes are left over after the last field, and
    /// `WebAuthnError::DecodeError` if the credential public key or the
    /// extensions are not well-formed CBOR (extensions must be a map)
    pub fn parse(bytes: &[u8]) -> Result<Self, WebAuthnError> {
        let mut reader = ByteReader::new(bytes);

        let rp_id_hash = reader.read_array::<RP_ID_HASH_LEN>("rpIdHash")?;
        let [flags] = reader.read_array::<1>("flags")?;
        let flags = AuthenticatorFlags::from_bits(flags);
        let sign_count = u32::from_be_bytes(reader.read_array("signCount")?);

        let attested_credential_data = if flags.attested_credential_data_included() {
            Some(Self::parse_attested_credential_data(&mut reader)?)
        } else {
            None
        };

        let extensions = if flags.extension_data_included() {
            let extensions = reader.read_cbor()?;
            extensions.expect_map("extensions")?;
            Some(extensions)
        } else {
            None
        };

        if reader.remaining() > 0 {
            return Err(WebAuthnError::LengthError(format!(
                "{} unexpected bytes after offset {} (flags {:#04x})",
                reader.remaining(),
                reader.position(),
                flags.bits()
            )));
        }

        debug!(
            "Parsed authenticator data: flags={:?}, sign_count={}, {} bytes",
            flags.names(),
            sign_count,
            bytes.len()
        );

        Ok(Self {
            rp_id_hash,
            flags,
            sign_count,
            attested_credential_data,
            extensions,
        })
    }

    fn parse_attested_credential_data(
        reader: &mut ByteReader<'_>,
    ) -> Result<AttestedCredentialData, WebAuthnError> {
        let aaguid = reader.read_array::<AAGUID_LEN>("aaguid")?;
        let id_len = u16::from_be_bytes(reader.read_array("credentialIdLength")?);
        let credential_id = reader.read_slice(usize::from(id_len), "credentialId")?.to_vec();
        let credential_public_key = reader.read_cbor()?;

        Ok(AttestedCredentialData {
            aaguid,
            credential_id,
            credential_public_key,
        })
    }

    /// Encode back into the wire layout
    ///
    /// The AT and ED bits of the emitted flags byte follow the presence of
    /// the optional fields, whatever `flags` says.
    ///
    /// # Errors
    /// Returns `WebAuthnError::LengthError` if the credential ID is longer
    /// than a 16-bit length prefix can describe
    pub fn to_bytes(&self) -> Result<Vec<u8>, WebAuthnError> {
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

        let mut out = Vec::with_capacity(HEADER_LEN);
        out.extend_from_slice(&self.rp_id_hash);
        out.push(flags.bits());
        out.extend_from_slice(&self.sign_count.to_be_bytes());

        if let Some(attested) = &self.attested_credential_data {
            let id_len = u16::try_from(attested.credential_id.len()).map_err(|_| {
                WebAuthnError::LengthError(format!(
                    "credential ID of {} bytes exceeds {} bytes",
                    attested.credential_id.len(),
                    u16::MAX
                ))
            })?;
            out.extend_from_slice(&attested.aaguid);
            out.extend_from_slice(&id_len.to_be_bytes());
            out.extend_from_slice(&attested.credential_id);
            cbor::encode_into(&mut out, &attested.credential_public_key);
        }

        if let Some(extensions) = &self.extensions {
            cbor::encode_into(&mut out, extensions);
        }

        Ok(out)
    }

    /// Whether `rp_id_hash` is the SHA-256 of the given relying party ID
    #[must_use]
    pub fn rp_id_matches(&self, rp_id: &str) -> bool {
        Sha256::digest(rp_id.as_bytes())[..] == self.rp_id_hash[..]
    }
}

/// Bounds-checked cursor over authenticator data
struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn read_slice(&mut self, len: usize, field: &str) -> Result<&'a [u8], WebAuthnError> {
        if len > self.remaining() {
            return Err(WebAuthnError::LengthError(format!(
                "{field} needs {len} bytes at offset {}, {} remaining",
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self, field: &str) -> Result<[u8; N], WebAuthnError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_slice(N, field)?);
        Ok(out)
    }

    /// Decode one CBOR item from the current position
    fn read_cbor(&mut self) -> Result<CborValue, WebAuthnError> {
        let (value, consumed) = cbor::decode_prefix(&self.bytes[self.pos..])?;
        self.pos += consumed;
        Ok(value)
    }
}
