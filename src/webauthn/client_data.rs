//! Client data normalization
//!
//! Platform authenticators hand back a `clientDataJSON` that the relying party
//! rejects as-is: the challenge arrives base64 encoded a second time and every
//! ceremony is labelled `webauthn.create`. This module rewrites those two
//! entries and copies everything else through untouched.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::WebAuthnError;

/// Client data key holding the ceremony type
pub const TYPE_KEY: &str = "type";
/// Client data key holding the challenge
pub const CHALLENGE_KEY: &str = "challenge";

/// `WebAuthn` ceremony a client data document belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CeremonyType {
    /// Registration
    #[default]
    #[serde(rename = "webauthn.create")]
    Create,
    /// Authentication
    #[serde(rename = "webauthn.get")]
    Get,
}

impl CeremonyType {
    /// Value of the client data `type` entry for this ceremony
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CeremonyType::Create => "webauthn.create",
            CeremonyType::Get => "webauthn.get",
        }
    }
}

impl fmt::Display for CeremonyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CeremonyType {
    type Err = WebAuthnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "webauthn.create" | "create" => Ok(CeremonyType::Create),
            "webauthn.get" | "get" => Ok(CeremonyType::Get),
            other => Err(WebAuthnError::BadData(format!(
                "Unknown ceremony type: {other}"
            ))),
        }
    }
}

/// Unpadded URL-safe base64 of the raw challenge bytes
#[must_use]
pub fn encode_challenge(raw_challenge: &str) -> String {
    URL_SAFE_NO_PAD.encode(raw_challenge.as_bytes())
}

/// Rewrite `challenge` and `type` in a client data document
///
/// The platform's own challenge value is discarded and replaced with the
/// encoding of `raw_challenge`; `type` is overwritten with `ceremony_type`.
/// Either entry is added if the platform left it out. All other entries keep
/// their values and their position.
///
/// # Errors
/// Returns `WebAuthnError::BadData` if the input is not a JSON object whose
/// values are all strings, or `WebAuthnError::SerializationError` if the
/// corrected document cannot be written back out
pub fn normalize(
    client_data: &[u8],
    raw_challenge: &str,
    ceremony_type: &str,
) -> Result<String, WebAuthnError> {
    debug!(
        "Normalizing client data: {}",
        String::from_utf8_lossy(client_data)
    );

    let document: Value = serde_json::from_slice(client_data).map_err(|e| {
        warn!("Failed to parse client data JSON: {e}");
        WebAuthnError::BadData(format!("Invalid client data JSON: {e}"))
    })?;

    let Value::Object(mut fields) = document else {
        warn!("Client data is not a JSON object");
        return Err(WebAuthnError::BadData(
            "Client data is not a JSON object".to_string(),
        ));
    };

    if let Some((key, _)) = fields.iter().find(|(_, value)| !value.is_string()) {
        warn!("Client data entry `{key}` is not a string");
        return Err(WebAuthnError::BadData(format!(
            "Client data entry `{key}` is not a string"
        )));
    }

    fields.insert(
        CHALLENGE_KEY.to_string(),
        Value::String(encode_challenge(raw_challenge)),
    );
    fields.insert(
        TYPE_KEY.to_string(),
        Value::String(ceremony_type.to_string()),
    );

    serde_json::to_string(&Value::Object(fields))
        .map_err(|e| WebAuthnError::SerializationError(e.to_string()))
}

/// [`normalize`] with a typed ceremony
///
/// # Errors
/// Same as [`normalize`]
pub fn normalize_for_ceremony(
    client_data: &[u8],
    raw_challenge: &str,
    ceremony: CeremonyType,
) -> Result<String, WebAuthnError> {
    normalize(client_data, raw_challenge, ceremony.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse_object(json: &str) -> serde_json::Map<String, Value> {
        match serde_json::from_str(json).unwrap() {
            Value::Object(fields) => fields,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_normalize_registration_mislabelled_as_create() {
        let input = concat!(
            r#"{"type":"webauthn.create","challenge":"YWJjMTIz","#,
            r#""origin":"https://example.com"}"#
        )
        .as_bytes();
        let output = normalize(input, "abc123", "webauthn.get").unwrap();
        assert_eq!(
            output,
            r#"{"type":"webauthn.get","challenge":"YWJjMTIz","origin":"https://example.com"}"#
        );
    }

    #[test]
    fn test_platform_challenge_is_discarded() {
        // Platform sent base64 of base64: the raw value must win
        let input = concat!(
            r#"{"type":"webauthn.create","challenge":"WVdKak1USXo","#,
            r#""origin":"https://example.com"}"#
        )
        .as_bytes();
        let output = normalize_for_ceremony(input, "abc123", CeremonyType::Create).unwrap();
        let fields = parse_object(&output);
        assert_eq!(fields["challenge"], json!("YWJjMTIz"));
        assert_eq!(fields["type"], json!("webauthn.create"));
    }

    #[test]
    fn test_other_entries_preserved_in_order() {
        let input = concat!(
            r#"{"origin":"https://login.example.com","type":"webauthn.create","#,
            r#""topOrigin":"https://example.com","challenge":"x","#,
            r#""androidPackageName":"com.example.app"}"#
        )
        .as_bytes();
        let output = normalize(input, "nonce", "webauthn.get").unwrap();
        let fields = parse_object(&output);

        assert_eq!(
            fields.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["origin", "type", "topOrigin", "challenge", "androidPackageName"]
        );
        assert_eq!(fields["origin"], json!("https://login.example.com"));
        assert_eq!(fields["topOrigin"], json!("https://example.com"));
        assert_eq!(fields["androidPackageName"], json!("com.example.app"));
    }

    #[test]
    fn test_missing_type_and_challenge_are_added() {
        let output =
            normalize(br#"{"origin":"https://example.com"}"#, "abc", "webauthn.get").unwrap();
        assert_eq!(
            output,
            r#"{"origin":"https://example.com","challenge":"YWJj","type":"webauthn.get"}"#
        );
    }

    #[test]
    fn test_challenge_is_url_safe_and_unpadded() {
        for raw in ["??>", "a", "ab", "~~~~", "\u{00ff}\u{00fe}", "challenge/with+symbols="] {
            let output = normalize(br#"{"type":"","challenge":""}"#, raw, "webauthn.get").unwrap();
            let fields = parse_object(&output);
            let challenge = fields["challenge"].as_str().unwrap();
            assert!(
                !challenge.contains(['+', '/', '=']),
                "{raw:?} encoded as {challenge}"
            );
            assert_eq!(URL_SAFE_NO_PAD.decode(challenge).unwrap(), raw.as_bytes());
        }
        assert_eq!(encode_challenge("??>"), "Pz8-");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let input = concat!(
            r#"{"type":"webauthn.create","challenge":"abc","#,
            r#""origin":"https://example.com","crossOrigin":"false"}"#
        )
        .as_bytes();
        let once = normalize(input, "raw", "webauthn.get").unwrap();
        let twice = normalize(once.as_bytes(), "raw", "webauthn.get").unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_array_is_bad_data() {
        let err = normalize(br#"["webauthn.create","abc"]"#, "abc", "webauthn.get").unwrap_err();
        assert!(matches!(err, WebAuthnError::BadData(_)));
    }

    #[test]
    fn test_non_string_values_are_bad_data() {
        for input in [
            br#"{"type":"webauthn.create","crossOrigin":false}"#.as_slice(),
            br#"{"type":"webauthn.create","tokenBinding":{"status":"present"}}"#.as_slice(),
            br#"{"type":null}"#.as_slice(),
        ] {
            assert!(matches!(
                normalize(input, "abc", "webauthn.get"),
                Err(WebAuthnError::BadData(_))
            ));
        }
    }

    #[test]
    fn test_invalid_json_is_bad_data() {
        assert!(matches!(
            normalize(b"{not json", "abc", "webauthn.get"),
            Err(WebAuthnError::BadData(_))
        ));
        assert!(matches!(
            normalize(&[0xff, 0xfe], "abc", "webauthn.get"),
            Err(WebAuthnError::BadData(_))
        ));
        assert!(matches!(
            normalize(b"\"webauthn.create\"", "abc", "webauthn.get"),
            Err(WebAuthnError::BadData(_))
        ));
    }

    #[test]
    fn test_ceremony_type_parsing() {
        assert_eq!("webauthn.get".parse::<CeremonyType>().unwrap(), CeremonyType::Get);
        assert_eq!("create".parse::<CeremonyType>().unwrap(), CeremonyType::Create);
        assert!("webauthn.sign".parse::<CeremonyType>().is_err());
        assert_eq!(CeremonyType::default().to_string(), "webauthn.create");
        assert_eq!(
            serde_json::to_string(&CeremonyType::Get).unwrap(),
            "\"webauthn.get\""
        );
    }
}
