#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::json;
use webauthn_payload::{
    settings::PayloadSettings,
    utils::logging::LoggingHelper,
    webauthn::{normalize_for_ceremony, AttestationObject, CeremonyType},
    VERSION,
};

const USAGE: &str = "\
usage:
  webauthn-payload inspect <attestation-object-base64url>
  webauthn-payload normalize <client-data-base64url> <raw-challenge> [create|get]
  webauthn-payload preferences";

fn main() -> Result<()> {
    LoggingHelper::init().context("Failed to initialize logging")?;

    // Load configuration from Settings.toml and environment variables
    let settings =
        PayloadSettings::load().map_err(|e| anyhow!("Failed to load settings: {e}"))?;
    LoggingHelper::apply_settings(&settings.logging);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let output = match args.as_slice() {
        ["inspect", object] => inspect(object, &settings)?,
        ["normalize", client_data, challenge] => {
            normalize_client_data(client_data, challenge, CeremonyType::default())?
        }
        ["normalize", client_data, challenge, ceremony] => {
            normalize_client_data(client_data, challenge, ceremony.parse()?)?
        }
        ["preferences"] => preferences(&settings)?,
        ["--version"] => VERSION.to_string(),
        _ => bail!("{USAGE}"),
    };

    println!("{output}");
    Ok(())
}

fn decode_base64url(input: &str, what: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(input.trim().trim_end_matches('='))
        .map_err(|e| anyhow!("Invalid {what} encoding: {e}"))
}

/// Parse an attestation or assertion object and describe it as JSON
fn inspect(object_b64: &str, settings: &PayloadSettings) -> Result<String> {
    let bytes = decode_base64url(object_b64, "attestation object")?;
    let object = AttestationObject::from_bytes(&bytes).context("Failed to parse object")?;
    let auth_data = &object.auth_data;
    LoggingHelper::log_authenticator_data(auth_data);

    let attested = auth_data.attested_credential_data.as_ref().map(|attested| {
        json!({
            "aaguid": attested.aaguid_uuid().to_string(),
            "credentialId": URL_SAFE_NO_PAD.encode(&attested.credential_id),
            "credentialPublicKey": attested.credential_public_key.to_string(),
        })
    });

    let description = json!({
        "fmt": object.format,
        "rpIdHash": URL_SAFE_NO_PAD.encode(auth_data.rp_id_hash),
        "rpIdMatches": settings
            .relying_party
            .rp_id
            .as_deref()
            .map(|rp_id| auth_data.rp_id_matches(rp_id)),
        "flags": auth_data.flags.names(),
        "signCount": auth_data.sign_count,
        "attestedCredentialData": attested,
        "extensions": auth_data.extensions.as_ref().map(ToString::to_string),
    });

    serde_json::to_string_pretty(&description).context("Failed to render description")
}

fn normalize_client_data(
    client_data_b64: &str,
    raw_challenge: &str,
    ceremony: CeremonyType,
) -> Result<String> {
    let client_data = decode_base64url(client_data_b64, "client data")?;
    let normalized = normalize_for_ceremony(&client_data, raw_challenge, ceremony)?;
    LoggingHelper::log_client_data_normalized(ceremony, &normalized);
    Ok(normalized)
}

/// Configured preferences as sent in credential requests
fn preferences(settings: &PayloadSettings) -> Result<String> {
    let description = json!({
        "userVerification": settings.preferences.user_verification.to_native(),
        "attestation": settings.preferences.attestation.to_native(),
    });
    serde_json::to_string_pretty(&description).context("Failed to render preferences")
}
