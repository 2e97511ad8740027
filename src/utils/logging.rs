// Centralized logging setup and multi-line summaries
use log::{debug, info, LevelFilter, SetLoggerError};

use crate::settings::LoggingSettings;
use crate::webauthn::{AuthenticatorData, CeremonyType};

pub struct LoggingHelper;

impl LoggingHelper {
    /// Install `env_logger`, honouring `RUST_LOG` when it is set
    ///
    /// Without `RUST_LOG` the level starts at `info` until
    /// [`LoggingHelper::apply_settings`] is called.
    ///
    /// # Errors
    ///
    /// Returns an error if a logger is already installed
    pub fn init() -> Result<(), SetLoggerError> {
        let rust_log = std::env::var("RUST_LOG").ok();

        let mut builder = env_logger::Builder::new();
        builder.filter_level(LevelFilter::Trace);
        if let Some(filters) = &rust_log {
            builder.parse_filters(filters);
        }
        builder.try_init()?;

        if rust_log.is_none() {
            log::set_max_level(LevelFilter::Info);
        }
        Ok(())
    }

    /// Apply the configured level unless `RUST_LOG` took precedence
    pub fn apply_settings(settings: &LoggingSettings) {
        if std::env::var_os("RUST_LOG").is_none() {
            log::set_max_level(settings.level_filter());
        }
    }

    /// Log a parsed authenticator data record in a standardized format
    pub fn log_authenticator_data(auth_data: &AuthenticatorData) {
        info!("=== Authenticator Data ===");
        info!("Flags: {:?}", auth_data.flags.names());
        info!("Sign count: {}", auth_data.sign_count);

        match &auth_data.attested_credential_data {
            Some(attested) => {
                info!("AAGUID: {}", attested.aaguid_uuid());
                info!("Credential ID length: {}", attested.credential_id.len());
                debug!("Credential public key: {}", attested.credential_public_key);
            }
            None => info!("No attested credential data"),
        }

        if let Some(extensions) = &auth_data.extensions {
            info!("Extensions: {extensions}");
        }
        info!("=== End Authenticator Data ===");
    }

    /// Log the outcome of a client data correction
    pub fn log_client_data_normalized(ceremony: CeremonyType, normalized: &str) {
        info!("Normalized client data for {ceremony}");
        debug!("Normalized client data: {normalized}");
    }
}
