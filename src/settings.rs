use std::fs;
use std::path::{Path, PathBuf};

use log::{info, LevelFilter};
use serde::{Deserialize, Serialize};

use crate::webauthn::{AttestationPreference, UserVerification};

/// Directory searched for an overriding `Settings.toml`
pub const CONFIG_DIR_ENV: &str = "WEBAUTHN_PAYLOAD_CONFIG_DIR";
pub const RP_ID_ENV: &str = "WEBAUTHN_PAYLOAD_RP_ID";
pub const USER_VERIFICATION_ENV: &str = "WEBAUTHN_PAYLOAD_USER_VERIFICATION";
pub const ATTESTATION_ENV: &str = "WEBAUTHN_PAYLOAD_ATTESTATION";
pub const LOG_LEVEL_ENV: &str = "WEBAUTHN_PAYLOAD_LOG_LEVEL";

const SETTINGS_FILE: &str = "Settings.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PayloadSettings {
    pub relying_party: RelyingPartySettings,
    pub preferences: PreferenceSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RelyingPartySettings {
    /// When set, parsed RP ID hashes are checked against SHA-256 of this ID
    pub rp_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PreferenceSettings {
    pub user_verification: UserVerification,
    pub attestation: AttestationPreference,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingSettings {
    /// Configured level, falling back to `info` for unknown names
    #[must_use]
    pub fn level_filter(&self) -> LevelFilter {
        self.level.trim().parse().unwrap_or(LevelFilter::Info)
    }
}

impl PayloadSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read or parsed
    /// - An environment override holds an unknown preference name
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        // Load base settings from TOML or defaults
        let mut settings = Self::load_base_settings()?;

        // Apply environment variable overrides
        settings.apply_env_overrides()?;

        Ok(settings)
    }

    /// Parse settings from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or has values of the wrong type
    pub fn from_toml_str(content: &str) -> Result<Self, basic_toml::Error> {
        basic_toml::from_str(content)
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `WEBAUTHN_PAYLOAD_CONFIG_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    fn load_base_settings() -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = Self::default();

        if let Some(loaded) = Self::load_file(&PathBuf::from(SETTINGS_FILE))? {
            settings = loaded;
        }

        if let Ok(config_dir) = std::env::var(CONFIG_DIR_ENV) {
            let path = Path::new(&config_dir).join(SETTINGS_FILE);
            match Self::load_file(&path)? {
                Some(loaded) => settings = loaded,
                None => info!(
                    "{CONFIG_DIR_ENV} set but no {SETTINGS_FILE} found at: {}",
                    path.display()
                ),
            }
        }

        Ok(settings)
    }

    fn load_file(path: &Path) -> Result<Option<Self>, Box<dyn std::error::Error>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&content)?;
        info!("Loaded settings from {}", path.display());
        Ok(Some(settings))
    }

    /// Apply environment variable overrides to settings
    ///
    /// # Errors
    ///
    /// Returns an error if a preference override is not a known name
    pub fn apply_env_overrides(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Ok(rp_id) = std::env::var(RP_ID_ENV) {
            self.relying_party.rp_id = Some(rp_id).filter(|id| !id.is_empty());
        }

        if let Ok(value) = std::env::var(USER_VERIFICATION_ENV) {
            self.preferences.user_verification = UserVerification::from_name(&value)
                .ok_or_else(|| format!("Invalid {USER_VERIFICATION_ENV}: {value}"))?;
        }

        if let Ok(value) = std::env::var(ATTESTATION_ENV) {
            self.preferences.attestation = AttestationPreference::from_name(&value)
                .ok_or_else(|| format!("Invalid {ATTESTATION_ENV}: {value}"))?;
        }

        if let Ok(level) = std::env::var(LOG_LEVEL_ENV) {
            self.logging.level = level;
        }

        Ok(())
    }
}
