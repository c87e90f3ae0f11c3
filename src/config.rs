// Configuration: defaults, then config.toml, then APP_* environment
// variables (nested keys use a double underscore, e.g.
// APP_DEVICE__BIOMETRIC_KIND=fingerprint).

use anyhow::Result;
use config::{Config, Environment, File, FileFormat, builder::DefaultState, ConfigBuilder};
use serde::Deserialize;

use crate::biometric::{BiometricKind, ChallengeOutcome};
use crate::lockout::LockoutConfig;

// How the simulated device answers challenges by default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulatedOutcome {
    #[default]
    Success,
    Cancel,
    Fail,
}

impl SimulatedOutcome {
    pub fn to_outcome(self) -> ChallengeOutcome {
        match self {
            SimulatedOutcome::Success => ChallengeOutcome::Success,
            SimulatedOutcome::Cancel => ChallengeOutcome::Cancelled,
            SimulatedOutcome::Fail => ChallengeOutcome::Failed("Biometric not recognised".to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    pub biometric_kind: BiometricKind,
    pub hardware_present: bool,
    pub enrolled: bool,
    pub challenge_outcome: SimulatedOutcome,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        DeviceSettings {
            biometric_kind: BiometricKind::Fingerprint,
            hardware_present: true,
            enrolled: true,
            challenge_outcome: SimulatedOutcome::Success,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_address: String,
    // JSON file for the two preference keys; in-memory when unset
    pub preferences_path: Option<String>,
    // JSON catalog replacing the built-in seed data
    pub catalog_path: Option<String>,
    #[serde(default)]
    pub device: DeviceSettings,
    #[serde(default)]
    pub lockout: LockoutConfig,
}

impl Settings {
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let builder = Self::defaults()?
            // Load from a configuration file (e.g., config.toml)
            .add_source(File::with_name("config").required(false))
            // Load from environment variables (e.g., APP_SERVER_ADDRESS)
            .add_source(Self::environment());

        let settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    // Defaults overlaid with an inline TOML document
    pub fn from_toml(toml: &str) -> Result<Self> {
        let settings = Self::defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    // APP_ prefix, nested keys joined with "__"
    fn environment() -> Environment {
        Environment::with_prefix("APP")
            .prefix_separator("_")
            .separator("__")
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        let builder = Config::builder().set_default("server_address", "127.0.0.1:3000")?;
        Ok(builder)
    }
}
