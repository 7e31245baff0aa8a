use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error_handler::LaunchpadError;

// ---------------------------------------------------------------------------
// Environment keys
// ---------------------------------------------------------------------------

pub const ENV_OPERATOR_ID: &str = "HEDERAS_OPERATOR_ID";
pub const ENV_OPERATOR_KEY: &str = "HEDERAS_OPERATOR_KEY";
pub const ENV_FEE_ADDRESS: &str = "FEE_ADDRESS";
pub const ENV_FEE_ADDRESS_2: &str = "FEE_ADDRESS_2";
pub const ENV_TEST_RECIPIENT: &str = "TESTNET_LP_ADDRESS_1";
const ENV_NETWORK: &str = "KILO_NETWORK";
const ENV_ARTIFACTS_DIR: &str = "KILO_ARTIFACTS_DIR";
const ENV_LOG_DIR: &str = "KILO_LOG_DIR";
const ENV_LOG_LEVEL: &str = "KILO_LOG";
const ENV_RELAY_URL: &str = "KILO_RELAY_URL";
const ENV_MIRROR_URL: &str = "KILO_MIRROR_URL";

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "launchpad.json";

// ---------------------------------------------------------------------------
// LaunchpadConfig
// ---------------------------------------------------------------------------

/// Settings for the deployment and decoding tools.
///
/// Non-secret settings may live in `launchpad.json`. Operator credentials and
/// fee accounts are **never** serialized; they come from the environment (or a
/// `.env` file) only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchpadConfig {
    #[serde(skip)]
    pub operator_id: Option<String>,
    #[serde(skip)]
    pub operator_key: Option<String>,
    #[serde(skip)]
    pub fee_address: Option<String>,
    #[serde(skip)]
    pub fee_address_2: Option<String>,
    #[serde(skip)]
    pub test_recipient: Option<String>,

    // Network
    pub network: String,
    pub relay_url: Option<String>,
    pub mirror_url: Option<String>,
    pub request_timeout_secs: u64,
    pub receipt_timeout_secs: u64,

    // Deployment
    pub artifacts_dir: PathBuf,
    pub token_create_fee_hbar: u64,
    pub mirror_propagation_secs: u64,

    // Logging
    pub logs_dir: PathBuf,
    pub log_level: String,
}

impl Default for LaunchpadConfig {
    fn default() -> Self {
        Self {
            operator_id: None,
            operator_key: None,
            fee_address: None,
            fee_address_2: None,
            test_recipient: None,
            network: "testnet".into(),
            relay_url: None,
            mirror_url: None,
            request_timeout_secs: 120,
            receipt_timeout_secs: 120,
            artifacts_dir: PathBuf::from("artifacts"),
            token_create_fee_hbar: 30,
            mirror_propagation_secs: 5,
            logs_dir: PathBuf::from("log"),
            log_level: "info".into(),
        }
    }
}

impl LaunchpadConfig {
    /// Load `.env`, then the JSON config file (if any), then the process
    /// environment on top.
    ///
    /// An explicit `path` must exist; without one, `launchpad.json` in the
    /// working directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match path {
            Some(path) => Self::load_from_path(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load_from_path(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_lookup(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load config from a specific file path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save the non-secret settings (credentials are excluded via `#[serde(skip)]`).
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Overlay values from a key lookup (normally the process environment).
    /// Empty values are ignored.
    pub fn apply_lookup(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get(ENV_OPERATOR_ID) {
            self.operator_id = Some(v);
        }
        if let Some(v) = get(ENV_OPERATOR_KEY) {
            self.operator_key = Some(v);
        }
        if let Some(v) = get(ENV_FEE_ADDRESS) {
            self.fee_address = Some(v);
        }
        if let Some(v) = get(ENV_FEE_ADDRESS_2) {
            self.fee_address_2 = Some(v);
        }
        if let Some(v) = get(ENV_TEST_RECIPIENT) {
            self.test_recipient = Some(v);
        }
        if let Some(v) = get(ENV_NETWORK) {
            self.network = v.to_lowercase();
        }
        if let Some(v) = get(ENV_ARTIFACTS_DIR) {
            self.artifacts_dir = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_LOG_DIR) {
            self.logs_dir = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_LOG_LEVEL) {
            self.log_level = v;
        }
        if let Some(v) = get(ENV_RELAY_URL) {
            self.relay_url = Some(v);
        }
        if let Some(v) = get(ENV_MIRROR_URL) {
            self.mirror_url = Some(v);
        }
    }

    /// Reject malformed endpoint overrides early.
    pub fn validate(&self) -> Result<(), LaunchpadError> {
        for (name, url) in [("relay_url", &self.relay_url), ("mirror_url", &self.mirror_url)] {
            if let Some(url) = url {
                if !validate_url(url) {
                    return Err(LaunchpadError::Config(format!("{name} is not a valid http(s) URL: {url}")));
                }
            }
        }
        if self.request_timeout_secs == 0 || self.receipt_timeout_secs == 0 {
            return Err(LaunchpadError::Config("timeouts must be greater than zero".into()));
        }
        Ok(())
    }

    /// Operator account id and private key, both required for any transaction.
    pub fn require_operator(&self) -> Result<(&str, &str), LaunchpadError> {
        let id = required(&self.operator_id, ENV_OPERATOR_ID)?;
        let key = required(&self.operator_key, ENV_OPERATOR_KEY)?;
        Ok((id, key))
    }

    /// The two launchpad fee collector accounts.
    pub fn require_fee_addresses(&self) -> Result<[&str; 2], LaunchpadError> {
        Ok([
            required(&self.fee_address, ENV_FEE_ADDRESS)?,
            required(&self.fee_address_2, ENV_FEE_ADDRESS_2)?,
        ])
    }

    /// Account that receives the NFT minted by the post-deployment check.
    pub fn require_test_recipient(&self) -> Result<&str, LaunchpadError> {
        required(&self.test_recipient, ENV_TEST_RECIPIENT)
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, LaunchpadError> {
    value
        .as_deref()
        .ok_or_else(|| LaunchpadError::Config(format!("{name} is not set")))
}

/// Validate that a URL is well-formed and uses HTTP or HTTPS.
pub fn validate_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            (scheme == "http" || scheme == "https") && parsed.host().is_some()
        }
        Err(_) => false,
    }
}
