use std::fmt;
use std::str::FromStr;

use kilo_core::{LaunchpadError, validate_url};
use serde::{Deserialize, Serialize};

/// Supported Hedera networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    Previewnet,
    Local,
}

impl Network {
    /// Name used on the command line and in mirror hostnames.
    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Previewnet => "previewnet",
            Network::Local => "local",
        }
    }

    /// EVM chain id served by the JSON-RPC relay.
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 295,
            Network::Testnet => 296,
            Network::Previewnet => 297,
            Network::Local => 298,
        }
    }

    /// Public mirror node REST base URL.
    pub fn mirror_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://mainnet-public.mirrornode.hedera.com",
            Network::Testnet => "https://testnet.mirrornode.hedera.com",
            Network::Previewnet => "https://previewnet.mirrornode.hedera.com",
            Network::Local => "http://localhost:5551",
        }
    }

    /// Public JSON-RPC relay URL.
    pub fn relay_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://mainnet.hashio.io/api",
            Network::Testnet => "https://testnet.hashio.io/api",
            Network::Previewnet => "https://previewnet.hashio.io/api",
            Network::Local => "http://localhost:7546",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = LaunchpadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "previewnet" => Ok(Network::Previewnet),
            "local" | "localnet" | "local-node" => Ok(Network::Local),
            other => Err(LaunchpadError::Config(format!(
                "unknown network {other:?} (expected mainnet, testnet, previewnet or local)"
            ))),
        }
    }
}

/// Resolved endpoints for one network, with custom overrides applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub network: Network,
    pub relay_url: String,
    pub mirror_url: String,
    pub relay_is_custom: bool,
    pub mirror_is_custom: bool,
}

impl Endpoints {
    /// Start from the network defaults and apply any overrides.
    ///
    /// Returns `Err` if an override fails URL validation.
    pub fn resolve(
        network: Network,
        relay_override: Option<&str>,
        mirror_override: Option<&str>,
    ) -> Result<Self, LaunchpadError> {
        let pick = |custom: Option<&str>, default: &str| -> Result<(String, bool), LaunchpadError> {
            match custom {
                Some(url) if !validate_url(url) => {
                    Err(LaunchpadError::Config(format!("invalid endpoint URL: {url}")))
                }
                Some(url) => Ok((url.trim_end_matches('/').to_string(), true)),
                None => Ok((default.to_string(), false)),
            }
        };
        let (relay_url, relay_is_custom) = pick(relay_override, network.relay_url())?;
        let (mirror_url, mirror_is_custom) = pick(mirror_override, network.mirror_url())?;
        Ok(Self {
            network,
            relay_url,
            mirror_url,
            relay_is_custom,
            mirror_is_custom,
        })
    }

    /// Resolve endpoints from the loaded configuration.
    pub fn from_config(config: &kilo_core::LaunchpadConfig) -> Result<Self, LaunchpadError> {
        let network: Network = config.network.parse()?;
        Self::resolve(network, config.relay_url.as_deref(), config.mirror_url.as_deref())
    }
}
