// Revert error decoding against the launchpad contract ABIs.

pub mod decode;
pub mod registry;
pub mod report;

use std::path::Path;

use anyhow::{Context, Result, bail};
use kilo_ledger::{EntityId, MirrorClient, Network};
use tracing::{debug, info};

pub use decode::{DecodeError, DecodedError, DecodedParam, format_value};
pub use registry::{AbiRegistry, DEFAULT_ABI_CONTRACTS};
pub use report::render;

/// Results fetched when looking for the latest failure.
const RESULTS_LIMIT: u32 = 10;

/// Decodes the most recent revert of one contract, as recorded by the mirror
/// node.
pub struct ErrorDecoder {
    network: Network,
    contract_id: String,
    registry: AbiRegistry,
    mirror: MirrorClient,
}

impl ErrorDecoder {
    /// `contract_id` is a `shard.realm.num` id or an EVM address.
    pub fn new(network: Network, contract_id: &str, artifacts_dir: &Path, mirror: MirrorClient) -> Result<Self> {
        let contract_id = contract_id.trim();
        let looks_like_address = contract_id.starts_with("0x") && contract_id.len() == 42;
        if !looks_like_address && contract_id.parse::<EntityId>().is_err() {
            bail!("invalid contract id {contract_id:?} (expected shard.realm.num or 0x address)");
        }

        let registry = AbiRegistry::load(artifacts_dir, &DEFAULT_ABI_CONTRACTS)
            .context("Failed to initialize ABI decoder")?;
        debug!(entries = registry.len(), "ABI decoder ready");

        Ok(Self {
            network,
            contract_id: contract_id.to_string(),
            registry,
            mirror,
        })
    }

    pub fn registry(&self) -> &AbiRegistry {
        &self.registry
    }

    /// The `error_message` of the contract's newest execution result.
    pub async fn latest_error_message(&self) -> Result<String> {
        let results = self
            .mirror
            .contract_results(&self.contract_id, RESULTS_LIMIT)
            .await
            .context("Mirror node request failed")?;

        match results.into_iter().next().and_then(|r| r.error_message) {
            Some(message) if !message.trim().is_empty() => Ok(message),
            _ => bail!("No error message found in mirror node response"),
        }
    }

    /// Fetch, decode and render the newest error.
    pub async fn decode(&self) -> Result<String> {
        info!(contract = %self.contract_id, network = %self.network, "decoding latest error");
        let message = self.latest_error_message().await?;
        self.report(&message)
    }

    /// Render `error_message` under a header naming the contract.
    ///
    /// Mirror nodes report some failures as plain text rather than revert
    /// data; those are passed through as-is.
    pub fn report(&self, error_message: &str) -> Result<String> {
        let mut out = format!(
            "Decoding error for contract {} on {}\n\n",
            self.contract_id, self.network
        );

        let trimmed = error_message.trim();
        if !trimmed.starts_with("0x") {
            out.push_str(&format!("Error message: {trimmed}\n"));
            return Ok(out);
        }

        let decoded = self
            .registry
            .decode(trimmed)
            .context("Failed to decode error message")?;
        out.push_str(&render(&self.registry, &decoded));
        Ok(out)
    }
}
