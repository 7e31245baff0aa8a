use std::collections::HashMap;
use std::path::Path;

use alloy::json_abi::{Error, JsonAbi, Param};
use alloy::primitives::Selector;
use anyhow::Result;
use kilo_ledger::ContractArtifact;
use tracing::{debug, info};

/// Contracts whose ABIs are consulted when decoding launchpad reverts.
pub const DEFAULT_ABI_CONTRACTS: [&str; 2] = ["KiloScribeMinter", "LaunchpadLib"];

fn param(ty: &str, name: &str) -> Param {
    Param {
        ty: ty.into(),
        name: name.into(),
        components: Vec::new(),
        internal_type: None,
    }
}

/// Custom errors and functions indexed by 4-byte selector.
///
/// Functions are included so that raw calldata found in a `bytes` parameter
/// (a failed inner call, for instance) decodes too. When two entries share a
/// selector the first one registered is kept.
#[derive(Debug, Clone)]
pub struct AbiRegistry {
    entries: HashMap<Selector, Error>,
}

impl Default for AbiRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AbiRegistry {
    /// A registry that knows only `Error(string)` and `Panic(uint256)`.
    pub fn new() -> Self {
        let mut registry = Self {
            entries: HashMap::new(),
        };
        registry.insert(Error {
            name: "Error".into(),
            inputs: vec![param("string", "message")],
        });
        registry.insert(Error {
            name: "Panic".into(),
            inputs: vec![param("uint256", "code")],
        });
        registry
    }

    /// Load and register the ABIs of `contracts` from a Hardhat artifacts
    /// directory.
    pub fn load(artifacts_dir: &Path, contracts: &[&str]) -> Result<Self> {
        let mut registry = Self::new();
        for name in contracts {
            let artifact = ContractArtifact::load(artifacts_dir, name)?;
            registry.add_abi(&artifact.abi);
            info!(contract = *name, "registered ABI");
        }
        Ok(registry)
    }

    /// Register every custom error, then every function, of `abi`.
    pub fn add_abi(&mut self, abi: &JsonAbi) {
        for error in abi.errors() {
            self.insert(error.clone());
        }
        for function in abi.functions() {
            self.insert(Error {
                name: function.name.clone(),
                inputs: function.inputs.clone(),
            });
        }
    }

    fn insert(&mut self, entry: Error) {
        let selector = entry.selector();
        match self.entries.get(&selector) {
            Some(existing) => {
                debug!(
                    selector = %selector,
                    kept = %existing.signature(),
                    ignored = %entry.signature(),
                    "selector collision"
                );
            }
            None => {
                self.entries.insert(selector, entry);
            }
        }
    }

    pub fn get(&self, selector: &Selector) -> Option<&Error> {
        self.entries.get(selector)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
