use std::path::Path;

use alloy::json_abi::JsonAbi;
use alloy::primitives::Bytes;
use anyhow::{Context, Result};
use kilo_ledger::artifact::decode_bytecode;
use kilo_ledger::{ContractArtifact, ContractCreate, ContractId, Ledger, link_libraries};
use tracing::{debug, info};

pub const LIBRARY_CONTRACT: &str = "LaunchpadLib";
pub const FACTORY_CONTRACT: &str = "KiloScribeMinterFactory";

/// Fully-qualified name the factory bytecode references the library by.
pub const LIBRARY_LINK_NAME: &str = "contracts/LaunchpadLib.sol:LaunchpadLib";

pub const LIBRARY_GAS: u64 = 13_000_000;
pub const LIBRARY_MEMO: &str = "LaunchpadLib library";
pub const FACTORY_GAS: u64 = 4_000_000;

/// Deployed factory, the library it is linked against, and its ABI.
#[derive(Debug, Clone)]
pub struct FactoryDeployment {
    pub factory_id: ContractId,
    pub library_id: ContractId,
    pub abi: JsonAbi,
}

/// Link the deployed library into the factory's creation bytecode.
pub fn link_factory(factory: &ContractArtifact, library_id: ContractId) -> Result<Bytes> {
    let library_address = library_id
        .to_solidity_hex()
        .with_context(|| format!("library id {library_id}"))?;
    let linked = link_libraries(&factory.bytecode, &[(LIBRARY_LINK_NAME, library_address)])
        .with_context(|| format!("Failed to link {}", factory.contract_name))?;
    decode_bytecode(&factory.contract_name, &linked)
}

/// Deploy `LaunchpadLib`, then `KiloScribeMinterFactory` linked against it.
///
/// Both artifacts are read before anything is submitted.
pub async fn deploy_factory<L: Ledger + ?Sized>(ledger: &L, artifacts_dir: &Path) -> Result<FactoryDeployment> {
    let library = ContractArtifact::load(artifacts_dir, LIBRARY_CONTRACT)?;
    let factory = ContractArtifact::load(artifacts_dir, FACTORY_CONTRACT)?;
    debug!(
        library_len = library.bytecode.len(),
        factory_len = factory.bytecode.len(),
        "loaded launchpad artifacts"
    );

    info!("deploying {LIBRARY_CONTRACT}");
    let library_id = ledger
        .create_contract(&ContractCreate {
            bytecode: library.bytecode_bytes()?,
            gas: LIBRARY_GAS,
            memo: LIBRARY_MEMO.into(),
        })
        .await
        .with_context(|| format!("Failed to deploy {LIBRARY_CONTRACT}"))?;
    info!(library = %library_id, "{LIBRARY_CONTRACT} deployed");

    let bytecode = link_factory(&factory, library_id)?;
    info!("deploying {FACTORY_CONTRACT}");
    let factory_id = ledger
        .create_contract(&ContractCreate {
            bytecode,
            gas: FACTORY_GAS,
            memo: String::new(),
        })
        .await
        .with_context(|| format!("Failed to deploy {FACTORY_CONTRACT}"))?;
    info!(factory = %factory_id, "{FACTORY_CONTRACT} deployed");

    Ok(FactoryDeployment {
        factory_id,
        library_id,
        abi: factory.abi,
    })
}
