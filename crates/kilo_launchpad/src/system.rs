use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use kilo_core::LaunchpadConfig;
use kilo_ledger::{AccountId, ContractId, ContractLookup, Ledger, TokenId};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::accounts::set_supply_key;
use crate::factory::deploy_factory;
use crate::minter::{DEFAULT_BASE_TOKEN_URI, MinterConfig, create_minter_contract, test_minting};
use crate::token::{TokenConfig, create_token};

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// Everything a full launchpad deployment needs up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPlan {
    pub token: TokenConfig,
    pub fee_addresses: [AccountId; 2],
    pub base_token_uri: String,
    pub artifacts_dir: PathBuf,
    /// Wait before looking up the freshly created minter on the mirror node.
    pub propagation_delay: Duration,
    /// Receives the test mint. No test mint without one.
    pub test_recipient: Option<AccountId>,
}

impl SystemPlan {
    /// KiloScribe collection defaults with accounts and paths from `config`.
    pub fn from_config(config: &LaunchpadConfig) -> Result<Self> {
        let [fee_1, fee_2] = config.require_fee_addresses()?;
        let fee_addresses = [parse_account(fee_1)?, parse_account(fee_2)?];
        let test_recipient = config
            .test_recipient
            .as_deref()
            .map(parse_account)
            .transpose()?;

        Ok(Self {
            token: TokenConfig::kiloscribe(fee_1, fee_2),
            fee_addresses,
            base_token_uri: DEFAULT_BASE_TOKEN_URI.into(),
            artifacts_dir: config.artifacts_dir.clone(),
            propagation_delay: Duration::from_secs(config.mirror_propagation_secs),
            test_recipient,
        })
    }
}

fn parse_account(raw: &str) -> Result<AccountId> {
    raw.parse()
        .with_context(|| format!("invalid account id {raw:?}"))
}

// ---------------------------------------------------------------------------
// Deployment
// ---------------------------------------------------------------------------

/// Ids of everything [`deploy_full_system`] created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemDeployment {
    pub token_id: TokenId,
    pub factory_id: ContractId,
    pub library_id: ContractId,
    pub minter_id: ContractId,
    /// Remaining supply after the test mint, when one ran.
    pub tokens_remaining: Option<u64>,
}

/// Token, library + factory, minter, supply key handover, then a test mint.
pub async fn deploy_full_system<L, M>(ledger: &L, mirror: &M, plan: &SystemPlan) -> Result<SystemDeployment>
where
    L: Ledger + ?Sized,
    M: ContractLookup + ?Sized,
{
    info!("Creating token...");
    let token = create_token(ledger, &plan.token).await?;

    info!("Deploying factory...");
    let factory = deploy_factory(ledger, &plan.artifacts_dir).await?;

    info!("Deploying minting contract...");
    let mut minter_config = MinterConfig::kiloscribe(token.token_id, plan.fee_addresses);
    minter_config.base_token_uri = plan.base_token_uri.clone();
    let minter_id = create_minter_contract(
        ledger,
        mirror,
        factory.factory_id,
        &minter_config,
        plan.propagation_delay,
    )
    .await?;

    info!("Updating token supply key...");
    set_supply_key(ledger, token.token_id, minter_id).await?;

    let tokens_remaining = match plan.test_recipient {
        Some(recipient) => {
            info!("Testing minting...");
            let check = test_minting(ledger, minter_id, recipient, minter_config.mint_price).await?;
            Some(check.tokens_remaining)
        }
        None => {
            warn!("no test recipient configured, skipping test mint");
            None
        }
    };

    let deployment = SystemDeployment {
        token_id: token.token_id,
        factory_id: factory.factory_id,
        library_id: factory.library_id,
        minter_id,
        tokens_remaining,
    };
    info!(
        token = %deployment.token_id,
        factory = %deployment.factory_id,
        library = %deployment.library_id,
        minter = %deployment.minter_id,
        "Deployment complete!"
    );
    Ok(deployment)
}
