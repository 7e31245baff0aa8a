use anyhow::{Context, Result};
use kilo_core::LaunchpadConfig;
use kilo_launchpad::{
    MinterConfig, SystemPlan, TokenConfig, allowance, associate, create_minter_contract,
    create_token, deploy_factory, deploy_full_system, set_supply_key, test_minting,
};
use kilo_ledger::{AccountId, Ledger, RelayLedger};
use serde_json::{Value, json};
use std::time::Duration;

use crate::cli::DeployCommand;

/// The two fee accounts, parsed.
pub fn fee_accounts(config: &LaunchpadConfig) -> Result<[AccountId; 2]> {
    let [first, second] = config.require_fee_addresses()?;
    let parse = |raw: &str| -> Result<AccountId> {
        raw.parse()
            .with_context(|| format!("invalid fee address {raw:?}"))
    };
    Ok([parse(first)?, parse(second)?])
}

/// Test-mint recipient: the flag, else the configured account.
pub fn mint_recipient(explicit: Option<AccountId>, config: &LaunchpadConfig) -> Result<AccountId> {
    if let Some(recipient) = explicit {
        return Ok(recipient);
    }
    let raw = config.require_test_recipient()?;
    raw.parse()
        .with_context(|| format!("invalid test recipient {raw:?}"))
}

/// Run one deployment command against the configured network and return a
/// JSON summary of what was created.
pub async fn run_deploy(command: &DeployCommand, config: &LaunchpadConfig) -> Result<Value> {
    let ledger = RelayLedger::from_config(config).context("Failed to connect to the ledger")?;
    let mirror = ledger.mirror();

    let summary = match command {
        DeployCommand::All => {
            let plan = SystemPlan::from_config(config)?;
            let deployment = deploy_full_system(&ledger, mirror, &plan).await?;
            serde_json::to_value(deployment)?
        }
        DeployCommand::Token => {
            let [fee_1, fee_2] = config.require_fee_addresses()?;
            let token = create_token(&ledger, &TokenConfig::kiloscribe(fee_1, fee_2)).await?;
            serde_json::to_value(token)?
        }
        DeployCommand::Factory => {
            let factory = deploy_factory(&ledger, &config.artifacts_dir).await?;
            json!({ "factory_id": factory.factory_id, "library_id": factory.library_id })
        }
        DeployCommand::Minter { factory, token } => {
            let minter_config = MinterConfig::kiloscribe(*token, fee_accounts(config)?);
            let minter_id = create_minter_contract(
                &ledger,
                mirror,
                *factory,
                &minter_config,
                Duration::from_secs(config.mirror_propagation_secs),
            )
            .await?;
            json!({ "minter_id": minter_id, "hashinal": minter_config.is_hashinal() })
        }
        DeployCommand::SupplyKey { token, minter } => {
            let receipt = set_supply_key(&ledger, *token, *minter).await?;
            serde_json::to_value(receipt)?
        }
        DeployCommand::TestMint {
            minter,
            recipient,
            price,
        } => {
            let recipient = mint_recipient(*recipient, config)?;
            let check = test_minting(&ledger, *minter, recipient, *price).await?;
            serde_json::to_value(check)?
        }
        DeployCommand::Associate { account, token } => {
            let receipt = associate(&ledger, *account, *token).await;
            json!({ "associated": receipt.is_some(), "receipt": receipt })
        }
        DeployCommand::Allowance {
            spender,
            amount,
            owner,
        } => {
            let owner = owner.unwrap_or_else(|| ledger.operator());
            let receipt = allowance(&ledger, owner, *spender, *amount).await;
            json!({ "approved": receipt.is_some(), "receipt": receipt })
        }
    };

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LaunchpadConfig {
        LaunchpadConfig {
            fee_address: Some("0.0.11".into()),
            fee_address_2: Some("0.0.12".into()),
            ..Default::default()
        }
    }

    #[test]
    fn parses_fee_accounts() {
        assert_eq!(
            fee_accounts(&config()).unwrap(),
            [AccountId::new(0, 0, 11), AccountId::new(0, 0, 12)]
        );
    }

    #[test]
    fn bad_fee_account_is_reported() {
        let mut config = config();
        config.fee_address_2 = Some("twelve".into());
        let err = fee_accounts(&config).unwrap_err();
        assert!(err.to_string().contains("invalid fee address"));
    }

    #[test]
    fn recipient_prefers_flag_over_config() {
        let mut config = config();
        config.test_recipient = Some("0.0.4242".into());
        assert_eq!(
            mint_recipient(Some(AccountId::new(0, 0, 7)), &config).unwrap(),
            AccountId::new(0, 0, 7)
        );
        assert_eq!(mint_recipient(None, &config).unwrap(), AccountId::new(0, 0, 4242));
    }

    #[test]
    fn recipient_is_required_without_flag() {
        let err = mint_recipient(None, &config()).unwrap_err();
        assert!(err.to_string().contains("TESTNET_LP_ADDRESS_1"));
    }

    #[tokio::test]
    async fn deploy_requires_operator_credentials() {
        let err = run_deploy(&DeployCommand::Factory, &LaunchpadConfig::default())
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("HEDERAS_OPERATOR_ID"));
    }
}
