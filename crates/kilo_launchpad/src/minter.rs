//! Per-collection minting contracts created through the factory.

use std::time::Duration;

use alloy::primitives::{Address, Bytes};
use alloy::sol;
use alloy::sol_types::{SolCall, SolValue};
use anyhow::{Context, Result, bail};
use kilo_ledger::{
    AccountId, ContractCall, ContractExecute, ContractId, ContractLookup, Hbar, Ledger, Receipt,
    TokenId, try_get_contract_id,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const CREATE_CONTRACT_GAS: u64 = 1_300_000;
pub const TOGGLE_MINT_GAS: u64 = 300_000;
pub const MINT_GAS: u64 = 1_200_000;
pub const TOKENS_REMAINING_GAS: u64 = 100_000;

pub const DEFAULT_BASE_TOKEN_URI: &str = "hcs://1/0.0.4840712";

sol! {
    interface IKiloScribeMinterFactory {
        function createContract(
            address tokenAddress,
            uint64 discountedMintPrice,
            uint64 allowListMintPrice,
            uint64 mintPrice,
            uint64 tokensRemaining,
            uint64[] launchpadFees,
            address[] feeAddresses,
            string baseTokenURI,
            bool isHashinal
        ) external returns (address);
    }

    interface IKiloScribeMinter {
        function toggleMintEnabled(bool enabled) external;
        function mint(address to, uint8 amount) external payable;
        function tokensRemaining() external view returns (uint64);
    }
}

/// Settings a minting contract is created with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinterConfig {
    pub token: TokenId,
    pub discounted_mint_price: Hbar,
    pub allow_list_mint_price: Hbar,
    pub mint_price: Hbar,
    pub tokens_remaining: u64,
    pub total_supply: u64,
    /// Launchpad fee per fee address, in basis points.
    pub launchpad_fees: Vec<u64>,
    pub fee_addresses: Vec<AccountId>,
    pub base_token_uri: String,
}

impl MinterConfig {
    /// 1 HBAR at every price tier, 3000 pieces, 10% to each fee address.
    pub fn kiloscribe(token: TokenId, fee_addresses: [AccountId; 2]) -> Self {
        Self {
            token,
            discounted_mint_price: Hbar::from_hbar(1),
            allow_list_mint_price: Hbar::from_hbar(1),
            mint_price: Hbar::from_hbar(1),
            tokens_remaining: 3000,
            total_supply: 3000,
            launchpad_fees: vec![1000, 1000],
            fee_addresses: fee_addresses.to_vec(),
            base_token_uri: DEFAULT_BASE_TOKEN_URI.into(),
        }
    }

    /// Metadata is inscribed on the consensus service.
    pub fn is_hashinal(&self) -> bool {
        self.base_token_uri.contains("hcs://")
    }

    /// ABI-encoded `createContract` call.
    pub fn encode_create_call(&self) -> Result<Bytes> {
        if self.launchpad_fees.len() != self.fee_addresses.len() {
            bail!(
                "{} launchpad fees for {} fee addresses",
                self.launchpad_fees.len(),
                self.fee_addresses.len()
            );
        }
        let fee_addresses = self
            .fee_addresses
            .iter()
            .map(|id| id.to_solidity_address().with_context(|| format!("fee address {id}")))
            .collect::<Result<Vec<Address>>>()?;

        let call = IKiloScribeMinterFactory::createContractCall {
            tokenAddress: self.token.to_solidity_address()?,
            discountedMintPrice: price(self.discounted_mint_price)?,
            allowListMintPrice: price(self.allow_list_mint_price)?,
            mintPrice: price(self.mint_price)?,
            tokensRemaining: self.tokens_remaining,
            launchpadFees: self.launchpad_fees.clone(),
            feeAddresses: fee_addresses,
            baseTokenURI: self.base_token_uri.clone(),
            isHashinal: self.is_hashinal(),
        };
        Ok(call.abi_encode().into())
    }
}

fn price(amount: Hbar) -> Result<u64> {
    u64::try_from(amount.to_tinybars()).with_context(|| format!("negative price {amount}"))
}

/// Have the factory create a minting contract and resolve its id.
///
/// The factory returns the new contract's EVM address; the mirror node is
/// given `propagation_delay` to index it before the bounded lookup starts.
pub async fn create_minter_contract<L, M>(
    ledger: &L,
    mirror: &M,
    factory: ContractId,
    config: &MinterConfig,
    propagation_delay: Duration,
) -> Result<ContractId>
where
    L: Ledger + ?Sized,
    M: ContractLookup + ?Sized,
{
    info!(
        factory = %factory,
        token = %config.token,
        hashinal = config.is_hashinal(),
        "creating minting contract"
    );
    let record = ledger
        .execute_contract(&ContractExecute {
            contract: factory,
            gas: CREATE_CONTRACT_GAS,
            payable: Hbar::ZERO,
            data: config.encode_create_call()?,
        })
        .await
        .context("createContract failed")?;

    let created = Address::abi_decode(&record.result)
        .with_context(|| format!("createContract returned no address ({})", record.receipt))?;
    let evm_address = format!("{created:#x}");
    debug!(address = %evm_address, "factory created contract");

    if !propagation_delay.is_zero() {
        tokio::time::sleep(propagation_delay).await;
    }

    let minter = try_get_contract_id(mirror, &evm_address).await;
    match minter {
        Some(id) => {
            info!(minter = %id, address = %evm_address, "minting contract ready");
            Ok(id)
        }
        None => bail!("could not resolve minting contract {evm_address}"),
    }
}

/// Outcome of [`test_minting`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintCheck {
    pub enable_receipt: Receipt,
    pub mint_receipt: Receipt,
    pub tokens_remaining: u64,
}

/// Read `tokensRemaining()` from a minting contract.
pub async fn tokens_remaining<L: Ledger + ?Sized>(ledger: &L, minter: ContractId) -> Result<u64> {
    let output = ledger
        .call_contract(&ContractCall {
            contract: minter,
            gas: TOKENS_REMAINING_GAS,
            data: IKiloScribeMinter::tokensRemainingCall {}.abi_encode().into(),
        })
        .await
        .context("tokensRemaining query failed")?;
    u64::abi_decode(&output).context("tokensRemaining returned malformed data")
}

/// Enable minting, mint one piece to `recipient` paying `price`, then read
/// the remaining supply.
pub async fn test_minting<L: Ledger + ?Sized>(
    ledger: &L,
    minter: ContractId,
    recipient: AccountId,
    price: Hbar,
) -> Result<MintCheck> {
    let enable_receipt = ledger
        .execute_contract(&ContractExecute {
            contract: minter,
            gas: TOGGLE_MINT_GAS,
            payable: Hbar::ZERO,
            data: IKiloScribeMinter::toggleMintEnabledCall { enabled: true }
                .abi_encode()
                .into(),
        })
        .await
        .context("toggleMintEnabled failed")?
        .receipt;
    info!(receipt = %enable_receipt, "minting enabled");

    let mint_receipt = ledger
        .execute_contract(&ContractExecute {
            contract: minter,
            gas: MINT_GAS,
            payable: price,
            data: IKiloScribeMinter::mintCall {
                to: recipient.to_solidity_address()?,
                amount: 1,
            }
            .abi_encode()
            .into(),
        })
        .await
        .with_context(|| format!("mint to {recipient} failed"))?
        .receipt;
    info!(receipt = %mint_receipt, recipient = %recipient, "minted");

    let tokens_remaining = tokens_remaining(ledger, minter).await?;
    info!(tokens_remaining, "tokens remaining");

    Ok(MintCheck {
        enable_receipt,
        mint_receipt,
        tokens_remaining,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockLedger, MockLookup, Recorded};

    fn fees() -> [AccountId; 2] {
        [AccountId::new(0, 0, 11), AccountId::new(0, 0, 12)]
    }

    #[test]
    fn kiloscribe_defaults() {
        let config = MinterConfig::kiloscribe(TokenId::new(0, 0, 77), fees());
        assert_eq!(config.mint_price.to_tinybars(), 100_000_000);
        assert_eq!(config.discounted_mint_price, config.mint_price);
        assert_eq!(config.tokens_remaining, 3000);
        assert_eq!(config.total_supply, 3000);
        assert_eq!(config.launchpad_fees, vec![1000, 1000]);
        assert_eq!(config.base_token_uri, "hcs://1/0.0.4840712");
        assert!(config.is_hashinal());
    }

    #[test]
    fn hashinal_follows_base_uri() {
        let mut config = MinterConfig::kiloscribe(TokenId::new(0, 0, 77), fees());
        config.base_token_uri = "ipfs://bafy/".into();
        assert!(!config.is_hashinal());
    }

    #[test]
    fn create_call_encodes_every_field() {
        let config = MinterConfig::kiloscribe(TokenId::new(0, 0, 77), fees());
        let data = config.encode_create_call().unwrap();
        assert_eq!(&data[..4], IKiloScribeMinterFactory::createContractCall::SELECTOR);

        let call = IKiloScribeMinterFactory::createContractCall::abi_decode(&data).unwrap();
        assert_eq!(call.tokenAddress, TokenId::new(0, 0, 77).to_solidity_address().unwrap());
        assert_eq!(call.mintPrice, 100_000_000);
        assert_eq!(call.tokensRemaining, 3000);
        assert_eq!(call.launchpadFees, vec![1000, 1000]);
        assert_eq!(call.feeAddresses[1], AccountId::new(0, 0, 12).to_solidity_address().unwrap());
        assert_eq!(call.baseTokenURI, "hcs://1/0.0.4840712");
        assert!(call.isHashinal);
    }

    #[test]
    fn create_call_rejects_mismatched_fees() {
        let mut config = MinterConfig::kiloscribe(TokenId::new(0, 0, 77), fees());
        config.launchpad_fees.push(500);
        assert!(config.encode_create_call().is_err());
    }

    #[tokio::test]
    async fn creates_and_resolves_minter() {
        let minter = ContractId::new(0, 0, 9001);
        let ledger = MockLedger::new().returning_minter(minter);
        let mirror = MockLookup::lagging(2);
        let config = MinterConfig::kiloscribe(TokenId::new(0, 0, 77), fees());

        let id = create_minter_contract(&ledger, &mirror, ContractId::new(0, 0, 500), &config, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(id, minter);
        assert_eq!(mirror.seen.lock().len(), 3);

        let calls = ledger.calls();
        let [Recorded::Execute(execute)] = calls.as_slice() else {
            panic!("unexpected calls: {calls:?}");
        };
        assert_eq!(execute.contract, ContractId::new(0, 0, 500));
        assert_eq!(execute.gas, CREATE_CONTRACT_GAS);
    }

    #[tokio::test]
    async fn unresolved_minter_is_an_error() {
        let ledger = MockLedger::new().returning_minter(ContractId::new(0, 0, 9001));
        let mirror = MockLookup::lagging(u32::MAX);
        let config = MinterConfig::kiloscribe(TokenId::new(0, 0, 77), fees());

        let err = create_minter_contract(&ledger, &mirror, ContractId::new(0, 0, 500), &config, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("could not resolve minting contract"));
        assert_eq!(mirror.seen.lock().len(), 4);
    }

    #[tokio::test]
    async fn empty_factory_result_is_an_error() {
        let ledger = MockLedger::new();
        let mirror = MockLookup::indexed();
        let config = MinterConfig::kiloscribe(TokenId::new(0, 0, 77), fees());
        let result =
            create_minter_contract(&ledger, &mirror, ContractId::new(0, 0, 500), &config, Duration::ZERO).await;
        assert!(result.is_err());
        assert!(mirror.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_minting_enables_mints_and_queries() {
        let ledger = MockLedger::new().returning_u64(2999);
        let minter = ContractId::new(0, 0, 9001);
        let recipient = AccountId::new(0, 0, 4242);

        let check = test_minting(&ledger, minter, recipient, Hbar::from_hbar(1)).await.unwrap();
        assert_eq!(check.tokens_remaining, 2999);
        assert!(check.mint_receipt.is_success());

        let calls = ledger.calls();
        let [Recorded::Execute(enable), Recorded::Execute(mint), Recorded::Call(query)] = calls.as_slice()
        else {
            panic!("unexpected calls: {calls:?}");
        };

        assert_eq!(enable.gas, TOGGLE_MINT_GAS);
        let toggle = IKiloScribeMinter::toggleMintEnabledCall::abi_decode(&enable.data).unwrap();
        assert!(toggle.enabled);

        assert_eq!(mint.gas, MINT_GAS);
        assert_eq!(mint.payable, Hbar::from_hbar(1));
        let decoded = IKiloScribeMinter::mintCall::abi_decode(&mint.data).unwrap();
        assert_eq!(decoded.to, recipient.to_solidity_address().unwrap());
        assert_eq!(decoded.amount, 1);

        assert_eq!(query.gas, TOKENS_REMAINING_GAS);
        assert_eq!(&query.data[..], IKiloScribeMinter::tokensRemainingCall::SELECTOR);
    }
}
