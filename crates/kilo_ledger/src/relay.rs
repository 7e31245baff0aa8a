//! [`Ledger`] over the Hashio JSON-RPC relay.
//!
//! Token operations go through the HTS system contracts (see [`crate::hts`]).
//! The relay only hands back EVM receipts, so return data and revert reasons
//! are read from the mirror node once it has indexed the transaction.

use std::str::FromStr;
use std::time::Duration;

use alloy::network::{EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, Bytes};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::Signer;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use kilo_core::LaunchpadConfig;
use tracing::{debug, info, warn};

use crate::entity::{AccountId, ContractId, EntityId, TokenId};
use crate::hbar::Hbar;
use crate::hts;
use crate::ledger::{
    ContractCall, ContractCreate, ContractExecute, ContractRecord, Ledger, LedgerError, Receipt,
    TokenCreate, TokenUpdate,
};
use crate::mirror::{MirrorClient, resolve_created_contract};
use crate::network::Endpoints;

/// DER prefix the Hedera portal prepends to raw secp256k1 private keys.
const ECDSA_DER_PREFIX: &str = "3030020100300706052b8104000a04220420";

const TOKEN_CREATE_GAS: u64 = 1_500_000;
const SYSTEM_CALL_GAS: u64 = 1_000_000;

fn transport(e: impl std::fmt::Display) -> LedgerError {
    LedgerError::Transport(e.to_string())
}

/// Parse an ECDSA operator key: raw hex, `0x`-prefixed, or DER-encoded hex.
pub fn parse_operator_key(raw: &str) -> Result<PrivateKeySigner, LedgerError> {
    let trimmed = raw.trim().trim_start_matches("0x");
    let key = trimmed
        .to_ascii_lowercase()
        .strip_prefix(ECDSA_DER_PREFIX)
        .map(str::to_string)
        .unwrap_or_else(|| trimmed.to_string());
    PrivateKeySigner::from_str(&key).map_err(|e| {
        LedgerError::Invalid(format!("operator key is not an ECDSA secp256k1 key: {e}"))
    })
}

pub struct RelayLedger {
    provider: DynProvider,
    mirror: MirrorClient,
    operator: AccountId,
    operator_public_key: Vec<u8>,
    receipt_timeout: Duration,
    token_create_fee: Hbar,
}

impl RelayLedger {
    pub fn connect(
        endpoints: &Endpoints,
        operator_id: &str,
        operator_key: &str,
        mirror: MirrorClient,
        receipt_timeout: Duration,
        token_create_fee: Hbar,
    ) -> Result<Self, LedgerError> {
        let operator: AccountId = operator_id
            .parse()
            .map_err(|e| LedgerError::Invalid(format!("operator id: {e}")))?;
        let signer = parse_operator_key(operator_key)?
            .with_chain_id(Some(endpoints.network.chain_id()));
        let operator_public_key = signer
            .credential()
            .verifying_key()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec();

        let url = endpoints
            .relay_url
            .parse()
            .map_err(|e| LedgerError::Invalid(format!("relay url {}: {e}", endpoints.relay_url)))?;
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();

        info!(
            network = %endpoints.network,
            relay = %endpoints.relay_url,
            operator = %operator,
            "connected to relay"
        );

        Ok(Self {
            provider,
            mirror,
            operator,
            operator_public_key,
            receipt_timeout,
            token_create_fee,
        })
    }

    /// Build a relay ledger from the loaded configuration.
    pub fn from_config(config: &LaunchpadConfig) -> Result<Self, LedgerError> {
        let endpoints = Endpoints::from_config(config).map_err(|e| LedgerError::Invalid(e.to_string()))?;
        let (operator_id, operator_key) = config
            .require_operator()
            .map_err(|e| LedgerError::Invalid(e.to_string()))?;
        let mirror = MirrorClient::new(
            endpoints.mirror_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
        .map_err(|e| LedgerError::Invalid(e.to_string()))?;
        let fee = i64::try_from(config.token_create_fee_hbar)
            .ok()
            .and_then(Hbar::checked_from_hbar)
            .ok_or_else(|| {
                LedgerError::Invalid(format!(
                    "token_create_fee_hbar {} is out of range",
                    config.token_create_fee_hbar
                ))
            })?;

        Self::connect(
            &endpoints,
            operator_id,
            operator_key,
            mirror,
            Duration::from_secs(config.receipt_timeout_secs),
            fee,
        )
    }

    /// Compressed public key of the operator, used for token keys.
    pub fn operator_public_key(&self) -> &[u8] {
        &self.operator_public_key
    }

    pub fn mirror(&self) -> &MirrorClient {
        &self.mirror
    }

    /// Send a transaction and wait for its receipt. Reverts become
    /// [`LedgerError::Reverted`] carrying the mirror's error message.
    async fn submit(
        &self,
        operation: &str,
        tx: TransactionRequest,
    ) -> Result<(Receipt, Option<Address>), LedgerError> {
        debug!(operation, "submitting transaction");
        let pending = self.provider.send_transaction(tx).await.map_err(transport)?;
        let receipt = pending
            .with_timeout(Some(self.receipt_timeout))
            .get_receipt()
            .await
            .map_err(transport)?;

        let hash = format!("{:#x}", receipt.transaction_hash());
        if !receipt.status() {
            let reason = self.revert_reason(&hash).await;
            warn!(operation, hash = %hash, reason = %reason, "transaction reverted");
            return Err(LedgerError::Reverted { hash, reason });
        }
        debug!(operation, hash = %hash, "transaction confirmed");
        Ok((Receipt::success(hash), receipt.contract_address()))
    }

    async fn revert_reason(&self, hash: &str) -> String {
        match self.mirror.await_contract_result(hash).await {
            Ok(result) => result
                .error_message
                .or(result.result)
                .unwrap_or_else(|| "unknown".into()),
            Err(e) => format!("unavailable ({e})"),
        }
    }

    /// Return data of a confirmed transaction, from the mirror node.
    async fn call_result(&self, operation: &str, hash: &str) -> Result<Bytes, LedgerError> {
        let result = self
            .mirror
            .await_contract_result(hash)
            .await
            .map_err(|e| LedgerError::MissingResult(format!("{operation} ({e})")))?;
        let bytes = result
            .call_result_bytes()
            .map_err(|e| LedgerError::Lookup(e.to_string()))?;
        Ok(Bytes::from(bytes))
    }

    /// Call a system contract and check its `int64` response code.
    async fn system_call(
        &self,
        operation: &str,
        to: Address,
        data: Bytes,
    ) -> Result<Receipt, LedgerError> {
        let tx = TransactionRequest::default()
            .with_to(to)
            .with_input(data)
            .with_gas_limit(SYSTEM_CALL_GAS);
        let (receipt, _) = self.submit(operation, tx).await?;
        let output = self.call_result(operation, &receipt.transaction_hash).await?;
        hts::check_response(operation, hts::decode_response_code(&output)?)?;
        Ok(receipt)
    }
}

#[async_trait]
impl Ledger for RelayLedger {
    fn operator(&self) -> AccountId {
        self.operator
    }

    async fn create_token(&self, tx: &TokenCreate) -> Result<TokenId, LedgerError> {
        let data = hts::encode_create_token(tx, &self.operator_public_key)?;
        let request = TransactionRequest::default()
            .with_to(hts::TOKEN_SERVICE)
            .with_input(data)
            .with_gas_limit(TOKEN_CREATE_GAS)
            .with_value(self.token_create_fee.to_weibars());

        let (receipt, _) = self.submit("createNonFungibleToken", request).await?;
        let output = self
            .call_result("createNonFungibleToken", &receipt.transaction_hash)
            .await?;
        let (code, token_address) = hts::decode_create_token(&output)?;
        hts::check_response("createNonFungibleToken", code)?;
        EntityId::from_address(token_address).map_err(|e| LedgerError::Invalid(e.to_string()))
    }

    async fn create_contract(&self, tx: &ContractCreate) -> Result<ContractId, LedgerError> {
        if !tx.memo.is_empty() {
            debug!(memo = %tx.memo, "contract memo is not settable through the relay");
        }
        let request = TransactionRequest::default()
            .with_deploy_code(tx.bytecode.clone())
            .with_gas_limit(tx.gas);
        let (receipt, created) = self.submit("contractCreate", request).await?;
        let address = created.ok_or_else(|| LedgerError::MissingResult("contractCreate".into()))?;

        let evm_address = format!("{address:#x}");
        resolve_created_contract(&self.mirror, &receipt.transaction_hash, &evm_address)
            .await
            .ok_or_else(|| {
                LedgerError::Lookup(format!(
                    "contract {evm_address} from {} is not on the mirror node",
                    receipt.transaction_hash
                ))
            })
    }

    async fn execute_contract(&self, tx: &ContractExecute) -> Result<ContractRecord, LedgerError> {
        let to = hts::solidity(&tx.contract)?;
        let request = TransactionRequest::default()
            .with_to(to)
            .with_input(tx.data.clone())
            .with_gas_limit(tx.gas)
            .with_value(tx.payable.to_weibars());
        let (receipt, _) = self.submit("contractExecute", request).await?;

        // Return data is informational for most calls; a lagging mirror is not fatal here.
        let result = match self.call_result("contractExecute", &receipt.transaction_hash).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "no return data for contract execution");
                Bytes::new()
            }
        };
        Ok(ContractRecord { receipt, result })
    }

    async fn call_contract(&self, query: &ContractCall) -> Result<Bytes, LedgerError> {
        let request = TransactionRequest::default()
            .with_to(hts::solidity(&query.contract)?)
            .with_input(query.data.clone())
            .with_gas_limit(query.gas);
        self.provider.call(request).await.map_err(transport)
    }

    async fn update_token(&self, tx: &TokenUpdate) -> Result<Receipt, LedgerError> {
        let mut last = None;

        if let Some(contract) = tx.supply_key {
            let data = hts::encode_supply_key_update(&tx.token, &contract)?;
            last = Some(self.system_call("updateTokenKeys", hts::TOKEN_SERVICE, data).await?);
        }

        if let Some(treasury) = tx.treasury {
            let info = self
                .mirror
                .token(&tx.token)
                .await
                .map_err(|e| LedgerError::Lookup(e.to_string()))?;
            let data =
                hts::encode_treasury_update(&tx.token, &treasury, &info.name, &info.symbol, &info.memo)?;
            last = Some(self.system_call("updateTokenInfo", hts::TOKEN_SERVICE, data).await?);
        }

        last.ok_or_else(|| LedgerError::Invalid(format!("token update for {} changes nothing", tx.token)))
    }

    async fn approve_hbar_allowance(
        &self,
        owner: AccountId,
        spender: AccountId,
        amount: Hbar,
    ) -> Result<Receipt, LedgerError> {
        let data = hts::encode_hbar_approve(&owner, &spender, amount.to_tinybars())?;
        self.system_call("hbarApprove", hts::ACCOUNT_SERVICE, data).await
    }

    async fn associate_token(
        &self,
        account: AccountId,
        token: TokenId,
    ) -> Result<Receipt, LedgerError> {
        let data = hts::encode_associate(&account, &token)?;
        self.system_call("associateToken", hts::TOKEN_SERVICE, data).await
    }
}
