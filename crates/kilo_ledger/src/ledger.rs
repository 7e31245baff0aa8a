//! The ledger boundary: every transaction the launchpad tooling submits goes
//! through [`Ledger`]. [`crate::relay::RelayLedger`] is the network-backed
//! implementation.

use alloy::primitives::Bytes;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entity::{AccountId, ContractId, TokenId};
use crate::hbar::Hbar;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors any ledger backend may return.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("{operation} failed with status {status}")]
    Status { operation: String, status: String },

    #[error("transaction {hash} reverted: {reason}")]
    Reverted { hash: String, reason: String },

    #[error("{0} returned no result")]
    MissingResult(String),

    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("Invalid request: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Which keys a new token carries. Every enabled key is the operator's key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenKeys {
    pub admin: bool,
    pub supply: bool,
    pub wipe: bool,
    pub fee_schedule: bool,
}

impl Default for TokenKeys {
    fn default() -> Self {
        Self {
            admin: true,
            supply: true,
            wipe: false,
            fee_schedule: false,
        }
    }
}

/// Royalty charged on NFT transfers: `numerator / denominator` of the
/// exchanged value, paid to `collector`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoyaltyFee {
    pub numerator: i64,
    pub denominator: i64,
    pub collector: AccountId,
}

/// Create a finite-supply, non-fungible token with zero initial supply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCreate {
    pub name: String,
    pub symbol: String,
    pub memo: String,
    pub treasury: AccountId,
    pub max_supply: i64,
    pub keys: TokenKeys,
    pub royalty_fees: Vec<RoyaltyFee>,
}

/// Deploy a contract from creation bytecode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCreate {
    pub bytecode: Bytes,
    pub gas: u64,
    pub memo: String,
}

/// Execute a state-changing contract function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractExecute {
    pub contract: ContractId,
    pub gas: u64,
    pub payable: Hbar,
    /// ABI-encoded call data (selector + arguments).
    pub data: Bytes,
}

/// Read-only contract query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub contract: ContractId,
    pub gas: u64,
    pub data: Bytes,
}

/// Rotate a token's supply key and/or treasury.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUpdate {
    pub token: TokenId,
    /// New supply key: the given contract.
    pub supply_key: Option<ContractId>,
    pub treasury: Option<AccountId>,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Confirmation that a transaction reached consensus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub status: String,
    pub transaction_hash: String,
}

impl Receipt {
    pub fn success(transaction_hash: impl Into<String>) -> Self {
        Self {
            status: "SUCCESS".into(),
            transaction_hash: transaction_hash.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "SUCCESS"
    }
}

impl std::fmt::Display for Receipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.status, self.transaction_hash)
    }
}

/// Receipt plus the raw ABI-encoded return data of the executed function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractRecord {
    pub receipt: Receipt,
    pub result: Bytes,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Transactions and queries the launchpad tooling needs from the ledger.
///
/// Every call waits for consensus (or the query result) before returning.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Account paying for and signing every transaction.
    fn operator(&self) -> AccountId;

    async fn create_token(&self, tx: &TokenCreate) -> Result<TokenId, LedgerError>;

    async fn create_contract(&self, tx: &ContractCreate) -> Result<ContractId, LedgerError>;

    async fn execute_contract(&self, tx: &ContractExecute) -> Result<ContractRecord, LedgerError>;

    async fn call_contract(&self, query: &ContractCall) -> Result<Bytes, LedgerError>;

    async fn update_token(&self, tx: &TokenUpdate) -> Result<Receipt, LedgerError>;

    /// Let `spender` spend up to `amount` of `owner`'s HBAR.
    async fn approve_hbar_allowance(
        &self,
        owner: AccountId,
        spender: AccountId,
        amount: Hbar,
    ) -> Result<Receipt, LedgerError>;

    async fn associate_token(&self, account: AccountId, token: TokenId)
    -> Result<Receipt, LedgerError>;
}
