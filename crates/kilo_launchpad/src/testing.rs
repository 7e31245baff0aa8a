//! In-memory [`Ledger`] and [`ContractLookup`] doubles for orchestration tests.

use std::sync::atomic::{AtomicU64, Ordering};

use alloy::primitives::Bytes;
use alloy::sol_types::SolValue;
use async_trait::async_trait;
use kilo_ledger::{
    AccountId, ContractCall, ContractCreate, ContractExecute, ContractId, ContractLookup,
    ContractRecord, ContractResult, EntityId, Hbar, Ledger, LedgerError, MirrorError, Receipt,
    TokenCreate, TokenId, TokenUpdate,
};
use parking_lot::Mutex;

/// Every request the mock received, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    CreateToken(TokenCreate),
    CreateContract(ContractCreate),
    Execute(ContractExecute),
    Call(ContractCall),
    UpdateToken(TokenUpdate),
    Allowance {
        owner: AccountId,
        spender: AccountId,
        amount: Hbar,
    },
    Associate {
        account: AccountId,
        token: TokenId,
    },
}

pub struct MockLedger {
    operator: AccountId,
    next_entity: AtomicU64,
    execute_result: Mutex<Bytes>,
    call_result: Mutex<Bytes>,
    fail_account_ops: bool,
    calls: Mutex<Vec<Recorded>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            operator: AccountId::new(0, 0, 1001),
            next_entity: AtomicU64::new(5000),
            execute_result: Mutex::new(Bytes::new()),
            call_result: Mutex::new(Bytes::new()),
            fail_account_ops: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Allowance and association requests fail with a status error.
    pub fn failing_account_ops() -> Self {
        Self {
            fail_account_ops: true,
            ..Self::new()
        }
    }

    /// Every contract execution returns `minter` as an ABI-encoded address.
    pub fn returning_minter(self, minter: ContractId) -> Self {
        let address = minter
            .to_solidity_address()
            .unwrap_or_else(|e| panic!("bad test id {minter}: {e}"));
        *self.execute_result.lock() = address.abi_encode().into();
        self
    }

    /// Every read-only call returns `value` as an ABI-encoded `uint64`.
    pub fn returning_u64(self, value: u64) -> Self {
        *self.call_result.lock() = value.abi_encode().into();
        self
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().clone()
    }

    fn record(&self, call: Recorded) {
        self.calls.lock().push(call);
    }

    fn next_id(&self) -> EntityId {
        EntityId::new(0, 0, self.next_entity.fetch_add(1, Ordering::SeqCst))
    }

    fn receipt(&self) -> Receipt {
        Receipt::success(format!("0x{:064x}", self.calls.lock().len()))
    }

    fn account_op(&self, operation: &str) -> Result<Receipt, LedgerError> {
        if self.fail_account_ops {
            return Err(LedgerError::Status {
                operation: operation.to_string(),
                status: "INVALID_SIGNATURE".into(),
            });
        }
        Ok(self.receipt())
    }
}

#[async_trait]
impl Ledger for MockLedger {
    fn operator(&self) -> AccountId {
        self.operator
    }

    async fn create_token(&self, tx: &TokenCreate) -> Result<TokenId, LedgerError> {
        self.record(Recorded::CreateToken(tx.clone()));
        Ok(self.next_id())
    }

    async fn create_contract(&self, tx: &ContractCreate) -> Result<ContractId, LedgerError> {
        self.record(Recorded::CreateContract(tx.clone()));
        Ok(self.next_id())
    }

    async fn execute_contract(&self, tx: &ContractExecute) -> Result<ContractRecord, LedgerError> {
        self.record(Recorded::Execute(tx.clone()));
        Ok(ContractRecord {
            receipt: self.receipt(),
            result: self.execute_result.lock().clone(),
        })
    }

    async fn call_contract(&self, query: &ContractCall) -> Result<Bytes, LedgerError> {
        self.record(Recorded::Call(query.clone()));
        Ok(self.call_result.lock().clone())
    }

    async fn update_token(&self, tx: &TokenUpdate) -> Result<Receipt, LedgerError> {
        self.record(Recorded::UpdateToken(*tx));
        Ok(self.receipt())
    }

    async fn approve_hbar_allowance(
        &self,
        owner: AccountId,
        spender: AccountId,
        amount: Hbar,
    ) -> Result<Receipt, LedgerError> {
        self.record(Recorded::Allowance {
            owner,
            spender,
            amount,
        });
        self.account_op("hbarApprove")
    }

    async fn associate_token(
        &self,
        account: AccountId,
        token: TokenId,
    ) -> Result<Receipt, LedgerError> {
        self.record(Recorded::Associate { account, token });
        self.account_op("associateToken")
    }
}

/// Resolves long-zero addresses after a fixed number of misses.
pub struct MockLookup {
    misses: u32,
    pub seen: Mutex<Vec<String>>,
}

impl MockLookup {
    pub fn indexed() -> Self {
        Self::lagging(0)
    }

    pub fn lagging(misses: u32) -> Self {
        Self {
            misses,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ContractLookup for MockLookup {
    async fn lookup_contract(&self, id_or_address: &str) -> Result<ContractId, MirrorError> {
        let mut seen = self.seen.lock();
        seen.push(id_or_address.to_string());
        if seen.len() as u32 <= self.misses {
            return Err(MirrorError::NotFound(id_or_address.to_string()));
        }
        ContractId::from_solidity_address(id_or_address)
            .map_err(|e| MirrorError::Decode(e.to_string()))
    }

    async fn contract_result(&self, hash: &str) -> Result<ContractResult, MirrorError> {
        Err(MirrorError::NotFound(hash.to_string()))
    }
}
