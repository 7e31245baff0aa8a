// Hedera ledger plumbing: ids, endpoints, artifacts, linking and the SDK boundary.

pub mod artifact;
pub mod entity;
pub mod hbar;
pub mod hts;
pub mod ledger;
pub mod linker;
pub mod mirror;
pub mod network;
pub mod relay;
pub mod retry;

// Re-export primary types for convenient access.
pub use artifact::{ContractArtifact, artifact_path};
pub use entity::{AccountId, ContractId, EntityId, EntityIdError, TokenId};
pub use hbar::Hbar;
pub use ledger::{
    ContractCall, ContractCreate, ContractExecute, ContractRecord, Ledger, LedgerError, Receipt,
    RoyaltyFee, TokenCreate, TokenKeys, TokenUpdate,
};
pub use linker::{LinkError, library_placeholder, link_libraries};
pub use mirror::{
    ContractLookup, ContractResult, MAX_LOOKUP_RETRIES, MirrorClient, MirrorError, bounded_lookup,
    poll_contract_result, resolve_created_contract, try_get_contract_id,
};
pub use network::{Endpoints, Network};
pub use relay::RelayLedger;
