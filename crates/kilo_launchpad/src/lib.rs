// KiloScribe launchpad deployment: collection token, library + factory, per-collection minters.

pub mod accounts;
pub mod factory;
pub mod minter;
pub mod system;
pub mod token;

#[cfg(test)]
pub(crate) mod testing;

// Re-export primary types for convenient access.
pub use accounts::{allowance, associate, set_supply_key};
pub use factory::{FactoryDeployment, deploy_factory};
pub use minter::{MintCheck, MinterConfig, create_minter_contract, test_minting, tokens_remaining};
pub use system::{SystemDeployment, SystemPlan, deploy_full_system};
pub use token::{RoyaltyShare, TokenConfig, TokenDeployment, create_token};
