use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kilo_ledger::{AccountId, ContractId, Hbar, Network, TokenId};

/// Deploy the KiloScribe launchpad contracts to Hedera.
#[derive(Parser, Debug)]
#[command(name = "kilo-deploy", version, about)]
pub struct DeployCli {
    /// JSON config file (default: launchpad.json when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: DeployCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum DeployCommand {
    /// Token, library, factory and minter, then hand over the supply key and test mint
    All,

    /// Create the collection token
    Token,

    /// Deploy LaunchpadLib and the linked minter factory
    Factory,

    /// Create a minting contract through an existing factory
    Minter {
        #[arg(long)]
        factory: ContractId,
        #[arg(long)]
        token: TokenId,
    },

    /// Move a token's supply key and treasury to a minting contract
    SupplyKey {
        #[arg(long)]
        token: TokenId,
        #[arg(long)]
        minter: ContractId,
    },

    /// Enable minting and mint one piece
    TestMint {
        #[arg(long)]
        minter: ContractId,
        /// Defaults to TESTNET_LP_ADDRESS_1
        #[arg(long)]
        recipient: Option<AccountId>,
        /// Mint price in HBAR
        #[arg(long, default_value = "1")]
        price: Hbar,
    },

    /// Associate a token with an account
    Associate {
        #[arg(long)]
        account: AccountId,
        #[arg(long)]
        token: TokenId,
    },

    /// Approve an HBAR allowance from the operator (or --owner)
    Allowance {
        #[arg(long)]
        spender: AccountId,
        /// Amount in HBAR
        #[arg(long)]
        amount: Hbar,
        #[arg(long)]
        owner: Option<AccountId>,
    },
}

/// Decode the latest revert of a contract from the mirror node.
#[derive(Parser, Debug)]
#[command(
    name = "kilo-decode",
    version,
    about,
    after_help = "Example: kilo-decode testnet 0.0.1234567"
)]
pub struct DecodeCli {
    /// mainnet, testnet, previewnet or local
    pub network: Network,

    /// Contract id (shard.realm.num) or EVM address
    pub contract_id: String,

    /// JSON config file (default: launchpad.json when present)
    #[arg(long)]
    pub config: Option<PathBuf>,
}
