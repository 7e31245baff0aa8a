use anyhow::{Context, Result, bail};
use kilo_ledger::{AccountId, Ledger, RoyaltyFee, TokenCreate, TokenId, TokenKeys};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Royalty amounts are expressed in basis points of this denominator.
pub const ROYALTY_DENOMINATOR: i64 = 10_000;

/// Royalty collectors a collection token may carry.
pub const MAX_ROYALTY_COLLECTORS: usize = 2;

/// One royalty collector and its share, in basis points (`"1000"` is 10%).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoyaltyShare {
    pub collector: String,
    pub amount: String,
}

/// Collection token settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    pub max_supply: i64,
    pub royalties: Vec<RoyaltyShare>,
    pub wipe_key: bool,
    pub fee_schedule_key: bool,
    pub memo: String,
}

impl TokenConfig {
    /// The KiloScribe collection: 3000 pieces, 10% royalty to each fee account.
    pub fn kiloscribe(fee_address: &str, fee_address_2: &str) -> Self {
        Self {
            name: "KiloScribe".into(),
            symbol: "KILO".into(),
            max_supply: 3000,
            royalties: vec![
                RoyaltyShare {
                    collector: fee_address.to_string(),
                    amount: "1000".into(),
                },
                RoyaltyShare {
                    collector: fee_address_2.to_string(),
                    amount: "1000".into(),
                },
            ],
            wipe_key: true,
            fee_schedule_key: true,
            memo: "KiloScribe NFT Collection".into(),
        }
    }

    /// Validate and build the token creation request with `treasury` as
    /// treasury.
    pub fn to_request(&self, treasury: AccountId) -> Result<TokenCreate> {
        if self.name.trim().is_empty() || self.symbol.trim().is_empty() {
            bail!("token name and symbol must not be empty");
        }
        if self.max_supply <= 0 {
            bail!("max supply must be positive, got {}", self.max_supply);
        }
        if self.royalties.len() > MAX_ROYALTY_COLLECTORS {
            bail!(
                "at most {MAX_ROYALTY_COLLECTORS} royalty collectors are supported, got {}",
                self.royalties.len()
            );
        }

        let royalty_fees = self
            .royalties
            .iter()
            .map(RoyaltyShare::to_fee)
            .collect::<Result<Vec<_>>>()?;

        Ok(TokenCreate {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            memo: self.memo.clone(),
            treasury,
            max_supply: self.max_supply,
            keys: TokenKeys {
                admin: true,
                supply: true,
                wipe: self.wipe_key,
                fee_schedule: self.fee_schedule_key,
            },
            royalty_fees,
        })
    }
}

impl RoyaltyShare {
    fn to_fee(&self) -> Result<RoyaltyFee> {
        let numerator: i64 = self
            .amount
            .trim()
            .parse()
            .with_context(|| format!("royalty amount {:?} is not a number", self.amount))?;
        if !(0..=ROYALTY_DENOMINATOR).contains(&numerator) {
            bail!("royalty amount {numerator} must be between 0 and {ROYALTY_DENOMINATOR}");
        }
        let collector: AccountId = self
            .collector
            .parse()
            .with_context(|| format!("royalty collector {:?}", self.collector))?;
        Ok(RoyaltyFee {
            numerator,
            denominator: ROYALTY_DENOMINATOR,
            collector,
        })
    }
}

/// Result of [`create_token`]. Both keys stay with the operator until the
/// supply key is handed to a minter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDeployment {
    pub token_id: TokenId,
    pub supply_key_holder: AccountId,
    pub admin_key_holder: AccountId,
}

/// Create the collection token with the operator as treasury, admin and
/// supply key holder.
pub async fn create_token<L: Ledger + ?Sized>(ledger: &L, config: &TokenConfig) -> Result<TokenDeployment> {
    let operator = ledger.operator();
    let request = config.to_request(operator)?;
    info!(
        name = %request.name,
        symbol = %request.symbol,
        max_supply = request.max_supply,
        operator = %operator,
        "creating token"
    );

    let token_id = ledger
        .create_token(&request)
        .await
        .with_context(|| format!("Failed to create token {}", request.symbol))?;
    info!(token = %token_id, "created token");

    Ok(TokenDeployment {
        token_id,
        supply_key_holder: operator,
        admin_key_holder: operator,
    })
}
