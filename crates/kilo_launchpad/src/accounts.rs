use anyhow::{Context, Result};
use kilo_ledger::{AccountId, ContractId, Hbar, Ledger, Receipt, TokenId, TokenUpdate};
use tracing::{info, warn};

/// Hand the token's supply key and treasury to the minting contract.
pub async fn set_supply_key<L: Ledger + ?Sized>(
    ledger: &L,
    token: TokenId,
    minter: ContractId,
) -> Result<Receipt> {
    let receipt = ledger
        .update_token(&TokenUpdate {
            token,
            supply_key: Some(minter),
            treasury: Some(minter),
        })
        .await
        .with_context(|| format!("Failed to move supply key of {token} to {minter}"))?;
    info!(token = %token, minter = %minter, status = %receipt.status, "token update");
    Ok(receipt)
}

/// Approve an HBAR allowance. Failures are logged, not returned.
pub async fn allowance<L: Ledger + ?Sized>(
    ledger: &L,
    owner: AccountId,
    spender: AccountId,
    amount: Hbar,
) -> Option<Receipt> {
    match ledger.approve_hbar_allowance(owner, spender, amount).await {
        Ok(receipt) => {
            info!(owner = %owner, spender = %spender, amount = %amount, receipt = %receipt, "allowance approved");
            Some(receipt)
        }
        Err(e) => {
            warn!(owner = %owner, spender = %spender, error = %e, "failed to add allowance");
            None
        }
    }
}

/// Associate `token` with `account`. Failures are logged, not returned.
pub async fn associate<L: Ledger + ?Sized>(
    ledger: &L,
    account: AccountId,
    token: TokenId,
) -> Option<Receipt> {
    match ledger.associate_token(account, token).await {
        Ok(receipt) => {
            info!(account = %account, token = %token, receipt = %receipt, "token associated");
            Some(receipt)
        }
        Err(e) => {
            warn!(account = %account, token = %token, error = %e, "failed to associate");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockLedger, Recorded};

    #[tokio::test]
    async fn supply_key_and_treasury_move_together() {
        let ledger = MockLedger::new();
        let token = TokenId::new(0, 0, 77);
        let minter = ContractId::new(0, 0, 9001);

        let receipt = set_supply_key(&ledger, token, minter).await.unwrap();
        assert!(receipt.is_success());
        assert_eq!(
            ledger.calls(),
            vec![Recorded::UpdateToken(TokenUpdate {
                token,
                supply_key: Some(minter),
                treasury: Some(minter),
            })]
        );
    }

    #[tokio::test]
    async fn allowance_records_request() {
        let ledger = MockLedger::new();
        let owner = ledger.operator();
        let spender = AccountId::new(0, 0, 9001);

        assert!(allowance(&ledger, owner, spender, Hbar::from_hbar(5)).await.is_some());
        assert_eq!(
            ledger.calls(),
            vec![Recorded::Allowance {
                owner,
                spender,
                amount: Hbar::from_hbar(5),
            }]
        );
    }

    #[tokio::test]
    async fn account_failures_are_swallowed() {
        let ledger = MockLedger::failing_account_ops();
        let account = AccountId::new(0, 0, 4242);
        let token = TokenId::new(0, 0, 77);

        assert!(associate(&ledger, account, token).await.is_none());
        assert!(allowance(&ledger, account, account, Hbar::from_hbar(1)).await.is_none());
        assert_eq!(ledger.calls().len(), 2);
    }
}
