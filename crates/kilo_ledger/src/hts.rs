//! Hedera Token Service (0x167) and account service (0x16a) system contracts,
//! as called through the JSON-RPC relay.

use alloy::primitives::{Address, Bytes, U256, address};
use alloy::sol;
use alloy::sol_types::{SolCall, SolValue};

use crate::entity::{AccountId, ContractId};
use crate::ledger::{LedgerError, TokenCreate, TokenKeys};

pub const TOKEN_SERVICE: Address = address!("0000000000000000000000000000000000000167");
pub const ACCOUNT_SERVICE: Address = address!("000000000000000000000000000000000000016a");

/// Ledger response code for success.
pub const SUCCESS: i64 = 22;

/// Key type bits.
pub const KEY_ADMIN: u64 = 1;
pub const KEY_WIPE: u64 = 8;
pub const KEY_SUPPLY: u64 = 16;
pub const KEY_FEE_SCHEDULE: u64 = 32;

/// 90 days, the minimum auto-renew period.
const AUTO_RENEW_PERIOD_SECS: i64 = 7_776_000;

sol! {
    struct KeyValue {
        bool inheritAccountKey;
        address contractId;
        bytes ed25519;
        bytes ECDSA_secp256k1;
        address delegatableContractId;
    }

    struct TokenKey {
        uint256 keyType;
        KeyValue key;
    }

    struct Expiry {
        int64 second;
        address autoRenewAccount;
        int64 autoRenewPeriod;
    }

    struct HederaToken {
        string name;
        string symbol;
        address treasury;
        string memo;
        bool tokenSupplyType;
        int64 maxSupply;
        bool freezeDefault;
        TokenKey[] tokenKeys;
        Expiry expiry;
    }

    struct FixedFee {
        int64 amount;
        address tokenId;
        bool useHbarsForPayment;
        bool useCurrentTokenForPayment;
        address feeCollector;
    }

    struct RoyaltyFee {
        int64 numerator;
        int64 denominator;
        int64 amount;
        address tokenId;
        bool useHbarsForPayment;
        address feeCollector;
    }

    interface IHederaTokenService {
        function createNonFungibleToken(HederaToken memory token)
            external payable returns (int64 responseCode, address tokenAddress);

        function createNonFungibleTokenWithCustomFees(
            HederaToken memory token,
            FixedFee[] memory fixedFees,
            RoyaltyFee[] memory royaltyFees
        ) external payable returns (int64 responseCode, address tokenAddress);

        function associateToken(address account, address token) external returns (int64 responseCode);

        function updateTokenKeys(address token, TokenKey[] memory keys) external returns (int64 responseCode);

        function updateTokenInfo(address token, HederaToken memory tokenInfo) external returns (int64 responseCode);
    }

    interface IHederaAccountService {
        function hbarApprove(address owner, address spender, int256 amount) external returns (int64 responseCode);
    }
}

/// Human-readable name for the response codes this tooling runs into.
pub fn response_status(code: i64) -> String {
    match code {
        7 => "INVALID_SIGNATURE".into(),
        10 => "INSUFFICIENT_PAYER_BALANCE".into(),
        22 => "SUCCESS".into(),
        33 => "CONTRACT_REVERT_EXECUTED".into(),
        184 => "TOKEN_NOT_ASSOCIATED_TO_ACCOUNT".into(),
        194 => "TOKEN_ALREADY_ASSOCIATED_TO_ACCOUNT".into(),
        other => format!("RESPONSE_CODE_{other}"),
    }
}

pub fn check_response(operation: &str, code: i64) -> Result<(), LedgerError> {
    if code == SUCCESS {
        Ok(())
    } else {
        Err(LedgerError::Status {
            operation: operation.to_string(),
            status: response_status(code),
        })
    }
}

pub(crate) fn solidity(id: &AccountId) -> Result<Address, LedgerError> {
    id.to_solidity_address()
        .map_err(|e| LedgerError::Invalid(e.to_string()))
}

fn empty_key() -> KeyValue {
    KeyValue {
        inheritAccountKey: false,
        contractId: Address::ZERO,
        ed25519: Bytes::new(),
        ECDSA_secp256k1: Bytes::new(),
        delegatableContractId: Address::ZERO,
    }
}

/// Key held by a compressed secp256k1 public key.
pub fn ecdsa_key(compressed_public_key: &[u8]) -> KeyValue {
    KeyValue {
        ECDSA_secp256k1: Bytes::copy_from_slice(compressed_public_key),
        ..empty_key()
    }
}

/// Key satisfied when the given contract is the caller.
pub fn contract_key(contract: Address) -> KeyValue {
    KeyValue {
        contractId: contract,
        ..empty_key()
    }
}

/// One `TokenKey` entry per enabled key, each held by the operator.
pub fn operator_token_keys(keys: &TokenKeys, operator_public_key: &[u8]) -> Vec<TokenKey> {
    [
        (keys.admin, KEY_ADMIN),
        (keys.supply, KEY_SUPPLY),
        (keys.wipe, KEY_WIPE),
        (keys.fee_schedule, KEY_FEE_SCHEDULE),
    ]
    .into_iter()
    .filter(|(enabled, _)| *enabled)
    .map(|(_, bit)| TokenKey {
        keyType: U256::from(bit),
        key: ecdsa_key(operator_public_key),
    })
    .collect()
}

fn hedera_token(tx: &TokenCreate, operator_public_key: &[u8]) -> Result<HederaToken, LedgerError> {
    let treasury = solidity(&tx.treasury)?;
    Ok(HederaToken {
        name: tx.name.clone(),
        symbol: tx.symbol.clone(),
        treasury,
        memo: tx.memo.clone(),
        tokenSupplyType: true,
        maxSupply: tx.max_supply,
        freezeDefault: false,
        tokenKeys: operator_token_keys(&tx.keys, operator_public_key),
        expiry: Expiry {
            second: 0,
            autoRenewAccount: treasury,
            autoRenewPeriod: AUTO_RENEW_PERIOD_SECS,
        },
    })
}

/// Encode the token creation call. Royalties select the custom-fee variant.
pub fn encode_create_token(tx: &TokenCreate, operator_public_key: &[u8]) -> Result<Bytes, LedgerError> {
    let token = hedera_token(tx, operator_public_key)?;
    if tx.royalty_fees.is_empty() {
        return Ok(IHederaTokenService::createNonFungibleTokenCall { token }
            .abi_encode()
            .into());
    }

    let royalty_fees = tx
        .royalty_fees
        .iter()
        .map(|fee| {
            Ok(RoyaltyFee {
                numerator: fee.numerator,
                denominator: fee.denominator,
                amount: 0,
                tokenId: Address::ZERO,
                useHbarsForPayment: false,
                feeCollector: solidity(&fee.collector)?,
            })
        })
        .collect::<Result<Vec<_>, LedgerError>>()?;

    Ok(IHederaTokenService::createNonFungibleTokenWithCustomFeesCall {
        token,
        fixedFees: Vec::new(),
        royaltyFees: royalty_fees,
    }
    .abi_encode()
    .into())
}

/// Decode `(int64 responseCode, address tokenAddress)`.
pub fn decode_create_token(data: &[u8]) -> Result<(i64, Address), LedgerError> {
    <(i64, Address)>::abi_decode_params(data)
        .map_err(|e| LedgerError::Invalid(format!("malformed createNonFungibleToken result: {e}")))
}

/// Decode a bare `int64 responseCode`.
pub fn decode_response_code(data: &[u8]) -> Result<i64, LedgerError> {
    <(i64,)>::abi_decode_params(data)
        .map(|(code,)| code)
        .map_err(|e| LedgerError::Invalid(format!("malformed response code: {e}")))
}

pub fn encode_associate(account: &AccountId, token: &AccountId) -> Result<Bytes, LedgerError> {
    Ok(IHederaTokenService::associateTokenCall {
        account: solidity(account)?,
        token: solidity(token)?,
    }
    .abi_encode()
    .into())
}

pub fn encode_supply_key_update(token: &AccountId, contract: &ContractId) -> Result<Bytes, LedgerError> {
    Ok(IHederaTokenService::updateTokenKeysCall {
        token: solidity(token)?,
        keys: vec![TokenKey {
            keyType: U256::from(KEY_SUPPLY),
            key: contract_key(solidity(contract)?),
        }],
    }
    .abi_encode()
    .into())
}

/// Treasury change. The name, symbol and memo must be restated or they are
/// cleared; keys and expiry left empty are not modified.
pub fn encode_treasury_update(
    token: &AccountId,
    treasury: &AccountId,
    name: &str,
    symbol: &str,
    memo: &str,
) -> Result<Bytes, LedgerError> {
    Ok(IHederaTokenService::updateTokenInfoCall {
        token: solidity(token)?,
        tokenInfo: HederaToken {
            name: name.to_string(),
            symbol: symbol.to_string(),
            treasury: solidity(treasury)?,
            memo: memo.to_string(),
            tokenSupplyType: true,
            maxSupply: 0,
            freezeDefault: false,
            tokenKeys: Vec::new(),
            expiry: Expiry {
                second: 0,
                autoRenewAccount: Address::ZERO,
                autoRenewPeriod: 0,
            },
        },
    }
    .abi_encode()
    .into())
}

pub fn encode_hbar_approve(owner: &AccountId, spender: &AccountId, tinybars: i64) -> Result<Bytes, LedgerError> {
    Ok(IHederaAccountService::hbarApproveCall {
        owner: solidity(owner)?,
        spender: solidity(spender)?,
        amount: alloy::primitives::I256::try_from(tinybars)
            .map_err(|e| LedgerError::Invalid(format!("allowance out of range: {e}")))?,
    }
    .abi_encode()
    .into())
}
