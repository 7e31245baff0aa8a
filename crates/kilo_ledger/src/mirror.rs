//! Mirror node REST client.
//!
//! The mirror node is an eventually-consistent index of ledger state: a contract
//! created a moment ago may not be visible yet. Lookups that race a fresh write
//! go through [`bounded_lookup`], which retries a fixed number of times and
//! then reports absence instead of failing.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::entity::{ContractId, TokenId};
use crate::retry::retry_async;

/// Retries after the first attempt before a lookup gives up.
pub const MAX_LOOKUP_RETRIES: u32 = 3;

/// Attempts made when polling for a submitted transaction's result.
const RESULT_POLL_ATTEMPTS: usize = 6;
const RESULT_POLL_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    #[error("Mirror node request failed: {0}")]
    Request(String),

    #[error("Mirror node returned {status} for {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Not found on mirror node: {0}")]
    NotFound(String),

    #[error("Unexpected mirror node response: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// `GET /api/v1/contracts/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct ContractInfo {
    pub contract_id: Option<String>,
}

/// One entry of `/api/v1/contracts/{id}/results` or
/// `/api/v1/contracts/results/{hash}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractResult {
    #[serde(default)]
    pub contract_id: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub call_result: Option<String>,
    #[serde(default)]
    pub created_contract_ids: Vec<String>,
}

impl ContractResult {
    /// Whether the mirror recorded the execution as successful.
    pub fn succeeded(&self) -> bool {
        self.result.as_deref() == Some("SUCCESS")
    }

    /// Id of the contract a creation transaction deployed. Falls back to the
    /// result's `contract_id`, which for a creation is the new contract.
    pub fn created_contract(&self) -> Option<ContractId> {
        self.created_contract_ids
            .first()
            .or(self.contract_id.as_ref())
            .and_then(|id| id.parse().ok())
    }

    /// Decoded `call_result` bytes (empty when absent).
    pub fn call_result_bytes(&self) -> Result<Vec<u8>, MirrorError> {
        match self.call_result.as_deref() {
            None => Ok(Vec::new()),
            Some(raw) => hex::decode(raw.trim_start_matches("0x"))
                .map_err(|e| MirrorError::Decode(format!("call_result is not hex: {e}"))),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractResultsPage {
    #[serde(default)]
    pub results: Vec<ContractResult>,
}

/// `GET /api/v1/tokens/{id}` (fields used by token updates).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub memo: String,
}

// ---------------------------------------------------------------------------
// Bounded retry
// ---------------------------------------------------------------------------

/// Run `op` once, then retry up to [`MAX_LOOKUP_RETRIES`] times with no delay.
///
/// `op` receives the zero-based attempt number. Returns the first success, or
/// `None` once the cap is reached; failures are logged, never propagated.
pub async fn bounded_lookup<T, E, F, Fut>(what: &str, mut op: F) -> Option<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let mut attempt = 0;
    loop {
        match op(attempt).await {
            Ok(value) => return Some(value),
            Err(e) if attempt < MAX_LOOKUP_RETRIES => {
                debug!(attempt, error = %e, "retrying {what}");
                attempt += 1;
            }
            Err(e) => {
                warn!(attempts = attempt + 1, error = %e, "could not resolve {what}");
                return None;
            }
        }
    }
}

/// Mirror queries the deployment flow depends on.
#[async_trait]
pub trait ContractLookup: Send + Sync {
    /// Resolve a contract id from an id or EVM address.
    async fn lookup_contract(&self, id_or_address: &str) -> Result<ContractId, MirrorError>;

    /// The execution result of one transaction, by hash.
    async fn contract_result(&self, hash: &str) -> Result<ContractResult, MirrorError>;
}

/// Resolve a contract id (typically from a freshly created EVM address),
/// tolerating mirror lag. `None` means the contract was not found in time.
pub async fn try_get_contract_id<L>(lookup: &L, id_or_address: &str) -> Option<ContractId>
where
    L: ContractLookup + ?Sized,
{
    bounded_lookup(&format!("contract {id_or_address}"), |_| {
        lookup.lookup_contract(id_or_address)
    })
    .await
}

/// Poll for a transaction's execution result until the mirror has indexed it,
/// backing off between attempts.
pub async fn poll_contract_result<L>(lookup: &L, hash: &str) -> Result<ContractResult, MirrorError>
where
    L: ContractLookup + ?Sized,
{
    retry_async(
        |attempt| {
            debug!(attempt, hash, "polling contract result");
            lookup.contract_result(hash)
        },
        RESULT_POLL_ATTEMPTS,
        RESULT_POLL_DELAY,
    )
    .await
}

/// Id of the contract deployed by transaction `hash`.
///
/// Reads the transaction's contract result first, which waits out indexing
/// lag. If that names no contract, resolves `evm_address` with
/// [`try_get_contract_id`].
pub async fn resolve_created_contract<L>(lookup: &L, hash: &str, evm_address: &str) -> Option<ContractId>
where
    L: ContractLookup + ?Sized,
{
    match poll_contract_result(lookup, hash).await {
        Ok(result) => {
            if let Some(id) = result.created_contract() {
                debug!(hash, contract = %id, "created contract from transaction result");
                return Some(id);
            }
            debug!(hash, "transaction result names no created contract");
        }
        Err(e) => warn!(hash, error = %e, "no contract result for creation"),
    }
    try_get_contract_id(lookup, evm_address).await
}

// ---------------------------------------------------------------------------
// MirrorClient
// ---------------------------------------------------------------------------

/// Client for the mirror node REST API.
#[derive(Debug, Clone)]
pub struct MirrorClient {
    base_url: String,
    client: Client,
}

impl MirrorClient {
    /// Create a client for `base_url` (e.g. `https://testnet.mirrornode.hedera.com`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, MirrorError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MirrorError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { base_url, client })
    }

    /// Return the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn contract_url(&self, id_or_address: &str) -> String {
        format!("{}/api/v1/contracts/{id_or_address}", self.base_url)
    }

    pub fn contract_results_url(&self, contract_id: &str, limit: u32) -> String {
        format!(
            "{}/api/v1/contracts/{contract_id}/results?order=desc&limit={limit}",
            self.base_url
        )
    }

    pub fn contract_result_by_hash_url(&self, hash: &str) -> String {
        format!("{}/api/v1/contracts/results/{hash}", self.base_url)
    }

    pub fn token_url(&self, token_id: &TokenId) -> String {
        format!("{}/api/v1/tokens/{token_id}", self.base_url)
    }

    /// Fetch a contract by id or EVM address.
    pub async fn contract(&self, id_or_address: &str) -> Result<ContractInfo, MirrorError> {
        let url = self.contract_url(id_or_address);
        info!(url = %url, "trying contract url");
        self.get_json(&url).await
    }

    /// Most recent execution results for a contract, newest first.
    pub async fn contract_results(
        &self,
        contract_id: &str,
        limit: u32,
    ) -> Result<Vec<ContractResult>, MirrorError> {
        let url = self.contract_results_url(contract_id, limit);
        let page: ContractResultsPage = self.get_json(&url).await?;
        Ok(page.results)
    }

    /// The execution result of one transaction, by EVM transaction hash.
    pub async fn contract_result_by_hash(&self, hash: &str) -> Result<ContractResult, MirrorError> {
        let url = self.contract_result_by_hash_url(hash);
        self.get_json(&url).await
    }

    /// Poll for a transaction's execution result until the mirror has indexed it.
    pub async fn await_contract_result(&self, hash: &str) -> Result<ContractResult, MirrorError> {
        poll_contract_result(self, hash).await
    }

    pub async fn token(&self, token_id: &TokenId) -> Result<TokenInfo, MirrorError> {
        let url = self.token_url(token_id);
        self.get_json(&url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, MirrorError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MirrorError::Request(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(MirrorError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MirrorError::Status {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| MirrorError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ContractLookup for MirrorClient {
    async fn lookup_contract(&self, id_or_address: &str) -> Result<ContractId, MirrorError> {
        let info = self.contract(id_or_address).await?;
        let id = info
            .contract_id
            .ok_or_else(|| MirrorError::Decode("response has no contract_id".into()))?;
        id.parse()
            .map_err(|e| MirrorError::Decode(format!("bad contract_id {id:?}: {e}")))
    }

    async fn contract_result(&self, hash: &str) -> Result<ContractResult, MirrorError> {
        self.contract_result_by_hash(hash).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn client() -> MirrorClient {
        MirrorClient::new("https://testnet.mirrornode.hedera.com/", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn base_url_strips_trailing_slash() {
        assert_eq!(client().base_url(), "https://testnet.mirrornode.hedera.com");
    }

    #[test]
    fn builds_mirror_urls() {
        let mirror = client();
        assert_eq!(
            mirror.contract_url("0.0.1234"),
            "https://testnet.mirrornode.hedera.com/api/v1/contracts/0.0.1234"
        );
        assert_eq!(
            mirror.contract_results_url("0.0.1234", 10),
            "https://testnet.mirrornode.hedera.com/api/v1/contracts/0.0.1234/results?order=desc&limit=10"
        );
        assert_eq!(
            mirror.contract_result_by_hash_url("0xabc"),
            "https://testnet.mirrornode.hedera.com/api/v1/contracts/results/0xabc"
        );
        assert_eq!(
            mirror.token_url(&"0.0.77".parse().unwrap()),
            "https://testnet.mirrornode.hedera.com/api/v1/tokens/0.0.77"
        );
    }

    #[test]
    fn parses_contract_info() {
        let info: ContractInfo = serde_json::from_str(
            r#"{
                "admin_key": null,
                "auto_renew_account": null,
                "contract_id": "0.0.5501337",
                "evm_address": "0x8f1a3e2b5c7d9e0f1a2b3c4d5e6f708192a3b4c5",
                "memo": "",
                "bytecode": "0x6080"
            }"#,
        )
        .unwrap();
        assert_eq!(info.contract_id.as_deref(), Some("0.0.5501337"));
    }

    #[test]
    fn parses_results_page_newest_first() {
        let page: ContractResultsPage = serde_json::from_str(
            r#"{
                "results": [
                    { "hash": "0x02", "result": "CONTRACT_REVERT_EXECUTED",
                      "error_message": "0x08c379a0", "call_result": "0x" },
                    { "hash": "0x01", "result": "SUCCESS", "error_message": null }
                ],
                "links": { "next": null }
            }"#,
        )
        .unwrap();
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].error_message.as_deref(), Some("0x08c379a0"));
        assert!(!page.results[0].succeeded());
        assert!(page.results[1].succeeded());
    }

    #[test]
    fn empty_results_page_parses() {
        let page: ContractResultsPage = serde_json::from_str("{}").unwrap();
        assert!(page.results.is_empty());
    }

    #[test]
    fn call_result_bytes_decodes_hex() {
        let result = ContractResult {
            call_result: Some("0x0016".into()),
            ..Default::default()
        };
        assert_eq!(result.call_result_bytes().unwrap(), vec![0x00, 0x16]);
        assert!(ContractResult::default().call_result_bytes().unwrap().is_empty());

        let bad = ContractResult {
            call_result: Some("0xzz".into()),
            ..Default::default()
        };
        assert!(bad.call_result_bytes().is_err());
    }

    #[tokio::test]
    async fn bounded_lookup_returns_first_success() {
        for k in 0..=MAX_LOOKUP_RETRIES {
            let calls = AtomicU32::new(0);
            let found = bounded_lookup("test", |attempt| {
                calls.fetch_add(1, Ordering::Relaxed);
                async move {
                    if attempt < k { Err("not indexed yet") } else { Ok(attempt * 10) }
                }
            })
            .await;
            assert_eq!(found, Some(k * 10));
            assert_eq!(calls.load(Ordering::Relaxed), k + 1);
        }
    }

    #[tokio::test]
    async fn bounded_lookup_gives_up_with_absence() {
        let calls = AtomicU32::new(0);
        let found: Option<u32> = bounded_lookup("test", |_| {
            calls.fetch_add(1, Ordering::Relaxed);
            async { Err::<u32, _>("404") }
        })
        .await;
        assert_eq!(found, None);
        assert_eq!(calls.load(Ordering::Relaxed), MAX_LOOKUP_RETRIES + 1);
    }

    /// Answers `NotFound` a fixed number of times before each kind of
    /// query succeeds.
    struct LaggingMirror {
        misses: u32,
        result_misses: u32,
        result: ContractResult,
        seen: Mutex<Vec<String>>,
        polled: AtomicU32,
    }

    impl LaggingMirror {
        fn new(misses: u32, result_misses: u32, result: ContractResult) -> Self {
            Self {
                misses,
                result_misses,
                result,
                seen: Mutex::new(Vec::new()),
                polled: AtomicU32::new(0),
            }
        }

        fn lagging(misses: u32) -> Self {
            Self::new(misses, u32::MAX, ContractResult::default())
        }
    }

    #[async_trait]
    impl ContractLookup for LaggingMirror {
        async fn lookup_contract(&self, id: &str) -> Result<ContractId, MirrorError> {
            let mut seen = self.seen.lock();
            seen.push(id.to_string());
            if seen.len() as u32 <= self.misses {
                Err(MirrorError::NotFound(id.to_string()))
            } else {
                Ok(ContractId::new(0, 0, 9001))
            }
        }

        async fn contract_result(&self, hash: &str) -> Result<ContractResult, MirrorError> {
            let polled = self.polled.fetch_add(1, Ordering::Relaxed) + 1;
            if polled <= self.result_misses {
                Err(MirrorError::NotFound(hash.to_string()))
            } else {
                Ok(self.result.clone())
            }
        }
    }

    fn creation_result(created: &str) -> ContractResult {
        ContractResult {
            contract_id: Some(created.into()),
            result: Some("SUCCESS".into()),
            created_contract_ids: vec![created.into()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn try_get_contract_id_tolerates_lag() {
        let mirror = LaggingMirror::lagging(2);
        let id = try_get_contract_id(&mirror, "0xabc").await;
        assert_eq!(id, Some(ContractId::new(0, 0, 9001)));
        assert_eq!(*mirror.seen.lock(), vec!["0xabc".to_string(); 3]);
    }

    #[tokio::test]
    async fn try_get_contract_id_returns_none_when_never_indexed() {
        let mirror = LaggingMirror::lagging(u32::MAX);
        assert_eq!(try_get_contract_id(&mirror, "0xabc").await, None);
        assert_eq!(mirror.seen.lock().len(), 4);
    }

    #[test]
    fn created_contract_prefers_created_ids() {
        let result: ContractResult = serde_json::from_str(
            r#"{
                "contract_id": "0.0.500",
                "created_contract_ids": ["0.0.9002", "0.0.9003"],
                "result": "SUCCESS"
            }"#,
        )
        .unwrap();
        assert_eq!(result.created_contract(), Some(ContractId::new(0, 0, 9002)));

        let bare = ContractResult {
            contract_id: Some("0.0.9004".into()),
            ..Default::default()
        };
        assert_eq!(bare.created_contract(), Some(ContractId::new(0, 0, 9004)));
        assert_eq!(ContractResult::default().created_contract(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn contract_result_polling_backs_off_until_indexed() {
        let mirror = LaggingMirror::new(0, 3, creation_result("0.0.9002"));
        let started = tokio::time::Instant::now();

        let result = poll_contract_result(&mirror, "0xfeed").await.unwrap();
        assert!(result.succeeded());
        assert_eq!(mirror.polled.load(Ordering::Relaxed), 4);
        // 500 ms, then 1 s, then 2 s between attempts
        assert!(started.elapsed() >= Duration::from_millis(3500));
    }

    #[tokio::test(start_paused = true)]
    async fn contract_result_polling_gives_up() {
        let mirror = LaggingMirror::lagging(0);
        let err = poll_contract_result(&mirror, "0xfeed").await.unwrap_err();
        assert!(matches!(err, MirrorError::NotFound(_)));
        assert_eq!(mirror.polled.load(Ordering::Relaxed), RESULT_POLL_ATTEMPTS as u32);
    }

    #[tokio::test(start_paused = true)]
    async fn created_contract_survives_seconds_of_mirror_lag() {
        let mirror = LaggingMirror::new(u32::MAX, 3, creation_result("0.0.9002"));
        let id = resolve_created_contract(&mirror, "0xfeed", "0xabc").await;
        assert_eq!(id, Some(ContractId::new(0, 0, 9002)));
        assert!(mirror.seen.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn created_contract_falls_back_to_address_lookup() {
        let mirror = LaggingMirror::lagging(1);
        let id = resolve_created_contract(&mirror, "0xfeed", "0xabc").await;
        assert_eq!(id, Some(ContractId::new(0, 0, 9001)));
        assert_eq!(mirror.seen.lock().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn created_contract_is_absent_when_nothing_resolves() {
        let mirror = LaggingMirror::lagging(u32::MAX);
        assert_eq!(resolve_created_contract(&mirror, "0xfeed", "0xabc").await, None);
    }
}
