//! Solidity library linking for unlinked creation bytecode.
//!
//! The compiler leaves a 40-character marker wherever a contract calls an
//! external library: `__$` + the first 34 hex characters of
//! `keccak256("<source path>:<library name>")` + `$__`. Linking replaces every
//! marker with the library's deployed address (20 bytes, lowercase hex).

use std::str::FromStr;

use alloy::primitives::{Address, keccak256};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("Unable to find placeholder for library {0}")]
    PlaceholderNotFound(String),

    #[error("invalid address {address:?} for library {library}")]
    InvalidAddress { library: String, address: String },
}

/// Placeholder the compiler emits for a fully-qualified library name
/// (`contracts/LaunchpadLib.sol:LaunchpadLib`).
pub fn library_placeholder(fully_qualified_name: &str) -> String {
    let hash = hex::encode(keccak256(fully_qualified_name.as_bytes()));
    format!("__${}$__", &hash[..34])
}

/// Replace each library's placeholder with its address.
///
/// Every occurrence is replaced. Fails if any named library has no placeholder
/// in `bytecode`, so relinking already-linked bytecode is an error rather than
/// a silent no-op.
pub fn link_libraries<N, A>(bytecode: &str, libraries: &[(N, A)]) -> Result<String, LinkError>
where
    N: AsRef<str>,
    A: AsRef<str>,
{
    let mut linked = bytecode.to_string();

    for (name, address) in libraries {
        let name = name.as_ref();
        let address = address.as_ref();
        let placeholder = library_placeholder(name);

        let parsed = Address::from_str(address.trim()).map_err(|_| LinkError::InvalidAddress {
            library: name.to_string(),
            address: address.to_string(),
        })?;

        if !linked.contains(&placeholder) {
            return Err(LinkError::PlaceholderNotFound(name.to_string()));
        }
        linked = linked.replace(&placeholder, &hex::encode(parsed));
    }

    Ok(linked)
}
