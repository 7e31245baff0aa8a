use alloy::dyn_abi::{DynSolValue, JsonAbiExt};
use alloy::primitives::Selector;
use thiserror::Error;

use crate::registry::AbiRegistry;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("error data is not hex: {0}")]
    InvalidHex(String),

    #[error("failed to decode {signature}: {reason}")]
    Abi { signature: String, reason: String },
}

/// One decoded argument, with its value rendered as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedParam {
    pub name: String,
    pub ty: String,
    pub value: String,
}

/// Revert data matched against the registry. `name` is `None` when no known
/// error or function has the data's selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedError {
    pub name: Option<String>,
    pub params: Vec<DecodedParam>,
    /// The raw data, `0x`-prefixed.
    pub data: String,
    /// Canonical signature of the match, empty when unmatched.
    pub signature: String,
}

impl DecodedError {
    pub fn selector(&self) -> Option<Selector> {
        let raw = hex::decode(self.data.trim_start_matches("0x")).ok()?;
        (raw.len() >= 4).then(|| Selector::from_slice(&raw[..4]))
    }
}

impl AbiRegistry {
    /// Decode `0x`-prefixed (or bare) hex revert data.
    pub fn decode(&self, data: &str) -> Result<DecodedError, DecodeError> {
        let trimmed = data.trim();
        let raw = hex::decode(trimmed.trim_start_matches("0x"))
            .map_err(|_| DecodeError::InvalidHex(trimmed.to_string()))?;
        let data = format!("0x{}", hex::encode(&raw));

        let unmatched = |data: String| DecodedError {
            name: None,
            params: Vec::new(),
            data,
            signature: String::new(),
        };
        if raw.len() < 4 {
            return Ok(unmatched(data));
        }
        let Some(entry) = self.get(&Selector::from_slice(&raw[..4])) else {
            return Ok(unmatched(data));
        };

        let signature = entry.signature();
        let values = entry
            .abi_decode_input(&raw[4..])
            .map_err(|e| DecodeError::Abi {
                signature: signature.clone(),
                reason: e.to_string(),
            })?;

        let params = entry
            .inputs
            .iter()
            .zip(values.iter())
            .map(|(input, value)| DecodedParam {
                name: input.name.clone(),
                ty: input.selector_type().into_owned(),
                value: format_value(value),
            })
            .collect();

        Ok(DecodedError {
            name: Some(entry.name.clone()),
            params,
            data,
            signature,
        })
    }
}

/// Render a decoded value: addresses and byte strings as lowercase `0x` hex,
/// integers in decimal, arrays as `[a, b]` and tuples as `(a, b)`.
pub fn format_value(value: &DynSolValue) -> String {
    let join = |items: &[DynSolValue]| items.iter().map(format_value).collect::<Vec<_>>().join(", ");

    #[allow(unreachable_patterns)]
    match value {
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::Uint(u, _) => u.to_string(),
        DynSolValue::FixedBytes(word, size) => format!("0x{}", hex::encode(&word[..*size])),
        DynSolValue::Address(address) => format!("0x{}", hex::encode(address)),
        DynSolValue::Function(function) => format!("0x{}", hex::encode(function)),
        DynSolValue::Bytes(bytes) => format!("0x{}", hex::encode(bytes)),
        DynSolValue::String(s) => s.clone(),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => format!("[{}]", join(items)),
        DynSolValue::Tuple(items) => format!("({})", join(items)),
        other => format!("{other:?}"),
    }
}

/// Meaning of a `Panic(uint256)` code.
pub fn panic_reason(code: &str) -> Option<&'static str> {
    let reason = match code {
        "0" => "generic compiler panic",
        "1" => "assertion failed",
        "17" => "arithmetic overflow or underflow",
        "18" => "division or modulo by zero",
        "33" => "invalid enum value",
        "34" => "invalid storage byte array encoding",
        "49" => "pop on empty array",
        "50" => "array index out of bounds",
        "65" => "out of memory",
        "81" => "call to uninitialized function pointer",
        _ => return None,
    };
    Some(reason)
}
