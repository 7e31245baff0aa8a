use std::fmt;
use std::str::FromStr;

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

/// Tinybars per HBAR.
pub const TINYBARS_PER_HBAR: i64 = 100_000_000;

/// The JSON-RPC relay denominates value in weibars (18 decimals), the native
/// ledger in tinybars (8 decimals).
const WEIBARS_PER_TINYBAR: u64 = 10_000_000_000;

/// An HBAR amount stored in tinybars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hbar(i64);

impl Hbar {
    pub const ZERO: Hbar = Hbar(0);

    pub const fn from_tinybars(tinybars: i64) -> Self {
        Self(tinybars)
    }

    /// Whole HBAR. Overflows for amounts beyond `i64::MAX` tinybars; use
    /// [`Hbar::checked_from_hbar`] for configured or user-supplied values.
    pub const fn from_hbar(hbar: i64) -> Self {
        Self(hbar * TINYBARS_PER_HBAR)
    }

    /// Whole HBAR, or `None` when the tinybar amount does not fit in an `i64`.
    pub const fn checked_from_hbar(hbar: i64) -> Option<Self> {
        match hbar.checked_mul(TINYBARS_PER_HBAR) {
            Some(tinybars) => Some(Self(tinybars)),
            None => None,
        }
    }

    pub const fn to_tinybars(self) -> i64 {
        self.0
    }

    /// Value for a relay transaction. Negative amounts map to zero.
    pub fn to_weibars(self) -> U256 {
        U256::from(self.0.max(0) as u64) * U256::from(WEIBARS_PER_TINYBAR)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Hbar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / TINYBARS_PER_HBAR as u64;
        let frac = abs % TINYBARS_PER_HBAR as u64;
        if frac == 0 {
            write!(f, "{sign}{whole} ℏ")
        } else {
            let frac = format!("{frac:08}");
            write!(f, "{sign}{whole}.{} ℏ", frac.trim_end_matches('0'))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid HBAR amount {0:?}")]
pub struct ParseHbarError(String);

impl FromStr for Hbar {
    type Err = ParseHbarError;

    /// Parses a decimal HBAR amount such as `1`, `0.5` or `12.00000001`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().trim_end_matches('ℏ').trim();
        let err = || ParseHbarError(s.to_string());

        let (negative, digits) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(err());
        }
        if frac.len() > 8 || !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
            return Err(err());
        }

        let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| err())? };
        let frac: i64 = if frac.is_empty() {
            0
        } else {
            format!("{frac:0<8}").parse().map_err(|_| err())?
        };
        let tinybars = whole
            .checked_mul(TINYBARS_PER_HBAR)
            .and_then(|t| t.checked_add(frac))
            .ok_or_else(err)?;
        Ok(Self(if negative { -tinybars } else { tinybars }))
    }
}
