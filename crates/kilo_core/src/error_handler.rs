use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating launchpad configuration.
#[derive(Error, Debug)]
pub enum LaunchpadError {
    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Error classification for anyhow::Error (message-pattern based)
// ---------------------------------------------------------------------------

/// Error severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    /// Non-critical, log only.
    Low,
    /// Operator can fix and rerun.
    Medium,
    /// Operation failed on chain.
    High,
    /// Funds or keys may be at risk.
    Critical,
}

/// Fine-grained error category derived from message patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassifiedCategory {
    Network,
    Signature,
    Balance,
    Revert,
    Association,
    Configuration,
    Artifact,
    Internal,
}

/// Classified error with context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedError {
    pub severity: ErrorSeverity,
    pub category: ClassifiedCategory,
    pub message: String,
    pub user_message: String,
    pub recoverable: bool,
}

/// Classify an `anyhow::Error` by looking for Hedera status codes and
/// transport failures in its message chain.
pub fn classify_error(error: &anyhow::Error) -> ClassifiedError {
    let full = format!("{error:#}");
    let msg = full.to_lowercase();

    let (category, severity, user_msg) = if msg.contains("insufficient_payer_balance")
        || msg.contains("insufficient funds")
    {
        (
            ClassifiedCategory::Balance,
            ErrorSeverity::High,
            "Operator account cannot pay for the transaction. Top it up and retry.",
        )
    } else if msg.contains("invalid_signature") || msg.contains("invalid signature") {
        (
            ClassifiedCategory::Signature,
            ErrorSeverity::Critical,
            "Signature rejected. Check that the operator key matches the operator id.",
        )
    } else if msg.contains("contract_revert_executed") || msg.contains("reverted") {
        (
            ClassifiedCategory::Revert,
            ErrorSeverity::High,
            "Contract reverted. Run kilo-decode against the contract for details.",
        )
    } else if msg.contains("token_already_associated") {
        (
            ClassifiedCategory::Association,
            ErrorSeverity::Low,
            "Token is already associated with the account.",
        )
    } else if msg.contains("timeout") || msg.contains("timed out") || msg.contains("connection") || msg.contains("dns") {
        (
            ClassifiedCategory::Network,
            ErrorSeverity::Medium,
            "Network error. Check the relay and mirror endpoints.",
        )
    } else if msg.contains("artifact") || msg.contains("placeholder") {
        (
            ClassifiedCategory::Artifact,
            ErrorSeverity::Medium,
            "Contract artifacts are missing or unlinked. Rebuild the contracts.",
        )
    } else if msg.contains("config") || msg.contains("is not set") {
        (
            ClassifiedCategory::Configuration,
            ErrorSeverity::Medium,
            "Configuration error. Check your .env file.",
        )
    } else {
        (
            ClassifiedCategory::Internal,
            ErrorSeverity::Medium,
            "An unexpected error occurred.",
        )
    };

    ClassifiedError {
        severity,
        category,
        message: full,
        user_message: user_msg.to_string(),
        recoverable: severity != ErrorSeverity::Critical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, anyhow};

    #[test]
    fn test_config_error_classifies_as_configuration() {
        let err = anyhow::Error::from(LaunchpadError::Config("HEDERAS_OPERATOR_ID is not set".into()));
        let classified = classify_error(&err);
        assert_eq!(classified.category, ClassifiedCategory::Configuration);
        assert_eq!(classified.user_message, "Configuration error. Check your .env file.");
        assert!(classified.message.starts_with("Configuration error: HEDERAS_OPERATOR_ID"));
    }

    #[test]
    fn test_classify_insufficient_balance() {
        let err = anyhow!("receipt for transaction failed with status INSUFFICIENT_PAYER_BALANCE");
        let classified = classify_error(&err);
        assert_eq!(classified.category, ClassifiedCategory::Balance);
        assert_eq!(classified.severity, ErrorSeverity::High);
        assert!(classified.recoverable);
    }

    #[test]
    fn test_classify_invalid_signature_is_not_recoverable() {
        let err = anyhow!("INVALID_SIGNATURE");
        let classified = classify_error(&err);
        assert_eq!(classified.category, ClassifiedCategory::Signature);
        assert!(!classified.recoverable);
    }

    #[test]
    fn test_classify_revert() {
        let err = anyhow!("transaction 0xabc reverted");
        assert_eq!(classify_error(&err).category, ClassifiedCategory::Revert);
    }

    #[test]
    fn test_classify_already_associated() {
        let err = anyhow!("HTS responded TOKEN_ALREADY_ASSOCIATED_TO_ACCOUNT");
        let classified = classify_error(&err);
        assert_eq!(classified.category, ClassifiedCategory::Association);
        assert_eq!(classified.severity, ErrorSeverity::Low);
    }

    #[test]
    fn test_classify_network_timeout() {
        let err = anyhow!("operation timed out");
        assert_eq!(classify_error(&err).category, ClassifiedCategory::Network);
    }

    #[test]
    fn test_classify_reads_context_chain() {
        let err: anyhow::Result<()> = Err(anyhow!("connection refused"));
        let err = err.context("deploying factory").unwrap_err();
        let classified = classify_error(&err);
        assert_eq!(classified.category, ClassifiedCategory::Network);
        assert!(classified.message.contains("deploying factory"));
    }

    #[test]
    fn test_classify_missing_placeholder() {
        let err = anyhow!("Unable to find placeholder for library contracts/LaunchpadLib.sol:LaunchpadLib");
        assert_eq!(classify_error(&err).category, ClassifiedCategory::Artifact);
    }

    #[test]
    fn test_classify_missing_env() {
        let err = anyhow!("FEE_ADDRESS is not set");
        assert_eq!(
            classify_error(&err).category,
            ClassifiedCategory::Configuration
        );
    }

    #[test]
    fn test_classify_internal_fallback() {
        let err = anyhow!("something totally unexpected happened");
        let classified = classify_error(&err);
        assert_eq!(classified.category, ClassifiedCategory::Internal);
        assert_eq!(classified.user_message, "An unexpected error occurred.");
    }
}
