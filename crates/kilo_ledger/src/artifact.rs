use std::path::{Path, PathBuf};

use alloy::json_abi::JsonAbi;
use alloy::primitives::Bytes;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::debug;

/// Compiled contract artifact as written by the Hardhat build.
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub contract_name: String,
    pub abi: JsonAbi,
    /// Creation bytecode, hex, possibly containing library placeholders.
    pub bytecode: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    contract_name: Option<String>,
    abi: JsonAbi,
    #[serde(default)]
    bytecode: String,
}

/// `<artifacts>/contracts/<Name>.sol/<Name>.json`
pub fn artifact_path(artifacts_dir: &Path, contract_name: &str) -> PathBuf {
    artifacts_dir
        .join("contracts")
        .join(format!("{contract_name}.sol"))
        .join(format!("{contract_name}.json"))
}

impl ContractArtifact {
    /// Load the artifact for `contract_name` from a Hardhat artifacts directory.
    pub fn load(artifacts_dir: &Path, contract_name: &str) -> Result<Self> {
        let path = artifact_path(artifacts_dir, contract_name);
        let content = std::fs::read_to_string(&path).with_context(|| {
            format!(
                "Failed to load artifact for {contract_name}: cannot read {}",
                path.display()
            )
        })?;
        let raw: RawArtifact = serde_json::from_str(&content).with_context(|| {
            format!("Failed to load artifact for {contract_name}: invalid JSON in {}", path.display())
        })?;
        debug!(
            contract = contract_name,
            bytecode_len = raw.bytecode.len(),
            "loaded artifact"
        );
        Ok(Self {
            contract_name: raw.contract_name.unwrap_or_else(|| contract_name.to_string()),
            abi: raw.abi,
            bytecode: raw.bytecode,
        })
    }

    /// Whether the bytecode still contains library placeholders.
    pub fn needs_linking(&self) -> bool {
        self.bytecode.contains("__$")
    }

    /// Decode the creation bytecode. Fails if placeholders are left unresolved.
    pub fn bytecode_bytes(&self) -> Result<Bytes> {
        decode_bytecode(&self.contract_name, &self.bytecode)
    }
}

/// Decode hex creation bytecode (with or without `0x`) for submission.
pub fn decode_bytecode(contract_name: &str, bytecode: &str) -> Result<Bytes> {
    if bytecode.contains("__$") {
        bail!("{contract_name} bytecode has an unlinked library placeholder");
    }
    let trimmed = bytecode.trim().trim_start_matches("0x");
    if trimmed.is_empty() {
        bail!("{contract_name} artifact has no bytecode (abstract contract or interface?)");
    }
    let bytes = hex::decode(trimmed)
        .with_context(|| format!("{contract_name} bytecode is not valid hex"))?;
    Ok(Bytes::from(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_artifact(dir: &Path, name: &str, body: &str) {
        let path = artifact_path(dir, name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    #[test]
    fn path_follows_hardhat_layout() {
        let path = artifact_path(Path::new("artifacts"), "LaunchpadLib");
        assert_eq!(
            path,
            PathBuf::from("artifacts/contracts/LaunchpadLib.sol/LaunchpadLib.json")
        );
    }

    #[test]
    fn loads_abi_and_bytecode() {
        let tmp = tempfile::tempdir().unwrap();
        write_artifact(
            tmp.path(),
            "KiloScribeMinter",
            r#"{
                "_format": "hh-sol-artifact-1",
                "contractName": "KiloScribeMinter",
                "sourceName": "contracts/KiloScribeMinter.sol",
                "abi": [
                    { "type": "error", "name": "MintDisabled", "inputs": [] },
                    { "type": "function", "name": "tokensRemaining", "inputs": [],
                      "outputs": [{ "name": "", "type": "uint64" }], "stateMutability": "view" }
                ],
                "bytecode": "0x6080",
                "deployedBytecode": "0x6080",
                "linkReferences": {},
                "deployedLinkReferences": {}
            }"#,
        );

        let artifact = ContractArtifact::load(tmp.path(), "KiloScribeMinter").unwrap();
        assert_eq!(artifact.contract_name, "KiloScribeMinter");
        assert_eq!(artifact.abi.errors().count(), 1);
        assert_eq!(artifact.abi.functions().count(), 1);
        assert!(!artifact.needs_linking());
        assert_eq!(artifact.bytecode_bytes().unwrap().as_ref(), &[0x60, 0x80]);
    }

    #[test]
    fn missing_artifact_names_contract() {
        let tmp = tempfile::tempdir().unwrap();
        let err = ContractArtifact::load(tmp.path(), "LaunchpadLib").unwrap_err();
        assert!(err.to_string().contains("Failed to load artifact for LaunchpadLib"));
    }

    #[test]
    fn unlinked_bytecode_cannot_be_decoded() {
        let err = decode_bytecode("Factory", "0x60__$0123456789abcdef0123456789abcdef01$__").unwrap_err();
        assert!(err.to_string().contains("unlinked library placeholder"));
    }

    #[test]
    fn empty_bytecode_is_rejected() {
        assert!(decode_bytecode("IMinter", "0x").is_err());
    }
}
