//! External key tool integration.
//!
//! Key material is produced by a `subkey`-compatible program run as a
//! subprocess. Its JSON output mode is used so each key comes back as one
//! self-describing record.

use std::fmt;
use std::path::PathBuf;
use std::process::Output;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::config::SubstrateConfig;

/// Errors raised while running the key tool.
#[derive(Debug, thiserror::Error)]
pub enum KeyGenError {
    #[error("Failed to run key tool {}: {source}", tool.display())]
    Spawn {
        tool: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Key tool exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("Malformed key tool output: {0}")]
    MalformedOutput(String),

    #[error("Unknown key scheme: {0} (expected sr25519, ed25519 or ecdsa)")]
    UnknownScheme(String),
}

/// Signature scheme understood by the key tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyScheme {
    #[default]
    Sr25519,
    Ed25519,
    Ecdsa,
}

impl KeyScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyScheme::Sr25519 => "sr25519",
            KeyScheme::Ed25519 => "ed25519",
            KeyScheme::Ecdsa => "ecdsa",
        }
    }
}

impl fmt::Display for KeyScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyScheme {
    type Err = KeyGenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sr25519" => Ok(KeyScheme::Sr25519),
            "ed25519" => Ok(KeyScheme::Ed25519),
            "ecdsa" => Ok(KeyScheme::Ecdsa),
            other => Err(KeyGenError::UnknownScheme(other.to_string())),
        }
    }
}

/// One key as reported by the key tool.
///
/// `secret_phrase` holds the inspected URI when no mnemonic is involved.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_phrase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_seed: Option<String>,
    pub public_key: String,
    pub account_id: String,
    pub ss58_public_key: String,
    pub ss58_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
}

impl KeyRecord {
    /// Copy of this record with the secret fields removed.
    pub fn public_only(&self) -> Self {
        Self {
            secret_phrase: None,
            secret_seed: None,
            ..self.clone()
        }
    }
}

impl fmt::Debug for KeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRecord")
            .field("public_key", &self.public_key)
            .field("ss58_address", &self.ss58_address)
            .finish_non_exhaustive()
    }
}

/// libp2p node key.
#[derive(Clone, PartialEq, Eq)]
pub struct NodeKey {
    /// Hex-encoded ed25519 secret, as written to a node key file
    pub secret: String,
    pub peer_id: String,
}

impl fmt::Debug for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeKey")
            .field("peer_id", &self.peer_id)
            .finish_non_exhaustive()
    }
}

/// Runs the external key tool.
#[derive(Debug, Clone)]
pub struct KeyGenerator {
    tool: PathBuf,
}

impl KeyGenerator {
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        Self { tool: tool.into() }
    }

    pub fn from_config(config: &SubstrateConfig) -> Self {
        Self::new(&config.key_tool)
    }

    /// Generate a fresh random key.
    pub async fn generate(&self, scheme: KeyScheme) -> Result<KeyRecord, KeyGenError> {
        let output = self
            .run(&["key", "generate", "--scheme", scheme.as_str(), "--output-type", "json"])
            .await?;
        parse_key_record(&output.stdout)
    }

    /// Inspect a secret URI (mnemonic, seed or dev URI with derivation path).
    pub async fn inspect(&self, uri: &str, scheme: KeyScheme) -> Result<KeyRecord, KeyGenError> {
        let output = self
            .run(&["key", "inspect", uri, "--scheme", scheme.as_str(), "--output-type", "json"])
            .await?;
        parse_key_record(&output.stdout)
    }

    /// Generate a node key. The tool prints the secret on stdout and the
    /// peer id on stderr.
    pub async fn generate_node_key(&self) -> Result<NodeKey, KeyGenError> {
        let output = self.run(&["key", "generate-node-key"]).await?;
        parse_node_key(&output.stdout, &output.stderr)
    }

    async fn run(&self, args: &[&str]) -> Result<Output, KeyGenError> {
        // Never log args: inspect carries the secret URI
        let subcommand = args.get(..2).map(|a| a.join(" ")).unwrap_or_default();
        tracing::debug!("Running key tool {} {}", self.tool.display(), subcommand);

        let output = Command::new(&self.tool)
            .args(args)
            .output()
            .await
            .map_err(|source| KeyGenError::Spawn {
                tool: self.tool.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(KeyGenError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

/// Parse the tool's JSON record for a single key.
pub fn parse_key_record(stdout: &[u8]) -> Result<KeyRecord, KeyGenError> {
    serde_json::from_slice(stdout).map_err(|e| KeyGenError::MalformedOutput(e.to_string()))
}

fn parse_node_key(stdout: &[u8], stderr: &[u8]) -> Result<NodeKey, KeyGenError> {
    let secret = String::from_utf8_lossy(stdout).trim().to_string();
    if secret.is_empty() || hex::decode(&secret).is_err() {
        return Err(KeyGenError::MalformedOutput(
            "node key secret is not a hex string".to_string(),
        ));
    }

    let stderr = String::from_utf8_lossy(stderr);
    let peer_id = stderr
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .ok_or_else(|| KeyGenError::MalformedOutput("missing peer id".to_string()))?
        .to_string();

    Ok(NodeKey { secret, peer_id })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE_JSON: &str = r#"{
        "accountId": "0xd43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d",
        "networkId": "substrate",
        "publicKey": "0xd43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d",
        "secretPhrase": "//Alice",
        "secretSeed": "0xe5be9a5092b81bca64be81d212e7f2f9eba183bb7a90954f7b76361f6edb5c0a",
        "ss58Address": "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY",
        "ss58PublicKey": "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY"
    }"#;

    #[test]
    fn test_parse_key_record() {
        let record = parse_key_record(ALICE_JSON.as_bytes()).unwrap();
        assert_eq!(record.secret_phrase.as_deref(), Some("//Alice"));
        assert_eq!(
            record.ss58_public_key,
            "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY"
        );
        assert_eq!(record.network_id.as_deref(), Some("substrate"));
    }

    #[test]
    fn test_positional_text_output_is_malformed() {
        let text = "Secret phrase:       //Alice\n  Network ID:        substrate\n";
        assert!(matches!(
            parse_key_record(text.as_bytes()),
            Err(KeyGenError::MalformedOutput(_))
        ));
    }

    #[test]
    fn test_public_only_and_debug_hide_secrets() {
        let record = parse_key_record(ALICE_JSON.as_bytes()).unwrap();

        let public = record.public_only();
        assert!(public.secret_phrase.is_none());
        assert!(public.secret_seed.is_none());
        assert_eq!(public.ss58_address, record.ss58_address);

        let printed = format!("{:?}", record);
        assert!(!printed.contains("//Alice"));
        assert!(!printed.contains("e5be9a50"));
    }

    #[test]
    fn test_parse_node_key() {
        let key = parse_node_key(
            b"2a6f1e3c0e1a8d2f7f4e5d6c7b8a99001122334455667788990aabbccddeeff0\n",
            b"12D3KooWEyoppNCUx8Yx66oV9fJnriXwCcXwDDUA2kj6vnc6iDEp\n",
        )
        .unwrap();
        assert_eq!(key.peer_id, "12D3KooWEyoppNCUx8Yx66oV9fJnriXwCcXwDDUA2kj6vnc6iDEp");
        assert!(key.secret.starts_with("2a6f"));

        assert!(parse_node_key(b"not hex", b"12D3Koo").is_err());
        assert!(parse_node_key(b"00ff", b"  \n").is_err());
    }

    #[test]
    fn test_scheme_parse_and_display() {
        assert_eq!("SR25519".parse::<KeyScheme>().unwrap(), KeyScheme::Sr25519);
        assert_eq!(KeyScheme::Ecdsa.to_string(), "ecdsa");
        assert!("rsa".parse::<KeyScheme>().is_err());
    }

    #[tokio::test]
    async fn test_missing_tool_is_spawn_error() {
        let generator = KeyGenerator::new("/nonexistent/key-tool");
        let err = generator.generate(KeyScheme::Sr25519).await.unwrap_err();
        assert!(matches!(err, KeyGenError::Spawn { .. }));
    }
}
