//! Substrate node configuration.

use std::env;

use proof_relay_core::BlockchainConfig;

/// Default local development node.
pub const DEFAULT_NODE_URL: &str = "ws://127.0.0.1:9944";
/// Default development signer.
pub const DEFAULT_SIGNER_URI: &str = "//Alice";
/// Default key tool binary, looked up on `PATH`.
pub const DEFAULT_KEY_TOOL: &str = "subkey";
/// Default SS58 address prefix of the settlement chain.
pub const DEFAULT_SS58_PREFIX: u16 = 251;
/// Largest prefix the SS58 format can carry (14 bits).
pub const MAX_SS58_PREFIX: u16 = 16_383;

/// Substrate-specific configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct SubstrateConfig {
    /// Node RPC endpoint
    pub node_url: String,

    /// Secret URI of the submitting account
    pub signer_uri: String,

    /// Path to the external key tool
    pub key_tool: String,

    /// SS58 prefix used when rendering account addresses
    pub ss58_prefix: u16,
}

impl SubstrateConfig {
    /// Create a configuration for the given node.
    pub fn new(node_url: impl Into<String>) -> Self {
        Self {
            node_url: node_url.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `RELAY_NODE_URL` - Node RPC endpoint (default: ws://127.0.0.1:9944)
    /// - `RELAY_SIGNER_URI` - Signer secret URI (default: //Alice)
    /// - `RELAY_KEY_TOOL` - Key tool binary (default: subkey)
    /// - `RELAY_SS58_PREFIX` - Address prefix (default: 251)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            node_url: env::var("RELAY_NODE_URL").unwrap_or(defaults.node_url),
            signer_uri: env::var("RELAY_SIGNER_URI").unwrap_or(defaults.signer_uri),
            key_tool: env::var("RELAY_KEY_TOOL").unwrap_or(defaults.key_tool),
            ss58_prefix: env::var("RELAY_SS58_PREFIX")
                .ok()
                .and_then(|s| s.parse::<u16>().ok())
                .unwrap_or(defaults.ss58_prefix),
        }
    }

    /// Set node URL.
    pub fn with_node_url(mut self, url: impl Into<String>) -> Self {
        self.node_url = url.into();
        self
    }

    /// Set signer URI.
    pub fn with_signer_uri(mut self, uri: impl Into<String>) -> Self {
        self.signer_uri = uri.into();
        self
    }

    /// Set key tool path.
    pub fn with_key_tool(mut self, path: impl Into<String>) -> Self {
        self.key_tool = path.into();
        self
    }

    /// Set SS58 address prefix.
    pub fn with_ss58_prefix(mut self, prefix: u16) -> Self {
        self.ss58_prefix = prefix;
        self
    }

    fn is_local(&self) -> bool {
        ["://127.0.0.1", "://localhost", "://[::1]"]
            .iter()
            .any(|host| self.node_url.contains(host))
    }
}

impl Default for SubstrateConfig {
    fn default() -> Self {
        Self {
            node_url: DEFAULT_NODE_URL.to_string(),
            signer_uri: DEFAULT_SIGNER_URI.to_string(),
            key_tool: DEFAULT_KEY_TOOL.to_string(),
            ss58_prefix: DEFAULT_SS58_PREFIX,
        }
    }
}

impl std::fmt::Debug for SubstrateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubstrateConfig")
            .field("node_url", &self.node_url)
            .field("signer_uri", &"<redacted>")
            .field("key_tool", &self.key_tool)
            .field("ss58_prefix", &self.ss58_prefix)
            .finish()
    }
}

impl BlockchainConfig for SubstrateConfig {
    fn network_name(&self) -> &str {
        if self.is_local() {
            "substrate-local"
        } else {
            "substrate-remote"
        }
    }

    fn rpc_url(&self) -> &str {
        &self.node_url
    }

    fn validate(&self) -> Result<(), String> {
        let url = &self.node_url;
        if !["ws://", "wss://", "http://", "https://"]
            .iter()
            .any(|scheme| url.starts_with(scheme))
        {
            return Err(format!("Invalid node URL format: {}", url));
        }

        if self.signer_uri.trim().is_empty() {
            return Err("Signer URI cannot be empty".to_string());
        }

        if self.key_tool.is_empty() {
            return Err("Key tool path cannot be empty".to_string());
        }

        if self.ss58_prefix > MAX_SS58_PREFIX {
            return Err(format!(
                "SS58 prefix {} exceeds {}",
                self.ss58_prefix, MAX_SS58_PREFIX
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid_local_node() {
        let config = SubstrateConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.network_name(), "substrate-local");
        assert_eq!(config.rpc_url(), "ws://127.0.0.1:9944");
    }

    #[test]
    fn test_rejects_bad_scheme() {
        let config = SubstrateConfig::new("tcp://node:9944");
        assert!(config.validate().unwrap_err().contains("tcp://node:9944"));
    }

    #[test]
    fn test_rejects_empty_signer() {
        let config = SubstrateConfig::default().with_signer_uri("  ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_remote_network_name() {
        let config = SubstrateConfig::new("wss://rpc.example.org:443");
        assert!(config.validate().is_ok());
        assert_eq!(config.network_name(), "substrate-remote");
    }

    #[test]
    fn test_ss58_prefix_range() {
        assert_eq!(SubstrateConfig::default().ss58_prefix, 251);
        assert!(
            SubstrateConfig::default()
                .with_ss58_prefix(MAX_SS58_PREFIX)
                .validate()
                .is_ok()
        );
        assert!(
            SubstrateConfig::default()
                .with_ss58_prefix(MAX_SS58_PREFIX + 1)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_debug_hides_signer() {
        let config = SubstrateConfig::default().with_signer_uri("//Secret");
        assert!(!format!("{:?}", config).contains("Secret"));
    }
}
