//! Relay configuration.

use std::env;
use std::time::Duration;

/// Default pallet hosting the proof-verification call.
pub const DEFAULT_PALLET: &str = "SettlementStwoPallet";
/// Default proof-verification function.
pub const DEFAULT_CALL: &str = "verify_proof";
/// Event signalling verification completion (`is_valid: bool`).
pub const DEFAULT_COMPLETION_EVENT: &str = "ProofVerified";
/// Event signalling whether the proof bytes could be parsed (`parsed: bool`).
pub const DEFAULT_PARSING_EVENT: &str = "DebugParsing";

const DEFAULT_INCLUSION_TIMEOUT: Duration = Duration::from_secs(120);

/// Chain-specific connection configuration.
///
/// This is a trait to allow different chains to provide their own config types.
pub trait BlockchainConfig: Send + Sync {
    /// Human-readable network name (e.g., "substrate-local")
    fn network_name(&self) -> &str;

    /// RPC endpoint URL
    fn rpc_url(&self) -> &str;

    /// Validate configuration (e.g., URL scheme, credentials present)
    fn validate(&self) -> Result<(), String>;
}

/// Names and limits the pipeline stages work with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Pallet exposing the verification call and emitting its events
    pub pallet: String,

    /// Verification function name
    pub call: String,

    /// Completion event variant
    pub completion_event: String,

    /// Parsing-diagnostic event variant
    pub parsing_event: String,

    /// How long to wait for block inclusion before reporting an unknown outcome
    pub inclusion_timeout: Duration,
}

impl RelayConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `RELAY_PALLET` - Pallet name (default: SettlementStwoPallet)
    /// - `RELAY_CALL` - Call name (default: verify_proof)
    /// - `RELAY_COMPLETION_EVENT` - Completion event (default: ProofVerified)
    /// - `RELAY_PARSING_EVENT` - Parsing-diagnostic event (default: DebugParsing)
    /// - `RELAY_INCLUSION_TIMEOUT_SECS` - Inclusion wait limit (default: 120)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(pallet) = env::var("RELAY_PALLET") {
            config.pallet = pallet;
        }
        if let Ok(call) = env::var("RELAY_CALL") {
            config.call = call;
        }
        if let Ok(event) = env::var("RELAY_COMPLETION_EVENT") {
            config.completion_event = event;
        }
        if let Ok(event) = env::var("RELAY_PARSING_EVENT") {
            config.parsing_event = event;
        }
        if let Some(secs) = read_env::<u64>("RELAY_INCLUSION_TIMEOUT_SECS") {
            config.inclusion_timeout = Duration::from_secs(secs.max(1));
        }

        config
    }

    /// Set pallet name.
    pub fn with_pallet(mut self, pallet: impl Into<String>) -> Self {
        self.pallet = pallet.into();
        self
    }

    /// Set inclusion timeout.
    pub fn with_inclusion_timeout(mut self, timeout: Duration) -> Self {
        self.inclusion_timeout = timeout;
        self
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            pallet: DEFAULT_PALLET.to_string(),
            call: DEFAULT_CALL.to_string(),
            completion_event: DEFAULT_COMPLETION_EVENT.to_string(),
            parsing_event: DEFAULT_PARSING_EVENT.to_string(),
            inclusion_timeout: DEFAULT_INCLUSION_TIMEOUT,
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
