//! Chain transport abstraction.
//!
//! `ChainTransport` is Layer 0: pure chain operations with no knowledge of
//! proofs. The pipeline stages in this crate only talk to the chain through it.

use async_trait::async_trait;

use crate::types::{
    BlockHash, CallDescription, ChainEvent, ComposedCall, InclusionStatus, SignedTransaction,
    SigningIdentity,
};

// ============================================================================
// Error Types
// ============================================================================

/// Transport layer errors.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Unknown call {pallet}::{function}: {reason}")]
    UnknownCall {
        pallet: String,
        function: String,
        reason: String,
    },

    #[error("Block not found: {0}")]
    BlockNotFound(BlockHash),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Backend-specific error: {0}")]
    BackendError(String),
}

// ============================================================================
// Layer 0: Pure Infrastructure
// ============================================================================

/// Atomic chain primitives the relay pipeline is built from.
#[async_trait]
pub trait ChainTransport: Send + Sync {
    /// Derive a signing identity (and its public address) from a secret URI.
    async fn derive_identity(&self, uri: &str) -> Result<SigningIdentity, TransportError>;

    /// Resolve a call against the connected chain's metadata.
    async fn compose_call(&self, call: &CallDescription) -> Result<ComposedCall, TransportError>;

    /// Sign a composed call with the given identity.
    async fn sign(
        &self,
        call: ComposedCall,
        identity: &SigningIdentity,
    ) -> Result<SignedTransaction, TransportError>;

    /// Submit a signed transaction and follow it until it is in a block or
    /// can no longer be included. Never times out on its own.
    async fn submit_and_watch(
        &self,
        tx: &SignedTransaction,
    ) -> Result<InclusionStatus, TransportError>;

    /// Fetch all events emitted in a block, in emission order.
    async fn fetch_block_events(&self, block: &BlockHash) -> Result<Vec<ChainEvent>, TransportError>;

    /// Health check: verify connection to the chain.
    async fn health_check(&self) -> Result<(), TransportError>;
}
