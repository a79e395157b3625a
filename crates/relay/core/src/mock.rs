//! Mock chain transport for testing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::{DEFAULT_CALL, DEFAULT_PALLET};
use crate::traits::{ChainTransport, TransportError};
use crate::types::{
    BlockHash, CallDescription, ChainEvent, ComposedCall, InclusionStatus, SignedTransaction,
    SigningIdentity, TransactionHash,
};

/// How the mock answers `submit_and_watch`.
#[derive(Debug, Clone)]
pub enum MockInclusion {
    Included {
        block_hash: BlockHash,
        extrinsic_index: Option<u32>,
    },
    Rejected(String),
    /// Connection dropped before a terminal status
    ConnectionLost,
    /// Never resolves
    Pending,
}

struct MockState {
    known_calls: Vec<(String, String)>,
    inclusion: MockInclusion,
    events: HashMap<BlockHash, Vec<ChainEvent>>,
    composed: Vec<CallDescription>,
    submitted: Vec<TransactionHash>,
    nonce: u64,
}

/// Mock transport for testing without a node.
///
/// Simulates chain operations in-memory.
#[derive(Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                known_calls: vec![(DEFAULT_PALLET.to_string(), DEFAULT_CALL.to_string())],
                inclusion: MockInclusion::Included {
                    block_hash: BlockHash::from_bytes(vec![0xbb; 32]),
                    extrinsic_index: Some(1),
                },
                events: HashMap::new(),
                composed: Vec::new(),
                submitted: Vec::new(),
                nonce: 0,
            })),
        }
    }

    pub fn with_inclusion(self, inclusion: MockInclusion) -> Self {
        self.state.lock().unwrap().inclusion = inclusion;
        self
    }

    pub fn with_block_events(self, block_hash: BlockHash, events: Vec<ChainEvent>) -> Self {
        self.state.lock().unwrap().events.insert(block_hash, events);
        self
    }

    pub fn composed_calls(&self) -> Vec<CallDescription> {
        self.state.lock().unwrap().composed.clone()
    }

    pub fn submitted(&self) -> Vec<TransactionHash> {
        self.state.lock().unwrap().submitted.clone()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainTransport for MockTransport {
    async fn derive_identity(&self, uri: &str) -> Result<SigningIdentity, TransportError> {
        let name = uri
            .strip_prefix("//")
            .filter(|n| !n.is_empty())
            .ok_or_else(|| TransportError::KeyDerivation(format!("invalid secret URI: {uri}")))?;
        Ok(SigningIdentity::new(uri, format!("5{}", name)))
    }

    async fn compose_call(&self, call: &CallDescription) -> Result<ComposedCall, TransportError> {
        let mut state = self.state.lock().unwrap();
        let known = state
            .known_calls
            .iter()
            .any(|(p, f)| *p == call.pallet && *f == call.function);
        if !known {
            return Err(TransportError::UnknownCall {
                pallet: call.pallet.clone(),
                function: call.function.clone(),
                reason: "not in metadata".to_string(),
            });
        }

        state.composed.push(call.clone());
        let call_data = call
            .params
            .iter()
            .flat_map(|p| p.value.as_bytes().to_vec())
            .collect();
        Ok(ComposedCall {
            description: call.clone(),
            call_data,
        })
    }

    async fn sign(
        &self,
        call: ComposedCall,
        identity: &SigningIdentity,
    ) -> Result<SignedTransaction, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.nonce += 1;
        Ok(SignedTransaction {
            hash: TransactionHash::from_bytes(state.nonce.to_le_bytes().to_vec()),
            encoded: call.call_data,
            signer: identity.address().to_string(),
        })
    }

    async fn submit_and_watch(
        &self,
        tx: &SignedTransaction,
    ) -> Result<InclusionStatus, TransportError> {
        let inclusion = {
            let mut state = self.state.lock().unwrap();
            state.submitted.push(tx.hash.clone());
            state.inclusion.clone()
        };

        match inclusion {
            MockInclusion::Included {
                block_hash,
                extrinsic_index,
            } => Ok(InclusionStatus::Included {
                block_hash,
                extrinsic_index,
            }),
            MockInclusion::Rejected(reason) => Ok(InclusionStatus::Rejected { reason }),
            MockInclusion::ConnectionLost => Err(TransportError::NetworkError(
                "connection closed".to_string(),
            )),
            MockInclusion::Pending => std::future::pending().await,
        }
    }

    async fn fetch_block_events(&self, block: &BlockHash) -> Result<Vec<ChainEvent>, TransportError> {
        self.state
            .lock()
            .unwrap()
            .events
            .get(block)
            .cloned()
            .ok_or_else(|| TransportError::BlockNotFound(block.clone()))
    }

    async fn health_check(&self) -> Result<(), TransportError> {
        Ok(())
    }
}
