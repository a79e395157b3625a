//! Submission and inclusion wait.
//!
//! The inclusion wait is the only suspension point of the pipeline. It is a
//! plain future bounded by a caller-supplied timeout, and it ends in one of
//! three states: included, rejected, or timed out. A timed-out transaction
//! may still land later, so that state is kept apart from rejection.

use std::time::Duration;

use crate::config::RelayConfig;
use crate::traits::{ChainTransport, TransportError};
use crate::types::{InclusionStatus, SignedTransaction, SubmissionReceipt, TransactionHash};

/// Errors that can occur while submitting a transaction.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Transaction {tx_hash} rejected before inclusion: {reason}")]
    Rejected {
        tx_hash: TransactionHash,
        reason: String,
    },

    #[error("Transport error: {0}")]
    TransportError(#[from] TransportError),

    #[error("Transaction {tx_hash} not included after {waited:?}; it may still be included")]
    OutcomeUnknown {
        tx_hash: TransactionHash,
        waited: Duration,
    },
}

impl SubmissionError {
    /// Whether a freshly built and signed transaction can be sent instead.
    ///
    /// False for an unknown outcome: the first transaction may still be included.
    pub fn is_resubmittable(&self) -> bool {
        !matches!(self, Self::OutcomeUnknown { .. })
    }
}

/// Terminal state of an inclusion wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InclusionOutcome {
    Included(SubmissionReceipt),
    Rejected {
        tx_hash: TransactionHash,
        reason: String,
    },
    TimedOut {
        tx_hash: TransactionHash,
        waited: Duration,
    },
}

/// Submits signed transactions and waits for block inclusion.
#[derive(Debug, Clone)]
pub struct SubmissionCoordinator {
    timeout: Duration,
}

impl SubmissionCoordinator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(config.inclusion_timeout)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Submit and wait until the transaction is in a block, is rejected, or
    /// the timeout elapses. Dropping the returned future abandons the wait.
    pub async fn wait_for_inclusion<T>(
        &self,
        transport: &T,
        tx: &SignedTransaction,
    ) -> Result<InclusionOutcome, TransportError>
    where
        T: ChainTransport + ?Sized,
    {
        tracing::info!("Submitting transaction {}...", tx.hash);

        match tokio::time::timeout(self.timeout, transport.submit_and_watch(tx)).await {
            Ok(Ok(InclusionStatus::Included {
                block_hash,
                extrinsic_index,
            })) => {
                tracing::info!("Transaction {} included in block {}", tx.hash, block_hash);
                Ok(InclusionOutcome::Included(SubmissionReceipt {
                    block_hash,
                    tx_hash: tx.hash.clone(),
                    extrinsic_index,
                }))
            }
            Ok(Ok(InclusionStatus::Rejected { reason })) => {
                tracing::warn!("Transaction {} rejected: {}", tx.hash, reason);
                Ok(InclusionOutcome::Rejected {
                    tx_hash: tx.hash.clone(),
                    reason,
                })
            }
            Ok(Err(e)) => Err(e),
            Err(_elapsed) => {
                tracing::warn!(
                    "Transaction {} not included within {:?}; outcome unknown",
                    tx.hash,
                    self.timeout
                );
                Ok(InclusionOutcome::TimedOut {
                    tx_hash: tx.hash.clone(),
                    waited: self.timeout,
                })
            }
        }
    }

    /// Submit and return a receipt once the transaction is in a block.
    pub async fn submit<T>(
        &self,
        transport: &T,
        tx: &SignedTransaction,
    ) -> Result<SubmissionReceipt, SubmissionError>
    where
        T: ChainTransport + ?Sized,
    {
        match self.wait_for_inclusion(transport, tx).await? {
            InclusionOutcome::Included(receipt) => Ok(receipt),
            InclusionOutcome::Rejected { tx_hash, reason } => {
                Err(SubmissionError::Rejected { tx_hash, reason })
            }
            InclusionOutcome::TimedOut { tx_hash, waited } => {
                Err(SubmissionError::OutcomeUnknown { tx_hash, waited })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockInclusion, MockTransport};
    use crate::types::BlockHash;

    fn signed_tx() -> SignedTransaction {
        SignedTransaction {
            hash: TransactionHash::from_bytes(vec![0x01; 32]),
            encoded: vec![0u8; 8],
            signer: "5Alice".to_string(),
        }
    }

    #[tokio::test]
    async fn test_included_yields_receipt() {
        let block = BlockHash::from_bytes(vec![0xcc; 32]);
        let transport = MockTransport::new().with_inclusion(MockInclusion::Included {
            block_hash: block.clone(),
            extrinsic_index: Some(2),
        });
        let coordinator = SubmissionCoordinator::new(Duration::from_secs(10));

        let receipt = coordinator.submit(&transport, &signed_tx()).await.unwrap();
        assert_eq!(receipt.block_hash, block);
        assert_eq!(receipt.tx_hash, signed_tx().hash);
        assert_eq!(receipt.extrinsic_index, Some(2));
    }

    #[tokio::test]
    async fn test_rejection_is_submission_error() {
        let transport = MockTransport::new()
            .with_inclusion(MockInclusion::Rejected("Invalid: bad signature".to_string()));
        let coordinator = SubmissionCoordinator::new(Duration::from_secs(10));

        let err = coordinator.submit(&transport, &signed_tx()).await.unwrap_err();
        assert!(matches!(err, SubmissionError::Rejected { ref reason, .. } if reason.contains("bad signature")));
        assert!(err.is_resubmittable());
    }

    #[tokio::test]
    async fn test_connection_loss_is_submission_error() {
        let transport = MockTransport::new().with_inclusion(MockInclusion::ConnectionLost);
        let coordinator = SubmissionCoordinator::new(Duration::from_secs(10));

        let err = coordinator.submit(&transport, &signed_tx()).await.unwrap_err();
        assert!(matches!(err, SubmissionError::TransportError(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_unknown_outcome() {
        let transport = MockTransport::new().with_inclusion(MockInclusion::Pending);
        let coordinator = SubmissionCoordinator::new(Duration::from_secs(30));

        let outcome = coordinator
            .wait_for_inclusion(&transport, &signed_tx())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            InclusionOutcome::TimedOut {
                tx_hash: signed_tx().hash,
                waited: Duration::from_secs(30),
            }
        );

        let err = coordinator.submit(&transport, &signed_tx()).await.unwrap_err();
        assert!(matches!(err, SubmissionError::OutcomeUnknown { .. }));
        assert!(!err.is_resubmittable());
        // The transaction did reach the transport both times
        assert_eq!(transport.submitted().len(), 2);
    }
}
