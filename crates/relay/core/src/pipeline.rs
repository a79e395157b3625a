//! End-to-end submission pipeline.
//!
//! Composes the stages in order: load, encode, build, submit, extract. Each
//! stage runs exactly once per `run` and the first failure aborts the run
//! with an error naming the stage.

use std::path::Path;
use std::time::Duration;

use crate::artifact::{self, ArtifactError};
use crate::builder::{SigningError, TransactionBuilder};
use crate::config::RelayConfig;
use crate::coordinator::{SubmissionCoordinator, SubmissionError};
use crate::encoder::{EncodedCallPayload, EncodingError, PayloadEncoder};
use crate::extractor::{EventLookupError, ResultExtractor};
use crate::traits::ChainTransport;
use crate::types::{BlockHash, SubmissionReceipt, TransactionHash, VerificationReport};

/// Failure of one pipeline stage.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ArtifactError),

    #[error("Encoding failed: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Signing failed: {0}")]
    Signing(#[from] SigningError),

    #[error("Submission failed: {0}")]
    Submission(SubmissionError),

    /// Inclusion wait timed out; the transaction may still land.
    #[error(
        "Transaction {tx_hash} not included after {waited:?}; outcome unknown, do not resubmit blindly"
    )]
    OutcomeAmbiguous {
        tx_hash: TransactionHash,
        waited: Duration,
    },

    #[error("Event lookup failed: {0}")]
    EventLookup(#[from] EventLookupError),
}

impl From<SubmissionError> for PipelineError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::OutcomeUnknown { tx_hash, waited } => {
                PipelineError::OutcomeAmbiguous { tx_hash, waited }
            }
            other => PipelineError::Submission(other),
        }
    }
}

impl PipelineError {
    /// Name of the stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "validation",
            PipelineError::Encoding(_) => "encoding",
            PipelineError::Signing(_) => "signing",
            PipelineError::Submission(_) | PipelineError::OutcomeAmbiguous { .. } => "submission",
            PipelineError::EventLookup(_) => "event lookup",
        }
    }

    /// Whether rerunning the whole pipeline is safe and may succeed.
    ///
    /// Input errors won't fix themselves, and an ambiguous outcome must be
    /// resolved by checking the chain first.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::Submission(_) | PipelineError::EventLookup(_)
        )
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub receipt: SubmissionReceipt,

    /// Present when result checking was requested
    pub verification: Option<VerificationReport>,
}

/// Load both documents and encode them into call parameters.
///
/// Touches nothing but the two files, so callers can reject bad input
/// before connecting to a node.
pub fn prepare_payload(
    proof_path: &Path,
    vk_path: &Path,
) -> Result<EncodedCallPayload, PipelineError> {
    let (proof, vk) = artifact::load_artifacts(proof_path, vk_path)?;
    Ok(PayloadEncoder::encode(&proof, &vk)?)
}

/// Proof relay pipeline over a chain transport.
pub struct ProofPipeline<T: ChainTransport> {
    transport: T,
    builder: TransactionBuilder,
    coordinator: SubmissionCoordinator,
    extractor: ResultExtractor,
}

impl<T: ChainTransport> ProofPipeline<T> {
    pub fn new(transport: T, config: RelayConfig) -> Self {
        Self {
            builder: TransactionBuilder::from_config(&config),
            coordinator: SubmissionCoordinator::from_config(&config),
            extractor: ResultExtractor::from_config(&config),
            transport,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn builder(&self) -> &TransactionBuilder {
        &self.builder
    }

    pub fn coordinator(&self) -> &SubmissionCoordinator {
        &self.coordinator
    }

    pub fn extractor(&self) -> &ResultExtractor {
        &self.extractor
    }

    /// Run the full pipeline.
    ///
    /// With `check_result` the inclusion block's events are read back and
    /// returned in the report; otherwise the run ends at inclusion.
    pub async fn run(
        &self,
        proof_path: &Path,
        vk_path: &Path,
        signer_uri: &str,
        check_result: bool,
    ) -> Result<PipelineReport, PipelineError> {
        let payload = prepare_payload(proof_path, vk_path)?;
        self.submit_payload(&payload, signer_uri, check_result).await
    }

    /// Sign, submit and optionally check an already encoded payload.
    pub async fn submit_payload(
        &self,
        payload: &EncodedCallPayload,
        signer_uri: &str,
        check_result: bool,
    ) -> Result<PipelineReport, PipelineError> {
        let identity = self.builder.derive_identity(&self.transport, signer_uri).await?;
        let tx = self.builder.build(&self.transport, payload, &identity).await?;

        let receipt = self.coordinator.submit(&self.transport, &tx).await?;

        let verification = if check_result {
            Some(self.extractor.extract(&self.transport, &receipt).await?)
        } else {
            None
        };

        Ok(PipelineReport {
            receipt,
            verification,
        })
    }

    /// Read the outcome of a verification call already included in `block_hash`.
    pub async fn check_result(
        &self,
        block_hash: &BlockHash,
        extrinsic_index: Option<u32>,
    ) -> Result<VerificationReport, PipelineError> {
        Ok(self
            .extractor
            .extract_at(&self.transport, block_hash, extrinsic_index)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{ProofArtifact, VerificationKey};
    use crate::mock::{MockInclusion, MockTransport};
    use crate::types::{ChainEvent, EventValue, VerificationOutcome};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        proof: std::path::PathBuf,
        vk: std::path::PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let proof = dir.path().join("proof.json");
        let vk = dir.path().join("verification_key.json");
        std::fs::write(&proof, serde_json::to_vec(&ProofArtifact::mock()).unwrap()).unwrap();
        std::fs::write(&vk, serde_json::to_vec(&VerificationKey::sample()).unwrap()).unwrap();
        Fixture {
            _dir: dir,
            proof,
            vk,
        }
    }

    fn verified_block(valid: bool) -> (BlockHash, Vec<ChainEvent>) {
        let block = BlockHash::from_bytes(vec![0xbb; 32]);
        let events = vec![
            ChainEvent::new("SettlementStwoPallet", "DebugParsing")
                .with_extrinsic_index(1)
                .with_field("parsed", EventValue::Bool(true)),
            ChainEvent::new("SettlementStwoPallet", "ProofVerified")
                .with_extrinsic_index(1)
                .with_field("is_valid", EventValue::Bool(valid)),
        ];
        (block, events)
    }

    #[tokio::test]
    async fn test_run_with_result_check() {
        let fx = fixture();
        let (block, events) = verified_block(true);
        let transport = MockTransport::new().with_block_events(block.clone(), events);
        let pipeline = ProofPipeline::new(transport, RelayConfig::default());

        let report = pipeline.run(&fx.proof, &fx.vk, "//Alice", true).await.unwrap();

        assert_eq!(report.receipt.block_hash, block);
        let verification = report.verification.unwrap();
        assert_eq!(verification.outcome, VerificationOutcome::Valid);
        assert_eq!(verification.parsed, Some(true));
        assert_eq!(pipeline.transport().submitted().len(), 1);
    }

    #[tokio::test]
    async fn test_run_without_result_check_skips_events() {
        let fx = fixture();
        // No events registered: a lookup would fail
        let pipeline = ProofPipeline::new(MockTransport::new(), RelayConfig::default());

        let report = pipeline.run(&fx.proof, &fx.vk, "//Alice", false).await.unwrap();
        assert!(report.verification.is_none());
    }

    #[tokio::test]
    async fn test_invalid_document_stops_before_signing() {
        let fx = fixture();
        std::fs::write(&fx.proof, r#"{"commitments": []}"#).unwrap();
        let pipeline = ProofPipeline::new(MockTransport::new(), RelayConfig::default());

        let err = pipeline.run(&fx.proof, &fx.vk, "//Alice", true).await.unwrap_err();
        assert_eq!(err.stage(), "validation");
        assert!(!err.is_retryable());
        assert!(pipeline.transport().composed_calls().is_empty());
    }

    #[tokio::test]
    async fn test_bad_key_is_signing_failure() {
        let fx = fixture();
        let pipeline = ProofPipeline::new(MockTransport::new(), RelayConfig::default());

        let err = pipeline.run(&fx.proof, &fx.vk, "garbage", true).await.unwrap_err();
        assert!(matches!(err, PipelineError::Signing(SigningError::KeyDerivationFailed(_))));
        assert!(pipeline.transport().submitted().is_empty());
    }

    #[tokio::test]
    async fn test_rejection_is_retryable_submission_failure() {
        let fx = fixture();
        let transport =
            MockTransport::new().with_inclusion(MockInclusion::Rejected("Dropped".to_string()));
        let pipeline = ProofPipeline::new(transport, RelayConfig::default());

        let err = pipeline.run(&fx.proof, &fx.vk, "//Alice", true).await.unwrap_err();
        assert!(matches!(err, PipelineError::Submission(SubmissionError::Rejected { .. })));
        assert_eq!(err.stage(), "submission");
        assert!(err.is_retryable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_ambiguous_not_retryable() {
        let fx = fixture();
        let transport = MockTransport::new().with_inclusion(MockInclusion::Pending);
        let config = RelayConfig::default().with_inclusion_timeout(Duration::from_secs(5));
        let pipeline = ProofPipeline::new(transport, config);

        let err = pipeline.run(&fx.proof, &fx.vk, "//Alice", true).await.unwrap_err();
        match &err {
            PipelineError::OutcomeAmbiguous { waited, .. } => {
                assert_eq!(*waited, Duration::from_secs(5));
            }
            other => panic!("expected OutcomeAmbiguous, got {other:?}"),
        }
        assert_eq!(err.stage(), "submission");
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_missing_events_is_event_lookup_failure() {
        let fx = fixture();
        let transport = MockTransport::new().with_inclusion(MockInclusion::Included {
            block_hash: BlockHash::from_bytes(vec![0x42; 32]),
            extrinsic_index: None,
        });
        let pipeline = ProofPipeline::new(transport, RelayConfig::default());

        let err = pipeline.run(&fx.proof, &fx.vk, "//Alice", true).await.unwrap_err();
        assert_eq!(err.stage(), "event lookup");
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_check_result_for_known_block() {
        let (block, events) = verified_block(false);
        let transport = MockTransport::new().with_block_events(block.clone(), events);
        let pipeline = ProofPipeline::new(transport, RelayConfig::default());

        let report = pipeline.check_result(&block, Some(1)).await.unwrap();
        assert_eq!(report.outcome, VerificationOutcome::Invalid);
    }
}
