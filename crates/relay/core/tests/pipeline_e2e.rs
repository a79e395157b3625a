//! Pipeline end-to-end over a recording transport.
//!
//! Runs the mock proof documents through every stage and checks what the
//! chain would actually receive.

use std::sync::Mutex;

use async_trait::async_trait;
use proof_relay_core::{
    BlockHash, CallDescription, ChainEvent, ChainTransport, ComposedCall, EventValue,
    InclusionStatus, ProofArtifact, ProofPipeline, RelayConfig, SignedTransaction,
    SigningIdentity, TransactionHash, TransportError, VerificationKey, VerificationOutcome,
};
use serde_json::{Value, json};
use tempfile::TempDir;

const BLOCK: [u8; 32] = [0x7e; 32];

/// Records the composed call and answers with a fixed block.
#[derive(Default)]
struct RecordingTransport {
    calls: Mutex<Vec<CallDescription>>,
    is_valid: bool,
}

#[async_trait]
impl ChainTransport for RecordingTransport {
    async fn derive_identity(&self, uri: &str) -> Result<SigningIdentity, TransportError> {
        Ok(SigningIdentity::new(uri, "5StubAddress"))
    }

    async fn compose_call(&self, call: &CallDescription) -> Result<ComposedCall, TransportError> {
        self.calls.lock().unwrap().push(call.clone());
        Ok(ComposedCall {
            description: call.clone(),
            call_data: vec![0x00],
        })
    }

    async fn sign(
        &self,
        call: ComposedCall,
        identity: &SigningIdentity,
    ) -> Result<SignedTransaction, TransportError> {
        Ok(SignedTransaction {
            hash: TransactionHash::from_bytes(vec![0x01; 32]),
            encoded: call.call_data,
            signer: identity.address().to_string(),
        })
    }

    async fn submit_and_watch(
        &self,
        _tx: &SignedTransaction,
    ) -> Result<InclusionStatus, TransportError> {
        Ok(InclusionStatus::Included {
            block_hash: BlockHash::from_bytes(BLOCK.to_vec()),
            extrinsic_index: Some(2),
        })
    }

    async fn fetch_block_events(
        &self,
        block: &BlockHash,
    ) -> Result<Vec<ChainEvent>, TransportError> {
        if block.as_bytes() != BLOCK {
            return Err(TransportError::BlockNotFound(block.clone()));
        }
        Ok(vec![
            ChainEvent::new("System", "ExtrinsicSuccess").with_extrinsic_index(0),
            ChainEvent::new("SettlementStwoPallet", "DebugParsing")
                .with_extrinsic_index(2)
                .with_field("parsed", EventValue::Bool(true)),
            ChainEvent::new("SettlementStwoPallet", "ProofVerified")
                .with_extrinsic_index(2)
                .with_field("is_valid", EventValue::Bool(self.is_valid)),
        ])
    }

    async fn health_check(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

fn write_documents(dir: &TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
    let proof = dir.path().join("proof.json");
    let vk = dir.path().join("verification_key.json");
    std::fs::write(
        &proof,
        serde_json::to_string_pretty(&ProofArtifact::mock()).unwrap(),
    )
    .unwrap();
    std::fs::write(
        &vk,
        serde_json::to_string_pretty(&VerificationKey::sample()).unwrap(),
    )
    .unwrap();
    (proof, vk)
}

fn decode_param(call: &CallDescription, name: &str) -> Value {
    let hex_value = call.param(name).expect("parameter present");
    assert_eq!(hex_value, hex_value.to_lowercase());
    assert!(!hex_value.starts_with("0x"));
    serde_json::from_slice(&hex::decode(hex_value).unwrap()).unwrap()
}

#[tokio::test]
async fn test_mock_proof_reaches_chain_intact() {
    let dir = TempDir::new().unwrap();
    let (proof_path, vk_path) = write_documents(&dir);

    let transport = RecordingTransport {
        is_valid: true,
        ..Default::default()
    };
    let pipeline = ProofPipeline::new(transport, RelayConfig::default());
    let report = pipeline
        .run(&proof_path, &vk_path, "//Alice", true)
        .await
        .unwrap();

    assert_eq!(report.receipt.block_hash.as_bytes(), BLOCK);
    assert_eq!(report.receipt.extrinsic_index, Some(2));
    let verification = report.verification.unwrap();
    assert_eq!(verification.outcome, VerificationOutcome::Valid);
    assert_eq!(verification.parsed, Some(true));

    let calls = pipeline.transport().calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(call.pallet, "SettlementStwoPallet");
    assert_eq!(call.function, "verify_proof");

    assert_eq!(
        decode_param(call, "proof"),
        json!({
            "commitments": ["0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef"],
            "decommitments": ["0xfedcba0987654321fedcba0987654321fedcba0987654321fedcba0987654321"],
            "fri_proof": {"layers": [1, 2, 3, 4, 5, 6]},
            "public_inputs": [3, 4, 5],
        })
    );
    assert_eq!(decode_param(call, "public_inputs"), json!([3, 4, 5]));
    assert_eq!(
        decode_param(call, "vk"),
        json!({
            "root": "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef",
            "params": {"alpha": 12345, "beta": 67890},
        })
    );
}

#[tokio::test]
async fn test_invalid_proof_is_reported_not_failed() {
    let dir = TempDir::new().unwrap();
    let (proof_path, vk_path) = write_documents(&dir);

    let pipeline = ProofPipeline::new(RecordingTransport::default(), RelayConfig::default());
    let report = pipeline
        .run(&proof_path, &vk_path, "//Alice", true)
        .await
        .unwrap();

    assert_eq!(
        report.verification.map(|v| v.outcome),
        Some(VerificationOutcome::Invalid)
    );
}

#[tokio::test]
async fn test_identical_inputs_give_identical_calls() {
    let dir = TempDir::new().unwrap();
    let (proof_path, vk_path) = write_documents(&dir);

    let pipeline = ProofPipeline::new(RecordingTransport::default(), RelayConfig::default());
    pipeline.run(&proof_path, &vk_path, "//Alice", false).await.unwrap();
    pipeline.run(&proof_path, &vk_path, "//Alice", false).await.unwrap();

    let calls = pipeline.transport().calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], calls[1]);
}
