//! Payload encoding.
//!
//! Turns a proof artifact and verification key into the three byte buffers
//! the verification call takes. Encoding is canonical JSON: object keys
//! sorted at every level, no whitespace, integers in their exact decimal
//! digits. Encoding the same logical documents always yields the same bytes.
//!
//! The proof keeps every field of the producer's document. Only `transform`
//! drops fields, see [`NormalizedProof::trimmed`].

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::artifact::{FriProof, Integer, ProofArtifact, ProofEntry, VerificationKey};

/// Errors that can occur while encoding a payload.
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("Unsupported {field}[{index}] entry: expected bytes, string or number, got {found}")]
    UnsupportedEntry {
        field: &'static str,
        index: usize,
        found: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Proof with every commitment/decommitment in textual form.
///
/// This is the document the chain-side verifier decodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedProof {
    pub commitments: Vec<String>,
    pub decommitments: Vec<String>,
    pub fri_proof: FriProof,
    pub public_inputs: Vec<Integer>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl NormalizedProof {
    /// Normalize a producer artifact.
    ///
    /// Binary entries become lowercase hex without prefix; textual and
    /// numeric entries are stringified unchanged.
    pub fn from_artifact(proof: &ProofArtifact) -> Result<Self, EncodingError> {
        Ok(Self {
            commitments: normalize_entries("commitments", &proof.commitments)?,
            decommitments: normalize_entries("decommitments", &proof.decommitments)?,
            fri_proof: proof.fri_proof.clone(),
            public_inputs: proof.public_inputs.clone(),
            extra: proof.extra.clone(),
        })
    }

    /// The four required fields only, with `fri_proof` reduced to `layers`.
    pub fn trimmed(&self) -> Self {
        Self {
            commitments: self.commitments.clone(),
            decommitments: self.decommitments.clone(),
            fri_proof: self.fri_proof.layers_only(),
            public_inputs: self.public_inputs.clone(),
            extra: BTreeMap::new(),
        }
    }
}

/// Canonical byte buffers for one verification call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCallPayload {
    pub proof: Vec<u8>,
    pub public_inputs: Vec<u8>,
    pub verification_key: Vec<u8>,
}

impl EncodedCallPayload {
    pub fn proof_hex(&self) -> String {
        hex::encode(&self.proof)
    }

    pub fn public_inputs_hex(&self) -> String {
        hex::encode(&self.public_inputs)
    }

    pub fn verification_key_hex(&self) -> String {
        hex::encode(&self.verification_key)
    }

    /// Combined size of the three buffers in bytes.
    pub fn len(&self) -> usize {
        self.proof.len() + self.public_inputs.len() + self.verification_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Stateless payload encoder.
pub struct PayloadEncoder;

impl PayloadEncoder {
    /// Encode proof, public inputs and verification key.
    ///
    /// Public inputs are encoded on their own, independent of the proof body,
    /// because the call takes them as a separate parameter.
    pub fn encode(
        proof: &ProofArtifact,
        vk: &VerificationKey,
    ) -> Result<EncodedCallPayload, EncodingError> {
        let normalized = NormalizedProof::from_artifact(proof)?;

        let payload = EncodedCallPayload {
            proof: canonical_json(&normalized)?,
            public_inputs: canonical_json(&normalized.public_inputs)?,
            verification_key: canonical_json(vk)?,
        };

        tracing::debug!(
            "Encoded payload: proof={}B public_inputs={}B vk={}B",
            payload.proof.len(),
            payload.public_inputs.len(),
            payload.verification_key.len()
        );
        Ok(payload)
    }
}

/// Compact JSON with object keys sorted at every level.
fn canonical_json<T: Serialize>(value: &T) -> Result<Vec<u8>, EncodingError> {
    // `Value` objects are ordered maps
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_vec(&value)?)
}

fn normalize_entries(
    field: &'static str,
    entries: &[ProofEntry],
) -> Result<Vec<String>, EncodingError> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| match entry {
            ProofEntry::Bytes(bytes) => Ok(hex::encode(bytes)),
            ProofEntry::Text(text) => Ok(text.clone()),
            ProofEntry::Number(number) => Ok(number.to_string()),
            ProofEntry::Unsupported(value) => Err(EncodingError::UnsupportedEntry {
                field,
                index,
                found: value.to_string(),
            }),
        })
        .collect()
}
