//! Proof and verification-key documents.
//!
//! Both documents are JSON files. Proof documents are checked against a fixed
//! field set before any typed parsing so that every missing field is reported
//! in one error instead of the first one serde trips over.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{self, DeserializeOwned, Deserializer, Unexpected};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Top-level fields every proof document must carry.
pub const REQUIRED_PROOF_FIELDS: [&str; 4] =
    ["commitments", "decommitments", "fri_proof", "public_inputs"];

/// Top-level fields every verification-key document must carry.
pub const REQUIRED_VK_FIELDS: [&str; 2] = ["root", "params"];

const FRI_LAYERS_FIELD: &str = "fri_proof.layers";

/// Errors raised while loading or validating artifact documents.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed document {}: {reason}", path.display())]
    MalformedDocument { path: PathBuf, reason: String },

    #[error("Missing required {document} fields: {}", fields.join(", "))]
    MissingField {
        document: &'static str,
        fields: Vec<String>,
    },

    #[error("Invalid FRI proof format: `fri_proof` must be an object with a `layers` field")]
    InvalidFriProof,
}

// ============================================================================
// Documents
// ============================================================================

/// A commitment or decommitment entry as found in the producer's document.
///
/// Producers emit either raw bytes (a JSON array of byte values) or an
/// already textual form. The variant is resolved once, at encode time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProofEntry {
    /// Binary data, rendered as lowercase hex without prefix
    Bytes(Vec<u8>),

    /// Textual data, passed through unchanged
    Text(String),

    /// Numeric data, passed through in its decimal form
    Number(Number),

    /// Any other shape; rejected by the encoder
    Unsupported(Value),
}

impl From<Value> for ProofEntry {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            Value::Number(number) => Self::Number(number),
            Value::Array(items) => {
                let bytes: Option<Vec<u8>> = items
                    .iter()
                    .map(|item| item.as_u64().and_then(|n| u8::try_from(n).ok()))
                    .collect();
                match bytes {
                    Some(bytes) => Self::Bytes(bytes),
                    None => Self::Unsupported(Value::Array(items)),
                }
            }
            other => Self::Unsupported(other),
        }
    }
}

impl<'de> Deserialize<'de> for ProofEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from)
    }
}

/// A JSON integer of any magnitude, kept with its exact decimal digits.
///
/// Public inputs are usually field elements wider than 64 bits, so they are
/// never narrowed to a machine integer. Fractions and exponents are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Number", into = "Number")]
pub struct Integer(Number);

impl Integer {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<u64> for Integer {
    fn from(value: u64) -> Self {
        Self(Number::from(value))
    }
}

impl TryFrom<Number> for Integer {
    type Error = String;

    fn try_from(number: Number) -> Result<Self, Self::Error> {
        let digits = number.as_str();
        let digits = digits.strip_prefix('-').unwrap_or(digits);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(number))
        } else {
            Err(format!("expected an integer, got {}", number))
        }
    }
}

impl From<Integer> for Number {
    fn from(value: Integer) -> Self {
        value.0
    }
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inner FRI proof structure.
///
/// Fields other than `layers` are kept so the submitted proof carries the
/// producer's document unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FriProof {
    pub layers: Vec<Integer>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl FriProof {
    pub fn new(layers: impl IntoIterator<Item = u64>) -> Self {
        Self {
            layers: layers.into_iter().map(Integer::from).collect(),
            extra: BTreeMap::new(),
        }
    }

    /// The same proof with only `layers` left.
    pub fn layers_only(&self) -> Self {
        Self {
            layers: self.layers.clone(),
            extra: BTreeMap::new(),
        }
    }
}

impl<'de> Deserialize<'de> for FriProof {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = object_fields(Value::deserialize(deserializer)?, "a FRI proof object")?;
        Ok(Self {
            layers: take_field(&mut fields, "layers")?,
            extra: fields.into_iter().collect(),
        })
    }
}

/// Proof artifact produced by the proving toolchain.
///
/// Unknown top-level fields are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProofArtifact {
    pub commitments: Vec<ProofEntry>,
    pub decommitments: Vec<ProofEntry>,
    pub fri_proof: FriProof,
    pub public_inputs: Vec<Integer>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ProofArtifact {
    /// Mock proof used for local testing against a development chain.
    pub fn mock() -> Self {
        Self {
            commitments: vec![ProofEntry::Text(
                "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef".to_string(),
            )],
            decommitments: vec![ProofEntry::Text(
                "0xfedcba0987654321fedcba0987654321fedcba0987654321fedcba0987654321".to_string(),
            )],
            fri_proof: FriProof::new([1, 2, 3, 4, 5, 6]),
            public_inputs: [3, 4, 5].into_iter().map(Integer::from).collect(),
            extra: BTreeMap::new(),
        }
    }
}

impl<'de> Deserialize<'de> for ProofArtifact {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = object_fields(Value::deserialize(deserializer)?, "a proof object")?;
        Ok(Self {
            commitments: take_field(&mut fields, "commitments")?,
            decommitments: take_field(&mut fields, "decommitments")?,
            fri_proof: take_field(&mut fields, "fri_proof")?,
            public_inputs: take_field(&mut fields, "public_inputs")?,
            extra: fields.into_iter().collect(),
        })
    }
}

/// Verification key document.
///
/// Opaque to the relay: only the presence of `root` and `params` is checked.
/// Unknown top-level fields are kept so re-encoding preserves them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationKey {
    pub root: Value,
    pub params: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl<'de> Deserialize<'de> for VerificationKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = object_fields(Value::deserialize(deserializer)?, "a key object")?;
        Ok(Self {
            root: take_field(&mut fields, "root")?,
            params: take_field(&mut fields, "params")?,
            extra: fields.into_iter().collect(),
        })
    }
}

impl VerificationKey {
    /// Sample key matching [`ProofArtifact::mock`].
    pub fn sample() -> Self {
        let params = BTreeMap::from([
            ("alpha".to_string(), Value::from(12345u64)),
            ("beta".to_string(), Value::from(67890u64)),
        ]);
        Self {
            root: Value::from(
                "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef",
            ),
            params,
            extra: BTreeMap::new(),
        }
    }
}

// Documents are split by hand rather than with `#[serde(flatten)]`: flatten
// buffers through serde's content tree, which cannot hold 128-bit integers.
fn object_fields<E: de::Error>(
    value: Value,
    expected: &'static str,
) -> Result<Map<String, Value>, E> {
    match value {
        Value::Object(fields) => Ok(fields),
        other => Err(E::invalid_type(unexpected(&other), &expected)),
    }
}

fn take_field<T: DeserializeOwned, E: de::Error>(
    fields: &mut Map<String, Value>,
    name: &'static str,
) -> Result<T, E> {
    let value = fields.remove(name).ok_or_else(|| E::missing_field(name))?;
    serde_json::from_value(value).map_err(|e| E::custom(format!("{}: {}", name, e)))
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(_) => Unexpected::Other("number"),
        Value::String(s) => Unexpected::Str(s),
        Value::Array(_) => Unexpected::Seq,
        Value::Object(_) => Unexpected::Map,
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load and validate a proof document.
pub fn load_proof(path: &Path) -> Result<ProofArtifact, ArtifactError> {
    let document = read_document(path)?;
    validate_proof_document(&document)?;
    let proof = serde_json::from_value(document).map_err(|e| malformed(path, e))?;

    tracing::debug!("Loaded proof document from {}", path.display());
    Ok(proof)
}

/// Load and validate a verification-key document.
pub fn load_verification_key(path: &Path) -> Result<VerificationKey, ArtifactError> {
    let document = read_document(path)?;
    validate_vk_document(&document)?;
    let vk = serde_json::from_value(document).map_err(|e| malformed(path, e))?;

    tracing::debug!("Loaded verification key from {}", path.display());
    Ok(vk)
}

/// Load both documents a submission needs. The proof is validated first.
pub fn load_artifacts(
    proof_path: &Path,
    vk_path: &Path,
) -> Result<(ProofArtifact, VerificationKey), ArtifactError> {
    let proof = load_proof(proof_path)?;
    let vk = load_verification_key(vk_path)?;

    tracing::info!(
        "Loaded proof ({} commitments, {} FRI layers, {} public inputs) and verification key",
        proof.commitments.len(),
        proof.fri_proof.layers.len(),
        proof.public_inputs.len()
    );
    Ok((proof, vk))
}

/// Check a parsed proof document against the required field set.
///
/// All absent top-level fields are reported together. `fri_proof` must be an
/// object containing `layers`.
pub fn validate_proof_document(document: &Value) -> Result<(), ArtifactError> {
    let object = document
        .as_object()
        .ok_or_else(|| ArtifactError::MissingField {
            document: "proof",
            fields: REQUIRED_PROOF_FIELDS.iter().map(|f| f.to_string()).collect(),
        })?;

    let mut missing: Vec<String> = REQUIRED_PROOF_FIELDS
        .iter()
        .filter(|field| !object.contains_key(**field))
        .map(|field| field.to_string())
        .collect();

    let fri_proof = object.get("fri_proof");
    if let Some(fri) = fri_proof.and_then(Value::as_object)
        && !fri.contains_key("layers")
    {
        missing.push(FRI_LAYERS_FIELD.to_string());
    }

    if !missing.is_empty() {
        return Err(ArtifactError::MissingField {
            document: "proof",
            fields: missing,
        });
    }

    match fri_proof {
        Some(Value::Object(_)) => Ok(()),
        _ => Err(ArtifactError::InvalidFriProof),
    }
}

/// Check a parsed verification-key document for `root` and `params`.
pub fn validate_vk_document(document: &Value) -> Result<(), ArtifactError> {
    let missing: Vec<String> = REQUIRED_VK_FIELDS
        .iter()
        .filter(|field| document.get(**field).is_none())
        .map(|field| field.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ArtifactError::MissingField {
            document: "verification key",
            fields: missing,
        })
    }
}

fn read_document(path: &Path) -> Result<Value, ArtifactError> {
    if !path.is_file() {
        return Err(ArtifactError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|e| malformed(path, e))
}

fn malformed(path: &Path, err: serde_json::Error) -> ArtifactError {
    ArtifactError::MalformedDocument {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
