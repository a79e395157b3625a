//! Common types for chain interactions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// Identifiers
// ============================================================================

/// Hash of a block produced by the chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockHash(pub Vec<u8>);

impl BlockHash {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl FromStr for BlockHash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_str = s.strip_prefix("0x").unwrap_or(s);
        hex::decode(hex_str).map(Self)
    }
}

/// Hash of a signed transaction (extrinsic).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionHash(pub Vec<u8>);

impl TransactionHash {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for TransactionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

// ============================================================================
// Signing
// ============================================================================

/// Key-derivation input plus the address derived from it.
///
/// Lives for one pipeline run and is never written anywhere. The secret URI
/// is kept out of `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningIdentity {
    uri: String,
    address: String,
}

impl SigningIdentity {
    pub fn new(uri: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            address: address.into(),
        }
    }

    /// Secret URI the keypair is derived from (e.g. `//Alice`).
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Public address (SS58 for Substrate chains).
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("uri", &"<redacted>")
            .field("address", &self.address)
            .finish()
    }
}

// ============================================================================
// Calls and Transactions
// ============================================================================

/// One named call parameter, carried as a hex string (no `0x` prefix).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallParam {
    pub name: String,
    pub value: String,
}

/// Chain call description: pallet, function and ordered parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallDescription {
    pub pallet: String,
    pub function: String,
    pub params: Vec<CallParam>,
}

impl CallDescription {
    /// Look up a parameter's hex value by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }
}

/// A call resolved against the connected chain.
#[derive(Debug, Clone)]
pub struct ComposedCall {
    /// What was asked for
    pub description: CallDescription,

    /// Encoded call data as the chain expects it
    pub call_data: Vec<u8>,
}

/// Signed, submittable transaction.
///
/// Bound to the signer's account nonce at signing time, so it must not be
/// resubmitted after an ambiguous outcome.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub hash: TransactionHash,
    pub encoded: Vec<u8>,
    pub signer: String,
}

/// Terminal transport status of a watched transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InclusionStatus {
    /// Transaction is part of a produced block
    Included {
        block_hash: BlockHash,
        extrinsic_index: Option<u32>,
    },

    /// Transaction will never be included in its current form
    Rejected { reason: String },
}

/// Proof that a transaction landed in a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub block_hash: BlockHash,
    pub tx_hash: TransactionHash,

    /// Position of the transaction inside the block, when the transport knows it
    pub extrinsic_index: Option<u32>,
}

// ============================================================================
// Events
// ============================================================================

/// Decoded value of an event field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventValue {
    Bool(bool),
    Uint(u128),
    Text(String),
    /// Anything else, rendered for diagnostics
    Other(String),
}

impl EventValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            EventValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// A single event field; `name` is `None` for tuple-style events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventField {
    pub name: Option<String>,
    pub value: EventValue,
}

/// Event emitted in a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEvent {
    pub pallet: String,
    pub variant: String,

    /// Extrinsic that emitted the event (`None` for block initialization/finalization)
    pub extrinsic_index: Option<u32>,

    pub fields: Vec<EventField>,
}

impl ChainEvent {
    pub fn new(pallet: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            pallet: pallet.into(),
            variant: variant.into(),
            extrinsic_index: None,
            fields: Vec::new(),
        }
    }

    pub fn with_extrinsic_index(mut self, index: u32) -> Self {
        self.extrinsic_index = Some(index);
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: EventValue) -> Self {
        self.fields.push(EventField {
            name: Some(name.into()),
            value,
        });
        self
    }

    /// The event's single flag parameter: the field called `name`, or the
    /// first field when every field is unnamed (tuple-style event).
    pub fn flag(&self, name: &str) -> Option<&EventValue> {
        let field = if self.fields.iter().all(|f| f.name.is_none()) {
            self.fields.first()
        } else {
            self.fields.iter().find(|f| f.name.as_deref() == Some(name))
        };
        field.map(|f| &f.value)
    }
}

// ============================================================================
// Verification Outcome
// ============================================================================

/// Outcome read from the inclusion block's events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationOutcome {
    /// Completion event reported a valid proof
    Valid,

    /// Completion event reported an invalid proof
    Invalid,

    /// Completion event present but its validity flag was unreadable
    ParsingFailed,

    /// No completion event in the block
    NotFound,
}

impl VerificationOutcome {
    /// Whether a completion event was actually observed and read.
    pub fn is_conclusive(&self) -> bool {
        matches!(self, Self::Valid | Self::Invalid)
    }
}

impl fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Valid => "VALID",
            Self::Invalid => "INVALID",
            Self::ParsingFailed => "UNPARSEABLE",
            Self::NotFound => "NOT FOUND",
        };
        f.write_str(s)
    }
}

/// Verification outcome plus auxiliary diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub outcome: VerificationOutcome,

    /// Parse-success flag from the parsing-diagnostic event, if one was emitted
    pub parsed: Option<bool>,

    pub block_hash: BlockHash,
}
