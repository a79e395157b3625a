//! Chain-agnostic proof relay pipeline.
//!
//! This crate turns a locally produced proof artifact and its verification key
//! into a proof-verification call, submits it as a signed transaction, waits
//! for block inclusion and reads the verification outcome back from the
//! block's events.
//!
//! # Architecture
//!
//! ```text
//! Layer 1: ProofPipeline (composition)
//!          ├── artifact   (load + validate documents)
//!          ├── encoder    (normalize + canonical bytes)
//!          ├── builder    (call description + signing)
//!          ├── coordinator(submit + wait for inclusion)
//!          └── extractor  (block events → outcome)
//!
//! Layer 0: ChainTransport (pure infrastructure)
//! ```
//!
//! Every stage runs once per submission and fails fast with its own error
//! type; nothing retries on its own.
//!
//! # Usage
//!
//! ```ignore
//! use proof_relay_core::{ProofPipeline, RelayConfig};
//!
//! let pipeline = ProofPipeline::new(transport, RelayConfig::from_env());
//! let report = pipeline
//!     .run("proof.json".as_ref(), "verification_key.json".as_ref(), "//Alice", true)
//!     .await?;
//! println!("included in {}", report.receipt.block_hash);
//! ```

pub mod artifact;
pub mod builder;
pub mod config;
pub mod coordinator;
pub mod encoder;
pub mod extractor;
pub mod pipeline;
pub mod traits;
pub mod types;

#[cfg(test)]
pub mod mock;

pub use artifact::{ArtifactError, FriProof, ProofArtifact, ProofEntry, VerificationKey};
pub use builder::{SigningError, TransactionBuilder};
pub use config::{BlockchainConfig, RelayConfig};
pub use coordinator::{InclusionOutcome, SubmissionCoordinator, SubmissionError};
pub use encoder::{EncodedCallPayload, EncodingError, NormalizedProof, PayloadEncoder};
pub use extractor::{EventLookupError, ResultExtractor};
pub use pipeline::{PipelineError, PipelineReport, ProofPipeline, prepare_payload};
pub use traits::{ChainTransport, TransportError};
pub use types::{
    BlockHash, CallDescription, CallParam, ChainEvent, ComposedCall, EventField, EventValue,
    InclusionStatus, SignedTransaction, SigningIdentity, SubmissionReceipt, TransactionHash,
    VerificationOutcome, VerificationReport,
};

#[cfg(test)]
pub use mock::MockTransport;
