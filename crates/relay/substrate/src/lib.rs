//! Substrate backend for the proof relay.
//!
//! This crate connects the chain-agnostic pipeline to a Substrate node:
//! - Dynamic call composition against the node's runtime metadata
//! - sr25519 signing from secret URIs
//! - Submit-and-watch with inclusion tracking
//! - Block event decoding
//!
//! It also wraps the external key tool used to mint signer and node keys,
//! including whole genesis key sets.
//!
//! # Usage
//!
//! ```ignore
//! use proof_relay_core::{ProofPipeline, RelayConfig};
//! use proof_relay_substrate::{SubstrateConfig, SubxtTransport};
//!
//! let config = SubstrateConfig::from_env();
//! let signer = config.signer_uri.clone();
//! let transport = SubxtTransport::connect(config).await?;
//!
//! let pipeline = ProofPipeline::new(transport, RelayConfig::from_env());
//! let report = pipeline.run(proof, vk, &signer, true).await?;
//! ```

pub mod client;
pub mod config;
pub mod genesis;
pub mod keys;
pub mod utils;

pub use client::SubxtTransport;
pub use config::SubstrateConfig;
pub use genesis::{GenesisKeys, GenesisSecrets, KeySet, KeySetSpec};
pub use keys::{KeyGenError, KeyGenerator, KeyRecord, KeyScheme, NodeKey};
