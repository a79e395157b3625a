//! Local artifact commands: transform, generate-vk, create-mock, validate.
//!
//! None of these touch the network.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use proof_relay_core::artifact;
use proof_relay_core::{NormalizedProof, ProofArtifact, VerificationKey};

use super::write_json;

/// Normalize a proof document into the on-chain format
#[derive(Debug, Parser)]
pub struct Transform {
    /// Producer proof document
    #[arg(long, value_name = "PATH")]
    pub input: PathBuf,

    /// Where to write the normalized document
    #[arg(long, value_name = "PATH")]
    pub output: PathBuf,
}

impl Transform {
    pub fn execute(self) -> Result<ExitCode> {
        println!("🔄 Transforming {}...", self.input.display());

        let normalized = transform_proof(&self.input)?;
        write_json(&self.output, &normalized)?;

        println!(
            "{} Wrote {} ({} commitments, {} decommitments, {} FRI layers)",
            style("✓").green().bold(),
            self.output.display(),
            normalized.commitments.len(),
            normalized.decommitments.len(),
            normalized.fri_proof.layers.len()
        );
        Ok(ExitCode::SUCCESS)
    }
}

/// Validate a producer proof and normalize it.
///
/// Unknown fields are dropped and only `layers` survives inside `fri_proof`.
fn transform_proof(path: &Path) -> Result<NormalizedProof> {
    let proof = artifact::load_proof(path)?;
    let normalized = NormalizedProof::from_artifact(&proof)
        .with_context(|| format!("Failed to normalize {}", path.display()))?;
    Ok(normalized.trimmed())
}

/// Write a sample verification key
#[derive(Debug, Parser)]
pub struct GenerateVk {
    /// Output path
    #[arg(long, value_name = "PATH", default_value = "verification_key.json")]
    pub output: PathBuf,
}

impl GenerateVk {
    pub fn execute(self) -> Result<ExitCode> {
        write_json(&self.output, &VerificationKey::sample())?;
        println!(
            "{} Verification key written to {}",
            style("✓").green().bold(),
            self.output.display()
        );
        Ok(ExitCode::SUCCESS)
    }
}

/// Write a mock proof for local testing
#[derive(Debug, Parser)]
pub struct CreateMock {
    /// Output path
    #[arg(long, value_name = "PATH", default_value = "mock_proof.json")]
    pub output: PathBuf,
}

impl CreateMock {
    pub fn execute(self) -> Result<ExitCode> {
        write_json(&self.output, &ProofArtifact::mock())?;
        println!(
            "{} Mock proof written to {}",
            style("✓").green().bold(),
            self.output.display()
        );
        Ok(ExitCode::SUCCESS)
    }
}

/// Validate a proof document
#[derive(Debug, Parser)]
pub struct Validate {
    /// Proof document
    #[arg(value_name = "PATH")]
    pub proof: PathBuf,
}

impl Validate {
    pub fn execute(self) -> Result<ExitCode> {
        match artifact::load_proof(&self.proof) {
            Ok(proof) => {
                println!(
                    "{} {} is valid ({} commitments, {} FRI layers, {} public inputs)",
                    style("✓").green().bold(),
                    self.proof.display(),
                    proof.commitments.len(),
                    proof.fri_proof.layers.len(),
                    proof.public_inputs.len()
                );
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                eprintln!("{} {}", style("✗").red().bold(), e);
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
