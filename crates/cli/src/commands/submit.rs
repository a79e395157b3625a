//! Proof submission command.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use console::style;
use proof_relay_core::{ProofPipeline, prepare_payload};

use super::{ChainArgs, connect, report_failure, report_verification};

/// Submit a proof and verification key for on-chain verification
#[derive(Debug, Parser)]
pub struct Submit {
    /// Proof document
    #[arg(long, value_name = "PATH")]
    pub proof: PathBuf,

    /// Verification key document
    #[arg(long, value_name = "PATH")]
    pub vk: PathBuf,

    /// Signer secret URI, e.g. //Alice or a mnemonic [env: RELAY_SIGNER_URI]
    #[arg(long, value_name = "URI")]
    pub key: Option<String>,

    /// Read the verification outcome from the inclusion block
    #[arg(long)]
    pub check_result: bool,

    #[command(flatten)]
    pub chain: ChainArgs,
}

impl Submit {
    pub async fn execute(self) -> Result<ExitCode> {
        let mut substrate = self.chain.substrate_config();
        if let Some(key) = self.key {
            substrate = substrate.with_signer_uri(key);
        }
        let relay = self.chain.relay_config();

        println!("📄 Loading {} and {}...", self.proof.display(), self.vk.display());
        // Reject bad input before touching the network
        let payload = match prepare_payload(&self.proof, &self.vk) {
            Ok(payload) => payload,
            Err(e) => return Ok(report_failure(&e)),
        };
        println!("   Encoded payload: {} bytes", payload.len());

        let signer = substrate.signer_uri.clone();
        println!("🔗 Connecting to {}...", substrate.node_url);
        let transport = connect(substrate).await?;

        println!("🚀 Submitting {}::{}...", relay.pallet, relay.call);
        let pipeline = ProofPipeline::new(transport, relay);
        let report = match pipeline
            .submit_payload(&payload, &signer, self.check_result)
            .await
        {
            Ok(report) => report,
            Err(e) => return Ok(report_failure(&e)),
        };

        let receipt = &report.receipt;
        println!("{} Transaction included", style("✓").green().bold());
        println!("   Transaction: {}", receipt.tx_hash);
        println!("   Block hash:  {}", receipt.block_hash);
        if let Some(index) = receipt.extrinsic_index {
            println!("   Extrinsic:   {}", index);
        }

        match &report.verification {
            Some(verification) => Ok(report_verification(verification)),
            None => Ok(ExitCode::SUCCESS),
        }
    }
}
