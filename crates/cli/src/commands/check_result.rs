//! Re-read the verification outcome of an included transaction.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use proof_relay_core::{BlockHash, ProofPipeline};

use super::{ChainArgs, connect, report_failure, report_verification};

/// Read the verification outcome from an already known block
#[derive(Debug, Parser)]
pub struct CheckResult {
    /// Inclusion block hash (0x-prefixed hex)
    #[arg(long, value_name = "HASH")]
    pub block: String,

    /// Only consider events of this extrinsic
    #[arg(long, value_name = "INDEX")]
    pub extrinsic_index: Option<u32>,

    #[command(flatten)]
    pub chain: ChainArgs,
}

impl CheckResult {
    pub async fn execute(self) -> Result<ExitCode> {
        let block: BlockHash = self
            .block
            .parse()
            .with_context(|| format!("Invalid block hash: {}", self.block))?;

        let transport = connect(self.chain.substrate_config()).await?;
        let pipeline = ProofPipeline::new(transport, self.chain.relay_config());

        println!("🔍 Checking events in block {}...", block);
        match pipeline.check_result(&block, self.extrinsic_index).await {
            Ok(report) => Ok(report_verification(&report)),
            Err(e) => Ok(report_failure(&e)),
        }
    }
}
