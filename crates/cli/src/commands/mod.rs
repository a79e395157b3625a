//! Command implementations.
//!
//! Each command is a separate module that implements its own CLI args and execution logic.

mod artifacts;
mod check_result;
mod keys;
mod submit;

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use proof_relay_core::{
    ChainTransport, PipelineError, RelayConfig, VerificationOutcome, VerificationReport,
};
use proof_relay_substrate::{SubstrateConfig, SubxtTransport};
use serde::Serialize;

pub use artifacts::{CreateMock, GenerateVk, Transform, Validate};
pub use check_result::CheckResult;
pub use keys::{KeysGenerate, KeysGenesis, KeysInspect};
pub use submit::Submit;

/// Chain connection options shared by the network commands.
///
/// Flags override the corresponding `RELAY_*` environment variables.
#[derive(Args, Debug, Default)]
pub struct ChainArgs {
    /// Node RPC endpoint [env: RELAY_NODE_URL]
    #[arg(long, value_name = "URL")]
    pub node: Option<String>,

    /// Pallet exposing the verification call [env: RELAY_PALLET]
    #[arg(long)]
    pub pallet: Option<String>,

    /// Seconds to wait for block inclusion [env: RELAY_INCLUSION_TIMEOUT_SECS]
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// SS58 prefix for printed addresses [env: RELAY_SS58_PREFIX]
    #[arg(long, value_name = "PREFIX")]
    pub ss58_prefix: Option<u16>,
}

impl ChainArgs {
    pub fn relay_config(&self) -> RelayConfig {
        let mut config = RelayConfig::from_env();
        if let Some(pallet) = &self.pallet {
            config = config.with_pallet(pallet.clone());
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_inclusion_timeout(Duration::from_secs(secs.max(1)));
        }
        config
    }

    pub fn substrate_config(&self) -> SubstrateConfig {
        let mut config = SubstrateConfig::from_env();
        if let Some(node) = &self.node {
            config = config.with_node_url(node.clone());
        }
        if let Some(prefix) = self.ss58_prefix {
            config = config.with_ss58_prefix(prefix);
        }
        config
    }
}

/// Connect and health-check the node.
pub async fn connect(config: SubstrateConfig) -> Result<SubxtTransport> {
    let node = config.node_url.clone();
    let transport = SubxtTransport::connect(config)
        .await
        .with_context(|| format!("Failed to connect to node at {}", node))?;
    transport
        .health_check()
        .await
        .with_context(|| format!("Node at {} is not healthy", node))?;
    Ok(transport)
}

/// Print a stage failure and map it to the failure exit code.
pub fn report_failure(err: &PipelineError) -> ExitCode {
    eprintln!(
        "{} {} stage failed: {}",
        style("✗").red().bold(),
        style(err.stage()).bold(),
        err
    );
    if err.is_retryable() {
        eprintln!("  {}", style("This failure is retryable.").dim());
    } else if let PipelineError::OutcomeAmbiguous { tx_hash, .. } = err {
        eprintln!(
            "  {}",
            style(format!(
                "Check whether {} was included before submitting again.",
                tx_hash
            ))
            .yellow()
        );
    }
    ExitCode::FAILURE
}

/// Print a verification report and map it to an exit code.
///
/// Valid and invalid proofs are both successful runs; an absent or
/// unreadable completion event is not.
pub fn report_verification(report: &VerificationReport) -> ExitCode {
    if let Some(parsed) = report.parsed {
        println!(
            "Proof parsing:      {}",
            if parsed {
                style("SUCCESS").green()
            } else {
                style("FAILED").red()
            }
        );
    }

    let outcome = match report.outcome {
        VerificationOutcome::Valid => style(report.outcome.to_string()).green().bold(),
        VerificationOutcome::Invalid => style(report.outcome.to_string()).red().bold(),
        _ => style(report.outcome.to_string()).yellow().bold(),
    };
    println!("Verification result: {}", outcome);

    if report.outcome.is_conclusive() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Write a value as pretty-printed JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut json = serde_json::to_string_pretty(value).context("Failed to serialize document")?;
    json.push('\n');
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
