//! Proof relay command-line tool.
//!
//! Submits proof artifacts to a Substrate chain for on-chain verification,
//! reads verification outcomes back, and prepares artifacts locally.

mod commands;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use console::style;

use commands::{
    CheckResult, CreateMock, GenerateVk, KeysGenerate, KeysGenesis, KeysInspect, Submit,
    Transform, Validate,
};

/// Proof submission and verification relay
#[derive(Parser)]
#[command(name = "proof-relay")]
#[command(about = "Submit proofs for on-chain verification", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to the platform cache directory
    #[arg(long, global = true)]
    log: bool,

    /// Also write logs to DIR/relay.log
    #[arg(long, value_name = "DIR", env = "RELAY_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Submit a proof and verification key for on-chain verification
    Submit(Submit),

    /// Read the verification outcome from an already known block
    CheckResult(CheckResult),

    /// Normalize a proof document into the on-chain format
    Transform(Transform),

    /// Write a sample verification key
    GenerateVk(GenerateVk),

    /// Write a mock proof for local testing
    CreateMock(CreateMock),

    /// Validate a proof document
    Validate(Validate),

    /// Key management via the external key tool
    #[command(subcommand)]
    Keys(KeysCommand),
}

/// Key management commands
#[derive(Parser)]
enum KeysCommand {
    /// Generate a new account or node key
    Generate(KeysGenerate),

    /// Inspect a secret URI
    Inspect(KeysInspect),

    /// Generate the key set for a new network's genesis
    Genesis(KeysGenesis),
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_dir = cli
        .log_dir
        .clone()
        .or_else(|| cli.log.then(logging::default_log_dir));
    let _guard = match logging::init(cli.verbose, log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{} {:#}", style("✗").red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Submit(cmd) => cmd.execute().await,
        Command::CheckResult(cmd) => cmd.execute().await,
        Command::Transform(cmd) => cmd.execute(),
        Command::GenerateVk(cmd) => cmd.execute(),
        Command::CreateMock(cmd) => cmd.execute(),
        Command::Validate(cmd) => cmd.execute(),
        Command::Keys(keys_cmd) => match keys_cmd {
            KeysCommand::Generate(cmd) => cmd.execute().await,
            KeysCommand::Inspect(cmd) => cmd.execute().await,
            KeysCommand::Genesis(cmd) => cmd.execute().await,
        },
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", style("✗").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
