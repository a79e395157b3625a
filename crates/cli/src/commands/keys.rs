//! Key generation and inspection through the external key tool.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use proof_relay_substrate::{KeyGenerator, KeyRecord, KeyScheme, KeySetSpec, SubstrateConfig};

/// Generate a new account or node key
#[derive(Debug, Parser)]
pub struct KeysGenerate {
    /// Key scheme (sr25519, ed25519, ecdsa)
    #[arg(short, long, default_value = "sr25519")]
    pub scheme: String,

    /// Generate a libp2p node key instead of an account key
    #[arg(long)]
    pub node_key: bool,

    /// Node key file to write (with --node-key)
    #[arg(long, value_name = "PATH", requires = "node_key")]
    pub output: Option<PathBuf>,

    /// Show secret material in output (WARNING: sensitive!)
    #[arg(long)]
    pub show_secret: bool,

    /// Key tool binary [env: RELAY_KEY_TOOL]
    #[arg(long, value_name = "PATH")]
    pub key_tool: Option<String>,
}

impl KeysGenerate {
    pub async fn execute(self) -> Result<ExitCode> {
        let generator = generator(self.key_tool);

        if self.node_key {
            let key = generator
                .generate_node_key()
                .await
                .context("Failed to generate node key")?;

            println!("{} Node key generated", style("✓").green().bold());
            println!("Peer ID: {}", key.peer_id);

            if let Some(path) = &self.output {
                std::fs::write(path, format!("{}\n", key.secret))
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("Secret written to {}", path.display());
            }
            if self.show_secret {
                println!();
                println!("⚠️  WARNING: Do NOT share your node key!");
                println!("{}", key.secret);
            }
            return Ok(ExitCode::SUCCESS);
        }

        let scheme: KeyScheme = self.scheme.parse()?;
        let record = generator
            .generate(scheme)
            .await
            .context("Failed to generate key")?;

        println!("{} {} key generated", style("✓").green().bold(), scheme);
        print_record(&record, self.show_secret)?;
        Ok(ExitCode::SUCCESS)
    }
}

/// Inspect a secret URI
#[derive(Debug, Parser)]
pub struct KeysInspect {
    /// Secret URI: mnemonic, 0x seed, or dev URI such as //Alice//stash
    pub uri: String,

    /// Key scheme (sr25519, ed25519, ecdsa)
    #[arg(short, long, default_value = "sr25519")]
    pub scheme: String,

    /// Show secret material in output (WARNING: sensitive!)
    #[arg(long)]
    pub show_secret: bool,

    /// Key tool binary [env: RELAY_KEY_TOOL]
    #[arg(long, value_name = "PATH")]
    pub key_tool: Option<String>,
}

impl KeysInspect {
    pub async fn execute(self) -> Result<ExitCode> {
        let scheme: KeyScheme = self.scheme.parse()?;
        let record = generator(self.key_tool)
            .inspect(&self.uri, scheme)
            .await
            .context("Failed to inspect key")?;

        print_record(&record, self.show_secret)?;
        Ok(ExitCode::SUCCESS)
    }
}

/// Generate the key set for a new network's genesis
#[derive(Debug, Parser)]
pub struct KeysGenesis {
    /// Number of validators
    #[arg(long, default_value_t = 10)]
    pub validators: usize,

    /// Number of nominators
    #[arg(long, default_value_t = 10)]
    pub nominators: usize,

    /// Number of community custodians
    #[arg(long, default_value_t = 3)]
    pub community_custodians: usize,

    /// Number of foundations
    #[arg(long, default_value_t = 2)]
    pub foundations: usize,

    /// Number of contributor custodians
    #[arg(long, default_value_t = 2)]
    pub contributor_custodians: usize,

    /// Number of investors
    #[arg(long, default_value_t = 2)]
    pub investors: usize,

    /// Do not create a sudo account
    #[arg(long)]
    pub disable_sudo: bool,

    /// Give each validator a separate stash account
    #[arg(long)]
    pub separate_account_validator: bool,

    /// Derive every key from this secret URI instead of generating random ones
    #[arg(long, value_name = "URI")]
    pub base_key: Option<String>,

    /// Public key document
    #[arg(long, value_name = "PATH", default_value = "generated_keys.json")]
    pub output: PathBuf,

    /// Folder for secrets.json and the validator node keys
    #[arg(long, value_name = "DIR", default_value = "secrets")]
    pub secrets_folder: PathBuf,

    /// Key tool binary [env: RELAY_KEY_TOOL]
    #[arg(long, value_name = "PATH")]
    pub key_tool: Option<String>,
}

impl KeysGenesis {
    fn spec(&self) -> KeySetSpec {
        KeySetSpec {
            validators: self.validators,
            nominators: self.nominators,
            community_custodians: self.community_custodians,
            foundations: self.foundations,
            contributor_custodians: self.contributor_custodians,
            investors: self.investors,
            sudo: !self.disable_sudo,
            separate_validator_account: self.separate_account_validator,
            base_key: self.base_key.clone(),
        }
    }

    pub async fn execute(self) -> Result<ExitCode> {
        let spec = self.spec();
        println!(
            "🔑 Generating keys: {} validators, {} nominators, {} community custodians, \
             {} foundations, {} contributor custodians, {} investors, sudo {}",
            spec.validators,
            spec.nominators,
            spec.community_custodians,
            spec.foundations,
            spec.contributor_custodians,
            spec.investors,
            if spec.sudo { "enabled" } else { "disabled" }
        );
        if spec.base_key.is_some() {
            println!("   Deriving from base key");
        }

        let set = generator(self.key_tool)
            .generate_key_set(&spec, &self.secrets_folder)
            .await
            .context("Failed to generate key set")?;
        set.write(&self.output, &self.secrets_folder)
            .with_context(|| format!("Failed to write key set to {}", self.output.display()))?;

        println!("{} Keys written to {}", style("✓").green().bold(), self.output.display());
        println!(
            "   Secrets and node keys written to {}",
            self.secrets_folder.display()
        );
        Ok(ExitCode::SUCCESS)
    }
}

fn generator(key_tool: Option<String>) -> KeyGenerator {
    let config = SubstrateConfig::from_env();
    let config = match key_tool {
        Some(tool) => config.with_key_tool(tool),
        None => config,
    };
    KeyGenerator::from_config(&config)
}

fn print_record(record: &KeyRecord, show_secret: bool) -> Result<()> {
    let shown = if show_secret {
        println!("⚠️  WARNING: Do NOT share your secret phrase or seed!");
        record.clone()
    } else {
        record.public_only()
    };
    println!("{}", serde_json::to_string_pretty(&shown)?);
    Ok(())
}
