//! IPNS Key Generation Tool
//!
//! Creates the Ed25519 signing key that `ipfs-deploy` uses to update its IPNS
//! name, and inspects existing keys.

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use ipfs_deploy::NameKey;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser)]
#[command(name = "ipfs-deploy-keygen")]
#[command(about = "IPNS Key Generation Tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new IPNS signing key
    Generate {
        /// File receiving the raw private key bytes
        #[arg(short, long, default_value = "signing-key.txt")]
        output: PathBuf,

        /// Overwrite the output file if it already exists
        #[arg(long)]
        force: bool,
    },

    /// Print the IPNS name of an existing key
    #[command(group(ArgGroup::new("source").required(true).args(["key_file", "base64"])))]
    Inspect {
        /// Path to a raw key file written by `generate`
        #[arg(long, value_name = "PATH")]
        key_file: Option<PathBuf>,

        /// Base64 key as stored in W3NAME_KEY_B64
        #[arg(long, value_name = "B64")]
        base64: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { output, force } => {
            generate_key(&output, force)?;
        }
        Commands::Inspect { key_file, base64 } => {
            let key = match (key_file, base64) {
                (Some(path), _) => load_key_file(&path)?,
                (None, Some(encoded)) => {
                    NameKey::from_base64(&encoded).context("Invalid base64 key")?
                }
                (None, None) => anyhow::bail!("either --key-file or --base64 must be provided"),
            };
            inspect_key(&key);
        }
    }

    Ok(())
}

fn generate_key(output: &Path, force: bool) -> Result<NameKey> {
    if output.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            output.display()
        );
    }

    let key = NameKey::generate().context("Failed to generate key")?;
    println!("IPNS Name: {}", key.name());

    fs::write(output, key.to_bytes()).context("Failed to write private key")?;
    debug!("Wrote {} key bytes", key.to_bytes().len());
    println!("Saved private key to {} (DO NOT COMMIT)", output.display());

    println!("W3NAME_KEY_B64:\n{}", key.to_base64());
    Ok(key)
}

fn load_key_file(path: &Path) -> Result<NameKey> {
    let raw = fs::read(path).context("Failed to read private key file")?;
    NameKey::from_bytes(&raw).context("Invalid private key file")
}

fn inspect_key(key: &NameKey) {
    println!("IPNS Name:  {}", key.name());
    println!(
        "Public key: {}",
        hex::encode(key.name().public_key().to_bytes())
    );
}
