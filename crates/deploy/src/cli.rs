use crate::config::{DeployConfig, LogFormat, UnavailablePolicy};
use crate::name::{NameKey, NameService, Resolution, W3NameClient};
use crate::pipeline::DeployPipeline;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// IPFS site deployment CLI
#[derive(Parser, Debug)]
#[command(name = "ipfs-deploy")]
#[command(about = "Publish a static site to IPFS and point an IPNS name at it")]
#[command(version)]
pub struct Cli {
    /// Optional TOML configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload the site directory and update the IPNS name
    Publish(PublishArgs),
    /// Print the IPNS name of the configured signing key
    Name,
    /// Show the currently published revision of the configured name
    Resolve,
}

#[derive(Args, Debug, Default)]
pub struct PublishArgs {
    /// Directory to publish
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Where to write the deployment report
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Gateway host used in report URLs
    #[arg(long, value_name = "HOST")]
    pub gateway: Option<String>,

    /// Behaviour when the current name record cannot be resolved
    #[arg(long, value_enum)]
    pub on_unavailable: Option<UnavailablePolicy>,
}

impl PublishArgs {
    fn apply(self, config: &mut DeployConfig) {
        if let Some(root) = self.root {
            config.root_dir = root;
        }
        if let Some(report) = self.report {
            config.report_path = report;
        }
        if let Some(gateway) = self.gateway {
            config.gateway_host = gateway;
        }
        if let Some(policy) = self.on_unavailable {
            config.on_unavailable = policy;
        }
    }
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let mut config =
        DeployConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    init_logging(&config);

    match cli.command {
        Commands::Publish(args) => {
            args.apply(&mut config);
            config.validate()?;
            let mut pipeline = DeployPipeline::from_config(config)?;
            pipeline.run().await?;
        }
        Commands::Name => {
            let key = NameKey::from_base64(config.name_key_b64()?)?;
            println!("IPNS Name: {}", key.name());
        }
        Commands::Resolve => {
            let key = NameKey::from_base64(config.name_key_b64()?)?;
            let client = W3NameClient::new(config.w3name_endpoint.clone());
            match client.resolve(key.name()).await {
                Resolution::Found(rev) => {
                    println!("IPNS Name: {}", key.name());
                    println!("Sequence:  {}", rev.sequence());
                    println!("Value:     {}", rev.value());
                    println!("Valid until: {}", rev.validity().to_rfc3339());
                }
                Resolution::NotFound => {
                    println!("{} has not been published yet", key.name());
                }
                Resolution::Unavailable(reason) => {
                    anyhow::bail!("could not resolve {}: {}", key.name(), reason);
                }
            }
        }
    }

    Ok(())
}

/// Install the global tracing subscriber. `RUST_LOG` takes precedence over
/// the configured level.
pub fn init_logging(config: &DeployConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .init(),
    }
}
