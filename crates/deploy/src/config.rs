//! Layered configuration: built-in defaults, an optional TOML file, then
//! `IPFS_DEPLOY_*` environment variables. Secrets are only read from the
//! environment (`PINATA_JWT`, `W3NAME_KEY_B64`).

use crate::errors::{DeployError, Result};
use crate::walker::DEFAULT_MAX_DEPTH;
use config::{Config, Environment, File as ConfigFile};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "IPFS_DEPLOY";
pub const PINATA_JWT_VAR: &str = "PINATA_JWT";
pub const NAME_KEY_VAR: &str = "W3NAME_KEY_B64";

pub const DEFAULT_PINATA_ENDPOINT: &str = "https://api.pinata.cloud/pinning/pinFileToIPFS";
pub const DEFAULT_W3NAME_ENDPOINT: &str = "https://name.web3.storage";
const ONE_YEAR_SECS: i64 = 365 * 24 * 60 * 60;
/// Upper bound on record validity, in seconds (100 years).
pub const MAX_RECORD_LIFETIME_SECS: u64 = 100 * ONE_YEAR_SECS as u64;

/// What to do when the current name record cannot be resolved for a reason
/// other than "never published".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum UnavailablePolicy {
    /// Fail the run rather than risk overwriting an unseen newer revision.
    #[default]
    Abort,
    /// Publish sequence 0 as if the name had never been used.
    StartFresh,
}

/// Console log layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
}

/// Secret string that never appears in `Debug` output.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Deployment configuration passed explicitly into every component.
#[derive(Debug, Clone, Deserialize)]
pub struct DeployConfig {
    // Input / output
    pub root_dir: PathBuf,
    pub report_path: PathBuf,
    pub max_depth: usize,

    // Services
    pub gateway_host: String,
    pub pinata_endpoint: String,
    pub w3name_endpoint: String,

    // Name records
    pub on_unavailable: UnavailablePolicy,
    pub record_lifetime_secs: u64,
    pub record_ttl_secs: u64,

    // Logging
    pub log_level: String,
    pub log_format: LogFormat,

    // Secrets
    #[serde(skip)]
    pub pinata_jwt: Option<Secret>,
    #[serde(skip)]
    pub name_key_b64: Option<Secret>,
}

impl DeployConfig {
    /// Load configuration from the process environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(config_path, std::env::vars().collect())
    }

    /// Load configuration from an explicit environment map.
    pub fn load_with_env(
        config_path: Option<&Path>,
        env: HashMap<String, String>,
    ) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("root_dir", "public")?
            .set_default("report_path", "latest-ipfs.txt")?
            .set_default("max_depth", DEFAULT_MAX_DEPTH as i64)?
            .set_default("gateway_host", "ipfs.io")?
            .set_default("pinata_endpoint", DEFAULT_PINATA_ENDPOINT)?
            .set_default("w3name_endpoint", DEFAULT_W3NAME_ENDPOINT)?
            .set_default("on_unavailable", "abort")?
            .set_default("record_lifetime_secs", ONE_YEAR_SECS)?
            .set_default("record_ttl_secs", 300_i64)?
            .set_default("log_level", "info")?
            .set_default("log_format", "pretty")?;

        if let Some(path) = config_path {
            if !path.exists() {
                return Err(DeployError::Config(format!(
                    "configuration file {} not found (specified via --config)",
                    path.display()
                )));
            }
            builder = builder.add_source(ConfigFile::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(Some(env.clone())),
        );

        let mut config: DeployConfig = builder.build()?.try_deserialize()?;
        config.pinata_jwt = secret_from(&env, PINATA_JWT_VAR);
        config.name_key_b64 = secret_from(&env, NAME_KEY_VAR);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let host = self.gateway_host.trim();
        if host.is_empty() || host.contains("://") || host.contains('/') {
            return Err(DeployError::Config(format!(
                "gateway_host must be a bare host name, got {:?}",
                self.gateway_host
            )));
        }
        if self.record_lifetime_secs == 0 || self.record_lifetime_secs > MAX_RECORD_LIFETIME_SECS {
            return Err(DeployError::Config(format!(
                "record_lifetime_secs must be between 1 and {}, got {}",
                MAX_RECORD_LIFETIME_SECS, self.record_lifetime_secs
            )));
        }
        Ok(())
    }

    /// Upload credential, or `AuthenticationMissing`.
    pub fn pinata_jwt(&self) -> Result<&str> {
        self.pinata_jwt
            .as_ref()
            .map(Secret::expose)
            .ok_or(DeployError::AuthenticationMissing)
    }

    /// Base64 signing key, or `SigningKeyMissing`.
    pub fn name_key_b64(&self) -> Result<&str> {
        self.name_key_b64
            .as_ref()
            .map(Secret::expose)
            .ok_or(DeployError::SigningKeyMissing)
    }

    pub fn record_lifetime(&self) -> Duration {
        Duration::from_secs(self.record_lifetime_secs)
    }

    pub fn record_ttl(&self) -> Duration {
        Duration::from_secs(self.record_ttl_secs)
    }

    /// Folder name the upload is wrapped in, taken from the root directory.
    pub fn folder_name(&self) -> String {
        self.root_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "site".to_string())
    }
}

fn secret_from(env: &HashMap<String, String>, key: &str) -> Option<Secret> {
    env.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(Secret::new)
}
