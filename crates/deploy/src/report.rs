//! Deployment summary written after a successful publish.

use crate::errors::{DeployError, Result};
use crate::name::IpnsName;
use crate::types::ContentId;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub cid: String,
    pub ipns_id: String,
    pub gateway: String,
}

impl PublishReport {
    pub fn new(cid: &ContentId, name: &IpnsName, gateway: impl Into<String>) -> Self {
        Self {
            cid: cid.to_string(),
            ipns_id: name.to_string(),
            gateway: gateway.into(),
        }
    }

    pub fn gateway_url_by_cid(&self) -> String {
        format!("https://{}/ipfs/{}/", self.gateway, self.cid)
    }

    pub fn gateway_url_by_ipns(&self) -> String {
        format!("https://{}/ipns/{}/", self.gateway, self.ipns_id)
    }

    /// Overwrite `path` with the rendered report and echo it to stdout.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| DeployError::filesystem(parent, e))?;
        }
        fs::write(path, self.to_string()).map_err(|e| DeployError::filesystem(path, e))?;
        info!("Wrote report to {}", path.display());

        println!("\nPublish complete\n{self}");
        Ok(())
    }
}

impl fmt::Display for PublishReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CID={}", self.cid)?;
        writeln!(f, "IPNS={}", self.ipns_id)?;
        writeln!(f, "Gateway (CID): {}", self.gateway_url_by_cid())?;
        writeln!(f, "Gateway (IPNS): {}", self.gateway_url_by_ipns())
    }
}
