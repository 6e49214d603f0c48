//! Linear publish workflow: walk → upload → resolve → publish → report.

use crate::config::DeployConfig;
use crate::errors::{DeployError, Result};
use crate::name::{NameKey, NamePublisher, NameService, W3NameClient};
use crate::report::PublishReport;
use crate::upload::{ContentUploader, PinataUploader};
use crate::walker::walk_directory;
use std::fmt;
use tracing::{error, info};

/// Workflow state. Any failure moves straight to `Failed`; there is no retry
/// or resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Walking,
    Uploading,
    Resolving,
    Publishing,
    Reporting,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Idle => "idle",
            Stage::Walking => "walking",
            Stage::Uploading => "uploading",
            Stage::Resolving => "resolving",
            Stage::Publishing => "publishing",
            Stage::Reporting => "reporting",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(label)
    }
}

pub struct DeployPipeline<U, N> {
    config: DeployConfig,
    key: NameKey,
    uploader: U,
    names: N,
    stage: Stage,
}

impl DeployPipeline<PinataUploader, W3NameClient> {
    /// Build the production pipeline. Credential and key problems surface
    /// here, before any filesystem or network access.
    pub fn from_config(config: DeployConfig) -> Result<Self> {
        let uploader = PinataUploader::from_config(&config)?;
        let key = NameKey::from_base64(config.name_key_b64()?)?;
        let names = W3NameClient::new(config.w3name_endpoint.clone());
        Ok(Self::new(config, key, uploader, names))
    }
}

impl<U: ContentUploader, N: NameService> DeployPipeline<U, N> {
    pub fn new(config: DeployConfig, key: NameKey, uploader: U, names: N) -> Self {
        Self {
            config,
            key,
            uploader,
            names,
            stage: Stage::Idle,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn key(&self) -> &NameKey {
        &self.key
    }

    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    pub fn names(&self) -> &N {
        &self.names
    }

    pub async fn run(&mut self) -> Result<PublishReport> {
        match self.execute().await {
            Ok(report) => {
                advance(&mut self.stage, Stage::Done);
                Ok(report)
            }
            Err(err) => {
                error!(stage = %self.stage, kind = ?err.kind(), "Deployment failed: {}", err);
                self.stage = Stage::Failed;
                Err(err)
            }
        }
    }

    async fn execute(&mut self) -> Result<PublishReport> {
        advance(&mut self.stage, Stage::Walking);
        let root = self.config.root_dir.clone();
        let files = walk_directory(&root, self.config.max_depth)?;
        if files.is_empty() {
            return Err(DeployError::EmptyDirectory(root));
        }

        advance(&mut self.stage, Stage::Uploading);
        println!("Uploading {} files to IPFS...", files.len());
        let folder = self.config.folder_name();
        let cid = self.uploader.upload(&folder, &files).await?;
        println!("CID: {cid}");

        advance(&mut self.stage, Stage::Resolving);
        let publisher = NamePublisher::from_config(&self.names, &self.config);
        let resolution = publisher.resolve(self.key.name()).await;
        let revision = publisher.next_revision(resolution, &cid.ipfs_path())?;

        advance(&mut self.stage, Stage::Publishing);
        publisher.publish_revision(&self.key, &revision).await?;

        advance(&mut self.stage, Stage::Reporting);
        let report = PublishReport::new(&cid, self.key.name(), self.config.gateway_host.clone());
        report.write(&self.config.report_path)?;

        Ok(report)
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    info!(from = %stage, to = %next, "Stage transition");
    *stage = next;
}
