//! Directory upload to a pinning service.

use crate::config::DeployConfig;
use crate::errors::{DeployError, Result};
use crate::types::{ContentId, FileEntry};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

/// Uploads a set of files as one directory tree and returns the root CID.
#[async_trait]
pub trait ContentUploader: Send + Sync {
    async fn upload(&self, folder: &str, files: &[FileEntry]) -> Result<ContentId>;
}

/// Pinata `pinFileToIPFS` client.
#[derive(Clone)]
pub struct PinataUploader {
    client: reqwest::Client,
    endpoint: String,
    jwt: String,
}

impl PinataUploader {
    /// Fails with `AuthenticationMissing` when `jwt` is empty.
    pub fn new(endpoint: impl Into<String>, jwt: impl Into<String>) -> Result<Self> {
        let jwt = jwt.into();
        if jwt.trim().is_empty() {
            return Err(DeployError::AuthenticationMissing);
        }
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            jwt,
        })
    }

    pub fn from_config(config: &DeployConfig) -> Result<Self> {
        Self::new(config.pinata_endpoint.clone(), config.pinata_jwt()?)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn build_form(&self, folder: &str, files: &[FileEntry]) -> Result<Form> {
        // Names go into Content-Disposition unescaped so that `/` survives.
        let names = files
            .iter()
            .map(|entry| part_file_name(folder, &entry.relative_path))
            .collect::<Result<Vec<_>>>()?;

        let mut form = Form::new().percent_encode_noop();
        for (entry, name) in files.iter().zip(names) {
            // Read whole file so the handle is closed before the next open.
            let bytes = tokio::fs::read(&entry.absolute_path)
                .await
                .map_err(|e| DeployError::filesystem(&entry.absolute_path, e))?;
            debug!("Adding {} ({} bytes)", entry.relative_path, bytes.len());
            let part = Part::bytes(bytes).file_name(name);
            form = form.part("file", part);
        }

        Ok(form
            .text("pinataOptions", json!({ "cidVersion": 1 }).to_string())
            .text("pinataMetadata", json!({ "name": folder }).to_string()))
    }
}

fn part_file_name(folder: &str, relative_path: &str) -> Result<String> {
    let name = format!("{folder}/{relative_path}");
    if name.contains(&['"', '\r', '\n'][..]) {
        return Err(DeployError::UnsupportedFileName(name));
    }
    Ok(name)
}

impl std::fmt::Debug for PinataUploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinataUploader")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
    #[serde(rename = "PinSize", default)]
    pin_size: Option<u64>,
}

#[async_trait]
impl ContentUploader for PinataUploader {
    async fn upload(&self, folder: &str, files: &[FileEntry]) -> Result<ContentId> {
        let form = self.build_form(folder, files).await?;

        info!("Uploading {} files to {}", files.len(), self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.jwt)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(DeployError::UploadRejected {
                status: status.as_u16(),
                body,
            });
        }

        let pinned: PinResponse = serde_json::from_str(&body)
            .map_err(|e| DeployError::InvalidResponse(format!("{e}: {body}")))?;
        if let Some(size) = pinned.pin_size {
            debug!("Pinned {} bytes", size);
        }
        Ok(ContentId::new(pinned.ipfs_hash))
    }
}
