#![allow(dead_code)]

use async_trait::async_trait;
use ipfs_deploy::name::{IpnsName, MemoryNameService, NameService, Resolution, SignedRecord};
use ipfs_deploy::{ContentId, ContentUploader, DeployConfig, DeployError, FileEntry, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Uploader that returns a fixed CID (or status) and records what it saw.
pub struct RecordingUploader {
    cid: String,
    fail_with: Option<u16>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl RecordingUploader {
    pub fn returning(cid: &str) -> Self {
        Self {
            cid: cid.to_string(),
            fail_with: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            fail_with: Some(status),
            ..Self::returning("")
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        let mut seen = self.seen.lock().unwrap().clone();
        seen.sort();
        seen
    }
}

#[async_trait]
impl ContentUploader for RecordingUploader {
    async fn upload(&self, folder: &str, files: &[FileEntry]) -> Result<ContentId> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        {
            let mut seen = self.seen.lock().unwrap();
            for file in files {
                seen.push(format!("{folder}/{}", file.relative_path));
            }
        }
        match self.fail_with {
            Some(status) => Err(DeployError::UploadRejected {
                status,
                body: "internal error".into(),
            }),
            None => Ok(ContentId::new(self.cid.clone())),
        }
    }
}

/// Name service wrapper counting calls, optionally forcing a resolution.
#[derive(Default)]
pub struct CountingNames {
    pub inner: MemoryNameService,
    forced: Option<Resolution>,
    resolves: AtomicUsize,
    publishes: AtomicUsize,
}

impl CountingNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolution(resolution: Resolution) -> Self {
        Self {
            forced: Some(resolution),
            ..Self::default()
        }
    }

    pub fn resolves(&self) -> usize {
        self.resolves.load(Ordering::SeqCst)
    }

    pub fn publishes(&self) -> usize {
        self.publishes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NameService for CountingNames {
    async fn resolve(&self, name: &IpnsName) -> Resolution {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        match &self.forced {
            Some(resolution) => resolution.clone(),
            None => self.inner.resolve(name).await,
        }
    }

    async fn publish(&self, name: &IpnsName, record: &SignedRecord) -> Result<()> {
        self.publishes.fetch_add(1, Ordering::SeqCst);
        self.inner.publish(name, record).await
    }
}

pub fn write_file(root: &Path, rel: &str, body: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

/// Config rooted in `dir` with credentials present.
pub fn test_config(dir: &Path, extra: &[(&str, &str)]) -> DeployConfig {
    let mut env: HashMap<String, String> = HashMap::from([
        (
            "IPFS_DEPLOY_ROOT_DIR".to_string(),
            dir.join("public").display().to_string(),
        ),
        (
            "IPFS_DEPLOY_REPORT_PATH".to_string(),
            dir.join("latest-ipfs.txt").display().to_string(),
        ),
        ("PINATA_JWT".to_string(), "test-jwt".to_string()),
    ]);
    for (k, v) in extra {
        env.insert(k.to_string(), v.to_string());
    }
    DeployConfig::load_with_env(None, env).unwrap()
}
