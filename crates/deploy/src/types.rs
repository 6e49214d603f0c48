use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A regular file discovered under the publish root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path used to open the file.
    pub absolute_path: PathBuf,
    /// Path below the root, always `/`-separated.
    pub relative_path: String,
}

/// Opaque content identifier returned by the pinning service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(cid: impl Into<String>) -> Self {
        Self(cid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// IPNS value pointing at this content.
    pub fn ipfs_path(&self) -> String {
        format!("/ipfs/{}", self.0)
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
