//! Iterative directory traversal producing the upload file list.

use crate::errors::{DeployError, Result};
use crate::types::FileEntry;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default limit on directory nesting below the root.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Enumerate every regular file below `root`.
///
/// Uses an explicit worklist instead of recursion. Directories nested deeper
/// than `max_depth` levels below the root abort the walk. Symlinks to files
/// are followed; symlinked directories are skipped so link cycles cannot
/// loop. Ordering of the returned entries is unspecified.
pub fn walk_directory(root: &Path, max_depth: usize) -> Result<Vec<FileEntry>> {
    if !root.is_dir() {
        return Err(DeployError::DirectoryNotFound(root.to_path_buf()));
    }

    let mut files = Vec::new();
    let mut pending: Vec<(PathBuf, usize)> = vec![(root.to_path_buf(), 0)];

    while let Some((dir, depth)) = pending.pop() {
        let entries = fs::read_dir(&dir).map_err(|e| DeployError::filesystem(&dir, e))?;

        for entry in entries {
            let entry = entry.map_err(|e| DeployError::filesystem(&dir, e))?;
            let path = entry.path();
            let file_type = entry
                .file_type()
                .map_err(|e| DeployError::filesystem(&path, e))?;

            if file_type.is_dir() {
                if depth + 1 > max_depth {
                    return Err(DeployError::DepthExceeded { path, max_depth });
                }
                pending.push((path, depth + 1));
                continue;
            }

            if file_type.is_symlink() {
                match fs::metadata(&path) {
                    Ok(meta) if meta.is_file() => {}
                    Ok(_) => {
                        warn!("Skipping symlinked directory {}", path.display());
                        continue;
                    }
                    Err(err) => {
                        warn!("Skipping dangling symlink {}: {}", path.display(), err);
                        continue;
                    }
                }
            } else if !file_type.is_file() {
                debug!("Skipping non-regular entry {}", path.display());
                continue;
            }

            let relative_path = relative_to(root, &path);
            files.push(FileEntry {
                absolute_path: path,
                relative_path,
            });
        }
    }

    debug!("Walked {} files under {}", files.len(), root.display());
    Ok(files)
}

fn relative_to(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
