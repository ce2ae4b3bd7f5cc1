//! Local filesystem storage writer implementation

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use tokio::fs;
use tracing::{error, info, warn};

use super::{StorageWriter, WriteReport};

/// Local filesystem writer rooted at an upload directory.
///
/// Relative output names are joined under the root; leading separators are
/// stripped so a template like `/uploads/{id}/avatar` still lands inside
/// the root.
pub struct LocalStorageWriter {
    root: PathBuf,
}

impl LocalStorageWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn target_path(&self, relative: &str) -> PathBuf {
        self.root.join(relative.trim_start_matches(['/', '\\']))
    }

    async fn copy_one(&self, source: &Path, target: &Path) -> Result<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(source, target).await?;
        Ok(())
    }
}

#[async_trait]
impl StorageWriter for LocalStorageWriter {
    async fn write(&self, files: &[(PathBuf, String)]) -> Result<WriteReport> {
        let mut report = WriteReport::with_capacity(files.len());
        for (source, name) in files {
            let target = self.target_path(name);
            match self.copy_one(source, &target).await {
                Ok(()) => {
                    info!("Stored upload locally: {}", target.display());
                    report.push((name.clone(), true));
                }
                Err(e) => {
                    error!(
                        "Failed to store {} as {}: {}",
                        source.display(),
                        target.display(),
                        e
                    );
                    report.push((name.clone(), false));
                }
            }
        }
        Ok(report)
    }

    async fn delete(&self, paths: &[String]) -> Result<Vec<bool>> {
        let mut results = Vec::with_capacity(paths.len());
        for path in paths {
            let target = self.target_path(path);
            match fs::remove_file(&target).await {
                Ok(()) => {
                    info!("Deleted file: {}", target.display());
                    results.push(true);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    info!("File already deleted: {}", target.display());
                    results.push(true);
                }
                Err(e) => {
                    warn!("Failed to delete file {}: {}", target.display(), e);
                    results.push(false);
                }
            }
        }
        Ok(results)
    }

    fn storage_type(&self) -> &'static str {
        "local"
    }
}
