//! Storage backend abstraction for uploaded files
//!
//! This module provides the write/delete strategy contract the field
//! pipeline talks to, with a unified interface over different backends
//! (local filesystem by default).

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;

pub mod local;

/// Per-output success report for one field's write, ordered like the
/// requested outputs. Any false entry fails the field.
pub type WriteReport = Vec<(String, bool)>;

/// Strategy persisting and deleting files in a storage backend.
#[async_trait]
pub trait StorageWriter: Send + Sync {
    /// Persist each absolute source file under its final relative name.
    /// The report contains one entry per requested output, in input order;
    /// a failed copy is reported as false rather than an error so the
    /// caller can see which outputs were affected.
    async fn write(&self, files: &[(PathBuf, String)]) -> Result<WriteReport>;

    /// Delete the given paths, reporting success per path in input order.
    /// Deleting a file that does not exist counts as success, so repeated
    /// deletes stay safe.
    async fn delete(&self, paths: &[String]) -> Result<Vec<bool>>;

    /// Human-readable identifier for this backend type, used in logs.
    fn storage_type(&self) -> &'static str;
}
