//! Upload payload types carried through one save attempt

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Status of one file submission, mirrored from the transport layer.
///
/// Only `Ok` uploads are processed; every other status makes the field
/// pipeline skip the field for that save attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Ok,
    /// No file was submitted for the field.
    NoFile,
    /// The upload exceeded the transport's size limit.
    TooLarge,
    /// The upload was interrupted and only partially received.
    Partial,
    /// Any other transport-level failure.
    Failed,
}

/// The raw upload payload for one field on one save attempt.
///
/// Serializable so it can travel as an ordinary record field value until
/// the pipeline replaces it with the stored filename.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadDatum {
    /// Where the transport layer parked the received bytes.
    pub tmp_path: PathBuf,
    /// Declared size in bytes.
    pub size: u64,
    /// Declared mime type.
    pub mime_type: String,
    pub status: UploadStatus,
    /// Original client-supplied filename.
    pub client_name: String,
}

impl UploadDatum {
    pub fn new(
        tmp_path: impl Into<PathBuf>,
        size: u64,
        mime_type: impl Into<String>,
        status: UploadStatus,
        client_name: impl Into<String>,
    ) -> Self {
        Self {
            tmp_path: tmp_path.into(),
            size,
            mime_type: mime_type.into(),
            status,
            client_name: client_name.into(),
        }
    }

    /// Build a datum from an already-written temporary file, taking the
    /// size from the file and guessing the mime type from the client name.
    pub async fn from_temp_file(
        tmp_path: impl Into<PathBuf>,
        client_name: impl Into<String>,
    ) -> Result<Self> {
        let tmp_path = tmp_path.into();
        let client_name = client_name.into();
        let meta = tokio::fs::metadata(&tmp_path).await?;
        let mime = mime_guess::from_path(&client_name).first_or_octet_stream();
        Ok(Self {
            tmp_path,
            size: meta.len(),
            mime_type: mime.essence_str().to_string(),
            status: UploadStatus::Ok,
            client_name,
        })
    }

    pub fn is_ok(&self) -> bool {
        self.status == UploadStatus::Ok
    }
}

/// Uploads set aside between the two save phases because their destination
/// path depends on the not-yet-assigned primary key.
///
/// An explicit side channel handed from `before_save` to `after_save`
/// rather than scratch state on the record itself. Entries keep insertion
/// order; the orchestrator inserts in configuration order so the deferred
/// pass replays fields in the same order a single-pass save would use.
#[derive(Debug, Default)]
pub struct DeferredUploads {
    entries: Vec<(String, UploadDatum)>,
}

impl DeferredUploads {
    pub fn insert(&mut self, field: impl Into<String>, datum: UploadDatum) {
        self.entries.push((field.into(), datum));
    }

    /// Remove and return the datum for `field`, consuming the entry.
    pub fn take(&mut self, field: &str) -> Option<UploadDatum> {
        let idx = self.entries.iter().position(|(name, _)| name == field)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
