//! Per-field upload pipeline: resolve, transform, write, mirror metadata

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::FieldConfig;
use crate::error::AttachmentError;
use crate::models::{Record, UploadDatum};
use crate::storage::StorageWriter;
use crate::strategies::{ContentTransformer, PathResolver};

/// One configured field with its strategies resolved. Built once at
/// behavior construction; strategy lookups never happen per call.
pub(crate) struct FieldPipeline {
    pub(crate) name: String,
    pub(crate) settings: FieldConfig,
    pub(crate) resolver: Arc<dyn PathResolver>,
    pub(crate) transformer: Arc<dyn ContentTransformer>,
    pub(crate) writer: Arc<dyn StorageWriter>,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum FieldOutcome {
    Written,
    Skipped,
}

impl FieldPipeline {
    /// Run the field to a single all-or-nothing outcome: either the files
    /// are persisted and all four metadata columns are set, or the record
    /// is left untouched for this field.
    pub(crate) async fn run(
        &self,
        record: &mut Record,
        datum: &UploadDatum,
    ) -> Result<FieldOutcome, AttachmentError> {
        if !datum.is_ok() {
            debug!(
                "Skipping field '{}': upload status is {:?}",
                self.name, datum.status
            );
            return Ok(FieldOutcome::Skipped);
        }

        let resolved = self
            .resolver
            .resolve(record, datum, &self.name, &self.settings)?;

        // Transformers see the resolved filename as the client name.
        let mut datum = datum.clone();
        datum.client_name = resolved.filename.clone();

        let outputs = self
            .transformer
            .transform(record, &datum, &self.name, &self.settings)?;
        let files: Vec<(PathBuf, String)> = outputs
            .into_iter()
            .map(|(source, name)| (source, join_under(&resolved.basepath, &name)))
            .collect();

        let report = self.writer.write(&files).await?;
        let failed: Vec<String> = report
            .iter()
            .filter(|(_, ok)| !ok)
            .map(|(name, _)| name.clone())
            .collect();
        if !failed.is_empty() {
            warn!(
                "Writer '{}' reported {} failed output(s) for field '{}'",
                self.writer.storage_type(),
                failed.len(),
                self.name
            );
            return Err(AttachmentError::WriteFailed {
                field: self.name.clone(),
                failed,
            });
        }

        record.set(&self.name, Value::String(resolved.filename.clone()));
        record.set(
            &self.settings.columns.dir,
            Value::String(resolved.basepath.clone()),
        );
        record.set(&self.settings.columns.size, Value::from(datum.size));
        record.set(
            &self.settings.columns.mime,
            Value::String(datum.mime_type.clone()),
        );
        debug!(
            "Field '{}' stored as {}/{}",
            self.name, resolved.basepath, resolved.filename
        );
        Ok(FieldOutcome::Written)
    }
}

/// Qualify an output name under the resolved base directory.
pub(crate) fn join_under(basepath: &str, name: &str) -> String {
    if basepath.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", basepath.trim_end_matches('/'), name)
    }
}
