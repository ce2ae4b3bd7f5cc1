//! Error types surfaced by the attachment lifecycle

use thiserror::Error;

/// Failure modes of the attachment behavior.
///
/// Configuration problems are raised at construction time and are fatal.
/// Runtime failures surface to the lifecycle caller; the behavior performs
/// no retries and no cleanup of files already written in the same call.
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// A strategy identifier that names no registered implementation, or a
    /// configured field without a matching schema column.
    #[error("configuration error for field '{field}': {message}")]
    Configuration { field: String, message: String },

    /// The storage writer reported at least one failed output for a field.
    /// Remaining fields of the same save call are not processed.
    #[error("storage writer failed for field '{field}', outputs: {failed:?}")]
    WriteFailed { field: String, failed: Vec<String> },

    /// The hook-free column update after a deferred pass could not be
    /// issued or reported no row updated. Unrecoverable: the deferred pass
    /// is the only opportunity to persist key-dependent metadata.
    #[error("deferred upload metadata not persisted: {reason}")]
    MetadataNotPersisted { reason: String },

    /// One or more per-field file deletions failed during record deletion.
    #[error("file deletion failed for field(s) {fields:?}")]
    DeleteFailed { fields: Vec<String> },

    /// Error propagated from a resolver, transformer or writer strategy.
    #[error(transparent)]
    Strategy(#[from] anyhow::Error),
}
