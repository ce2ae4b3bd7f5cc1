// Re-export all model types for ease of use

pub mod record;
pub mod upload;

pub use record::{Column, ColumnKind, Record, RecordStore, TableSchema};
pub use upload::{DeferredUploads, UploadDatum, UploadStatus};
