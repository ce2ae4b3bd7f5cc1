/*!
 * Attache: file upload handling for record persistence lifecycles
 *
 * This crate hooks into the create/update/delete lifecycle of a record
 * store. For configured fields it treats the incoming field value as a
 * file upload: a path resolver computes the destination, a content
 * transformer produces one or more output files, and a storage writer
 * persists them. Stored filename, directory, size and mime type are
 * mirrored back onto the record's columns.
 *
 * Paths that embed the record's primary key are handled in two phases:
 * the upload is set aside before the initial insert and replayed after
 * the key is assigned, followed by a minimal, hook-free column update so
 * the derived metadata is persisted without re-entering the lifecycle.
 */

pub mod behavior;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod storage;
pub mod strategies;

pub use behavior::{AllowEmptyUploads, AttachmentBehavior, EmptyUploadPolicy};
pub use config::{
    BehaviorConfig, FieldConfig, MetadataColumns, StrategyChoice, PRIMARY_KEY_PLACEHOLDER,
};
pub use error::AttachmentError;
pub use models::{
    ColumnKind, DeferredUploads, Record, RecordStore, TableSchema, UploadDatum, UploadStatus,
};
pub use storage::{local::LocalStorageWriter, StorageWriter, WriteReport};
pub use strategies::{
    ContentTransformer, PathResolver, ResolvedPath, StrategyRegistry, TransformOutputs,
};
