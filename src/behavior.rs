//! Lifecycle orchestration: the save and delete phases of the behavior

use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::config::{BehaviorConfig, StrategyChoice};
use crate::error::AttachmentError;
use crate::models::{DeferredUploads, Record, RecordStore, TableSchema, UploadDatum, UploadStatus};
use crate::pipeline::{join_under, FieldPipeline};
use crate::strategies::StrategyRegistry;

/// Consulted per field to decide whether an empty (no file submitted)
/// value is permitted and may be stripped before record construction.
pub trait EmptyUploadPolicy: Send + Sync {
    fn allows_empty(&self, field: &str) -> bool;
}

/// Default policy: empty submissions are always permitted.
#[derive(Debug, Default)]
pub struct AllowEmptyUploads;

impl EmptyUploadPolicy for AllowEmptyUploads {
    fn allows_empty(&self, _field: &str) -> bool {
        true
    }
}

/// The attachment behavior for one table.
///
/// Hook this into the record store's lifecycle at four points:
/// [`before_marshal`](Self::before_marshal) when raw data arrives,
/// [`before_save`](Self::before_save) before the record is persisted,
/// [`after_save`](Self::after_save) once the key is known, and
/// [`after_delete`](Self::after_delete) after the record is removed.
///
/// Fields are processed strictly in configuration insertion order, one at
/// a time; nothing inside a save or delete call runs concurrently.
pub struct AttachmentBehavior {
    schema: TableSchema,
    fields: Vec<FieldPipeline>,
}

impl std::fmt::Debug for AttachmentBehavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachmentBehavior")
            .field("schema", &self.schema)
            .field("fields", &self.fields.iter().map(|p| &p.name).collect::<Vec<_>>())
            .finish()
    }
}

impl AttachmentBehavior {
    /// Resolve the configured strategies against the registry and mark
    /// each configured column as carrying an uploaded file. An unknown
    /// strategy name or a field without a schema column is a fatal
    /// configuration error.
    pub fn new(
        config: BehaviorConfig,
        mut schema: TableSchema,
        registry: &StrategyRegistry,
    ) -> Result<Self, AttachmentError> {
        let mut fields = Vec::with_capacity(config.len());
        for (name, settings) in config.iter() {
            if !schema.mark_uploaded(name) {
                return Err(AttachmentError::Configuration {
                    field: name.to_string(),
                    message: format!("no column '{}' in table '{}'", name, schema.table()),
                });
            }

            let resolver = match &settings.resolver {
                StrategyChoice::Instance(instance) => instance.clone(),
                StrategyChoice::Named(id) => registry.resolver(id).ok_or_else(|| {
                    AttachmentError::Configuration {
                        field: name.to_string(),
                        message: format!("unknown path resolver '{}'", id),
                    }
                })?,
            };
            let transformer = match &settings.transformer {
                StrategyChoice::Instance(instance) => instance.clone(),
                StrategyChoice::Named(id) => registry.transformer(id).ok_or_else(|| {
                    AttachmentError::Configuration {
                        field: name.to_string(),
                        message: format!("unknown content transformer '{}'", id),
                    }
                })?,
            };
            let writer = match &settings.writer {
                StrategyChoice::Instance(instance) => instance.clone(),
                StrategyChoice::Named(id) => registry.writer(id).ok_or_else(|| {
                    AttachmentError::Configuration {
                        field: name.to_string(),
                        message: format!("unknown storage writer '{}'", id),
                    }
                })?,
            };

            fields.push(FieldPipeline {
                name: name.to_string(),
                settings: settings.clone(),
                resolver,
                transformer,
                writer,
            });
        }
        info!(
            "Attachment behavior ready for table '{}' with {} field(s)",
            schema.table(),
            fields.len()
        );
        Ok(Self { schema, fields })
    }

    /// Schema with the configured columns marked as uploaded-file columns,
    /// for handing to the store's schema layer.
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Names of the configured fields, in processing order.
    pub fn configured_fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Strip permitted empty submissions from raw incoming data before the
    /// record is built, so a "no file" value never reaches the column.
    pub fn before_marshal(&self, data: &mut Map<String, Value>, policy: &dyn EmptyUploadPolicy) {
        for field in &self.fields {
            let Some(datum) = decode_datum(data.get(&field.name)) else {
                continue;
            };
            if datum.status == UploadStatus::NoFile && policy.allows_empty(&field.name) {
                debug!("Stripping empty upload for field '{}'", field.name);
                data.remove(&field.name);
            }
        }
    }

    /// First save phase, invoked before the record is persisted.
    ///
    /// Fields whose template depends on a primary key the record does not
    /// have yet are moved into the returned [`DeferredUploads`] and their
    /// live value blanked, so no unresolved placeholder text is ever
    /// persisted. Every other field with an Ok upload runs through the
    /// pipeline; the first failure aborts the save.
    pub async fn before_save(
        &self,
        record: &mut Record,
    ) -> Result<DeferredUploads, AttachmentError> {
        let mut deferred = DeferredUploads::default();
        for field in &self.fields {
            let Some(datum) = decode_datum(record.get(&field.name)) else {
                continue;
            };
            if !datum.is_ok() {
                debug!(
                    "Skipping field '{}': upload status is {:?}",
                    field.name, datum.status
                );
                continue;
            }
            if field.settings.path_depends_on_key() && !record.has_key() {
                debug!(
                    "Deferring field '{}' until the primary key is assigned",
                    field.name
                );
                record.set(&field.name, Value::String(String::new()));
                deferred.insert(&field.name, datum);
                continue;
            }
            field.run(record, &datum).await?;
        }
        Ok(deferred)
    }

    /// Second save phase, invoked after the record is persisted and the
    /// key is assigned. Replays the deferred fields in configuration
    /// order, then persists any resulting column mutations through a
    /// hook-free minimal update. The record is expected to arrive with
    /// dirty tracking cleared by the initial persistence.
    pub async fn after_save(
        &self,
        record: &mut Record,
        mut deferred: DeferredUploads,
        store: &dyn RecordStore,
    ) -> Result<(), AttachmentError> {
        if deferred.is_empty() {
            return Ok(());
        }
        for field in &self.fields {
            let Some(datum) = deferred.take(&field.name) else {
                continue;
            };
            let restored =
                serde_json::to_value(&datum).map_err(|e| AttachmentError::Strategy(e.into()))?;
            record.set(&field.name, restored);
            field.run(record, &datum).await?;
        }
        if record.is_dirty() {
            self.persist_metadata(record, store).await?;
        }
        Ok(())
    }

    /// Hook-free minimal update: the mutated values intersected with the
    /// table's columns, keyed by primary key, issued directly against the
    /// store so the save lifecycle is not re-entered. Dirty tracking is
    /// cleared once the update has been issued, whatever its outcome.
    async fn persist_metadata(
        &self,
        record: &mut Record,
        store: &dyn RecordStore,
    ) -> Result<(), AttachmentError> {
        if !record.has_key() {
            error!(
                "Cannot persist upload metadata for table '{}': record has no primary key",
                self.schema.table()
            );
            return Err(AttachmentError::MetadataNotPersisted {
                reason: "record has no primary key".to_string(),
            });
        }
        let key = record
            .key()
            .cloned()
            .unwrap_or(Value::Null);
        let values = record.dirty_values(&self.schema);
        if values.is_empty() {
            record.clear_dirty();
            return Ok(());
        }

        let columns: Vec<&String> = values.keys().collect();
        debug!(
            "Persisting upload metadata for table '{}' key {}: {:?}",
            self.schema.table(),
            key,
            columns
        );
        let result = store
            .update_columns(self.schema.table(), &key, values)
            .await;
        record.clear_dirty();
        match result {
            Ok(true) => Ok(()),
            Ok(false) => Err(AttachmentError::MetadataNotPersisted {
                reason: "direct column update matched no row".to_string(),
            }),
            Err(e) => Err(AttachmentError::MetadataNotPersisted {
                reason: e.to_string(),
            }),
        }
    }

    /// Invoked after the record is deleted. Removes the stored file for
    /// every field not marked keep-on-delete, computing the path from the
    /// stored dir column plus the field's stored filename. All fields are
    /// processed even when one fails; failures are aggregated into a
    /// single error.
    pub async fn after_delete(&self, record: &Record) -> Result<(), AttachmentError> {
        let mut failed = Vec::new();
        for field in &self.fields {
            if field.settings.keep_files_on_delete {
                continue;
            }
            let Some(filename) = record.get_str(&field.name).filter(|s| !s.is_empty()) else {
                continue;
            };
            let dir = record.get_str(&field.settings.columns.dir).unwrap_or("");
            let path = join_under(dir, filename);
            match field.writer.delete(std::slice::from_ref(&path)).await {
                Ok(results) if results.iter().all(|ok| *ok) => {
                    debug!("Deleted stored file {} for field '{}'", path, field.name);
                }
                Ok(_) => {
                    warn!(
                        "Writer '{}' failed to delete {} for field '{}'",
                        field.writer.storage_type(),
                        path,
                        field.name
                    );
                    failed.push(field.name.clone());
                }
                Err(e) => {
                    error!("Delete failed for field '{}': {}", field.name, e);
                    failed.push(field.name.clone());
                }
            }
        }
        if failed.is_empty() {
            Ok(())
        } else {
            Err(AttachmentError::DeleteFailed { fields: failed })
        }
    }
}

/// Decode a field value back into an upload datum. Values that are not
/// upload payloads (plain filenames, nulls) yield None and the field is
/// left alone.
fn decode_datum(value: Option<&Value>) -> Option<UploadDatum> {
    serde_json::from_value(value?.clone()).ok()
}
