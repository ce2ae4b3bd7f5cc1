//! Pluggable path-resolution and content-transformation strategies
//!
//! Strategies are registered under a name and looked up once when the
//! behavior is constructed; configurations may also carry first-class
//! instances. The storage writer strategy lives in [`crate::storage`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::config::FieldConfig;
use crate::models::{Record, UploadDatum};
use crate::storage::{local::LocalStorageWriter, StorageWriter};

pub mod resolver;
pub mod transformer;

pub use resolver::TemplatePathResolver;
pub use transformer::PassthroughTransformer;

/// Destination computed for one field's upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Directory portion, stored in the configured `dir` column.
    pub basepath: String,
    /// Final stored filename, stored as the field value.
    pub filename: String,
}

/// Strategy computing the destination directory and stored filename.
///
/// Must be deterministic for identical inputs and pure with respect to
/// storage. Callers guarantee the record's key is assigned before a
/// key-dependent template is resolved.
pub trait PathResolver: Send + Sync {
    fn resolve(
        &self,
        record: &Record,
        datum: &UploadDatum,
        field: &str,
        settings: &FieldConfig,
    ) -> Result<ResolvedPath>;
}

/// Ordered mapping of absolute temp source path to desired output name.
pub type TransformOutputs = Vec<(PathBuf, String)>;

/// Strategy deriving one or more output files from an upload.
///
/// A single pass-through entry for the original file, or several entries
/// for the original plus derivatives. Pure with respect to persisted
/// state; side effects are limited to the temporary files it is given.
pub trait ContentTransformer: Send + Sync {
    fn transform(
        &self,
        record: &Record,
        datum: &UploadDatum,
        field: &str,
        settings: &FieldConfig,
    ) -> Result<TransformOutputs>;
}

/// Ad-hoc closures double as transformers.
impl<F> ContentTransformer for F
where
    F: Fn(&Record, &UploadDatum, &str, &FieldConfig) -> Result<TransformOutputs> + Send + Sync,
{
    fn transform(
        &self,
        record: &Record,
        datum: &UploadDatum,
        field: &str,
        settings: &FieldConfig,
    ) -> Result<TransformOutputs> {
        self(record, datum, field, settings)
    }
}

/// Named strategy implementations for each role.
#[derive(Default)]
pub struct StrategyRegistry {
    resolvers: HashMap<String, Arc<dyn PathResolver>>,
    transformers: HashMap<String, Arc<dyn ContentTransformer>>,
    writers: HashMap<String, Arc<dyn StorageWriter>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in strategies under their default names:
    /// `template`, `passthrough` and a `local` writer rooted at
    /// `upload_root`.
    pub fn with_defaults(upload_root: impl Into<PathBuf>) -> Self {
        let mut registry = Self::new();
        registry.register_resolver("template", Arc::new(TemplatePathResolver));
        registry.register_transformer("passthrough", Arc::new(PassthroughTransformer));
        registry.register_writer("local", Arc::new(LocalStorageWriter::new(upload_root)));
        registry
    }

    pub fn register_resolver(&mut self, name: impl Into<String>, resolver: Arc<dyn PathResolver>) {
        self.resolvers.insert(name.into(), resolver);
    }

    pub fn register_transformer(
        &mut self,
        name: impl Into<String>,
        transformer: Arc<dyn ContentTransformer>,
    ) {
        self.transformers.insert(name.into(), transformer);
    }

    pub fn register_writer(&mut self, name: impl Into<String>, writer: Arc<dyn StorageWriter>) {
        self.writers.insert(name.into(), writer);
    }

    pub fn resolver(&self, name: &str) -> Option<Arc<dyn PathResolver>> {
        self.resolvers.get(name).cloned()
    }

    pub fn transformer(&self, name: &str) -> Option<Arc<dyn ContentTransformer>> {
        self.transformers.get(name).cloned()
    }

    pub fn writer(&self, name: &str) -> Option<Arc<dyn StorageWriter>> {
        self.writers.get(name).cloned()
    }
}
