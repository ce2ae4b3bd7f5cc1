//! Per-field configuration of the attachment behavior

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::storage::StorageWriter;
use crate::strategies::{ContentTransformer, PathResolver};

/// Placeholder substituted with the record's primary key by the default
/// resolver. Its presence in a template defers the field on unsaved
/// records until the key is assigned.
pub const PRIMARY_KEY_PLACEHOLDER: &str = "{id}";

/// Placeholder substituted with the field name by the default resolver.
pub const FIELD_PLACEHOLDER: &str = "{field}";

/// A strategy selected either by registered name or as a first-class
/// instance. Names are resolved against the registry once, when the
/// behavior is constructed.
pub enum StrategyChoice<T: ?Sized> {
    Named(String),
    Instance(Arc<T>),
}

impl<T: ?Sized> StrategyChoice<T> {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl<T: ?Sized> Clone for StrategyChoice<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Named(name) => Self::Named(name.clone()),
            Self::Instance(inner) => Self::Instance(Arc::clone(inner)),
        }
    }
}

impl<T: ?Sized> fmt::Debug for StrategyChoice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "Named({:?})", name),
            Self::Instance(_) => f.write_str("Instance(..)"),
        }
    }
}

/// Names of the columns receiving upload metadata next to the field itself.
#[derive(Debug, Clone)]
pub struct MetadataColumns {
    pub dir: String,
    pub size: String,
    pub mime: String,
}

impl Default for MetadataColumns {
    fn default() -> Self {
        Self {
            dir: "dir".to_string(),
            size: "size".to_string(),
            mime: "type".to_string(),
        }
    }
}

/// Settings for one upload-handling field.
#[derive(Debug, Clone)]
pub struct FieldConfig {
    /// Destination template, e.g. `/uploads/{id}/avatar`. The last path
    /// segment is the filename stem for the default resolver.
    pub path_template: String,
    pub columns: MetadataColumns,
    pub resolver: StrategyChoice<dyn PathResolver>,
    pub transformer: StrategyChoice<dyn ContentTransformer>,
    pub writer: StrategyChoice<dyn StorageWriter>,
    /// When true (the default) record deletion leaves stored files alone.
    pub keep_files_on_delete: bool,
    /// Strategy-specific settings; empty unless a strategy needs them.
    pub options: Map<String, Value>,
}

impl FieldConfig {
    pub fn new(path_template: impl Into<String>) -> Self {
        Self {
            path_template: path_template.into(),
            columns: MetadataColumns::default(),
            resolver: StrategyChoice::named("template"),
            transformer: StrategyChoice::named("passthrough"),
            writer: StrategyChoice::named("local"),
            keep_files_on_delete: true,
            options: Map::new(),
        }
    }

    pub fn with_columns(mut self, dir: &str, size: &str, mime: &str) -> Self {
        self.columns = MetadataColumns {
            dir: dir.to_string(),
            size: size.to_string(),
            mime: mime.to_string(),
        };
        self
    }

    pub fn with_resolver(mut self, resolver: StrategyChoice<dyn PathResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_transformer(mut self, transformer: StrategyChoice<dyn ContentTransformer>) -> Self {
        self.transformer = transformer;
        self
    }

    pub fn with_writer(mut self, writer: StrategyChoice<dyn StorageWriter>) -> Self {
        self.writer = writer;
        self
    }

    pub fn keep_files_on_delete(mut self, keep: bool) -> Self {
        self.keep_files_on_delete = keep;
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Whether the destination depends on the record's primary key.
    pub fn path_depends_on_key(&self) -> bool {
        self.path_template.contains(PRIMARY_KEY_PLACEHOLDER)
    }
}

/// Field configurations in insertion order.
///
/// Processing order is this order, both for the initial pass and the
/// deferred pass, so later fields can rely on mutations made by earlier
/// ones.
#[derive(Debug, Clone, Default)]
pub struct BehaviorConfig {
    fields: Vec<(String, FieldConfig)>,
}

impl BehaviorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a field configuration. Replacing keeps the field's
    /// original position.
    pub fn field(mut self, name: impl Into<String>, config: FieldConfig) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = config,
            None => self.fields.push((name, config)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldConfig> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldConfig)> {
        self.fields.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FieldConfig::new("/uploads/{id}/avatar");
        assert!(config.keep_files_on_delete);
        assert!(config.path_depends_on_key());
        assert_eq!(config.columns.dir, "dir");
        assert_eq!(config.columns.size, "size");
        assert_eq!(config.columns.mime, "type");
        assert!(config.options.is_empty());
    }

    #[test]
    fn test_insertion_order_preserved_on_replace() {
        let config = BehaviorConfig::new()
            .field("avatar", FieldConfig::new("/a/avatar"))
            .field("doc", FieldConfig::new("/b/doc"))
            .field("avatar", FieldConfig::new("/c/avatar"));

        let order: Vec<&str> = config.iter().map(|(n, _)| n).collect();
        assert_eq!(order, vec!["avatar", "doc"]);
        assert_eq!(config.get("avatar").unwrap().path_template, "/c/avatar");
    }
}
