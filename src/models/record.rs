//! Record and schema types, plus the store interface the deferred pass needs

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Logical kind of a table column.
///
/// Supplied to the store's schema layer at construction time; there is no
/// process-wide type registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Scalar,
    /// Column whose value is the stored filename of an uploaded file.
    UploadedFile,
}

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// Schema of the table the behavior is attached to.
///
/// The hook-free metadata update is restricted to these columns; mutated
/// record fields without a matching column are never sent to the store.
#[derive(Debug, Clone)]
pub struct TableSchema {
    table: String,
    columns: Vec<Column>,
}

impl TableSchema {
    pub fn new(
        table: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            table: table.into(),
            columns: columns
                .into_iter()
                .map(|name| Column {
                    name: name.into(),
                    kind: ColumnKind::Scalar,
                })
                .collect(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column_kind(&self, name: &str) -> Option<ColumnKind> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.kind)
    }

    /// Mark `name` as carrying an uploaded file. Returns false when the
    /// schema has no such column.
    pub(crate) fn mark_uploaded(&mut self, name: &str) -> bool {
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(column) => {
                column.kind = ColumnKind::UploadedFile;
                true
            }
            None => false,
        }
    }
}

/// One persistable business entity flowing through the lifecycle.
///
/// Field values are JSON so an upload payload can travel as an ordinary
/// field value until the pipeline replaces it with the stored filename.
/// Every `set` marks the field dirty; the store owning the record is
/// expected to clear dirty tracking whenever it persists.
#[derive(Debug, Clone)]
pub struct Record {
    primary_key: String,
    values: Map<String, Value>,
    dirty: HashSet<String>,
}

impl Record {
    /// Create a record over `values` with clean dirty tracking.
    pub fn new(primary_key: impl Into<String>, values: Map<String, Value>) -> Self {
        Self {
            primary_key: primary_key.into(),
            values,
            dirty: HashSet::new(),
        }
    }

    pub fn primary_key_column(&self) -> &str {
        &self.primary_key
    }

    /// Current primary key value, if assigned.
    pub fn key(&self) -> Option<&Value> {
        self.values.get(&self.primary_key)
    }

    /// Whether the primary key is assigned and usable. Null and empty
    /// string count as unassigned.
    pub fn has_key(&self) -> bool {
        match self.key() {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }

    /// Primary key rendered for path substitution.
    pub fn key_string(&self) -> Option<String> {
        match self.key()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.values.get(field).and_then(Value::as_str)
    }

    /// Set a field value and mark it dirty.
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        let field = field.into();
        self.dirty.insert(field.clone());
        self.values.insert(field, value);
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn dirty_fields(&self) -> impl Iterator<Item = &str> {
        self.dirty.iter().map(String::as_str)
    }

    /// Forget all pending mutations without persisting them.
    pub fn clear_dirty(&mut self) {
        self.dirty.clear();
    }

    /// Mutated values restricted to the schema's columns, the payload of
    /// the hook-free minimal update.
    pub fn dirty_values(&self, schema: &TableSchema) -> Map<String, Value> {
        self.values
            .iter()
            .filter(|(name, _)| self.dirty.contains(*name) && schema.has_column(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

/// Interface to the underlying record store, reduced to the one direct
/// update primitive the deferred pass needs.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Update the given columns of the row identified by `key`, bypassing
    /// the save lifecycle entirely. Returns false when no row was updated.
    async fn update_columns(
        &self,
        table: &str,
        key: &Value,
        values: Map<String, Value>,
    ) -> Result<bool>;
}
