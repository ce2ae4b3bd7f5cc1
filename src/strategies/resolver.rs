//! Default template-based path resolver

use std::path::Path;

use anyhow::{bail, Result};

use crate::config::{FieldConfig, FIELD_PLACEHOLDER, PRIMARY_KEY_PLACEHOLDER};
use crate::models::{Record, UploadDatum};

use super::{PathResolver, ResolvedPath};

/// Resolves the destination from the field's path template.
///
/// `{id}` is substituted with the record's primary key and `{field}` with
/// the field name. The template's last path segment is the filename stem;
/// the extension is taken from the client-supplied name. For
/// `/uploads/{id}/avatar`, a record with key 42 and a client name of
/// `me.png` resolve to basepath `/uploads/42` and filename `avatar.png`.
#[derive(Debug, Default)]
pub struct TemplatePathResolver;

impl PathResolver for TemplatePathResolver {
    fn resolve(
        &self,
        record: &Record,
        datum: &UploadDatum,
        field: &str,
        settings: &FieldConfig,
    ) -> Result<ResolvedPath> {
        let mut path = settings.path_template.replace(FIELD_PLACEHOLDER, field);

        if path.contains(PRIMARY_KEY_PLACEHOLDER) {
            let Some(key) = record.key_string() else {
                bail!(
                    "path template for field '{}' needs the primary key, but the record has none",
                    field
                );
            };
            path = path.replace(PRIMARY_KEY_PLACEHOLDER, &key);
        }

        let (basepath, stem) = match path.rsplit_once('/') {
            Some((base, stem)) => (base.to_string(), stem.to_string()),
            None => (String::new(), path),
        };
        if stem.is_empty() {
            bail!(
                "path template '{}' for field '{}' has no filename segment",
                settings.path_template,
                field
            );
        }

        let filename = match Path::new(&datum.client_name)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            Some(ext) => format!("{}.{}", stem, ext),
            None => stem,
        };

        Ok(ResolvedPath { basepath, filename })
    }
}
