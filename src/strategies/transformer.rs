//! Default pass-through content transformer

use anyhow::Result;

use crate::config::FieldConfig;
use crate::models::{Record, UploadDatum};

use super::{ContentTransformer, TransformOutputs};

/// Hands the temporary upload through unchanged as a single output named
/// after the resolved filename. The pipeline injects the resolved filename
/// into the datum's client name before invoking transformers.
#[derive(Debug, Default)]
pub struct PassthroughTransformer;

impl ContentTransformer for PassthroughTransformer {
    fn transform(
        &self,
        _record: &Record,
        datum: &UploadDatum,
        _field: &str,
        _settings: &FieldConfig,
    ) -> Result<TransformOutputs> {
        Ok(vec![(datum.tmp_path.clone(), datum.client_name.clone())])
    }
}
