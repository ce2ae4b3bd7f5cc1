/*!
 * Unit tests for the template path resolver.
 *
 * The default resolver substitutes the primary key and field placeholders,
 * takes the template's last segment as the filename stem and the client
 * name's extension as the extension.
 */

use attache::strategies::{PathResolver, TemplatePathResolver};
use attache::{FieldConfig, Record, UploadDatum, UploadStatus};
use serde_json::json;

fn record_with(values: serde_json::Value) -> Record {
    match values {
        serde_json::Value::Object(map) => Record::new("id", map),
        _ => panic!("expected a JSON object"),
    }
}

fn datum(client_name: &str) -> UploadDatum {
    UploadDatum::new("/tmp/upload1", 4, "image/png", UploadStatus::Ok, client_name)
}

#[test]
fn test_primary_key_placeholder_substitution() {
    let record = record_with(json!({ "id": 42 }));
    let settings = FieldConfig::new("/uploads/{id}/avatar");

    let resolved = TemplatePathResolver
        .resolve(&record, &datum("me.png"), "avatar", &settings)
        .unwrap();

    assert_eq!(resolved.basepath, "/uploads/42");
    assert_eq!(resolved.filename, "avatar.png");
}

#[test]
fn test_string_primary_key() {
    let record = record_with(json!({ "id": "abc-123" }));
    let settings = FieldConfig::new("/files/{id}/doc");

    let resolved = TemplatePathResolver
        .resolve(&record, &datum("report.pdf"), "doc", &settings)
        .unwrap();

    assert_eq!(resolved.basepath, "/files/abc-123");
    assert_eq!(resolved.filename, "doc.pdf");
}

#[test]
fn test_field_placeholder_substitution() {
    let record = record_with(json!({ "id": 1 }));
    let settings = FieldConfig::new("/files/{field}/original");

    let resolved = TemplatePathResolver
        .resolve(&record, &datum("x.txt"), "doc", &settings)
        .unwrap();

    assert_eq!(resolved.basepath, "/files/doc");
    assert_eq!(resolved.filename, "original.txt");
}

#[test]
fn test_client_name_without_extension_keeps_stem() {
    let record = record_with(json!({ "id": 7 }));
    let settings = FieldConfig::new("/uploads/{id}/avatar");

    let resolved = TemplatePathResolver
        .resolve(&record, &datum("rawfile"), "avatar", &settings)
        .unwrap();

    assert_eq!(resolved.filename, "avatar");
}

#[test]
fn test_template_without_directory() {
    let record = record_with(json!({}));
    let settings = FieldConfig::new("avatar");

    let resolved = TemplatePathResolver
        .resolve(&record, &datum("me.png"), "avatar", &settings)
        .unwrap();

    assert_eq!(resolved.basepath, "");
    assert_eq!(resolved.filename, "avatar.png");
}

#[test]
fn test_missing_key_is_an_error() {
    let record = record_with(json!({}));
    let settings = FieldConfig::new("/uploads/{id}/avatar");

    let result = TemplatePathResolver.resolve(&record, &datum("me.png"), "avatar", &settings);
    assert!(result.is_err());
}

#[test]
fn test_empty_filename_segment_is_an_error() {
    let record = record_with(json!({ "id": 1 }));
    let settings = FieldConfig::new("/uploads/{id}/");

    let result = TemplatePathResolver.resolve(&record, &datum("me.png"), "avatar", &settings);
    assert!(result.is_err());
}

#[test]
fn test_resolution_is_deterministic() {
    let record = record_with(json!({ "id": 42 }));
    let settings = FieldConfig::new("/uploads/{id}/avatar");

    let first = TemplatePathResolver
        .resolve(&record, &datum("me.png"), "avatar", &settings)
        .unwrap();
    let second = TemplatePathResolver
        .resolve(&record, &datum("me.png"), "avatar", &settings)
        .unwrap();
    assert_eq!(first, second);
}
