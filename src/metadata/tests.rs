#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::diagnostics::{DiagnosticKind, Diagnostics, Severity};

const PETS_YAML: &str = r#"
assembly: Contoso.Pets
types:
  - kind: object
    name: Contoso.Pets.Models.Pet
    fields:
      - { name: Id, type: System.Int64, required: true }
      - { name: Nickname, type: System.String, nullable: true }
  - kind: enum
    name: Contoso.Pets.Models.Color
    values: [Red, Green]
"#;

#[test]
fn test_loads_yaml_metadata() {
    let diagnostics = Diagnostics::new();
    let catalog = TypeCatalog::load(
        &[MetadataSource::new("pets.yaml", PETS_YAML)],
        &diagnostics,
        false,
    );

    assert!(diagnostics.is_empty());
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.source_count(), 1);
    assert_eq!(catalog.assemblies(), &["Contoso.Pets".to_string()]);

    match catalog.get("T:Contoso.Pets.Models.Pet").unwrap() {
        TypeDecl::Object {
            ordered, fields, ..
        } => {
            assert!(!ordered);
            assert_eq!(fields.len(), 2);
            assert!(fields[0].required);
            assert!(fields[1].nullable);
            assert_eq!(fields[1].type_name, "System.String");
        }
        other => panic!("expected object, got {other:?}"),
    }
    assert!(matches!(
        catalog.get("Contoso.Pets.Models.Color"),
        Some(TypeDecl::Enum { values, .. }) if values.len() == 2
    ));
}

#[test]
fn test_loads_json_metadata() {
    let json = r#"{"types":[{"kind":"object","name":"Contoso.Owner","ordered":true,
        "fields":[{"name":"Name","type":"System.String"}]}]}"#;
    let diagnostics = Diagnostics::new();
    let catalog = TypeCatalog::load(
        &[MetadataSource::new("owner.JSON", json)],
        &diagnostics,
        true,
    );

    assert!(diagnostics.is_empty());
    assert!(matches!(
        catalog.get("Contoso.Owner"),
        Some(TypeDecl::Object { ordered: true, .. })
    ));
}

#[test]
fn test_invalid_document_is_reported_and_skipped() {
    let diagnostics = Diagnostics::new();
    let catalog = TypeCatalog::load(
        &[
            MetadataSource::new("broken.yaml", "types: [ { kind: widget, name: X } ]"),
            MetadataSource::new("pets.yaml", PETS_YAML),
        ],
        &diagnostics,
        false,
    );

    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.source_count(), 2);
    let all = diagnostics.snapshot();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].kind, DiagnosticKind::MalformedInput);
    assert!(all[0].message.contains("broken.yaml"));
}

#[test]
fn test_duplicate_declaration_later_wins() {
    let override_yaml = r#"
types:
  - kind: enum
    name: Contoso.Pets.Models.Color
    values: [Blue]
"#;
    let diagnostics = Diagnostics::new();
    let catalog = TypeCatalog::load(
        &[
            MetadataSource::new("pets.yaml", PETS_YAML),
            MetadataSource::new("override.yaml", override_yaml),
        ],
        &diagnostics,
        false,
    );

    let all = diagnostics.snapshot();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].severity, Severity::Warning);
    assert_eq!(all[0].kind, DiagnosticKind::DuplicateType);
    assert_eq!(
        catalog.get("Contoso.Pets.Models.Color"),
        Some(&TypeDecl::Enum {
            name: "Contoso.Pets.Models.Color".to_string(),
            values: vec!["Blue".to_string()],
        })
    );
}
