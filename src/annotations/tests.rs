#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Unit tests for the annotation store

use super::*;
use crate::diagnostics::{DiagnosticKind, Diagnostics, Severity};

const PETS_XML: &str = r#"<?xml version="1.0"?>
<doc>
  <assembly><name>Contoso.Pets</name></assembly>
  <members>
    <member name="M:Contoso.Pets.PetsController.GetPet(System.Int64,System.Boolean)">
      <summary>Gets the pet identified by <paramref name="id"/>.</summary>
      <remarks>Returns a <see cref="T:Contoso.Pets.Models.Pet"/> &amp; its owner.</remarks>
      <url>https://api.contoso.com/v1/pets/{id}?verbose={verbose}</url>
      <verb>GET</verb>
      <group>Pets</group>
      <param name="id" in="path" cref="T:System.Int64">Pet id</param>
      <param name="verbose" required="false">Include details</param>
      <response code="200"><see cref="T:Contoso.Pets.Models.Pet"/>The pet</response>
      <response code="404">Not found</response>
    </member>
    <member name="T:Contoso.Pets.Models.Pet">
      <summary>A pet in the store.</summary>
    </member>
  </members>
</doc>"#;

fn load(sources: &[AnnotationSource]) -> (AnnotationStore, Diagnostics) {
    let diagnostics = Diagnostics::new();
    let store = AnnotationStore::load(sources, &diagnostics, false);
    (store, diagnostics)
}

fn member(raw: &str) -> MemberIdentifier {
    raw.parse().unwrap()
}

#[test]
fn test_parses_member_documentation() {
    let (store, diagnostics) = load(&[AnnotationSource::new("pets.xml", PETS_XML)]);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.snapshot());
    assert_eq!(store.len(), 2);
    assert_eq!(store.assemblies(), &["Contoso.Pets".to_string()]);

    let record = store
        .get(&member(
            "M:Contoso.Pets.PetsController.GetPet(System.Int64,System.Boolean)",
        ))
        .unwrap();
    assert_eq!(record.summary.as_deref(), Some("Gets the pet identified by id."));
    assert_eq!(record.remarks.as_deref(), Some("Returns a Pet & its owner."));
    assert_eq!(record.params.len(), 2);

    let id = record.param("id").unwrap();
    assert_eq!(id.location, Some(ParameterLocation::Path));
    assert_eq!(id.cref.as_deref(), Some("T:System.Int64"));
    assert_eq!(id.description, "Pet id");

    let verbose = record.param("verbose").unwrap();
    assert_eq!(verbose.location, None);
    assert_eq!(verbose.required, Some(false));

    assert_eq!(record.responses.len(), 2);
    assert_eq!(record.responses[0].code, "200");
    assert_eq!(
        record.responses[0].cref.as_deref(),
        Some("T:Contoso.Pets.Models.Pet")
    );
    assert_eq!(record.responses[0].description, "The pet");
    assert_eq!(record.responses[1].cref, None);

    assert_eq!(record.tag("verb").unwrap().text, "GET");
    assert_eq!(record.tag_values("group").collect::<Vec<_>>(), vec!["Pets"]);
    assert_eq!(store.type_summary("Contoso.Pets.Models.Pet"), Some("A pet in the store."));
}

#[test]
fn test_later_source_wins_with_single_warning() {
    let first = r#"<doc><members>
        <member name="T:Contoso.Pet"><summary>First</summary></member>
    </members></doc>"#;
    let second = r#"<doc><members>
        <member name="T:Contoso.Pet"><summary>Second</summary></member>
    </members></doc>"#;

    let (store, diagnostics) = load(&[
        AnnotationSource::new("a.xml", first),
        AnnotationSource::new("b.xml", second),
    ]);

    let all = diagnostics.snapshot();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].severity, Severity::Warning);
    assert_eq!(all[0].kind, DiagnosticKind::DuplicateMember);
    assert_eq!(all[0].member, Some(member("T:Contoso.Pet")));
    assert_eq!(
        store.get(&member("T:Contoso.Pet")).unwrap().summary.as_deref(),
        Some("Second")
    );
}

#[test]
fn test_malformed_source_does_not_abort_load() {
    let broken = "<doc><members><member name=\"T:A\"></members></doc>";
    let (store, diagnostics) = load(&[
        AnnotationSource::new("broken.xml", broken),
        AnnotationSource::new("pets.xml", PETS_XML),
    ]);

    assert_eq!(store.len(), 2);
    let errors: Vec<_> = diagnostics
        .snapshot()
        .into_iter()
        .filter(|d| d.is_error())
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("broken.xml"));
}

#[test]
fn test_malformed_entries_are_skipped() {
    let xml = r#"<doc><members>
        <member name="Contoso.NoPrefix"><summary>x</summary></member>
        <member><summary>no name</summary></member>
        <member name="M:Contoso.Api.Get">
          <param>no name</param>
          <param name="q" in="somewhere">query</param>
          <response code="20">bad code</response>
          <response code="4xx">client errors</response>
        </member>
    </members></doc>"#;
    let (store, diagnostics) = load(&[AnnotationSource::new("mixed.xml", xml)]);

    assert_eq!(store.len(), 1);
    let record = store.get(&member("M:Contoso.Api.Get")).unwrap();
    assert_eq!(record.params.len(), 1);
    assert_eq!(record.params[0].location, None);
    assert_eq!(record.responses.len(), 1);
    assert_eq!(record.responses[0].code, "4XX");

    let all = diagnostics.snapshot();
    assert_eq!(all.iter().filter(|d| d.is_error()).count(), 2);
    assert_eq!(
        all.iter()
            .filter(|d| d.severity == Severity::Warning)
            .count(),
        3
    );
}

#[test]
fn test_parallel_load_keeps_source_order() {
    let sources: Vec<AnnotationSource> = (0..8)
        .map(|i| {
            AnnotationSource::new(
                format!("s{i}.xml"),
                format!(
                    r#"<doc><members><member name="T:Contoso.Shared"><summary>v{i}</summary></member>
                    <member name="T:Contoso.Only{i}"/></members></doc>"#
                ),
            )
        })
        .collect();
    let diagnostics = Diagnostics::new();
    let store = AnnotationStore::load(&sources, &diagnostics, true);

    assert_eq!(store.len(), 9);
    assert_eq!(
        store.get(&member("T:Contoso.Shared")).unwrap().summary.as_deref(),
        Some("v7")
    );
    assert_eq!(diagnostics.len(), 7);
    let first_key = store.iter().next().map(|(id, _)| id.to_string());
    assert_eq!(first_key.as_deref(), Some("T:Contoso.Shared"));
}

#[test]
fn test_response_codes() {
    assert!(is_valid_response_code("200"));
    assert!(is_valid_response_code("5XX"));
    assert!(is_valid_response_code("default"));
    assert!(!is_valid_response_code("600"));
    assert!(!is_valid_response_code("2X0"));
    assert!(!is_valid_response_code("ok"));
}
