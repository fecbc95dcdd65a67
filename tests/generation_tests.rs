#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! End-to-end generation over the petstore fixtures

mod common;

use apidocgen::annotations::{AnnotationSource, ParameterLocation};
use apidocgen::config::GenerationOptions;
use apidocgen::document::Grouping;
use apidocgen::generator::generate;
use apidocgen::metadata::MetadataSource;
use apidocgen::openapi::{OpenApi, SchemaType};
use apidocgen::reflect::PrimitiveKind;
use apidocgen::schema::{PropertyNaming, SchemaNode};
use apidocgen::{DiagnosticKind, Severity};
use common::{doc, petstore_annotations, petstore_metadata};
use http::Method;

fn sequential() -> GenerationOptions {
    GenerationOptions {
        parallel: false,
        ..GenerationOptions::default()
    }
}

#[test]
fn test_petstore_single_document() {
    let result = generate(
        &[petstore_annotations()],
        &[petstore_metadata()],
        &GenerationOptions::default(),
    );

    assert!(result.diagnostics.is_empty(), "{:#?}", result.diagnostics);
    assert_eq!(result.documents.len(), 1);
    let document = &result.documents["default"];
    assert!(document.is_valid());
    assert_eq!(document.title, "Contoso.Pets");
    assert_eq!(document.version, "V1");
    assert_eq!(document.servers, vec!["https://api.contoso.com".to_string()]);
    assert_eq!(document.tags, vec!["Pets".to_string(), "Owners".to_string()]);
    assert_eq!(
        document.components.keys().collect::<Vec<_>>(),
        vec!["Color", "PageOfPet", "Person", "Pet"]
    );

    let ids: Vec<&str> = document
        .operations
        .iter()
        .map(|o| o.operation_id.as_str())
        .collect();
    assert_eq!(
        ids,
        vec![
            "PetsController_GetPet",
            "PetsController_ListPets",
            "PetsController_AddPet",
            "OwnersController_GetOwner",
        ]
    );

    let list = &document.operations[1];
    assert_eq!(list.method, Method::GET);
    assert_eq!(list.path, "/v1/pets");
    assert_eq!(list.parameters[0].name, "limit");
    assert_eq!(list.parameters[0].location, ParameterLocation::Query);
    assert!(list.parameters[0].nullable);
    assert_eq!(
        list.parameters[0].schema,
        SchemaNode::Primitive(PrimitiveKind::Int32)
    );
    assert_eq!(
        list.parameters[1].schema,
        SchemaNode::Reference("Color".to_string())
    );

    let add = &document.operations[2];
    assert_eq!(add.method, Method::POST);
    let body = add.request_body.as_ref().unwrap();
    assert!(body.required);
    assert_eq!(body.schema, SchemaNode::Reference("Pet".to_string()));
}

#[test]
fn test_rendered_components_and_descriptions() {
    let result = generate(&[petstore_annotations()], &[petstore_metadata()], &sequential());
    let openapi = OpenApi::from_document(&result.documents["default"]);

    assert_eq!(openapi.openapi, "3.1.0");
    assert_eq!(
        openapi.paths.keys().collect::<Vec<_>>(),
        vec!["/v1/pets/{id}", "/v1/pets", "/v2/owners/{name}"]
    );
    assert_eq!(
        openapi.paths["/v1/pets"].keys().collect::<Vec<_>>(),
        vec!["get", "post"]
    );

    let pet = &openapi.components.schemas["Pet"];
    assert_eq!(pet.description.as_deref(), Some("A pet in the store."));
    assert_eq!(pet.required, vec!["Id".to_string(), "Name".to_string()]);
    let properties = pet.properties.as_ref().unwrap();
    assert_eq!(properties["Name"].description.as_deref(), Some("Display name."));
    assert_eq!(properties["Owner"].one_of.len(), 2);
    assert_eq!(
        properties["Owner"].one_of[0].referenced_component(),
        Some("Person")
    );

    let person = &openapi.components.schemas["Person"];
    let pets = &person.properties.as_ref().unwrap()["Pets"];
    assert_eq!(pets.schema_type, Some(SchemaType::Single("array".into())));
    assert_eq!(
        pets.items.as_ref().unwrap().referenced_component(),
        Some("Pet")
    );

    let limit = &openapi.paths["/v1/pets"]["get"].parameters[0];
    assert_eq!(
        limit.schema.schema_type,
        Some(SchemaType::Multiple(vec!["integer".into(), "null".into()]))
    );

    let get_pet = &openapi.paths["/v1/pets/{id}"]["get"];
    assert_eq!(get_pet.responses["200"].description, "The pet");
    assert!(get_pet.responses["404"].content.is_empty());
}

#[test]
fn test_output_is_deterministic() {
    let parallel = generate(
        &[petstore_annotations()],
        &[petstore_metadata()],
        &GenerationOptions::default(),
    );
    let serial = generate(&[petstore_annotations()], &[petstore_metadata()], &sequential());

    let render = |result: &apidocgen::GenerationResult| {
        OpenApi::from_document(&result.documents["default"])
            .to_yaml()
            .unwrap()
    };
    assert_eq!(render(&parallel), render(&serial));
    assert_eq!(
        parallel.schemas.fingerprint("Pet"),
        serial.schemas.fingerprint("Pet")
    );
}

#[test]
fn test_path_version_grouping() {
    let options = GenerationOptions {
        grouping: Grouping::PathVersion,
        title: Some("Pets".to_string()),
        ..sequential()
    };
    let result = generate(&[petstore_annotations()], &[petstore_metadata()], &options);

    assert_eq!(result.documents.keys().collect::<Vec<_>>(), vec!["v1", "v2"]);
    assert_eq!(result.documents["v1"].title, "Pets-v1");
    assert_eq!(result.documents["v2"].operations.len(), 1);
    assert_eq!(
        result.documents["v2"].components.keys().collect::<Vec<_>>(),
        vec!["Color", "Person", "Pet"]
    );
    assert!(result.documents.values().all(|d| d.is_valid()));
}

#[test]
fn test_camel_case_properties() {
    let options = GenerationOptions {
        naming: PropertyNaming::CamelCase,
        ..sequential()
    };
    let result = generate(&[petstore_annotations()], &[petstore_metadata()], &options);
    let SchemaNode::Object(pet) = &result.documents["default"].components["Pet"] else {
        panic!("Pet should be an object schema");
    };
    let names: Vec<&str> = pet.properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["id", "name", "color", "owner", "tags"]);
}

#[test]
fn test_missing_type_metadata_keeps_operation() {
    let xml = doc(
        "Contoso.Pets",
        r#"<member name="M:Contoso.Pets.Controllers.ToysController.GetToy(System.Int32)">
             <url>/toys/{id}</url>
             <verb>GET</verb>
             <param name="id">Toy id</param>
             <response code="200" cref="T:Contoso.Pets.Models.Toy">The toy</response>
           </member>"#,
    );
    let result = generate(
        &[AnnotationSource::new("toys.xml", xml)],
        &[petstore_metadata()],
        &sequential(),
    );

    let errors: Vec<_> = result.errors().collect();
    assert_eq!(errors.len(), 1, "{:#?}", result.diagnostics);
    assert_eq!(errors[0].kind, DiagnosticKind::UnresolvedType);
    assert_eq!(
        errors[0].member.as_ref().map(|m| m.as_str()),
        Some("M:Contoso.Pets.Controllers.ToysController.GetToy(System.Int32)")
    );

    let document = &result.documents["default"];
    assert!(document.is_valid());
    assert!(document.components.is_empty());
    let response = &document.operations[0].responses[0];
    assert_eq!(
        response.schema,
        Some(SchemaNode::Unknown("Contoso.Pets.Models.Toy".to_string()))
    );
}

#[test]
fn test_duplicate_member_later_source_wins() {
    let member = |summary: &str| {
        doc(
            "Contoso.Pets",
            &format!(
                r#"<member name="M:Contoso.Pets.Controllers.PetsController.Ping">
                     <summary>{summary}</summary>
                     <url>/ping</url>
                     <verb>GET</verb>
                     <response code="204">Alive</response>
                   </member>"#
            ),
        )
    };
    let result = generate(
        &[
            AnnotationSource::new("first.xml", member("First")),
            AnnotationSource::new("second.xml", member("Second")),
        ],
        &[petstore_metadata()],
        &GenerationOptions::default(),
    );

    let duplicates: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::DuplicateMember)
        .collect();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].severity, Severity::Warning);
    assert_eq!(
        result.documents["default"].operations[0].summary.as_deref(),
        Some("Second")
    );
}

#[test]
fn test_fatal_inputs() {
    let no_metadata = generate(&[petstore_annotations()], &[], &sequential());
    assert!(no_metadata.documents.is_empty());
    assert_eq!(no_metadata.diagnostics.len(), 1);
    assert_eq!(no_metadata.diagnostics[0].kind, DiagnosticKind::NoMetadata);

    let xml = doc(
        "Contoso.Pets",
        r#"<member name="T:Contoso.Pets.Models.Pet"><summary>A pet.</summary></member>"#,
    );
    let no_operations = generate(
        &[AnnotationSource::new("types-only.xml", xml)],
        &[MetadataSource::new("types.yml", "types: []")],
        &sequential(),
    );
    assert!(no_operations.documents.is_empty());
    assert_eq!(
        no_operations
            .errors()
            .map(|d| d.kind)
            .collect::<Vec<_>>(),
        vec![DiagnosticKind::NoOperations]
    );
}
