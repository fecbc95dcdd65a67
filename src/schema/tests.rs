#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::annotations::{AnnotationSource, AnnotationStore};
use crate::diagnostics::Diagnostics;
use crate::metadata::{FieldDecl, TypeCatalog, TypeDecl};
use crate::reflect::TypeReflector;

fn field(name: &str, ty: &str) -> FieldDecl {
    FieldDecl {
        name: name.to_string(),
        type_name: ty.to_string(),
        nullable: false,
        required: false,
    }
}

fn object(name: &str, ordered: bool, fields: Vec<FieldDecl>) -> TypeDecl {
    TypeDecl::Object {
        name: name.to_string(),
        ordered,
        type_parameters: Vec::new(),
        fields,
    }
}

fn shapes(catalog: &TypeCatalog, types: &[&str]) -> Vec<TypeShape> {
    let reflector = TypeReflector::new(catalog);
    let mut diagnostics = Vec::new();
    let shapes = types
        .iter()
        .map(|ty| reflector.resolve_type_name(ty, None, &mut diagnostics).shape)
        .collect();
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    shapes
}

fn canonicalize(catalog: &TypeCatalog, types: &[&str]) -> (SchemaIndex, Diagnostics) {
    let diagnostics = Diagnostics::new();
    let shapes = shapes(catalog, types);
    let index = SchemaBuilder::new(PropertyNaming::Preserve).canonicalize(&shapes, &diagnostics);
    (index, diagnostics)
}

fn pets_catalog() -> TypeCatalog {
    TypeCatalog::from_decls(vec![
        object(
            "Contoso.Pet",
            false,
            vec![
                field("Name", "System.String"),
                field("Owner", "Contoso.Person"),
                field("Color", "Contoso.Color"),
            ],
        ),
        object(
            "Contoso.Person",
            false,
            vec![field("Name", "System.String"), field("Pets", "Contoso.Pet[]")],
        ),
        TypeDecl::Enum {
            name: "Contoso.Color".to_string(),
            values: vec!["Red".to_string()],
        },
    ])
}

fn properties(index: &SchemaIndex, component: &str) -> Vec<Property> {
    match index.component(component) {
        Some(SchemaNode::Object(object)) => object.properties.clone(),
        other => panic!("expected object component {component}, got {other:?}"),
    }
}

#[test]
fn test_cycle_yields_one_component_per_type() {
    let catalog = pets_catalog();
    let (index, diagnostics) = canonicalize(&catalog, &["Contoso.Pet", "Contoso.Person"]);

    assert!(diagnostics.is_empty());
    let names: Vec<&str> = index.components().keys().map(String::as_str).collect();
    assert_eq!(names, vec!["Color", "Person", "Pet"]);

    let pet = properties(&index, "Pet");
    assert_eq!(pet[1].schema, SchemaNode::Reference("Person".to_string()));
    assert_eq!(pet[2].schema, SchemaNode::Reference("Color".to_string()));
    let person = properties(&index, "Person");
    assert_eq!(
        person[1].schema,
        SchemaNode::Array(Box::new(SchemaNode::Reference("Pet".to_string())))
    );

    let (reachable, missing) = index.closure(["Person"]);
    assert_eq!(reachable.into_iter().collect::<Vec<_>>(), vec!["Color", "Person", "Pet"]);
    assert!(missing.is_empty());
}

#[test]
fn test_fingerprints_do_not_depend_on_entry_point() {
    let catalog = pets_catalog();
    let (from_pet, _) = canonicalize(&catalog, &["Contoso.Pet"]);
    let (from_person, _) = canonicalize(&catalog, &["Contoso.Person"]);
    let (both, _) = canonicalize(&catalog, &["Contoso.Person", "Contoso.Pet"]);

    for component in ["Pet", "Person", "Color"] {
        let expected = from_pet.fingerprint(component).unwrap();
        assert_eq!(from_person.fingerprint(component), Some(expected));
        assert_eq!(both.fingerprint(component), Some(expected));
        assert_eq!(expected.len(), 64);
    }
    assert_eq!(from_pet.components(), both.components());
}

#[test]
fn test_structurally_different_types_are_renamed_by_namespace() {
    let catalog = TypeCatalog::from_decls(vec![
        object("Contoso.V1.Pet", false, vec![field("Id", "int")]),
        object(
            "Contoso.V2.Pet",
            false,
            vec![field("Id", "int"), field("Name", "string")],
        ),
    ]);
    let (index, diagnostics) = canonicalize(&catalog, &["Contoso.V2.Pet", "Contoso.V1.Pet"]);

    assert_eq!(index.name_of("Contoso.V1.Pet"), Some("V1_Pet"));
    assert_eq!(index.name_of("Contoso.V2.Pet"), Some("V2_Pet"));
    let all = diagnostics.snapshot();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].kind, DiagnosticKind::NamingCollision);
}

#[test]
fn test_identical_shapes_share_a_component() {
    let catalog = TypeCatalog::from_decls(vec![
        object("Contoso.V1.Tag", false, vec![field("Name", "string")]),
        object("Contoso.V2.Tag", false, vec![field("Name", "System.String")]),
    ]);
    let (index, diagnostics) = canonicalize(&catalog, &["Contoso.V1.Tag", "Contoso.V2.Tag"]);

    assert!(diagnostics.is_empty());
    assert_eq!(index.components().len(), 1);
    assert_eq!(index.name_of("Contoso.V1.Tag"), Some("Tag"));
    assert_eq!(index.name_of("Contoso.V2.Tag"), Some("Tag"));
}

#[test]
fn test_field_order_matters_only_when_ordered() {
    let unordered = TypeCatalog::from_decls(vec![
        object("Contoso.A.Point", false, vec![field("X", "int"), field("Y", "int")]),
        object("Contoso.B.Point", false, vec![field("Y", "int"), field("X", "int")]),
    ]);
    let (index, _) = canonicalize(&unordered, &["Contoso.A.Point", "Contoso.B.Point"]);
    assert_eq!(index.components().len(), 1);

    let ordered = TypeCatalog::from_decls(vec![
        object("Contoso.A.Point", true, vec![field("X", "int"), field("Y", "int")]),
        object("Contoso.B.Point", true, vec![field("Y", "int"), field("X", "int")]),
    ]);
    let (index, _) = canonicalize(&ordered, &["Contoso.A.Point", "Contoso.B.Point"]);
    assert_eq!(index.name_of("Contoso.A.Point"), Some("A_Point"));
    assert_eq!(index.name_of("Contoso.B.Point"), Some("B_Point"));
}

#[test]
fn test_fingerprint_suffix_when_namespaces_cannot_separate() {
    let catalog = TypeCatalog::from_decls(vec![
        TypeDecl::Object {
            name: "Contoso.Page`1".to_string(),
            ordered: false,
            type_parameters: vec!["T".to_string()],
            fields: vec![field("Items", "T[]")],
        },
        object("Contoso.V1.Item", false, vec![field("Id", "int")]),
        object("Contoso.V2.Item", false, vec![field("Id", "long")]),
    ]);
    let (index, diagnostics) = canonicalize(
        &catalog,
        &["Contoso.Page{Contoso.V1.Item}", "Contoso.Page{Contoso.V2.Item}"],
    );

    let first = index.name_of("Contoso.Page{Contoso.V1.Item}").unwrap();
    let second = index.name_of("Contoso.Page{Contoso.V2.Item}").unwrap();
    assert_ne!(first, second);
    for name in [first, second] {
        assert!(name.starts_with("PageOfItem_"), "{name}");
        assert_eq!(name.len(), "PageOfItem_".len() + 8);
    }
    assert_eq!(diagnostics.len(), 2);
}

#[test]
fn test_camel_case_with_property_collision() {
    let catalog = TypeCatalog::from_decls(vec![object(
        "Contoso.Link",
        false,
        vec![field("URLValue", "string"), field("Id", "int"), field("ID", "long")],
    )]);
    let diagnostics = Diagnostics::new();
    let shapes = shapes(&catalog, &["Contoso.Link"]);
    let index = SchemaBuilder::new(PropertyNaming::CamelCase).canonicalize(&shapes, &diagnostics);

    let names: Vec<String> = properties(&index, "Link").into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["urlValue", "id"]);
    let all = diagnostics.snapshot();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].kind, DiagnosticKind::PropertyCollision);
}

#[test]
fn test_to_camel_case() {
    assert_eq!(to_camel_case("Name"), "name");
    assert_eq!(to_camel_case("ID"), "id");
    assert_eq!(to_camel_case("IPAddress"), "ipAddress");
    assert_eq!(to_camel_case("URLValue"), "urlValue");
    assert_eq!(to_camel_case("alreadyCamel"), "alreadyCamel");
    assert_eq!(to_camel_case(""), "");
}

#[test]
fn test_descriptions_come_from_annotations() {
    let xml = r#"<doc><members>
        <member name="T:Contoso.Pet"><summary>A pet.</summary></member>
        <member name="P:Contoso.Pet.Name"><summary>Display name.</summary></member>
    </members></doc>"#;
    let diagnostics = Diagnostics::new();
    let store = AnnotationStore::load(&[AnnotationSource::new("pets.xml", xml)], &diagnostics, false);
    let catalog = pets_catalog();
    let shapes = shapes(&catalog, &["Contoso.Pet"]);
    let index = SchemaBuilder::new(PropertyNaming::Preserve)
        .with_annotations(&store)
        .canonicalize(&shapes, &diagnostics);

    match index.component("Pet") {
        Some(SchemaNode::Object(pet)) => {
            assert_eq!(pet.description.as_deref(), Some("A pet."));
            assert_eq!(pet.properties[0].description.as_deref(), Some("Display name."));
            assert_eq!(pet.properties[1].description, None);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_unknown_names_still_yield_references() {
    let index = SchemaIndex::default();
    let shape = TypeShape::Reference("Contoso.Models.Pet".to_string());
    assert_eq!(index.schema_for(&shape), SchemaNode::Reference("Pet".to_string()));
    let (reachable, missing) = index.closure(["Pet"]);
    assert!(reachable.is_empty());
    assert_eq!(missing.into_iter().collect::<Vec<_>>(), vec!["Pet"]);
}

#[test]
fn test_dense_cycle_canonicalizes_each_type_once() {
    let names: Vec<String> = (0..12).map(|i| format!("Ns.E{i}")).collect();
    let catalog = TypeCatalog::from_decls(names.iter().map(|name| {
        object(
            name,
            false,
            names
                .iter()
                .filter(|other| *other != name)
                .map(|other| field(&format!("To{}", &other[3..]), other))
                .collect(),
        )
    }));
    let (index, diagnostics) = canonicalize(&catalog, &["Ns.E0", "Ns.E7"]);

    assert!(diagnostics.is_empty());
    assert_eq!(index.components().len(), 12);
    assert_eq!(properties(&index, "E3").len(), 11);
    assert_eq!(
        properties(&index, "E3")[0].schema,
        SchemaNode::Reference("E0".to_string())
    );
}

#[test]
fn test_identical_cycles_share_components() {
    let cycle = |ns: &str| {
        vec![
            object(
                &format!("{ns}.Pet"),
                false,
                vec![field("Owner", &format!("{ns}.Person"))],
            ),
            object(
                &format!("{ns}.Person"),
                false,
                vec![field("Pets", &format!("{ns}.Pet[]"))],
            ),
        ]
    };
    let catalog = TypeCatalog::from_decls(cycle("Contoso.A").into_iter().chain(cycle("Contoso.B")));
    let (index, diagnostics) = canonicalize(&catalog, &["Contoso.A.Pet", "Contoso.B.Person"]);

    assert!(diagnostics.is_empty());
    assert_eq!(index.components().len(), 2);
    assert_eq!(index.name_of("Contoso.A.Pet"), Some("Pet"));
    assert_eq!(index.name_of("Contoso.B.Pet"), Some("Pet"));
    assert_ne!(index.fingerprint("Pet"), index.fingerprint("Person"));
}
