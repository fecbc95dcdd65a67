//! # Schema Builder
//!
//! Canonicalizes reflected [`TypeShape`]s into a de-duplicated set of named
//! component schemas.
//!
//! Every object and enum reachable from the input shapes becomes a component.
//! Components are identified by structure: each named type gets a SHA-256
//! fingerprint of its canonical form, types with the
//! same candidate name and fingerprint share one component, and types whose
//! candidate names collide with different structure are renamed
//! deterministically. Back-references produced by the reflector become
//! references to the enclosing component, so cyclic types stay finite.
//!
//! The result is a [`SchemaIndex`]: component name to [`SchemaNode`], and
//! qualified type name to component name.

mod fingerprint;
mod naming;

#[cfg(test)]
mod tests;

pub use naming::{to_camel_case, PropertyNaming};

use crate::annotations::AnnotationStore;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::ids::TypeRef;
use crate::reflect::{EnumShape, ObjectShape, PrimitiveKind, TypeShape};
use fingerprint::Fingerprinter;
use naming::assign_component_names;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Canonical schema.
///
/// At usage sites (properties, parameters, bodies) only the inline variants
/// and [`SchemaNode::Reference`] appear; [`SchemaNode::Object`] and
/// [`SchemaNode::Enum`] are component bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaNode {
    Primitive(PrimitiveKind),
    Array(Box<SchemaNode>),
    Map(Box<SchemaNode>),
    /// Reference to a component by name
    Reference(String),
    /// Placeholder for an unresolved type, carrying its name
    Unknown(String),
    Object(ObjectSchema),
    Enum(EnumSchema),
}

impl SchemaNode {
    pub fn string() -> Self {
        SchemaNode::Primitive(PrimitiveKind::String)
    }

    /// Component names this node refers to directly
    pub fn references(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.collect_references(&mut names);
        names
    }

    fn collect_references<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        match self {
            SchemaNode::Reference(name) => {
                names.insert(name.as_str());
            }
            SchemaNode::Array(inner) | SchemaNode::Map(inner) => inner.collect_references(names),
            SchemaNode::Object(object) => {
                for property in &object.properties {
                    property.schema.collect_references(names);
                }
            }
            SchemaNode::Primitive(_) | SchemaNode::Unknown(_) | SchemaNode::Enum(_) => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectSchema {
    pub description: Option<String>,
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub schema: SchemaNode,
    pub nullable: bool,
    pub required: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumSchema {
    pub description: Option<String>,
    pub values: Vec<String>,
}

/// A named type collected from the input shapes
#[derive(Debug, Clone)]
pub(crate) enum Definition {
    Object(Arc<ObjectShape>),
    Enum(Arc<EnumShape>),
}

impl Definition {
    fn type_ref(&self) -> &TypeRef {
        match self {
            Definition::Object(object) => &object.type_ref,
            Definition::Enum(shape) => &shape.type_ref,
        }
    }
}

/// Canonical components of a run
#[derive(Debug, Clone, Default)]
pub struct SchemaIndex {
    components: BTreeMap<String, SchemaNode>,
    names: HashMap<String, String>,
    fingerprints: BTreeMap<String, String>,
}

impl SchemaIndex {
    /// Components in name order
    pub fn components(&self) -> &BTreeMap<String, SchemaNode> {
        &self.components
    }

    pub fn component(&self, name: &str) -> Option<&SchemaNode> {
        self.components.get(name)
    }

    /// Component name assigned to a qualified type name
    pub fn name_of(&self, qualified: &str) -> Option<&str> {
        self.names.get(qualified).map(String::as_str)
    }

    /// Structural fingerprint of a component
    pub fn fingerprint(&self, component: &str) -> Option<&str> {
        self.fingerprints.get(component).map(String::as_str)
    }

    /// Usage-site schema for a shape. Named shapes become references; a name
    /// that was never canonicalized still yields a reference (to its
    /// candidate name) so document validation can report it.
    pub fn schema_for(&self, shape: &TypeShape) -> SchemaNode {
        match shape {
            TypeShape::Primitive(kind) => SchemaNode::Primitive(*kind),
            TypeShape::Array(inner) => SchemaNode::Array(Box::new(self.schema_for(inner))),
            TypeShape::Map(inner) => SchemaNode::Map(Box::new(self.schema_for(inner))),
            TypeShape::Object(object) => self.reference_to(&object.name),
            TypeShape::Enum(shape) => self.reference_to(&shape.name),
            TypeShape::Reference(name) => self.reference_to(name),
            TypeShape::Unknown(name) => SchemaNode::Unknown(name.clone()),
        }
    }

    fn reference_to(&self, qualified: &str) -> SchemaNode {
        match self.names.get(qualified) {
            Some(name) => SchemaNode::Reference(name.clone()),
            None => SchemaNode::Reference(
                qualified
                    .parse::<TypeRef>()
                    .map(|ty| ty.candidate_name())
                    .unwrap_or_else(|_| qualified.to_string()),
            ),
        }
    }

    /// Every component reachable from `roots`, roots included. Names without a
    /// component are returned separately.
    pub fn closure<'a>(
        &'a self,
        roots: impl IntoIterator<Item = &'a str>,
    ) -> (BTreeSet<&'a str>, BTreeSet<&'a str>) {
        let mut reachable = BTreeSet::new();
        let mut missing = BTreeSet::new();
        let mut pending: Vec<&str> = roots.into_iter().collect();
        while let Some(name) = pending.pop() {
            if reachable.contains(name) || missing.contains(name) {
                continue;
            }
            match self.components.get(name) {
                Some(node) => {
                    reachable.insert(name);
                    pending.extend(node.references());
                }
                None => {
                    missing.insert(name);
                }
            }
        }
        (reachable, missing)
    }
}

/// Converts shapes into a [`SchemaIndex`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaBuilder<'a> {
    naming: PropertyNaming,
    annotations: Option<&'a AnnotationStore>,
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(naming: PropertyNaming) -> Self {
        SchemaBuilder {
            naming,
            annotations: None,
        }
    }

    /// Use `T:`/`P:`/`F:` summaries as schema and property descriptions
    pub fn with_annotations(mut self, annotations: &'a AnnotationStore) -> Self {
        self.annotations = Some(annotations);
        self
    }

    pub fn canonicalize<'s>(
        &self,
        shapes: impl IntoIterator<Item = &'s TypeShape>,
        diagnostics: &Diagnostics,
    ) -> SchemaIndex {
        let mut definitions = BTreeMap::new();
        for shape in shapes {
            collect_definitions(shape, &mut definitions);
        }

        let mut fingerprinter = Fingerprinter::new(&definitions);
        let entries: Vec<(String, TypeRef, String)> = definitions
            .iter()
            .map(|(name, definition)| {
                (
                    name.clone(),
                    definition.type_ref().clone(),
                    fingerprinter.fingerprint(name),
                )
            })
            .collect();

        let classes = assign_component_names(&entries, diagnostics);

        let mut index = SchemaIndex::default();
        for class in &classes {
            for member in &class.members {
                index.names.insert(member.clone(), class.name.clone());
            }
            index
                .fingerprints
                .insert(class.name.clone(), class.fingerprint.clone());
        }

        for class in &classes {
            let Some(definition) = class.members.first().and_then(|m| definitions.get(m)) else {
                continue;
            };
            let body = match definition {
                Definition::Enum(shape) => SchemaNode::Enum(EnumSchema {
                    description: self.type_description(&shape.type_ref),
                    values: shape.values.clone(),
                }),
                Definition::Object(object) => {
                    SchemaNode::Object(self.object_schema(&class.name, object, &index, diagnostics))
                }
            };
            index.components.insert(class.name.clone(), body);
        }

        tracing::debug!(
            types = definitions.len(),
            components = index.components.len(),
            "schemas canonicalized"
        );
        index
    }

    fn object_schema(
        &self,
        component: &str,
        object: &ObjectShape,
        index: &SchemaIndex,
        diagnostics: &Diagnostics,
    ) -> ObjectSchema {
        let mut properties: Vec<Property> = Vec::with_capacity(object.fields.len());
        for field in &object.fields {
            let name = self.naming.apply(&field.name);
            if properties.iter().any(|p| p.name == name) {
                diagnostics.warning(
                    DiagnosticKind::PropertyCollision,
                    format!(
                        "schema '{component}': field '{}' maps to property '{name}' which is already defined; field skipped",
                        field.name
                    ),
                    None,
                );
                continue;
            }
            properties.push(Property {
                name,
                schema: index.schema_for(&field.shape),
                nullable: field.nullable,
                required: field.required,
                description: self.member_description(&object.type_ref, &field.name),
            });
        }
        ObjectSchema {
            description: self.type_description(&object.type_ref),
            properties,
        }
    }

    fn type_description(&self, ty: &TypeRef) -> Option<String> {
        let annotations = self.annotations?;
        let name = documented_name(ty)?;
        annotations.type_summary(&name).map(str::to_string)
    }

    fn member_description(&self, ty: &TypeRef, member: &str) -> Option<String> {
        let annotations = self.annotations?;
        let name = documented_name(ty)?;
        annotations.member_summary(&name, member).map(str::to_string)
    }
}

/// Name under which documentation refers to a type: generic definitions are
/// documented with their arity (`Ns.Page`1`).
fn documented_name(ty: &TypeRef) -> Option<String> {
    match ty {
        TypeRef::Named { name, args } if args.is_empty() || name.contains('`') => Some(name.clone()),
        TypeRef::Named { name, args } => Some(format!("{name}`{}", args.len())),
        TypeRef::Array(_) => None,
    }
}

fn collect_definitions(shape: &TypeShape, definitions: &mut BTreeMap<String, Definition>) {
    match shape {
        TypeShape::Array(inner) | TypeShape::Map(inner) => collect_definitions(inner, definitions),
        TypeShape::Object(object) => {
            if definitions.contains_key(&object.name) {
                return;
            }
            definitions.insert(object.name.clone(), Definition::Object(Arc::clone(object)));
            for field in &object.fields {
                collect_definitions(&field.shape, definitions);
            }
        }
        TypeShape::Enum(shape) => {
            definitions
                .entry(shape.name.clone())
                .or_insert_with(|| Definition::Enum(Arc::clone(shape)));
        }
        TypeShape::Primitive(_) | TypeShape::Reference(_) | TypeShape::Unknown(_) => {}
    }
}
