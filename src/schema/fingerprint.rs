//! Structural fingerprints of named types.
//!
//! Types are grouped into strongly connected components of the definition
//! graph. The canonical text of a type numbers the members of its component
//! in the order they are first reached from it (fields sorted by name unless
//! the type is ordered), then lists each member's fields with the canonical
//! form of each field type. A named field type is encoded as:
//!
//! - `@i` when it is member `i` of the same component;
//! - `#<digest>` otherwise, using its own fingerprint.
//!
//! Each member is written once, so the text grows with the size of the
//! component rather than with the number of paths through it. The
//! fingerprint of a type is a function of the type graph reachable from it
//! and nothing else.

use crate::reflect::{FieldShape, ObjectShape, PrimitiveKind, TypeShape};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};

use super::Definition;

pub(crate) struct Fingerprinter<'g> {
    definitions: &'g BTreeMap<String, Definition>,
    components: HashMap<&'g str, usize>,
    memo: HashMap<String, String>,
}

impl<'g> Fingerprinter<'g> {
    pub(crate) fn new(definitions: &'g BTreeMap<String, Definition>) -> Self {
        Fingerprinter {
            definitions,
            components: strongly_connected(definitions),
            memo: HashMap::new(),
        }
    }

    /// Hex SHA-256 fingerprint of a named type
    pub(crate) fn fingerprint(&mut self, name: &str) -> String {
        if let Some(hash) = self.memo.get(name) {
            return hash.clone();
        }
        let text = self.canonical_text(name);
        let hash = digest(&text);
        self.memo.insert(name.to_string(), hash.clone());
        hash
    }

    fn canonical_text(&mut self, root: &str) -> String {
        let definitions = self.definitions;
        let Some((root, _)) = definitions.get_key_value(root) else {
            return format!("u:{root}");
        };
        let component = self.components.get(root.as_str()).copied();

        let mut members: Vec<&'g str> = vec![root.as_str()];
        let mut numbering: HashMap<&'g str, usize> = HashMap::from([(root.as_str(), 0)]);
        let mut next = 0;
        while let Some(&name) = members.get(next) {
            next += 1;
            let Some(Definition::Object(object)) = definitions.get(name) else {
                continue;
            };
            for field in canonical_fields(object) {
                let mut targets = Vec::new();
                named_targets(&field.shape, &mut targets);
                for target in targets {
                    let same_component = self.components.get(target).copied() == component;
                    if same_component
                        && definitions.contains_key(target)
                        && !numbering.contains_key(target)
                    {
                        numbering.insert(target, members.len());
                        members.push(target);
                    }
                }
            }
        }

        let mut out = String::new();
        for (index, name) in members.iter().enumerate() {
            out.push_str(&format!("[{index}]"));
            match definitions.get(*name) {
                Some(Definition::Enum(shape)) => {
                    out.push_str(&format!("e[{}]", shape.values.join(",")));
                }
                Some(Definition::Object(object)) => self.encode_object(object, &numbering, &mut out),
                None => out.push_str(&format!("u:{name}")),
            }
        }
        out
    }

    fn encode_object(
        &mut self,
        object: &ObjectShape,
        numbering: &HashMap<&str, usize>,
        out: &mut String,
    ) {
        let mut parts = Vec::with_capacity(object.fields.len());
        for field in canonical_fields(object) {
            let mut part = format!(
                "{}:{}{}=",
                field.name,
                if field.nullable { "n" } else { "" },
                if field.required { "r" } else { "" }
            );
            self.encode_shape(&field.shape, numbering, &mut part);
            parts.push(part);
        }
        let marker = if object.ordered { "!" } else { "" };
        out.push_str(&format!("o{marker}{{{}}}", parts.join(";")));
    }

    fn encode_shape(
        &mut self,
        shape: &TypeShape,
        numbering: &HashMap<&str, usize>,
        out: &mut String,
    ) {
        match shape {
            TypeShape::Primitive(kind) => out.push_str(&primitive_tag(*kind)),
            TypeShape::Array(inner) => {
                out.push_str("a(");
                self.encode_shape(inner, numbering, out);
                out.push(')');
            }
            TypeShape::Map(inner) => {
                out.push_str("m(");
                self.encode_shape(inner, numbering, out);
                out.push(')');
            }
            TypeShape::Object(object) => self.encode_named(&object.name, numbering, out),
            TypeShape::Enum(shape) => self.encode_named(&shape.name, numbering, out),
            TypeShape::Reference(name) => self.encode_named(name, numbering, out),
            TypeShape::Unknown(name) => {
                out.push_str(&format!("u:{name}"));
            }
        }
    }

    fn encode_named(&mut self, name: &str, numbering: &HashMap<&str, usize>, out: &mut String) {
        if let Some(index) = numbering.get(name) {
            out.push_str(&format!("@{index}"));
        } else if self.definitions.contains_key(name) {
            let hash = self.fingerprint(name);
            out.push_str(&format!("#{hash}"));
        } else {
            out.push_str(&format!("u:{name}"));
        }
    }
}

/// Fields in encoding order: declaration order for ordered types, by name
/// otherwise
fn canonical_fields(object: &ObjectShape) -> Vec<&FieldShape> {
    let mut fields: Vec<&FieldShape> = object.fields.iter().collect();
    if !object.ordered {
        fields.sort_by(|a, b| a.name.cmp(&b.name));
    }
    fields
}

fn primitive_tag(kind: PrimitiveKind) -> String {
    format!(
        "p:{}/{}",
        kind.openapi_type().unwrap_or("any"),
        kind.openapi_format().unwrap_or_default()
    )
}

fn digest(text: &str) -> String {
    let hash = Sha256::digest(text.as_bytes());
    let mut hex = String::with_capacity(hash.len() * 2);
    for byte in hash.iter() {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

fn named_targets<'g>(shape: &'g TypeShape, out: &mut Vec<&'g str>) {
    match shape {
        TypeShape::Array(inner) | TypeShape::Map(inner) => named_targets(inner, out),
        TypeShape::Object(object) => out.push(&object.name),
        TypeShape::Enum(shape) => out.push(&shape.name),
        TypeShape::Reference(name) => out.push(name),
        TypeShape::Primitive(_) | TypeShape::Unknown(_) => {}
    }
}

/// Tarjan's algorithm over the definition graph: name -> component id.
fn strongly_connected(definitions: &BTreeMap<String, Definition>) -> HashMap<&str, usize> {
    let mut edges: HashMap<&str, Vec<&str>> = HashMap::new();
    for (name, definition) in definitions {
        let mut targets = Vec::new();
        if let Definition::Object(object) = definition {
            for field in &object.fields {
                named_targets(&field.shape, &mut targets);
            }
        }
        targets.retain(|t| definitions.contains_key(*t));
        edges.insert(name.as_str(), targets);
    }

    let mut state = Tarjan {
        edges: &edges,
        index: 0,
        indices: HashMap::new(),
        lowlinks: HashMap::new(),
        stack: Vec::new(),
        on_stack: HashMap::new(),
        components: HashMap::new(),
        next_component: 0,
    };
    for name in definitions.keys() {
        if !state.indices.contains_key(name.as_str()) {
            state.visit(name.as_str());
        }
    }
    state.components
}

struct Tarjan<'e, 'g> {
    edges: &'e HashMap<&'g str, Vec<&'g str>>,
    index: usize,
    indices: HashMap<&'g str, usize>,
    lowlinks: HashMap<&'g str, usize>,
    stack: Vec<&'g str>,
    on_stack: HashMap<&'g str, bool>,
    components: HashMap<&'g str, usize>,
    next_component: usize,
}

impl<'g> Tarjan<'_, 'g> {
    fn visit(&mut self, node: &'g str) {
        self.indices.insert(node, self.index);
        self.lowlinks.insert(node, self.index);
        self.index += 1;
        self.stack.push(node);
        self.on_stack.insert(node, true);

        let targets = self.edges.get(node).cloned().unwrap_or_default();
        for target in targets {
            if !self.indices.contains_key(target) {
                self.visit(target);
                let low = self.lowlinks[target].min(self.lowlinks[node]);
                self.lowlinks.insert(node, low);
            } else if self.on_stack.get(target).copied().unwrap_or(false) {
                let low = self.indices[target].min(self.lowlinks[node]);
                self.lowlinks.insert(node, low);
            }
        }

        if self.lowlinks[node] == self.indices[node] {
            while let Some(member) = self.stack.pop() {
                self.on_stack.insert(member, false);
                self.components.insert(member, self.next_component);
                if member == node {
                    break;
                }
            }
            self.next_component += 1;
        }
    }
}
