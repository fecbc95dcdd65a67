//! # Type Reflector
//!
//! Resolves type expressions against the [`TypeCatalog`] into [`TypeShape`]s.
//!
//! Resolution keeps the stack of objects currently being expanded. A field
//! whose type is already on that stack, or was already expanded elsewhere in
//! the same resolution, becomes a [`TypeShape::Reference`] instead of being
//! expanded again. Each declared object is therefore expanded at most once
//! per resolution, and recursive types stay finite.
//!
//! A generic definition that instantiates itself with ever larger arguments
//! (`Node{T}` holding a `Node{List{T}}`) has no finite expansion; the growing
//! instantiation resolves to [`TypeShape::Unknown`] with an error diagnostic.
//! So do types that are neither primitives, well-known collections nor
//! declared in the catalog.

mod shape;


pub use shape::{EnumShape, FieldShape, ObjectShape, PrimitiveKind, TypeShape};

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::ids::{MemberIdentifier, MemberKind, TypeRef};
use crate::metadata::{TypeCatalog, TypeDecl};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Marker for "no back-reference escapes this shape"
const CLOSED: usize = usize::MAX;

/// Objects nested deeper than this are not expanded
const MAX_DEPTH: usize = 64;

/// A resolved type and whether it was wrapped in `Nullable{T}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    pub shape: TypeShape,
    pub nullable: bool,
}

/// Read-only view over the catalog used to resolve types.
#[derive(Debug, Clone, Copy)]
pub struct TypeReflector<'a> {
    catalog: &'a TypeCatalog,
}

impl<'a> TypeReflector<'a> {
    pub fn new(catalog: &'a TypeCatalog) -> Self {
        TypeReflector { catalog }
    }

    /// Resolve a `T:` member identifier
    pub fn resolve(&self, id: &MemberIdentifier, diagnostics: &mut Vec<Diagnostic>) -> TypeShape {
        match id.type_ref() {
            Some(ty) => self.resolve_type(&ty, Some(id), diagnostics).shape,
            None => {
                let reason = if id.kind() == MemberKind::Type {
                    "malformed type expression"
                } else {
                    "not a type identifier"
                };
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::UnresolvedType,
                    format!("cannot resolve '{id}': {reason}"),
                    Some(id),
                ));
                TypeShape::Unknown(id.name().to_string())
            }
        }
    }

    /// Resolve a parsed type expression. `origin` is the member the type was
    /// reached from and is attached to any diagnostic.
    pub fn resolve_type(
        &self,
        ty: &TypeRef,
        origin: Option<&MemberIdentifier>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> ResolvedType {
        let mut resolution = Resolution {
            catalog: self.catalog,
            origin,
            diagnostics,
            path: Vec::new(),
            cache: HashMap::new(),
            expanded: HashMap::new(),
            reported: HashSet::new(),
        };
        let resolved = resolution.resolve_ref(ty);
        ResolvedType {
            shape: resolved.shape,
            nullable: resolved.nullable,
        }
    }

    /// Parse and resolve a type expression given as text (a cref or a
    /// signature parameter type)
    pub fn resolve_type_name(
        &self,
        expr: &str,
        origin: Option<&MemberIdentifier>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> ResolvedType {
        match expr.parse::<TypeRef>() {
            Ok(ty) => self.resolve_type(&ty, origin, diagnostics),
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::UnresolvedType,
                    e.to_string(),
                    origin,
                ));
                ResolvedType {
                    shape: TypeShape::Unknown(expr.trim().to_string()),
                    nullable: false,
                }
            }
        }
    }
}

struct Resolved {
    shape: TypeShape,
    nullable: bool,
    /// Lowest stack depth referenced from inside this shape, or [`CLOSED`]
    free: usize,
}

impl Resolved {
    fn closed(shape: TypeShape) -> Self {
        Resolved {
            shape,
            nullable: false,
            free: CLOSED,
        }
    }
}

enum WellKnown {
    Nullable,
    Collection,
    Dictionary,
}

fn well_known_generic(ty: &TypeRef) -> Option<WellKnown> {
    let TypeRef::Named { args, .. } = ty else {
        return None;
    };
    let namespace = ty.namespace_segments();
    if !(namespace.is_empty() || namespace[0] == "System") {
        return None;
    }
    let simple = ty.simple_name();
    match (simple.as_str(), args.len()) {
        ("Nullable", 1) => Some(WellKnown::Nullable),
        (
            "List" | "IList" | "IEnumerable" | "ICollection" | "IReadOnlyList"
            | "IReadOnlyCollection" | "HashSet" | "ISet" | "Collection",
            1,
        ) => Some(WellKnown::Collection),
        ("Dictionary" | "IDictionary" | "IReadOnlyDictionary", 2) => Some(WellKnown::Dictionary),
        _ => None,
    }
}

fn is_byte(ty: &TypeRef) -> bool {
    match ty {
        TypeRef::Named { name, args } => {
            args.is_empty() && PrimitiveKind::from_type_name(name) == Some(PrimitiveKind::Byte)
        }
        TypeRef::Array(_) => false,
    }
}

/// Replace generic parameters of an open definition by the closed arguments.
fn substitute(ty: &TypeRef, params: &[String], args: &[TypeRef]) -> TypeRef {
    match ty {
        TypeRef::Named { name, args: inner } if inner.is_empty() => {
            let index = params
                .iter()
                .position(|p| p == name)
                .or_else(|| name.strip_prefix('`').and_then(|i| i.parse::<usize>().ok()));
            match index.and_then(|i| args.get(i)) {
                Some(arg) => arg.clone(),
                None => ty.clone(),
            }
        }
        TypeRef::Named { name, args: inner } => TypeRef::Named {
            name: name.clone(),
            args: inner.iter().map(|a| substitute(a, params, args)).collect(),
        },
        TypeRef::Array(inner) => TypeRef::Array(Box::new(substitute(inner, params, args))),
    }
}

/// Whether `needle` occurs anywhere inside `ty`, `ty` itself included
fn contains(ty: &TypeRef, needle: &TypeRef) -> bool {
    ty == needle
        || match ty {
            TypeRef::Named { args, .. } => args.iter().any(|arg| contains(arg, needle)),
            TypeRef::Array(inner) => contains(inner, needle),
        }
}

/// `args` wraps every one of `outer` without being equal to it: expanding the
/// definition again would grow the arguments without bound.
fn grows(args: &[TypeRef], outer: &[TypeRef]) -> bool {
    args != outer
        && !outer.is_empty()
        && outer
            .iter()
            .all(|o| args.iter().any(|a| contains(a, o)))
}

/// Find the declaration of a type: the closed name first, then the open
/// generic definition (`Ns.Page`1`, then `Ns.Page`).
fn lookup<'c>(
    catalog: &'c TypeCatalog,
    ty: &TypeRef,
) -> Option<(&'c TypeDecl, Vec<String>, Vec<TypeRef>)> {
    if let Some(decl) = catalog.get(&ty.to_string()) {
        return Some((decl, Vec::new(), Vec::new()));
    }
    let TypeRef::Named { name, args } = ty else {
        return None;
    };
    if args.is_empty() {
        return None;
    }
    let decl = catalog
        .get(&format!("{name}`{}", args.len()))
        .or_else(|| catalog.get(name))?;
    let params = match decl {
        TypeDecl::Object {
            type_parameters, ..
        } => type_parameters.clone(),
        TypeDecl::Enum { .. } => Vec::new(),
    };
    Some((decl, params, args.clone()))
}

/// State of one top-level resolution
struct Resolution<'c, 'd> {
    catalog: &'c TypeCatalog,
    origin: Option<&'d MemberIdentifier>,
    diagnostics: &'d mut Vec<Diagnostic>,
    /// Objects currently being expanded, outermost first
    path: Vec<PathEntry>,
    /// Fully self-contained shapes already built in this resolution
    cache: HashMap<String, TypeShape>,
    /// Objects built in this resolution that refer to an enclosing object,
    /// with the lowest depth they refer to
    expanded: HashMap<String, usize>,
    reported: HashSet<String>,
}

struct PathEntry {
    key: String,
    /// Open generic definition and the arguments it was closed with
    generic: Option<(String, Vec<TypeRef>)>,
}

impl Resolution<'_, '_> {
    fn resolve_ref(&mut self, ty: &TypeRef) -> Resolved {
        match ty {
            TypeRef::Array(inner) if is_byte(inner) => {
                Resolved::closed(TypeShape::Primitive(PrimitiveKind::Binary))
            }
            TypeRef::Array(inner) => {
                let element = self.resolve_ref(inner);
                Resolved {
                    shape: TypeShape::Array(Box::new(element.shape)),
                    nullable: false,
                    free: element.free,
                }
            }
            TypeRef::Named { name, args } => {
                if args.is_empty() {
                    if let Some(kind) = PrimitiveKind::from_type_name(name) {
                        return Resolved::closed(TypeShape::Primitive(kind));
                    }
                }
                match well_known_generic(ty) {
                    Some(WellKnown::Nullable) => {
                        let mut inner = self.resolve_ref(&args[0]);
                        inner.nullable = true;
                        inner
                    }
                    Some(WellKnown::Collection) => {
                        let element = self.resolve_ref(&args[0]);
                        Resolved {
                            shape: TypeShape::Array(Box::new(element.shape)),
                            nullable: false,
                            free: element.free,
                        }
                    }
                    Some(WellKnown::Dictionary) => {
                        let value = self.resolve_ref(&args[1]);
                        Resolved {
                            shape: TypeShape::Map(Box::new(value.shape)),
                            nullable: false,
                            free: value.free,
                        }
                    }
                    None => self.resolve_declared(ty),
                }
            }
        }
    }

    fn resolve_declared(&mut self, ty: &TypeRef) -> Resolved {
        let key = ty.to_string();

        if let Some(depth) = self.path.iter().position(|entry| entry.key == key) {
            return Resolved {
                shape: TypeShape::Reference(key),
                nullable: false,
                free: depth,
            };
        }
        if let Some(shape) = self.cache.get(&key) {
            return Resolved::closed(shape.clone());
        }
        if let Some(&free) = self.expanded.get(&key) {
            return Resolved {
                shape: TypeShape::Reference(key),
                nullable: false,
                free,
            };
        }

        let catalog = self.catalog;
        let Some((decl, params, args)) = lookup(catalog, ty) else {
            self.report_unresolved(&key);
            return Resolved::closed(TypeShape::Unknown(key));
        };

        match decl {
            TypeDecl::Enum { values, .. } => {
                if values.is_empty() {
                    self.diagnostics.push(Diagnostic::warning(
                        DiagnosticKind::UnresolvedType,
                        format!("enum '{key}' declares no values"),
                        self.origin,
                    ));
                }
                let shape = TypeShape::Enum(Arc::new(EnumShape {
                    name: key.clone(),
                    type_ref: ty.clone(),
                    values: values.clone(),
                }));
                self.cache.insert(key, shape.clone());
                Resolved::closed(shape)
            }
            TypeDecl::Object {
                name: definition,
                ordered,
                fields,
                ..
            } => {
                let unbounded = !args.is_empty()
                    && self.path.iter().any(|entry| {
                        matches!(&entry.generic, Some((open, outer)) if open == definition && grows(&args, outer))
                    });
                if unbounded || self.path.len() >= MAX_DEPTH {
                    self.diagnostics.push(Diagnostic::error(
                        DiagnosticKind::UnresolvedType,
                        format!("type '{key}' nests itself without bound and cannot be expanded"),
                        self.origin,
                    ));
                    return Resolved::closed(TypeShape::Unknown(key));
                }

                let depth = self.path.len();
                self.path.push(PathEntry {
                    key: key.clone(),
                    generic: (!args.is_empty()).then(|| (definition.clone(), args.clone())),
                });

                let mut free = CLOSED;
                let mut shaped = Vec::with_capacity(fields.len());
                for field in fields {
                    let field_type = match field.type_name.parse::<TypeRef>() {
                        Ok(parsed) => substitute(&parsed, &params, &args),
                        Err(e) => {
                            self.diagnostics.push(Diagnostic::error(
                                DiagnosticKind::UnresolvedType,
                                format!("field '{}' of '{key}': {e}", field.name),
                                self.origin,
                            ));
                            shaped.push(FieldShape {
                                name: field.name.clone(),
                                shape: TypeShape::Unknown(field.type_name.clone()),
                                nullable: field.nullable,
                                required: field.required,
                            });
                            continue;
                        }
                    };
                    let resolved = self.resolve_ref(&field_type);
                    free = free.min(resolved.free);
                    shaped.push(FieldShape {
                        name: field.name.clone(),
                        shape: resolved.shape,
                        nullable: field.nullable || resolved.nullable,
                        required: field.required,
                    });
                }
                self.path.pop();

                let shape = TypeShape::Object(Arc::new(ObjectShape {
                    name: key.clone(),
                    type_ref: ty.clone(),
                    ordered: *ordered,
                    fields: shaped,
                }));
                // References to this object itself stay inside the shape.
                if free >= depth {
                    self.cache.insert(key, shape.clone());
                    free = CLOSED;
                } else {
                    self.expanded.insert(key, free);
                }
                Resolved {
                    shape,
                    nullable: false,
                    free,
                }
            }
        }
    }

    fn report_unresolved(&mut self, key: &str) {
        if !self.reported.insert(key.to_string()) {
            return;
        }
        self.diagnostics.push(Diagnostic::error(
            DiagnosticKind::UnresolvedType,
            format!("type '{key}' is not described by any type metadata"),
            self.origin,
        ));
    }
}
