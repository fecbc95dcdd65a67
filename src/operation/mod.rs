//! # Operation Builder
//!
//! Turns a documented method into an [`Operation`].
//!
//! Building happens in two steps around schema canonicalization:
//!
//! 1. [`OperationTypes::resolve`] resolves the types of the documented
//!    parameters and responses with the [`TypeReflector`];
//! 2. once every shape of the run is canonicalized, [`OperationBuilder::build`]
//!    combines the route, the annotation record and the [`SchemaIndex`].
//!
//! ## Parameter locations
//!
//! An explicit `in` attribute wins. Otherwise a name in the query template is a
//! query parameter, a name in the path template is a path parameter, and
//! anything else is a query parameter. `in="body"` parameters become the
//! request body. Template variables without a `<param>` are added as strings
//! with a warning.

mod route;


pub use route::RouteMetadata;

use crate::annotations::{AnnotationRecord, ParamDoc, ParameterLocation};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::ids::MemberIdentifier;
use crate::reflect::{ResolvedType, TypeReflector, TypeShape};
use crate::schema::{SchemaIndex, SchemaNode};
use http::{Method, StatusCode};
use std::collections::{BTreeSet, HashMap};

/// A request parameter (never [`ParameterLocation::Body`])
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub location: ParameterLocation,
    pub description: Option<String>,
    pub required: bool,
    pub nullable: bool,
    pub schema: SchemaNode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBody {
    pub description: Option<String>,
    pub required: bool,
    pub nullable: bool,
    pub schema: SchemaNode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub code: String,
    pub description: String,
    pub nullable: bool,
    /// `None` for description-only responses
    pub schema: Option<SchemaNode>,
}

/// One documented endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub member: MemberIdentifier,
    pub operation_id: String,
    pub method: Method,
    pub path: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub parameters: Vec<Parameter>,
    pub request_body: Option<RequestBody>,
    /// Responses in documentation order, unique by code
    pub responses: Vec<Response>,
    pub tags: Vec<String>,
    pub server: Option<String>,
    /// First `<group>` tag, used by the `group` grouping scheme
    pub group: Option<String>,
}

impl Operation {
    /// Every schema used by the operation
    pub fn schemas(&self) -> impl Iterator<Item = &SchemaNode> {
        self.parameters
            .iter()
            .map(|p| &p.schema)
            .chain(self.request_body.iter().map(|b| &b.schema))
            .chain(self.responses.iter().filter_map(|r| r.schema.as_ref()))
    }

    /// Component names referenced directly by the operation
    pub fn schema_references(&self) -> BTreeSet<&str> {
        self.schemas().flat_map(SchemaNode::references).collect()
    }
}

/// Resolved parameter and response types of one operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationTypes {
    params: HashMap<String, ResolvedType>,
    responses: HashMap<String, ResolvedType>,
}

impl OperationTypes {
    /// Resolve the type of every documented parameter and response.
    ///
    /// A parameter's type is its `cref`, else the method signature's type at
    /// the same position when the documented and declared counts match, else
    /// it stays unresolved and renders as a string.
    pub fn resolve(
        id: &MemberIdentifier,
        record: &AnnotationRecord,
        reflector: &TypeReflector<'_>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Self {
        let mut types = OperationTypes::default();
        let signature = id.parameter_types();
        let positional = signature.len() == record.params.len();

        for (position, param) in record.params.iter().enumerate() {
            if types.params.contains_key(&param.name) {
                continue;
            }
            let expr = match (&param.cref, positional) {
                (Some(cref), _) => Some(cref.as_str()),
                (None, true) => signature.get(position).map(String::as_str),
                (None, false) => None,
            };
            if let Some(expr) = expr {
                let resolved = reflector.resolve_type_name(expr, Some(id), diagnostics);
                types.params.insert(param.name.clone(), resolved);
            }
        }

        for response in &record.responses {
            if types.responses.contains_key(&response.code) {
                continue;
            }
            if let Some(cref) = &response.cref {
                let resolved = reflector.resolve_type_name(cref, Some(id), diagnostics);
                types.responses.insert(response.code.clone(), resolved);
            }
        }
        types
    }

    /// Shapes to canonicalize
    pub fn shapes(&self) -> impl Iterator<Item = &TypeShape> {
        self.params
            .values()
            .chain(self.responses.values())
            .map(|resolved| &resolved.shape)
    }
}

/// Builds operations against the canonical schemas of the run
#[derive(Debug, Clone, Copy)]
pub struct OperationBuilder<'a> {
    index: &'a SchemaIndex,
}

impl<'a> OperationBuilder<'a> {
    pub fn new(index: &'a SchemaIndex) -> Self {
        OperationBuilder { index }
    }

    pub fn build(
        &self,
        id: &MemberIdentifier,
        record: &AnnotationRecord,
        route: &RouteMetadata,
        types: &OperationTypes,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Operation {
        let path_vars = route.path_params();
        let mut parameters: Vec<Parameter> = Vec::new();
        let mut request_body: Option<RequestBody> = None;

        for param in &record.params {
            let resolved = types.params.get(&param.name);
            let schema = resolved
                .map(|r| self.index.schema_for(&r.shape))
                .unwrap_or_else(SchemaNode::string);
            let nullable = resolved.is_some_and(|r| r.nullable);

            let location = match param.location {
                Some(ParameterLocation::Body) => {
                    if request_body.is_some() {
                        diagnostics.push(Diagnostic::warning(
                            DiagnosticKind::MalformedInput,
                            format!("second body parameter '{}' ignored", param.name),
                            Some(id),
                        ));
                    } else {
                        request_body = Some(RequestBody {
                            description: description_of(param),
                            required: param.required.unwrap_or(true),
                            nullable,
                            schema,
                        });
                    }
                    continue;
                }
                Some(explicit) => explicit,
                None if route.query_params.contains(&param.name) => ParameterLocation::Query,
                None if path_vars.contains(&param.name) => ParameterLocation::Path,
                None => ParameterLocation::Query,
            };

            if location == ParameterLocation::Path && !path_vars.contains(&param.name) {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticKind::UnusedPathParameter,
                    format!(
                        "path parameter '{}' does not appear in '{}'; dropped",
                        param.name, route.path
                    ),
                    Some(id),
                ));
                continue;
            }
            if parameters
                .iter()
                .any(|p| p.name == param.name && p.location == location)
            {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticKind::MalformedInput,
                    format!("parameter '{}' documented more than once", param.name),
                    Some(id),
                ));
                continue;
            }

            parameters.push(Parameter {
                name: param.name.clone(),
                location,
                description: description_of(param),
                required: location == ParameterLocation::Path || param.required.unwrap_or(false),
                nullable,
                schema,
            });
        }

        for var in &path_vars {
            let documented = parameters
                .iter()
                .any(|p| p.location == ParameterLocation::Path && p.name == *var);
            if !documented {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticKind::UndocumentedPathParameter,
                    format!("path variable '{var}' has no <param>; added as a string"),
                    Some(id),
                ));
                parameters.push(Parameter {
                    name: var.clone(),
                    location: ParameterLocation::Path,
                    description: None,
                    required: true,
                    nullable: false,
                    schema: SchemaNode::string(),
                });
            }
        }

        for var in &route.query_params {
            let documented = parameters
                .iter()
                .any(|p| p.location == ParameterLocation::Query && p.name == *var);
            if !documented {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticKind::UndocumentedQueryParameter,
                    format!("query variable '{var}' has no <param>; added as an optional string"),
                    Some(id),
                ));
                parameters.push(Parameter {
                    name: var.clone(),
                    location: ParameterLocation::Query,
                    description: None,
                    required: false,
                    nullable: false,
                    schema: SchemaNode::string(),
                });
            }
        }

        let responses = self.responses(id, record, types, diagnostics);
        let tags = operation_tags(id, record);

        Operation {
            member: id.clone(),
            operation_id: operation_id(id),
            method: route.method.clone(),
            path: route.path.clone(),
            summary: record.summary.clone(),
            description: record.remarks.clone(),
            parameters,
            request_body,
            responses,
            tags,
            server: route.server.clone(),
            group: record.tag_values("group").next().map(str::to_string),
        }
    }

    fn responses(
        &self,
        id: &MemberIdentifier,
        record: &AnnotationRecord,
        types: &OperationTypes,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<Response> {
        let mut responses: Vec<Response> = Vec::new();
        for response in &record.responses {
            if responses.iter().any(|r| r.code == response.code) {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticKind::DuplicateResponse,
                    format!("response {} documented more than once; the first is kept", response.code),
                    Some(id),
                ));
                continue;
            }
            let resolved = types.responses.get(&response.code);
            let description = if response.description.is_empty() {
                default_description(&response.code)
            } else {
                response.description.clone()
            };
            responses.push(Response {
                code: response.code.clone(),
                description,
                nullable: resolved.is_some_and(|r| r.nullable),
                schema: resolved.map(|r| self.index.schema_for(&r.shape)),
            });
        }

        if responses.is_empty() {
            diagnostics.push(Diagnostic::warning(
                DiagnosticKind::MissingResponse,
                "operation documents no response; a default response was added",
                Some(id),
            ));
            responses.push(Response {
                code: "default".to_string(),
                description: default_description("default"),
                nullable: false,
                schema: None,
            });
        }
        responses
    }
}

fn description_of(param: &ParamDoc) -> Option<String> {
    if param.description.is_empty() {
        None
    } else {
        Some(param.description.clone())
    }
}

fn default_description(code: &str) -> String {
    code.parse::<u16>()
        .ok()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .and_then(|status| status.canonical_reason())
        .unwrap_or("Response")
        .to_string()
}

fn strip_arity(name: &str) -> &str {
    name.split('`').next().unwrap_or(name)
}

/// `<DeclaringTypeSimpleName>_<MethodName>`
pub fn operation_id(id: &MemberIdentifier) -> String {
    format!(
        "{}_{}",
        strip_arity(id.declaring_type_simple_name()),
        strip_arity(id.member_name())
    )
}

/// `<group>` values, or the declaring type without a `Controller` suffix
fn operation_tags(id: &MemberIdentifier, record: &AnnotationRecord) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for group in record.tag_values("group") {
        if !tags.iter().any(|t| t == group) {
            tags.push(group.to_string());
        }
    }
    if tags.is_empty() {
        let declaring = strip_arity(id.declaring_type_simple_name());
        let tag = match declaring.strip_suffix("Controller") {
            Some(stripped) if !stripped.is_empty() => stripped,
            _ => declaring,
        };
        if !tag.is_empty() {
            tags.push(tag.to_string());
        }
    }
    tags
}
