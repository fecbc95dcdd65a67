//! # OpenAPI Rendering
//!
//! Typed OpenAPI 3.1 output model and the rendering of an assembled
//! [`Document`] into it. Serialization goes through `serde_yaml` /
//! `serde_json`; the model derives `Deserialize` as well so generated files
//! can be read back.
//!
//! ## Rendering rules
//!
//! - nullable primitives, arrays and maps render with a type array including
//!   `"null"`: `type: [string, "null"]`
//! - nullable component references render as
//!   `oneOf: [{$ref: ...}, {type: "null"}]`
//! - unresolved types render as a schema carrying only a description
//! - dictionaries render as `type: object` with `additionalProperties`
//! - components appear in name order; paths, operations and responses in
//!   first-seen order

use crate::document::Document;
use crate::operation::{Operation, Parameter, RequestBody, Response};
use crate::reflect::PrimitiveKind;
use crate::schema::{ObjectSchema, SchemaNode};
use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const OPENAPI_VERSION: &str = "3.1.0";
pub const JSON_MEDIA_TYPE: &str = "application/json";
const COMPONENT_PREFIX: &str = "#/components/schemas/";

/// Serialization format of generated documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Yaml => "yml",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Yaml => write!(f, "yaml"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{other}'")),
        }
    }
}

/// Root document object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApi {
    pub openapi: String,
    pub info: Info,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub paths: IndexMap<String, IndexMap<String, OperationObject>>,
    #[serde(default, skip_serializing_if = "Components::is_empty")]
    pub components: Components,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationObject {
    pub operation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBodyObject>,
    pub responses: IndexMap<String, ResponseObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterObject {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    pub schema: Schema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBodyObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    pub content: IndexMap<String, MediaType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseObject {
    pub description: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: Schema,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: BTreeMap<String, Schema>,
}

impl Components {
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// `type` keyword: a single type or a type array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    Single(String),
    Multiple(Vec<String>),
}

/// The subset of JSON Schema used by generated documents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<Box<Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Schema>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    #[serde(rename = "oneOf", default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Schema>,
}

impl Schema {
    fn typed(name: &str) -> Self {
        Schema {
            schema_type: Some(SchemaType::Single(name.to_string())),
            ..Schema::default()
        }
    }

    fn reference(component: &str) -> Self {
        Schema {
            reference: Some(format!("{COMPONENT_PREFIX}{component}")),
            ..Schema::default()
        }
    }

    /// Component name of a `#/components/schemas/` reference
    pub fn referenced_component(&self) -> Option<&str> {
        self.reference.as_deref()?.strip_prefix(COMPONENT_PREFIX)
    }

    /// Allow `null` in addition to the current schema
    fn nullable(mut self) -> Self {
        if self.reference.is_some() {
            return Schema {
                one_of: vec![self, Schema::typed("null")],
                ..Schema::default()
            };
        }
        self.schema_type = match self.schema_type.take() {
            Some(SchemaType::Single(single)) => {
                Some(SchemaType::Multiple(vec![single, "null".to_string()]))
            }
            Some(SchemaType::Multiple(mut types)) => {
                if !types.iter().any(|t| t == "null") {
                    types.push("null".to_string());
                }
                Some(SchemaType::Multiple(types))
            }
            // untyped schemas already admit null
            None => None,
        };
        self
    }
}

impl OpenApi {
    /// Render an assembled document
    pub fn from_document(document: &Document) -> Self {
        let mut paths: IndexMap<String, IndexMap<String, OperationObject>> = IndexMap::new();
        for operation in &document.operations {
            paths
                .entry(operation.path.clone())
                .or_default()
                .insert(
                    operation.method.as_str().to_ascii_lowercase(),
                    render_operation(operation),
                );
        }

        OpenApi {
            openapi: OPENAPI_VERSION.to_string(),
            info: Info {
                title: document.title.clone(),
                version: document.version.clone(),
            },
            servers: document
                .servers
                .iter()
                .map(|url| Server { url: url.clone() })
                .collect(),
            tags: document
                .tags
                .iter()
                .map(|name| Tag { name: name.clone() })
                .collect(),
            paths,
            components: Components {
                schemas: document
                    .components
                    .iter()
                    .map(|(name, node)| (name.clone(), render_node(node)))
                    .collect(),
            },
        }
    }

    pub fn to_yaml(&self) -> anyhow::Result<String> {
        serde_yaml::to_string(self).context("failed to serialize document as YAML")
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize document as JSON")
    }

    pub fn to_format(&self, format: OutputFormat) -> anyhow::Result<String> {
        match format {
            OutputFormat::Yaml => self.to_yaml(),
            OutputFormat::Json => self.to_json(),
        }
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(text).context("failed to parse YAML document")
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        serde_json::from_str(text).context("failed to parse JSON document")
    }
}

fn render_operation(operation: &Operation) -> OperationObject {
    OperationObject {
        operation_id: operation.operation_id.clone(),
        summary: operation.summary.clone(),
        description: operation.description.clone(),
        tags: operation.tags.clone(),
        parameters: operation.parameters.iter().map(render_parameter).collect(),
        request_body: operation.request_body.as_ref().map(render_request_body),
        responses: operation
            .responses
            .iter()
            .map(|r| (r.code.clone(), render_response(r)))
            .collect(),
    }
}

fn render_parameter(parameter: &Parameter) -> ParameterObject {
    ParameterObject {
        name: parameter.name.clone(),
        location: parameter.location.as_str().to_string(),
        description: parameter.description.clone(),
        required: parameter.required,
        schema: usage_schema(&parameter.schema, parameter.nullable),
    }
}

fn render_request_body(body: &RequestBody) -> RequestBodyObject {
    let mut content = IndexMap::new();
    content.insert(
        JSON_MEDIA_TYPE.to_string(),
        MediaType {
            schema: usage_schema(&body.schema, body.nullable),
        },
    );
    RequestBodyObject {
        description: body.description.clone(),
        required: body.required,
        content,
    }
}

fn render_response(response: &Response) -> ResponseObject {
    let mut content = IndexMap::new();
    if let Some(schema) = &response.schema {
        content.insert(
            JSON_MEDIA_TYPE.to_string(),
            MediaType {
                schema: usage_schema(schema, response.nullable),
            },
        );
    }
    ResponseObject {
        description: response.description.clone(),
        content,
    }
}

fn usage_schema(node: &SchemaNode, nullable: bool) -> Schema {
    let schema = render_node(node);
    if nullable {
        schema.nullable()
    } else {
        schema
    }
}

fn render_primitive(kind: PrimitiveKind) -> Schema {
    Schema {
        schema_type: kind
            .openapi_type()
            .map(|t| SchemaType::Single(t.to_string())),
        format: kind.openapi_format().map(str::to_string),
        ..Schema::default()
    }
}

fn render_node(node: &SchemaNode) -> Schema {
    match node {
        SchemaNode::Primitive(kind) => render_primitive(*kind),
        SchemaNode::Array(inner) => Schema {
            items: Some(Box::new(render_node(inner))),
            ..Schema::typed("array")
        },
        SchemaNode::Map(inner) => Schema {
            additional_properties: Some(Box::new(render_node(inner))),
            ..Schema::typed("object")
        },
        SchemaNode::Reference(name) => Schema::reference(name),
        SchemaNode::Unknown(name) => Schema {
            description: Some(format!("Unresolved type '{name}'")),
            ..Schema::default()
        },
        SchemaNode::Object(object) => render_object(object),
        SchemaNode::Enum(values) => Schema {
            description: values.description.clone(),
            enum_values: values.values.clone(),
            ..Schema::typed("string")
        },
    }
}

fn render_object(object: &ObjectSchema) -> Schema {
    let mut properties = IndexMap::with_capacity(object.properties.len());
    let mut required = Vec::new();
    for property in &object.properties {
        let mut schema = usage_schema(&property.schema, property.nullable);
        if property.description.is_some() && schema.description.is_none() {
            schema.description = property.description.clone();
        }
        if property.required {
            required.push(property.name.clone());
        }
        properties.insert(property.name.clone(), schema);
    }
    Schema {
        description: object.description.clone(),
        properties: Some(properties),
        required,
        ..Schema::typed("object")
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::schema::{EnumSchema, Property};

    #[test]
    fn test_nullable_rendering() {
        let string = usage_schema(&SchemaNode::string(), true);
        assert_eq!(
            string.schema_type,
            Some(SchemaType::Multiple(vec!["string".into(), "null".into()]))
        );

        let reference = usage_schema(&SchemaNode::Reference("Pet".into()), true);
        assert!(reference.reference.is_none());
        assert_eq!(reference.one_of.len(), 2);
        assert_eq!(reference.one_of[0].referenced_component(), Some("Pet"));
        assert_eq!(
            reference.one_of[1].schema_type,
            Some(SchemaType::Single("null".into()))
        );

        let list = usage_schema(
            &SchemaNode::Array(Box::new(SchemaNode::Primitive(PrimitiveKind::Int32))),
            true,
        );
        assert_eq!(
            list.schema_type,
            Some(SchemaType::Multiple(vec!["array".into(), "null".into()]))
        );
        assert_eq!(list.items.unwrap().format.as_deref(), Some("int32"));

        let any = usage_schema(&SchemaNode::Primitive(PrimitiveKind::Any), true);
        assert_eq!(any, Schema::default());
    }

    #[test]
    fn test_unknown_and_map_rendering() {
        let unknown = render_node(&SchemaNode::Unknown("Contoso.Missing".into()));
        assert!(unknown.schema_type.is_none());
        assert_eq!(
            unknown.description.as_deref(),
            Some("Unresolved type 'Contoso.Missing'")
        );

        let map = render_node(&SchemaNode::Map(Box::new(SchemaNode::Reference(
            "Pet".into(),
        ))));
        assert_eq!(map.schema_type, Some(SchemaType::Single("object".into())));
        assert_eq!(
            map.additional_properties.unwrap().referenced_component(),
            Some("Pet")
        );
    }

    #[test]
    fn test_component_rendering() {
        let object = SchemaNode::Object(ObjectSchema {
            description: Some("A pet".into()),
            properties: vec![
                Property {
                    name: "Id".into(),
                    schema: SchemaNode::Primitive(PrimitiveKind::Int64),
                    nullable: false,
                    required: true,
                    description: Some("Identifier".into()),
                },
                Property {
                    name: "Owner".into(),
                    schema: SchemaNode::Reference("Person".into()),
                    nullable: true,
                    required: false,
                    description: None,
                },
            ],
        });
        let schema = render_node(&object);
        assert_eq!(schema.required, vec!["Id".to_string()]);
        let properties = schema.properties.unwrap();
        assert_eq!(properties.keys().collect::<Vec<_>>(), vec!["Id", "Owner"]);
        assert_eq!(properties["Id"].description.as_deref(), Some("Identifier"));
        assert_eq!(properties["Owner"].one_of.len(), 2);

        let color = render_node(&SchemaNode::Enum(EnumSchema {
            description: None,
            values: vec!["Red".into(), "Green".into()],
        }));
        assert_eq!(color.enum_values, vec!["Red".to_string(), "Green".to_string()]);
    }

    #[test]
    fn test_output_format() {
        assert_eq!("YML".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert_eq!(OutputFormat::Json.extension(), "json");
        assert!("toml".parse::<OutputFormat>().is_err());
    }
}
