use crate::ids::TypeRef;
use std::sync::Arc;

/// Primitive kinds known to the reflector, with their OpenAPI rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    String,
    Char,
    Boolean,
    Byte,
    SByte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    Decimal,
    DateTime,
    DateTimeOffset,
    DateOnly,
    TimeOnly,
    TimeSpan,
    Guid,
    Uri,
    /// Base64 encoded bytes (`System.Byte[]`)
    Binary,
    /// `System.Object`: any JSON value
    Any,
}

impl PrimitiveKind {
    /// Map a CLR type name or a C# keyword alias to a primitive kind
    pub fn from_type_name(name: &str) -> Option<Self> {
        let clr = name.strip_prefix("System.").unwrap_or(name);
        let kind = match clr {
            "String" | "string" => PrimitiveKind::String,
            "Char" | "char" => PrimitiveKind::Char,
            "Boolean" | "bool" => PrimitiveKind::Boolean,
            "Byte" | "byte" => PrimitiveKind::Byte,
            "SByte" | "sbyte" => PrimitiveKind::SByte,
            "Int16" | "short" => PrimitiveKind::Int16,
            "UInt16" | "ushort" => PrimitiveKind::UInt16,
            "Int32" | "int" => PrimitiveKind::Int32,
            "UInt32" | "uint" => PrimitiveKind::UInt32,
            "Int64" | "long" => PrimitiveKind::Int64,
            "UInt64" | "ulong" => PrimitiveKind::UInt64,
            "Single" | "float" => PrimitiveKind::Single,
            "Double" | "double" => PrimitiveKind::Double,
            "Decimal" | "decimal" => PrimitiveKind::Decimal,
            "DateTime" => PrimitiveKind::DateTime,
            "DateTimeOffset" => PrimitiveKind::DateTimeOffset,
            "DateOnly" => PrimitiveKind::DateOnly,
            "TimeOnly" => PrimitiveKind::TimeOnly,
            "TimeSpan" => PrimitiveKind::TimeSpan,
            "Guid" => PrimitiveKind::Guid,
            "Uri" => PrimitiveKind::Uri,
            "Object" | "object" => PrimitiveKind::Any,
            _ => return None,
        };
        Some(kind)
    }

    /// OpenAPI `type` (None for [`PrimitiveKind::Any`])
    pub fn openapi_type(&self) -> Option<&'static str> {
        match self {
            PrimitiveKind::Boolean => Some("boolean"),
            PrimitiveKind::Byte
            | PrimitiveKind::SByte
            | PrimitiveKind::Int16
            | PrimitiveKind::UInt16
            | PrimitiveKind::Int32
            | PrimitiveKind::UInt32
            | PrimitiveKind::Int64
            | PrimitiveKind::UInt64 => Some("integer"),
            PrimitiveKind::Single | PrimitiveKind::Double | PrimitiveKind::Decimal => Some("number"),
            PrimitiveKind::Any => None,
            _ => Some("string"),
        }
    }

    pub fn openapi_format(&self) -> Option<&'static str> {
        match self {
            PrimitiveKind::Byte
            | PrimitiveKind::SByte
            | PrimitiveKind::Int16
            | PrimitiveKind::UInt16
            | PrimitiveKind::Int32 => Some("int32"),
            PrimitiveKind::UInt32 | PrimitiveKind::Int64 | PrimitiveKind::UInt64 => Some("int64"),
            PrimitiveKind::Single => Some("float"),
            PrimitiveKind::Double | PrimitiveKind::Decimal => Some("double"),
            PrimitiveKind::DateTime | PrimitiveKind::DateTimeOffset => Some("date-time"),
            PrimitiveKind::DateOnly => Some("date"),
            PrimitiveKind::TimeOnly => Some("time"),
            PrimitiveKind::TimeSpan => Some("duration"),
            PrimitiveKind::Guid => Some("uuid"),
            PrimitiveKind::Uri => Some("uri"),
            PrimitiveKind::Binary => Some("byte"),
            _ => None,
        }
    }
}

/// Structural description of a type.
///
/// Objects and enums are shared behind `Arc`. A type that refers to an
/// object still being resolved, or to one already expanded elsewhere in the
/// same shape, is represented by [`TypeShape::Reference`] holding that
/// object's name, so shapes are finite trees with each object spelled out
/// once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    Primitive(PrimitiveKind),
    Array(Box<TypeShape>),
    /// Dictionary with string keys
    Map(Box<TypeShape>),
    Object(Arc<ObjectShape>),
    Enum(Arc<EnumShape>),
    /// Object with this name, expanded elsewhere in the same shape
    Reference(String),
    /// Placeholder for a type that could not be resolved
    Unknown(String),
}

impl TypeShape {
    /// Qualified name of a named shape
    pub fn name(&self) -> Option<&str> {
        match self {
            TypeShape::Object(object) => Some(&object.name),
            TypeShape::Enum(shape) => Some(&shape.name),
            TypeShape::Reference(name) | TypeShape::Unknown(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, TypeShape::Unknown(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectShape {
    /// Closed type expression in text form (`Ns.Page{Ns.Pet}`)
    pub name: String,
    pub type_ref: TypeRef,
    pub ordered: bool,
    pub fields: Vec<FieldShape>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldShape {
    pub name: String,
    pub shape: TypeShape,
    pub nullable: bool,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumShape {
    pub name: String,
    pub type_ref: TypeRef,
    pub values: Vec<String>,
}
