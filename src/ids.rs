//! Identifiers shared by every stage: documented member identifiers
//! (`M:Ns.Type.Method(System.String)`) and type expressions
//! (`System.Collections.Generic.List{Ns.Pet}`, `Ns.Pet[]`).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Error produced when a member identifier or type expression cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdentifierError {
    pub input: String,
    pub reason: &'static str,
}

impl Display for ParseIdentifierError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid identifier '{}': {}", self.input, self.reason)
    }
}

impl std::error::Error for ParseIdentifierError {}

fn invalid(input: &str, reason: &'static str) -> ParseIdentifierError {
    ParseIdentifierError {
        input: input.to_string(),
        reason,
    }
}

/// Kind prefix of a member identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MemberKind {
    Type,
    Method,
    Property,
    Field,
    Event,
    Namespace,
}

impl MemberKind {
    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "T" => Some(MemberKind::Type),
            "M" => Some(MemberKind::Method),
            "P" => Some(MemberKind::Property),
            "F" => Some(MemberKind::Field),
            "E" => Some(MemberKind::Event),
            "N" => Some(MemberKind::Namespace),
            _ => None,
        }
    }

    pub fn prefix(&self) -> char {
        match self {
            MemberKind::Type => 'T',
            MemberKind::Method => 'M',
            MemberKind::Property => 'P',
            MemberKind::Field => 'F',
            MemberKind::Event => 'E',
            MemberKind::Namespace => 'N',
        }
    }
}

/// Stable key naming a documented source element.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct MemberIdentifier {
    raw: String,
    kind: MemberKind,
    name: String,
    parameters: Vec<String>,
}

impl MemberIdentifier {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    /// Fully qualified name without the parameter list
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter types of a method signature, in declaration order
    pub fn parameter_types(&self) -> &[String] {
        &self.parameters
    }

    /// Last segment of the qualified name (`GetPet` for `M:Ns.Pets.GetPet(...)`)
    pub fn member_name(&self) -> &str {
        split_last_segment(&self.name).1
    }

    /// Qualified name of the declaring type (the namespace for `T:` members)
    pub fn declaring_type(&self) -> &str {
        split_last_segment(&self.name).0
    }

    /// Simple name of the declaring type (`Pets` for `M:Ns.Pets.GetPet`)
    pub fn declaring_type_simple_name(&self) -> &str {
        split_last_segment(self.declaring_type()).1
    }

    /// The identifier as a type expression, for `T:` identifiers used as crefs.
    pub fn type_ref(&self) -> Option<TypeRef> {
        if self.kind != MemberKind::Type {
            return None;
        }
        self.name.parse().ok()
    }
}

impl Display for MemberIdentifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for MemberIdentifier {
    type Err = ParseIdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let (prefix, rest) = raw
            .split_once(':')
            .ok_or_else(|| invalid(raw, "missing kind prefix"))?;
        let kind =
            MemberKind::from_prefix(prefix).ok_or_else(|| invalid(raw, "unknown kind prefix"))?;

        let (name, parameters) = match rest.find('(') {
            Some(open) => {
                let close = matching_close(rest, open)
                    .ok_or_else(|| invalid(raw, "unbalanced parameter list"))?;
                let trailer = &rest[close + 1..];
                // Conversion operators carry their return type after `~`.
                if !trailer.is_empty() && !trailer.starts_with('~') {
                    return Err(invalid(raw, "unexpected text after parameter list"));
                }
                let inner = &rest[open + 1..close];
                let parameters = split_top_level(inner)
                    .ok_or_else(|| invalid(raw, "unbalanced brackets in parameter list"))?;
                if parameters.iter().any(String::is_empty) {
                    return Err(invalid(raw, "empty parameter type"));
                }
                (&rest[..open], parameters)
            }
            None => (rest, Vec::new()),
        };

        if name.is_empty() {
            return Err(invalid(raw, "empty member name"));
        }
        if !brackets_balanced(name) {
            return Err(invalid(raw, "unbalanced brackets in member name"));
        }

        Ok(MemberIdentifier {
            raw: raw.to_string(),
            kind,
            name: name.to_string(),
            parameters,
        })
    }
}

impl Serialize for MemberIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for MemberIdentifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<MemberIdentifier>()
            .map_err(serde::de::Error::custom)
    }
}

/// Parsed type expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named { name: String, args: Vec<TypeRef> },
    Array(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Qualified name without generic arguments (`Ns.Page` for `Ns.Page{Ns.Pet}`)
    pub fn base_name(&self) -> Option<&str> {
        match self {
            TypeRef::Named { name, .. } => Some(name),
            TypeRef::Array(_) => None,
        }
    }

    pub fn args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Named { args, .. } => args,
            TypeRef::Array(_) => &[],
        }
    }

    pub fn simple_name(&self) -> String {
        match self {
            TypeRef::Named { name, .. } => strip_arity(split_last_segment(name).1).to_string(),
            TypeRef::Array(inner) => format!("{}Array", inner.simple_name()),
        }
    }

    /// Namespace segments of the declaring context, outermost first
    pub fn namespace_segments(&self) -> Vec<&str> {
        match self {
            TypeRef::Named { name, .. } => {
                let (namespace, _) = split_last_segment(name);
                if namespace.is_empty() {
                    Vec::new()
                } else {
                    namespace.split('.').collect()
                }
            }
            TypeRef::Array(inner) => inner.namespace_segments(),
        }
    }

    /// Component-name candidate: `Pet`, `PageOfPet`, `PairOfStringAndInt32`
    pub fn candidate_name(&self) -> String {
        match self {
            TypeRef::Named { args, .. } if !args.is_empty() => {
                let args: Vec<String> = args.iter().map(TypeRef::candidate_name).collect();
                format!("{}Of{}", self.simple_name(), args.join("And"))
            }
            _ => self.simple_name(),
        }
    }
}

impl Display for TypeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeRef::Named { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("{")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(",")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str("}")?;
                }
                Ok(())
            }
            TypeRef::Array(inner) => write!(f, "{inner}[]"),
        }
    }
}

impl FromStr for TypeRef {
    type Err = ParseIdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let body = trimmed.strip_prefix("T:").unwrap_or(trimmed);
        // By-reference and pointer markers in signatures do not change the shape.
        let body = body.trim_end_matches(['@', '*']);
        let mut parser = TypeRefParser {
            input: body,
            pos: 0,
        };
        let parsed = parser
            .parse_type()
            .ok_or_else(|| invalid(trimmed, "malformed type expression"))?;
        if parser.pos != body.len() {
            return Err(invalid(trimmed, "unexpected trailing characters"));
        }
        Ok(parsed)
    }
}

struct TypeRefParser<'a> {
    input: &'a str,
    pos: usize,
}

impl TypeRefParser<'_> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
            self.pos += c.len_utf8();
        }
    }

    fn parse_type(&mut self) -> Option<TypeRef> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '{' | '}' | '[' | ']' | ',') || c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
        if self.pos == start {
            return None;
        }
        let name = self.input[start..self.pos].to_string();

        let mut args = Vec::new();
        if self.eat('{') {
            loop {
                args.push(self.parse_type()?);
                self.skip_ws();
                if self.eat(',') {
                    continue;
                }
                if self.eat('}') {
                    break;
                }
                return None;
            }
        }

        let mut ty = TypeRef::Named { name, args };
        while self.eat('[') {
            // Multi-dimensional arrays (`[0:,0:]`) are treated as a single array level.
            while let Some(c) = self.peek() {
                if c == ']' {
                    break;
                }
                self.pos += c.len_utf8();
            }
            if !self.eat(']') {
                return None;
            }
            ty = TypeRef::Array(Box::new(ty));
        }
        self.skip_ws();
        Some(ty)
    }
}

/// Split `Ns.Type.Member` at the last dot outside any bracket pair.
fn split_last_segment(name: &str) -> (&str, &str) {
    let mut depth = 0i32;
    let mut split = None;
    for (i, c) in name.char_indices() {
        match c {
            '{' | '(' | '[' => depth += 1,
            '}' | ')' | ']' => depth -= 1,
            '.' if depth == 0 => split = Some(i),
            _ => {}
        }
    }
    match split {
        Some(i) => (&name[..i], &name[i + 1..]),
        None => ("", name),
    }
}

/// `List`1` -> `List`
fn strip_arity(name: &str) -> &str {
    name.split('`').next().unwrap_or(name)
}

fn matching_close(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in s[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

fn brackets_balanced(s: &str) -> bool {
    let mut stack = Vec::new();
    for c in s.chars() {
        match c {
            '{' | '(' | '[' => stack.push(c),
            '}' => {
                if stack.pop() != Some('{') {
                    return false;
                }
            }
            ')' => {
                if stack.pop() != Some('(') {
                    return false;
                }
            }
            ']' => {
                if stack.pop() != Some('[') {
                    return false;
                }
            }
            _ => {}
        }
    }
    stack.is_empty()
}

/// Split a parameter list on commas that are not nested inside brackets.
fn split_top_level(s: &str) -> Option<Vec<String>> {
    if s.trim().is_empty() {
        return Some(Vec::new());
    }
    if !brackets_balanced(s) {
        return None;
    }
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in s.chars() {
        match c {
            '{' | '(' | '[' => {
                depth += 1;
                current.push(c);
            }
            '}' | ')' | ']' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    parts.push(current.trim().to_string());
    Some(parts)
}
