//! Parsing of XML documentation files into annotation records.
//!
//! The file is first read into a small element tree with `quick-xml`'s pull
//! reader, then each `<member>` is walked. Inline references (`<see cref>`,
//! `<paramref name>`) are flattened into text.

use super::record::{
    is_valid_response_code, AnnotationRecord, CustomTag, ParamDoc, ParameterLocation, ResponseDoc,
};
use super::AnnotationSource;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::ids::MemberIdentifier;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Result of parsing one documentation source
#[derive(Debug, Clone, Default)]
pub struct ParsedSource {
    pub origin: String,
    pub assembly: Option<String>,
    pub entries: Vec<(MemberIdentifier, AnnotationRecord)>,
}

#[derive(Debug, Clone)]
enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element, String> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| format!("invalid attribute on <{name}>: {e}"))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| format!("invalid attribute value on <{name}>: {e}"))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
    })
}

fn attach(stack: &mut [Element], node: Node) -> Result<(), String> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(node);
            Ok(())
        }
        None => Err("content outside of the document root".to_string()),
    }
}

/// Read the whole document into an element tree rooted at a synthetic element.
fn parse_tree(xml: &str) -> Result<Element, String> {
    let mut reader = Reader::from_str(xml);
    let mut stack = vec![Element::default()];

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => stack.push(element_from_start(&start)?),
            Ok(Event::Empty(start)) => {
                let element = element_from_start(&start)?;
                attach(&mut stack, Node::Element(element))?;
            }
            Ok(Event::End(_)) => {
                if stack.len() < 2 {
                    return Err("unexpected closing tag".to_string());
                }
                if let Some(element) = stack.pop() {
                    attach(&mut stack, Node::Element(element))?;
                }
            }
            Ok(Event::Text(text)) => {
                let text = text
                    .unescape()
                    .map_err(|e| format!("invalid text content: {e}"))?
                    .into_owned();
                attach(&mut stack, Node::Text(text))?;
            }
            Ok(Event::CData(data)) => {
                let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                attach(&mut stack, Node::Text(text))?;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(format!(
                    "error at position {}: {e}",
                    reader.buffer_position()
                ))
            }
        }
    }

    if stack.len() != 1 {
        return Err("unexpected end of document: unclosed elements".to_string());
    }
    stack
        .pop()
        .ok_or_else(|| "empty document".to_string())
}

/// Simple name of a cref target: `T:Contoso.Models.Pet` -> `Pet`
fn cref_display(cref: &str) -> &str {
    let body = cref.split_once(':').map(|(_, rest)| rest).unwrap_or(cref);
    let body = body.split('(').next().unwrap_or(body);
    body.rsplit('.').next().unwrap_or(body)
}

/// Flatten an element's content to text. When `skip_see` is set, `<see>`
/// elements are left out (response descriptions carry their type that way).
fn flatten_text(element: &Element, skip_see: bool, out: &mut String) {
    for node in &element.children {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(child) => match child.name.as_str() {
                "see" | "seealso" => {
                    if skip_see && child.name == "see" {
                        continue;
                    }
                    if let Some(cref) = child.attribute("cref") {
                        out.push_str(cref_display(cref));
                    } else if let Some(word) = child.attribute("langword") {
                        out.push_str(word);
                    } else {
                        flatten_text(child, skip_see, out);
                    }
                }
                "paramref" | "typeparamref" => {
                    if let Some(name) = child.attribute("name") {
                        out.push_str(name);
                    }
                }
                "para" | "br" => {
                    out.push(' ');
                    flatten_text(child, skip_see, out);
                    out.push(' ');
                }
                _ => flatten_text(child, skip_see, out),
            },
        }
    }
}

fn normalized_text(element: &Element, skip_see: bool) -> String {
    let mut raw = String::new();
    flatten_text(element, skip_see, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn nested_cref(element: &Element) -> Option<String> {
    element
        .elements()
        .find(|e| e.name == "see")
        .and_then(|e| e.attribute("cref"))
        .map(str::to_string)
}

fn parse_param(
    element: &Element,
    id: &MemberIdentifier,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<ParamDoc> {
    let Some(name) = element.attribute("name").map(str::trim).filter(|n| !n.is_empty()) else {
        diagnostics.push(Diagnostic::warning(
            DiagnosticKind::MalformedInput,
            "<param> without a name attribute was skipped",
            Some(id),
        ));
        return None;
    };

    let location = match element.attribute("in") {
        Some(raw) => match raw.parse::<ParameterLocation>() {
            Ok(location) => Some(location),
            Err(e) => {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticKind::MalformedInput,
                    format!("parameter '{name}': {e}; location will be inferred"),
                    Some(id),
                ));
                None
            }
        },
        None => None,
    };

    let required = match element.attribute("required") {
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            other => {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticKind::MalformedInput,
                    format!("parameter '{name}': invalid required value '{other}'"),
                    Some(id),
                ));
                None
            }
        },
        None => None,
    };

    let cref = element
        .attribute("cref")
        .or_else(|| element.attribute("type"))
        .map(str::to_string)
        .or_else(|| nested_cref(element));

    Some(ParamDoc {
        name: name.to_string(),
        description: normalized_text(element, false),
        location,
        cref,
        required,
    })
}

fn parse_response(
    element: &Element,
    id: &MemberIdentifier,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<ResponseDoc> {
    let code = element.attribute("code").map(str::trim).unwrap_or_default();
    if !is_valid_response_code(code) {
        diagnostics.push(Diagnostic::warning(
            DiagnosticKind::MalformedInput,
            format!("<response> with invalid code '{code}' was skipped"),
            Some(id),
        ));
        return None;
    }

    let cref = element
        .attribute("cref")
        .map(str::to_string)
        .or_else(|| nested_cref(element));
    let skip_see = element.attribute("cref").is_none() && cref.is_some();

    let code = if code == "default" {
        code.to_string()
    } else {
        code.to_ascii_uppercase()
    };

    Some(ResponseDoc {
        code,
        description: normalized_text(element, skip_see),
        cref,
    })
}

fn parse_member(
    element: &Element,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<(MemberIdentifier, AnnotationRecord)> {
    let Some(raw) = element.attribute("name") else {
        diagnostics.push(Diagnostic::error(
            DiagnosticKind::MalformedInput,
            "<member> without a name attribute was skipped",
            None,
        ));
        return None;
    };
    let id = match raw.parse::<MemberIdentifier>() {
        Ok(id) => id,
        Err(e) => {
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::MalformedInput,
                format!("{e}; member skipped"),
                None,
            ));
            return None;
        }
    };

    let mut record = AnnotationRecord::default();
    for child in element.elements() {
        match child.name.as_str() {
            "summary" => record.summary = non_empty(normalized_text(child, false)),
            "remarks" => record.remarks = non_empty(normalized_text(child, false)),
            "param" => {
                if let Some(param) = parse_param(child, &id, diagnostics) {
                    record.params.push(param);
                }
            }
            "response" => {
                if let Some(response) = parse_response(child, &id, diagnostics) {
                    record.responses.push(response);
                }
            }
            _ => record.tags.push(CustomTag {
                name: child.name.clone(),
                attributes: child.attributes.clone(),
                text: normalized_text(child, false),
            }),
        }
    }
    Some((id, record))
}

/// Parse a documentation source. Diagnostics are returned rather than pushed so
/// the caller can append them in source order.
pub fn parse_source(source: &AnnotationSource) -> (ParsedSource, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let mut parsed = ParsedSource {
        origin: source.origin.clone(),
        ..ParsedSource::default()
    };

    let root = match parse_tree(&source.content) {
        Ok(root) => root,
        Err(e) => {
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::MalformedInput,
                format!("{}: not well-formed XML ({e}); source skipped", source.origin),
                None,
            ));
            return (parsed, diagnostics);
        }
    };

    let Some(doc) = root.child("doc") else {
        diagnostics.push(Diagnostic::error(
            DiagnosticKind::MalformedInput,
            format!("{}: missing <doc> root element; source skipped", source.origin),
            None,
        ));
        return (parsed, diagnostics);
    };

    parsed.assembly = doc
        .child("assembly")
        .and_then(|a| a.child("name"))
        .map(|n| normalized_text(n, false))
        .filter(|n| !n.is_empty());

    for members in doc.elements().filter(|e| e.name == "members") {
        for member in members.elements().filter(|e| e.name == "member") {
            if let Some(entry) = parse_member(member, &mut diagnostics) {
                parsed.entries.push(entry);
            }
        }
    }

    (parsed, diagnostics)
}
