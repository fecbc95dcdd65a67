use std::fmt;
use std::str::FromStr;

/// Where a documented parameter is carried in the HTTP request.
///
/// `Body` only exists at the annotation level; the operation builder turns
/// body parameters into the request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
    Body,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
            ParameterLocation::Body => "body",
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "path" => Ok(ParameterLocation::Path),
            "query" => Ok(ParameterLocation::Query),
            "header" => Ok(ParameterLocation::Header),
            "cookie" => Ok(ParameterLocation::Cookie),
            "body" => Ok(ParameterLocation::Body),
            other => Err(format!("unknown parameter location '{other}'")),
        }
    }
}

/// Documentation of a single `<param>` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDoc {
    pub name: String,
    pub description: String,
    /// Explicit `in` attribute, when present and valid
    pub location: Option<ParameterLocation>,
    /// Type of the parameter from `cref` (or a nested `<see cref>`)
    pub cref: Option<String>,
    pub required: Option<bool>,
}

/// Documentation of a single `<response>` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseDoc {
    /// Status code: three digits, a range such as `4XX`, or `default`
    pub code: String,
    pub description: String,
    pub cref: Option<String>,
}

/// Any element of a member's documentation that has no dedicated field
/// (`url`, `verb`, `group`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomTag {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
}

impl CustomTag {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Structured documentation of one member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationRecord {
    pub summary: Option<String>,
    pub remarks: Option<String>,
    pub params: Vec<ParamDoc>,
    pub responses: Vec<ResponseDoc>,
    pub tags: Vec<CustomTag>,
}

impl AnnotationRecord {
    pub fn param(&self, name: &str) -> Option<&ParamDoc> {
        self.params.iter().find(|p| p.name == name)
    }

    /// First custom tag with the given element name
    pub fn tag(&self, name: &str) -> Option<&CustomTag> {
        self.tags.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Non-empty texts of every custom tag with the given element name
    pub fn tag_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.tags
            .iter()
            .filter(move |t| t.name.eq_ignore_ascii_case(name))
            .map(|t| t.text.as_str())
            .filter(|text| !text.is_empty())
    }
}

/// `200`, `4XX` and `default` are accepted; anything else is malformed.
pub fn is_valid_response_code(code: &str) -> bool {
    if code == "default" {
        return true;
    }
    let bytes = code.as_bytes();
    if bytes.len() != 3 || !(b'1'..=b'5').contains(&bytes[0]) {
        return false;
    }
    let digits = bytes[1..].iter().all(u8::is_ascii_digit);
    let range = bytes[1..].iter().all(|b| *b == b'X' || *b == b'x');
    digits || range
}
