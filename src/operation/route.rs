//! Route metadata taken from the `<verb>` and `<url>` documentation tags.

use crate::annotations::AnnotationRecord;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::ids::{MemberIdentifier, MemberKind};
use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;

static TEMPLATE_PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([^{}/?&=]+)\}").expect("template parameter regex should be valid")
});

/// HTTP method, path template and server of a documented operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMetadata {
    pub method: Method,
    /// Path template relative to the server, always starting with `/`
    pub path: String,
    /// `scheme://host` of an absolute URL
    pub server: Option<String>,
    /// Names templated in the query string (`?limit={limit}`)
    pub query_params: Vec<String>,
}

impl RouteMetadata {
    /// Read route metadata from a record.
    ///
    /// Returns `Ok(None)` for members that carry neither tag (they are not
    /// operations) and an error diagnostic when the route is incomplete or
    /// invalid.
    pub fn from_record(
        id: &MemberIdentifier,
        record: &AnnotationRecord,
    ) -> Result<Option<Self>, Diagnostic> {
        let verb = record.tag_values("verb").next();
        let url = record.tag_values("url").next();

        let (verb, url) = match (verb, url) {
            (None, None) => return Ok(None),
            (Some(verb), Some(url)) => (verb, url),
            (Some(_), None) => {
                return Err(Diagnostic::error(
                    DiagnosticKind::MissingRoute,
                    "operation has a <verb> but no <url>; excluded",
                    Some(id),
                ))
            }
            (None, Some(_)) => {
                return Err(Diagnostic::error(
                    DiagnosticKind::MissingRoute,
                    "operation has a <url> but no <verb>; excluded",
                    Some(id),
                ))
            }
        };

        if id.kind() != MemberKind::Method {
            return Err(Diagnostic::error(
                DiagnosticKind::InvalidRoute,
                "route tags are only supported on methods; excluded",
                Some(id),
            ));
        }

        let method = parse_method(verb).ok_or_else(|| {
            Diagnostic::error(
                DiagnosticKind::InvalidRoute,
                format!("unknown HTTP verb '{verb}'; excluded"),
                Some(id),
            )
        })?;

        let (server, path, query) = split_url(url);
        if let Err(reason) = validate_template(&path) {
            return Err(Diagnostic::error(
                DiagnosticKind::InvalidRoute,
                format!("invalid url '{url}': {reason}; excluded"),
                Some(id),
            ));
        }

        let query_params = query.map(template_params).unwrap_or_default();

        Ok(Some(RouteMetadata {
            method,
            path: normalize_template(&path),
            server,
            query_params,
        }))
    }

    /// Names of the `{name}` variables in the path template, in order
    pub fn path_params(&self) -> Vec<String> {
        template_params(&self.path)
    }
}

fn parse_method(verb: &str) -> Option<Method> {
    let upper = verb.trim().to_ascii_uppercase();
    let method = match upper.as_str() {
        "GET" => Method::GET,
        "PUT" => Method::PUT,
        "POST" => Method::POST,
        "DELETE" => Method::DELETE,
        "OPTIONS" => Method::OPTIONS,
        "HEAD" => Method::HEAD,
        "PATCH" => Method::PATCH,
        "TRACE" => Method::TRACE,
        _ => return None,
    };
    Some(method)
}

/// Split a URL into (server, path, query). A relative URL has no server.
fn split_url(url: &str) -> (Option<String>, String, Option<&str>) {
    let url = url.trim();
    let (without_fragment, _) = url.split_once('#').unwrap_or((url, ""));
    let (location, query) = match without_fragment.split_once('?') {
        Some((location, query)) => (location, Some(query)),
        None => (without_fragment, None),
    };

    let (server, path) = match location.split_once("://") {
        Some((scheme, rest)) => match rest.find('/') {
            Some(slash) => (
                Some(format!("{scheme}://{}", &rest[..slash])),
                rest[slash..].to_string(),
            ),
            None => (Some(format!("{scheme}://{rest}")), "/".to_string()),
        },
        None => {
            let path = location.trim();
            if path.starts_with('/') {
                (None, path.to_string())
            } else {
                (None, format!("/{path}"))
            }
        }
    };

    let path = if path.len() > 1 {
        path.trim_end_matches('/').to_string()
    } else {
        path
    };
    (server, path, query)
}

fn validate_template(path: &str) -> Result<(), &'static str> {
    if path.chars().any(char::is_whitespace) {
        return Err("path contains whitespace");
    }
    let mut open = false;
    let mut empty = true;
    for c in path.chars() {
        match c {
            '{' if open => return Err("nested '{' in path template"),
            '{' => {
                open = true;
                empty = true;
            }
            '}' if !open => return Err("unmatched '}' in path template"),
            '}' if empty => return Err("empty path template variable"),
            '}' => open = false,
            '/' if open => return Err("unterminated path template variable"),
            _ => empty = false,
        }
    }
    if open {
        return Err("unterminated path template variable");
    }
    Ok(())
}

/// Drop route constraints and optional markers: `{id:int}` and `{id?}` become `{id}`.
fn normalize_template(path: &str) -> String {
    TEMPLATE_PARAM
        .replace_all(path, |captures: &regex::Captures<'_>| {
            let name = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
            format!("{{{}}}", variable_name(name))
        })
        .into_owned()
}

fn variable_name(raw: &str) -> &str {
    let name = raw.split(':').next().unwrap_or(raw);
    name.trim().trim_end_matches('?').trim_start_matches('*')
}

fn template_params(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for captures in TEMPLATE_PARAM.captures_iter(template) {
        if let Some(name) = captures.get(1) {
            let name = variable_name(name.as_str());
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}
