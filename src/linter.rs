//! # OpenAPI Linter Module
//!
//! Checks an already generated OpenAPI document, typically one written by
//! `apidocgen generate` and then edited or merged by hand.
//!
//! ## Checks Performed
//!
//! 1. **Missing operationId** - every operation must have one
//! 2. **Duplicate operationId** - operation ids must be unique in the document
//! 3. **Dangling schema references** - every `#/components/schemas/` `$ref`
//!    must name a defined component
//!
//! ## Usage
//!
//! ```rust,no_run
//! use apidocgen::linter::{lint_spec, print_lint_issues};
//! use std::path::Path;
//!
//! let issues = lint_spec(Path::new("openapi/Contoso.Pets.yml"))?;
//! print_lint_issues(&issues, false);
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::diagnostics::{DiagnosticKind, Severity};
use anyhow::Context;
use oas3::{spec::PathItem, OpenApiV3Spec};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;


const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// A problem found in an OpenAPI document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintIssue {
    /// Where the issue occurred (e.g. "/pets/{id} GET", "schema:Pet")
    pub location: String,
    pub severity: Severity,
    pub kind: DiagnosticKind,
    /// Human-readable description of the problem
    pub message: String,
    /// Optional suggestion for how to fix it
    pub suggestion: Option<String>,
}

impl LintIssue {
    pub fn new(
        location: impl Into<String>,
        severity: Severity,
        kind: DiagnosticKind,
        message: impl Into<String>,
    ) -> Self {
        LintIssue {
            location: location.into(),
            severity,
            kind,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Lint an OpenAPI file (YAML when the extension is `yaml`/`yml`, else JSON)
pub fn lint_spec(spec_path: &Path) -> anyhow::Result<Vec<LintIssue>> {
    let text = std::fs::read_to_string(spec_path)
        .with_context(|| format!("failed to read {}", spec_path.display()))?;
    let is_yaml = spec_path
        .extension()
        .map(|s| s == "yaml" || s == "yml")
        .unwrap_or(false);
    let spec: OpenApiV3Spec = if is_yaml {
        serde_yaml::from_str(&text)
            .with_context(|| format!("{} is not a valid OpenAPI document", spec_path.display()))?
    } else {
        serde_json::from_str(&text)
            .with_context(|| format!("{} is not a valid OpenAPI document", spec_path.display()))?
    };
    lint_document(&spec)
}

/// Lint a parsed document
pub fn lint_document(spec: &OpenApiV3Spec) -> anyhow::Result<Vec<LintIssue>> {
    let defined: BTreeSet<&str> = spec
        .components
        .as_ref()
        .map(|c| c.schemas.keys().map(String::as_str).collect())
        .unwrap_or_default();

    let mut issues = Vec::new();
    let mut operation_ids: HashMap<String, String> = HashMap::new();

    if let Some(paths) = spec.paths.as_ref() {
        for (path, path_item) in paths {
            for (method, operation) in operations(path_item) {
                let location = format!("{path} {method}");
                match operation.operation_id.as_deref() {
                    None => issues.push(
                        LintIssue::new(
                            &location,
                            Severity::Error,
                            DiagnosticKind::MissingOperationId,
                            "Operation is missing operationId",
                        )
                        .with_suggestion("Add an operationId such as 'PetsController_GetPet'"),
                    ),
                    Some(id) => {
                        if let Some(first) = operation_ids.get(id) {
                            issues.push(LintIssue::new(
                                &location,
                                Severity::Error,
                                DiagnosticKind::DuplicateOperationId,
                                format!("operationId '{id}' is already used by {first}"),
                            ));
                        } else {
                            operation_ids.insert(id.to_string(), location.clone());
                        }
                    }
                }
                let value = serde_json::to_value(operation)
                    .with_context(|| format!("failed to inspect operation {location}"))?;
                check_refs(&value, &location, &defined, &mut issues);
            }
        }
    }

    if let Some(components) = spec.components.as_ref() {
        for (name, schema) in &components.schemas {
            let location = format!("schema:{name}");
            let value = serde_json::to_value(schema)
                .with_context(|| format!("failed to inspect {location}"))?;
            check_refs(&value, &location, &defined, &mut issues);
        }
    }

    Ok(issues)
}

/// HTTP methods of a path item, in a fixed order
fn operations(path_item: &PathItem) -> Vec<(&'static str, &oas3::spec::Operation)> {
    [
        ("GET", path_item.get.as_ref()),
        ("PUT", path_item.put.as_ref()),
        ("POST", path_item.post.as_ref()),
        ("DELETE", path_item.delete.as_ref()),
        ("OPTIONS", path_item.options.as_ref()),
        ("HEAD", path_item.head.as_ref()),
        ("PATCH", path_item.patch.as_ref()),
        ("TRACE", path_item.trace.as_ref()),
    ]
    .into_iter()
    .filter_map(|(method, operation)| operation.map(|op| (method, op)))
    .collect()
}

fn collect_refs<'v>(value: &'v Value, refs: &mut BTreeSet<&'v str>) {
    match value {
        Value::Object(map) => {
            for (key, entry) in map {
                match (key.as_str(), entry) {
                    ("$ref", Value::String(target)) => {
                        refs.insert(target.as_str());
                    }
                    _ => collect_refs(entry, refs),
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_refs(item, refs)),
        _ => {}
    }
}

fn check_refs(value: &Value, location: &str, defined: &BTreeSet<&str>, issues: &mut Vec<LintIssue>) {
    let mut refs = BTreeSet::new();
    collect_refs(value, &mut refs);
    for target in refs {
        let Some(name) = target.strip_prefix(SCHEMA_REF_PREFIX) else {
            continue;
        };
        if !defined.contains(name) {
            issues.push(
                LintIssue::new(
                    location,
                    Severity::Error,
                    DiagnosticKind::DanglingReference,
                    format!("Schema reference '{name}' not found in components.schemas"),
                )
                .with_suggestion(format!("Add '{name}' to components.schemas")),
            );
        }
    }
}

/// Print lint issues grouped by severity
pub fn print_lint_issues(issues: &[LintIssue], errors_only: bool) {
    let errors: Vec<_> = issues.iter().filter(|i| i.is_error()).collect();
    let warnings: Vec<_> = issues.iter().filter(|i| !i.is_error()).collect();

    if errors.is_empty() && (errors_only || warnings.is_empty()) {
        println!("✅ No lint issues found!");
        return;
    }

    println!("\n📋 Lint Results:");
    println!("   {} error(s), {} warning(s)\n", errors.len(), warnings.len());

    if !errors.is_empty() {
        println!("❌ Errors (must fix):");
        errors.iter().for_each(|issue| print_issue(issue));
        println!();
    }

    if !errors_only && !warnings.is_empty() {
        println!("⚠️  Warnings (should fix):");
        warnings.iter().for_each(|issue| print_issue(issue));
        println!();
    }
}

fn print_issue(issue: &LintIssue) {
    println!("   [{}] {}", issue.kind, issue.location);
    println!("      {}", issue.message);
    if let Some(suggestion) = &issue.suggestion {
        println!("      💡 Suggestion: {suggestion}");
    }
}

/// Fail when any error-level issue was found
pub fn fail_if_errors(issues: &[LintIssue]) -> anyhow::Result<()> {
    let errors = issues.iter().filter(|i| i.is_error()).count();
    if errors > 0 {
        anyhow::bail!("{errors} lint error(s) found");
    }
    Ok(())
}
