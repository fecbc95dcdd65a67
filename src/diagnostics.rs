//! # Diagnostics Module
//!
//! Every stage of a generation run reports data-quality problems here instead
//! of returning errors. The collector is an append-only log shared by
//! reference between stages (and between rayon worker threads), so it is
//! guarded by a mutex.
//!
//! ## Usage
//!
//! ```rust
//! use apidocgen::diagnostics::{Diagnostics, DiagnosticKind};
//!
//! let diagnostics = Diagnostics::new();
//! diagnostics.warning(DiagnosticKind::DuplicateMember, "documented twice", None);
//! assert!(!diagnostics.has_errors());
//! ```

use crate::ids::MemberIdentifier;
use parking_lot::Mutex;
use std::fmt;

#[cfg(test)]
mod tests;

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Warning - generation continues and output is still written
    Warning,
    /// Error - the caller's strict policy withholds all output
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Machine-readable category of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    MalformedInput,
    DuplicateMember,
    UnresolvedType,
    DuplicateType,
    NamingCollision,
    PropertyCollision,
    MissingRoute,
    InvalidRoute,
    UndocumentedPathParameter,
    UndocumentedQueryParameter,
    UnusedPathParameter,
    DuplicateResponse,
    MissingResponse,
    DuplicateOperation,
    DuplicateOperationId,
    DanglingReference,
    NoMetadata,
    NoOperations,
    MissingOperationId,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::MalformedInput => "malformed_input",
            DiagnosticKind::DuplicateMember => "duplicate_member",
            DiagnosticKind::UnresolvedType => "unresolved_type",
            DiagnosticKind::DuplicateType => "duplicate_type",
            DiagnosticKind::NamingCollision => "naming_collision",
            DiagnosticKind::PropertyCollision => "property_collision",
            DiagnosticKind::MissingRoute => "missing_route",
            DiagnosticKind::InvalidRoute => "invalid_route",
            DiagnosticKind::UndocumentedPathParameter => "undocumented_path_parameter",
            DiagnosticKind::UndocumentedQueryParameter => "undocumented_query_parameter",
            DiagnosticKind::UnusedPathParameter => "unused_path_parameter",
            DiagnosticKind::DuplicateResponse => "duplicate_response",
            DiagnosticKind::MissingResponse => "missing_response",
            DiagnosticKind::DuplicateOperation => "duplicate_operation",
            DiagnosticKind::DuplicateOperationId => "duplicate_operation_id",
            DiagnosticKind::DanglingReference => "dangling_reference",
            DiagnosticKind::NoMetadata => "no_metadata",
            DiagnosticKind::NoOperations => "no_operations",
            DiagnosticKind::MissingOperationId => "missing_operation_id",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded generation issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    /// Human-readable description of the problem
    pub message: String,
    /// Documented member the issue originates from, when there is one
    pub member: Option<MemberIdentifier>,
    /// Group key of the document the issue applies to (validation failures)
    pub document: Option<String>,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        kind: DiagnosticKind,
        message: impl Into<String>,
        member: Option<&MemberIdentifier>,
    ) -> Self {
        Diagnostic {
            severity,
            kind,
            message: message.into(),
            member: member.cloned(),
            document: None,
        }
    }

    pub fn error(
        kind: DiagnosticKind,
        message: impl Into<String>,
        member: Option<&MemberIdentifier>,
    ) -> Self {
        Self::new(Severity::Error, kind, message, member)
    }

    pub fn warning(
        kind: DiagnosticKind,
        message: impl Into<String>,
        member: Option<&MemberIdentifier>,
    ) -> Self {
        Self::new(Severity::Warning, kind, message, member)
    }

    /// Attach the group key of the document this diagnostic applies to
    pub fn for_document(mut self, key: impl Into<String>) -> Self {
        self.document = Some(key.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.severity, self.kind)?;
        if let Some(member) = &self.member {
            write!(f, " {member}")?;
        }
        if let Some(document) = &self.document {
            write!(f, " (document {document})")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Append-only, thread-safe diagnostics log for one generation run
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Mutex<Vec<Diagnostic>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, diagnostic: Diagnostic) {
        trace_diagnostic(&diagnostic);
        self.entries.lock().push(diagnostic);
    }

    /// Append a batch under a single lock so it stays contiguous in the log.
    pub fn extend(&self, batch: impl IntoIterator<Item = Diagnostic>) {
        let batch: Vec<Diagnostic> = batch.into_iter().collect();
        if batch.is_empty() {
            return;
        }
        batch.iter().for_each(trace_diagnostic);
        self.entries.lock().extend(batch);
    }

    /// Append another log, already traced when it was recorded
    pub fn absorb(&self, other: Diagnostics) {
        let batch = other.into_vec();
        if !batch.is_empty() {
            self.entries.lock().extend(batch);
        }
    }

    pub fn error(
        &self,
        kind: DiagnosticKind,
        message: impl Into<String>,
        member: Option<&MemberIdentifier>,
    ) {
        self.push(Diagnostic::error(kind, message, member));
    }

    pub fn warning(
        &self,
        kind: DiagnosticKind,
        message: impl Into<String>,
        member: Option<&MemberIdentifier>,
    ) {
        self.push(Diagnostic::warning(kind, message, member));
    }

    pub fn has_errors(&self) -> bool {
        self.entries.lock().iter().any(Diagnostic::is_error)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Copy of the full ordered list
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries.into_inner()
    }
}

fn trace_diagnostic(diagnostic: &Diagnostic) {
    let member = diagnostic
        .member
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default();
    match diagnostic.severity {
        Severity::Error => tracing::error!(
            kind = diagnostic.kind.as_str(),
            member = %member,
            "{}",
            diagnostic.message
        ),
        Severity::Warning => tracing::warn!(
            kind = diagnostic.kind.as_str(),
            member = %member,
            "{}",
            diagnostic.message
        ),
    }
}

/// Error-level entries of a diagnostics list, in order
pub fn errors(diagnostics: &[Diagnostic]) -> Vec<&Diagnostic> {
    diagnostics.iter().filter(|d| d.is_error()).collect()
}

/// Print diagnostics grouped by severity
pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        println!("✅ No diagnostics reported");
        return;
    }

    let errors = errors(diagnostics);
    let warnings: Vec<_> = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .collect();

    println!(
        "\n📋 {} error(s), {} warning(s)\n",
        errors.len(),
        warnings.len()
    );

    if !errors.is_empty() {
        println!("❌ Errors:");
        for diagnostic in &errors {
            print_entry(diagnostic);
        }
        println!();
    }

    if !warnings.is_empty() {
        println!("⚠️  Warnings:");
        for diagnostic in &warnings {
            print_entry(diagnostic);
        }
        println!();
    }
}

fn print_entry(diagnostic: &Diagnostic) {
    match &diagnostic.member {
        Some(member) => println!("   [{}] {}", diagnostic.kind, member),
        None => println!("   [{}]", diagnostic.kind),
    }
    println!("      {}", diagnostic.message);
}
