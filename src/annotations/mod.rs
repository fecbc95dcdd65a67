//! # Annotation Store
//!
//! Loads XML documentation sources into [`AnnotationRecord`]s keyed by
//! [`MemberIdentifier`].
//!
//! ## Merge rules
//!
//! - Each source is parsed independently (in parallel when enabled).
//! - Malformed entries are reported and skipped; the rest of the source is kept.
//! - A member documented more than once (in one source or across sources) is
//!   reported as a warning and the later record wins. The member keeps the
//!   position where it was first seen.
//!
//! ```rust
//! use apidocgen::annotations::{AnnotationSource, AnnotationStore};
//! use apidocgen::diagnostics::Diagnostics;
//!
//! let xml = r#"<doc><members>
//!   <member name="T:Contoso.Pet"><summary>A pet.</summary></member>
//! </members></doc>"#;
//! let diagnostics = Diagnostics::new();
//! let store = AnnotationStore::load(&[AnnotationSource::new("pets.xml", xml)], &diagnostics, false);
//! assert_eq!(store.len(), 1);
//! ```

mod record;
mod xml;

#[cfg(test)]
mod tests;

pub use record::{
    is_valid_response_code, AnnotationRecord, CustomTag, ParamDoc, ParameterLocation, ResponseDoc,
};
pub use xml::{parse_source, ParsedSource};

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::ids::MemberIdentifier;
use anyhow::Context;
use indexmap::IndexMap;
use rayon::prelude::*;
use std::path::Path;

/// One raw documentation input, already read into memory.
#[derive(Debug, Clone)]
pub struct AnnotationSource {
    /// Where the content came from (file path or a label); used in messages
    pub origin: String,
    pub content: String,
}

impl AnnotationSource {
    pub fn new(origin: impl Into<String>, content: impl Into<String>) -> Self {
        AnnotationSource {
            origin: origin.into(),
            content: content.into(),
        }
    }

    /// Read a documentation file from disk
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read annotation file {}", path.display()))?;
        Ok(Self::new(path.display().to_string(), content))
    }
}

/// Mapping of member identifiers to their documentation.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    records: IndexMap<MemberIdentifier, AnnotationRecord>,
    assemblies: Vec<String>,
}

impl AnnotationStore {
    /// Parse and merge all sources. Never fails: problems become diagnostics.
    pub fn load(sources: &[AnnotationSource], diagnostics: &Diagnostics, parallel: bool) -> Self {
        let parsed: Vec<(ParsedSource, Vec<Diagnostic>)> = if parallel {
            sources.par_iter().map(parse_source).collect()
        } else {
            sources.iter().map(parse_source).collect()
        };

        let mut store = AnnotationStore::default();
        for (source, batch) in parsed {
            diagnostics.extend(batch);
            store.merge(source, diagnostics);
        }

        tracing::debug!(
            sources = sources.len(),
            members = store.records.len(),
            "annotation store loaded"
        );
        store
    }

    fn merge(&mut self, source: ParsedSource, diagnostics: &Diagnostics) {
        if let Some(assembly) = source.assembly {
            if !self.assemblies.contains(&assembly) {
                self.assemblies.push(assembly);
            }
        }
        for (id, record) in source.entries {
            if self.records.contains_key(&id) {
                diagnostics.warning(
                    DiagnosticKind::DuplicateMember,
                    format!(
                        "member documented more than once; the entry from {} replaces the earlier one",
                        source.origin
                    ),
                    Some(&id),
                );
            }
            // IndexMap::insert keeps the original position of an existing key.
            self.records.insert(id, record);
        }
    }

    pub fn get(&self, id: &MemberIdentifier) -> Option<&AnnotationRecord> {
        self.records.get(id)
    }

    /// Records in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&MemberIdentifier, &AnnotationRecord)> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Assembly names declared by the sources, first-seen order
    pub fn assemblies(&self) -> &[String] {
        &self.assemblies
    }

    /// Summary of a `T:` member, used as a schema description
    pub fn type_summary(&self, qualified_name: &str) -> Option<&str> {
        self.summary_of(&format!("T:{qualified_name}"))
    }

    /// Summary of a `P:` (or `F:`) member of a type, used as a property description
    pub fn member_summary(&self, qualified_type: &str, member: &str) -> Option<&str> {
        self.summary_of(&format!("P:{qualified_type}.{member}"))
            .or_else(|| self.summary_of(&format!("F:{qualified_type}.{member}")))
    }

    fn summary_of(&self, raw: &str) -> Option<&str> {
        let id = raw.parse::<MemberIdentifier>().ok()?;
        self.records.get(&id)?.summary.as_deref()
    }
}
