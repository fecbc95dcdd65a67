//! # Type Metadata
//!
//! Structural descriptions of the types referenced by the documentation. They
//! stand in for compiled assemblies: each metadata document lists object and
//! enum declarations with their fields and values.
//!
//! ## Format
//!
//! ```yaml
//! assembly: Contoso.Pets
//! types:
//!   - kind: object
//!     name: Contoso.Pets.Models.Pet
//!     fields:
//!       - { name: Id, type: System.Int64, required: true }
//!       - { name: Owner, type: Contoso.Pets.Models.Person, nullable: true }
//!   - kind: enum
//!     name: Contoso.Pets.Models.Color
//!     values: [Red, Green]
//!   - kind: object
//!     name: Contoso.Pets.Models.Page`1
//!     typeParameters: [T]
//!     fields:
//!       - { name: Items, type: "System.Collections.Generic.List{T}" }
//! ```
//!
//! JSON documents with the same structure are accepted when the origin ends
//! in `.json`.

#[cfg(test)]
mod tests;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use anyhow::Context;
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// One raw type-metadata input, already read into memory.
#[derive(Debug, Clone)]
pub struct MetadataSource {
    pub origin: String,
    pub content: String,
}

impl MetadataSource {
    pub fn new(origin: impl Into<String>, content: impl Into<String>) -> Self {
        MetadataSource {
            origin: origin.into(),
            content: content.into(),
        }
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read type metadata file {}", path.display()))?;
        Ok(Self::new(path.display().to_string(), content))
    }

    fn is_json(&self) -> bool {
        self.origin.to_ascii_lowercase().ends_with(".json")
    }
}

/// A metadata document as it appears on disk
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataDocument {
    #[serde(default)]
    pub assembly: Option<String>,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

/// A declared object or enum type
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeDecl {
    Object {
        name: String,
        /// Field order is meaningful for structural comparison
        #[serde(default)]
        ordered: bool,
        /// Names of the generic parameters of an open definition; fields may
        /// also refer to them positionally as `` `0 ``, `` `1 ``
        #[serde(default, rename = "typeParameters")]
        type_parameters: Vec<String>,
        #[serde(default)]
        fields: Vec<FieldDecl>,
    },
    Enum {
        name: String,
        #[serde(default)]
        values: Vec<String>,
    },
}

impl TypeDecl {
    pub fn name(&self) -> &str {
        match self {
            TypeDecl::Object { name, .. } | TypeDecl::Enum { name, .. } => name,
        }
    }
}

/// A field of an object declaration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub required: bool,
}

/// All declared types of a run, keyed by qualified name.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: HashMap<String, TypeDecl>,
    assemblies: Vec<String>,
    sources: usize,
}

impl TypeCatalog {
    /// Parse and merge metadata sources. Never fails: problems become diagnostics.
    pub fn load(sources: &[MetadataSource], diagnostics: &Diagnostics, parallel: bool) -> Self {
        let parsed: Vec<Result<MetadataDocument, Diagnostic>> = if parallel {
            sources.par_iter().map(parse_metadata).collect()
        } else {
            sources.iter().map(parse_metadata).collect()
        };

        let mut catalog = TypeCatalog {
            sources: sources.len(),
            ..TypeCatalog::default()
        };
        for (source, result) in sources.iter().zip(parsed) {
            match result {
                Ok(document) => catalog.merge(&source.origin, document, diagnostics),
                Err(diagnostic) => diagnostics.push(diagnostic),
            }
        }

        tracing::debug!(
            sources = sources.len(),
            types = catalog.types.len(),
            "type catalog loaded"
        );
        catalog
    }

    /// Build a catalog directly from declarations
    pub fn from_decls(decls: impl IntoIterator<Item = TypeDecl>) -> Self {
        let mut catalog = TypeCatalog {
            sources: 1,
            ..TypeCatalog::default()
        };
        for decl in decls {
            catalog.types.insert(decl.name().to_string(), decl);
        }
        catalog
    }

    fn merge(&mut self, origin: &str, document: MetadataDocument, diagnostics: &Diagnostics) {
        if let Some(assembly) = document.assembly {
            if !self.assemblies.contains(&assembly) {
                self.assemblies.push(assembly);
            }
        }
        for decl in document.types {
            let name = decl.name().trim().to_string();
            if name.is_empty() {
                diagnostics.error(
                    DiagnosticKind::MalformedInput,
                    format!("{origin}: type declaration without a name was skipped"),
                    None,
                );
                continue;
            }
            if self.types.contains_key(&name) {
                diagnostics.warning(
                    DiagnosticKind::DuplicateType,
                    format!("type '{name}' declared more than once; the declaration from {origin} wins"),
                    None,
                );
            }
            self.types.insert(name, decl);
        }
    }

    /// Look up a declaration by qualified name (a `T:` prefix is accepted)
    pub fn get(&self, name: &str) -> Option<&TypeDecl> {
        let name = name.strip_prefix("T:").unwrap_or(name);
        self.types.get(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Number of metadata sources supplied to the run (zero is a fatal input)
    pub fn source_count(&self) -> usize {
        self.sources
    }

    pub fn assemblies(&self) -> &[String] {
        &self.assemblies
    }
}

fn parse_metadata(source: &MetadataSource) -> Result<MetadataDocument, Diagnostic> {
    let parsed = if source.is_json() {
        serde_json::from_str::<MetadataDocument>(&source.content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str::<MetadataDocument>(&source.content).map_err(|e| e.to_string())
    };
    parsed.map_err(|e| {
        Diagnostic::error(
            DiagnosticKind::MalformedInput,
            format!("{}: invalid type metadata ({e}); source skipped", source.origin),
            None,
        )
    })
}
