//! # Generator
//!
//! The single entry point of a generation run. [`generate`] wires the stages
//! together:
//!
//! 1. annotation sources and type metadata load concurrently (`rayon::join`);
//! 2. every documented member with route tags has its route parsed and its
//!    parameter and response types resolved (`par_iter`);
//! 3. all resolved shapes are canonicalized into one [`SchemaIndex`];
//! 4. operations are built against that index;
//! 5. operations are grouped into documents and validated.
//!
//! Nothing here fails on bad data: the result always carries the documents
//! that could be assembled plus the complete, ordered diagnostics list.
//! Per-member work produces a local batch of diagnostics that is appended in
//! input order, so the log is the same with or without parallelism.

use crate::annotations::{AnnotationRecord, AnnotationSource, AnnotationStore};
use crate::config::GenerationOptions;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::document::{Document, DocumentAssembler};
use crate::ids::MemberIdentifier;
use crate::metadata::{MetadataSource, TypeCatalog};
use crate::operation::{Operation, OperationBuilder, OperationTypes, RouteMetadata};
use crate::reflect::TypeReflector;
use crate::schema::{SchemaBuilder, SchemaIndex};
use indexmap::IndexMap;
use rayon::prelude::*;
use std::path::PathBuf;

/// Outcome of a run: partial documents plus every diagnostic
#[derive(Debug, Clone, Default)]
pub struct GenerationResult {
    /// Documents by group key, in first-seen order
    pub documents: IndexMap<String, Document>,
    pub diagnostics: Vec<Diagnostic>,
    /// Canonical components of the whole run
    pub schemas: SchemaIndex,
}

impl GenerationResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    /// Documents that passed validation
    pub fn valid_documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values().filter(|d| d.is_valid())
    }
}

/// Input files of a run
#[derive(Debug, Clone, Default)]
pub struct InputPaths {
    pub annotations: Vec<PathBuf>,
    pub metadata: Vec<PathBuf>,
}

impl InputPaths {
    /// Read every input file. A missing or unreadable file is a hard failure.
    pub fn load(&self) -> anyhow::Result<(Vec<AnnotationSource>, Vec<MetadataSource>)> {
        let annotations = self
            .annotations
            .iter()
            .map(|path| AnnotationSource::from_path(path))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let metadata = self
            .metadata
            .iter()
            .map(|path| MetadataSource::from_path(path))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok((annotations, metadata))
    }
}

/// A documented member that declares a route, with its resolved types
struct Candidate<'s> {
    id: &'s MemberIdentifier,
    record: &'s AnnotationRecord,
    route: RouteMetadata,
    types: OperationTypes,
}

/// Run the whole pipeline over in-memory sources.
pub fn generate(
    annotations: &[AnnotationSource],
    metadata: &[MetadataSource],
    options: &GenerationOptions,
) -> GenerationResult {
    let diagnostics = Diagnostics::new();

    if metadata.is_empty() {
        diagnostics.error(
            DiagnosticKind::NoMetadata,
            "no type metadata sources were supplied; nothing can be generated",
            None,
        );
        return GenerationResult {
            diagnostics: diagnostics.into_vec(),
            ..GenerationResult::default()
        };
    }

    let (store, catalog) = load_inputs(annotations, metadata, &diagnostics, options.parallel);
    let reflector = TypeReflector::new(&catalog);

    let members: Vec<(&MemberIdentifier, &AnnotationRecord)> = store.iter().collect();
    let prepared: Vec<(Option<Candidate<'_>>, Vec<Diagnostic>)> = if options.parallel {
        members
            .par_iter()
            .map(|&(id, record)| prepare(id, record, &reflector))
            .collect()
    } else {
        members
            .iter()
            .map(|&(id, record)| prepare(id, record, &reflector))
            .collect()
    };

    let mut candidates = Vec::with_capacity(prepared.len());
    for (candidate, batch) in prepared {
        diagnostics.extend(batch);
        candidates.extend(candidate);
    }

    let index = SchemaBuilder::new(options.naming)
        .with_annotations(&store)
        .canonicalize(
            candidates.iter().flat_map(|c| c.types.shapes()),
            &diagnostics,
        );

    let builder = OperationBuilder::new(&index);
    let mut operations: Vec<Operation> = Vec::with_capacity(candidates.len());
    for candidate in &candidates {
        let mut batch = Vec::new();
        operations.push(builder.build(
            candidate.id,
            candidate.record,
            &candidate.route,
            &candidate.types,
            &mut batch,
        ));
        diagnostics.extend(batch);
    }

    if operations.is_empty() {
        diagnostics.error(
            DiagnosticKind::NoOperations,
            "no documented member declares a route (<url> and <verb>); no document was assembled",
            None,
        );
        return GenerationResult {
            diagnostics: diagnostics.into_vec(),
            schemas: index,
            ..GenerationResult::default()
        };
    }

    let title = options
        .title
        .clone()
        .or_else(|| store.assemblies().first().cloned())
        .or_else(|| catalog.assemblies().first().cloned())
        .unwrap_or_else(|| "API".to_string());

    let documents = DocumentAssembler::new(&index, options.grouping, options.document_version.as_str())
        .with_title(title)
        .assemble(operations, &diagnostics);

    tracing::info!(
        members = store.len(),
        types = catalog.len(),
        components = index.components().len(),
        documents = documents.len(),
        diagnostics = diagnostics.len(),
        "generation finished"
    );

    GenerationResult {
        documents,
        diagnostics: diagnostics.into_vec(),
        schemas: index,
    }
}

/// Read the input files and run [`generate`].
pub fn generate_from_paths(
    inputs: &InputPaths,
    options: &GenerationOptions,
) -> anyhow::Result<GenerationResult> {
    let (annotations, metadata) = inputs.load()?;
    Ok(generate(&annotations, &metadata, options))
}

/// Load both input kinds. Each loader writes to its own log, merged
/// annotations first, so the order does not depend on scheduling.
fn load_inputs(
    annotations: &[AnnotationSource],
    metadata: &[MetadataSource],
    diagnostics: &Diagnostics,
    parallel: bool,
) -> (AnnotationStore, TypeCatalog) {
    let annotation_log = Diagnostics::new();
    let metadata_log = Diagnostics::new();

    let (store, catalog) = if parallel {
        rayon::join(
            || AnnotationStore::load(annotations, &annotation_log, true),
            || TypeCatalog::load(metadata, &metadata_log, true),
        )
    } else {
        (
            AnnotationStore::load(annotations, &annotation_log, false),
            TypeCatalog::load(metadata, &metadata_log, false),
        )
    };

    diagnostics.absorb(annotation_log);
    diagnostics.absorb(metadata_log);
    (store, catalog)
}

fn prepare<'s>(
    id: &'s MemberIdentifier,
    record: &'s AnnotationRecord,
    reflector: &TypeReflector<'_>,
) -> (Option<Candidate<'s>>, Vec<Diagnostic>) {
    let mut batch = Vec::new();
    let route = match RouteMetadata::from_record(id, record) {
        Ok(Some(route)) => route,
        Ok(None) => return (None, batch),
        Err(diagnostic) => {
            batch.push(diagnostic);
            return (None, batch);
        }
    };
    let types = OperationTypes::resolve(id, record, reflector, &mut batch);
    (
        Some(Candidate {
            id,
            record,
            route,
            types,
        }),
        batch,
    )
}
