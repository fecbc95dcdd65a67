//! # Document Assembler
//!
//! Partitions the operations of a run into [`Document`]s and checks that every
//! schema reference of a document resolves within that document.
//!
//! ## Grouping
//!
//! | Scheme         | Key                                                         |
//! |----------------|-------------------------------------------------------------|
//! | `single`       | `default`                                                   |
//! | `group`        | first `<group>` tag of the operation, else `default`        |
//! | `path-version` | first path segment matching `v<digits>`, else `default`     |
//!
//! Documents, operations, servers and tags keep first-seen order. The
//! component map of a document is the closure of the components its
//! operations reference; a referenced name with no component makes the
//! document invalid and is reported once per document.


use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::operation::Operation;
use crate::schema::{SchemaIndex, SchemaNode};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Key of operations that match no group
pub const DEFAULT_GROUP: &str = "default";

static VERSION_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^v\d+$").expect("version segment regex should be valid"));

/// How operations are partitioned into documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Grouping {
    #[default]
    Single,
    Group,
    PathVersion,
}

impl Grouping {
    /// Group key of an operation under this scheme
    pub fn key(&self, operation: &Operation) -> String {
        let key = match self {
            Grouping::Single => None,
            Grouping::Group => operation.group.clone(),
            Grouping::PathVersion => operation
                .path
                .split('/')
                .find(|segment| VERSION_SEGMENT.is_match(segment))
                .map(str::to_ascii_lowercase),
        };
        key.unwrap_or_else(|| DEFAULT_GROUP.to_string())
    }

    /// Whether the scheme can produce more than one document
    pub fn is_multi_document(&self) -> bool {
        !matches!(self, Grouping::Single)
    }
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grouping::Single => write!(f, "single"),
            Grouping::Group => write!(f, "group"),
            Grouping::PathVersion => write!(f, "path-version"),
        }
    }
}

impl FromStr for Grouping {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Grouping::Single),
            "group" => Ok(Grouping::Group),
            "path-version" | "path_version" | "version" => Ok(Grouping::PathVersion),
            other => Err(format!("unknown grouping scheme '{other}'")),
        }
    }
}

/// One assembled OpenAPI document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Group key
    pub key: String,
    pub title: String,
    pub version: String,
    /// Server URLs in first-seen order
    pub servers: Vec<String>,
    /// Operation tags in first-seen order
    pub tags: Vec<String>,
    pub operations: Vec<Operation>,
    /// Components reachable from the operations, in name order
    pub components: BTreeMap<String, SchemaNode>,
    dangling: BTreeSet<String>,
}

impl Document {
    /// Referenced component names with no definition in this document
    pub fn dangling_references(&self) -> &BTreeSet<String> {
        &self.dangling
    }

    pub fn is_valid(&self) -> bool {
        self.dangling.is_empty()
    }

    /// Operations grouped by path, in first-seen order
    pub fn paths(&self) -> IndexMap<&str, Vec<&Operation>> {
        let mut paths: IndexMap<&str, Vec<&Operation>> = IndexMap::new();
        for operation in &self.operations {
            paths.entry(operation.path.as_str()).or_default().push(operation);
        }
        paths
    }
}

/// Groups operations into documents
#[derive(Debug, Clone)]
pub struct DocumentAssembler<'a> {
    index: &'a SchemaIndex,
    grouping: Grouping,
    version: String,
    title: String,
}

impl<'a> DocumentAssembler<'a> {
    pub fn new(index: &'a SchemaIndex, grouping: Grouping, version: impl Into<String>) -> Self {
        DocumentAssembler {
            index,
            grouping,
            version: version.into(),
            title: "API".to_string(),
        }
    }

    /// Base title; multi-document schemes append `-{key}`
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn assemble(
        &self,
        operations: Vec<Operation>,
        diagnostics: &Diagnostics,
    ) -> IndexMap<String, Document> {
        let mut groups: IndexMap<String, Vec<Operation>> = IndexMap::new();
        for operation in operations {
            groups
                .entry(self.grouping.key(&operation))
                .or_default()
                .push(operation);
        }

        let mut documents = IndexMap::with_capacity(groups.len());
        for (key, operations) in groups {
            let document = self.document(key.clone(), operations, diagnostics);
            documents.insert(key, document);
        }

        tracing::debug!(
            grouping = %self.grouping,
            documents = documents.len(),
            "documents assembled"
        );
        documents
    }

    fn document(
        &self,
        key: String,
        candidates: Vec<Operation>,
        diagnostics: &Diagnostics,
    ) -> Document {
        let mut batch = Vec::new();
        let mut routes = HashSet::new();
        let mut ids: HashMap<String, usize> = HashMap::new();
        let mut used: HashSet<String> = HashSet::new();
        // a renamed id must not take the id of a later operation
        let original: HashSet<String> = candidates
            .iter()
            .map(|operation| operation.operation_id.clone())
            .collect();
        let mut operations: Vec<Operation> = Vec::with_capacity(candidates.len());

        for mut operation in candidates {
            if !routes.insert((operation.method.clone(), operation.path.clone())) {
                batch.push(
                    Diagnostic::error(
                        DiagnosticKind::DuplicateOperation,
                        format!(
                            "{} {} is already documented; operation dropped",
                            operation.method, operation.path
                        ),
                        Some(&operation.member),
                    )
                    .for_document(key.as_str()),
                );
                continue;
            }

            let seen = ids.entry(operation.operation_id.clone()).or_insert(0);
            *seen += 1;
            if used.contains(&operation.operation_id) {
                let mut suffix = (*seen).max(2);
                let mut renamed = format!("{}_{suffix}", operation.operation_id);
                while used.contains(&renamed) || original.contains(&renamed) {
                    suffix += 1;
                    renamed = format!("{}_{suffix}", operation.operation_id);
                }
                batch.push(
                    Diagnostic::warning(
                        DiagnosticKind::DuplicateOperationId,
                        format!(
                            "operation id '{}' is already used; renamed to '{renamed}'",
                            operation.operation_id
                        ),
                        Some(&operation.member),
                    )
                    .for_document(key.as_str()),
                );
                operation.operation_id = renamed;
            }
            used.insert(operation.operation_id.clone());
            operations.push(operation);
        }

        let mut servers: Vec<String> = Vec::new();
        let mut tags: Vec<String> = Vec::new();
        let mut roots: BTreeSet<&str> = BTreeSet::new();
        for operation in &operations {
            if let Some(server) = &operation.server {
                if !servers.contains(server) {
                    servers.push(server.clone());
                }
            }
            for tag in &operation.tags {
                if !tags.contains(tag) {
                    tags.push(tag.clone());
                }
            }
            roots.extend(operation.schema_references());
        }

        let (reachable, missing) = self.index.closure(roots);
        let components: BTreeMap<String, SchemaNode> = reachable
            .into_iter()
            .filter_map(|name| {
                self.index
                    .component(name)
                    .map(|node| (name.to_string(), node.clone()))
            })
            .collect();
        let dangling: BTreeSet<String> = missing.into_iter().map(str::to_string).collect();

        if !dangling.is_empty() {
            let names: Vec<String> = dangling.iter().map(|n| format!("'{n}'")).collect();
            batch.push(
                Diagnostic::error(
                    DiagnosticKind::DanglingReference,
                    format!(
                        "referenced schema(s) {} not defined in the document",
                        names.join(", ")
                    ),
                    None,
                )
                .for_document(key.as_str()),
            );
        }
        diagnostics.extend(batch);

        let title = if self.grouping.is_multi_document() {
            format!("{}-{key}", self.title)
        } else {
            self.title.clone()
        };

        Document {
            key,
            title,
            version: self.version.clone(),
            servers,
            tags,
            operations,
            components,
            dangling,
        }
    }
}
