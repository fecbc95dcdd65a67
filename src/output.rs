//! Writing generated documents to disk.
//!
//! The generator never decides whether output is written; the caller's
//! [`WritePolicy`] does. One file per document, named after its title.

use crate::document::Document;
use crate::generator::GenerationResult;
use crate::openapi::{OpenApi, OutputFormat};
use anyhow::Context;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// What to write when the run reported errors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WritePolicy {
    /// Any error-level diagnostic withholds every document
    #[default]
    Strict,
    /// Write every document that passed validation
    PerDocument,
}

impl fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WritePolicy::Strict => write!(f, "strict"),
            WritePolicy::PerDocument => write!(f, "per-document"),
        }
    }
}

impl FromStr for WritePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(WritePolicy::Strict),
            "per-document" | "per_document" => Ok(WritePolicy::PerDocument),
            other => Err(format!("unknown write policy '{other}'")),
        }
    }
}

/// Files written and documents held back
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub written: Vec<PathBuf>,
    /// Group keys of documents that were not written
    pub withheld: Vec<String>,
}

/// `{title}.{ext}` with characters unsafe in file names replaced by `_`
pub fn file_name(title: &str, format: OutputFormat) -> String {
    let mut stem: String = title
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() || stem.chars().all(|c| c == '.') {
        stem = "openapi".to_string();
    }
    format!("{stem}.{}", format.extension())
}

/// [`file_name`], suffixed with `_2`, `_3`, ... when an earlier document of
/// the run already took the name. `taken` holds lowercased names so titles
/// differing only in case do not overwrite each other either.
pub fn unique_file_name(title: &str, format: OutputFormat, taken: &mut HashSet<String>) -> String {
    let name = file_name(title, format);
    if taken.insert(name.to_lowercase()) {
        return name;
    }
    let extension = format.extension();
    let stem = name
        .strip_suffix(&format!(".{extension}"))
        .unwrap_or(name.as_str());
    let mut suffix = 2;
    loop {
        let candidate = format!("{stem}_{suffix}.{extension}");
        if taken.insert(candidate.to_lowercase()) {
            tracing::warn!(title, file = %candidate, clashes_with = %name, "output file name already used; suffixed");
            return candidate;
        }
        suffix += 1;
    }
}

/// Apply the write policy to the result of a run
pub fn write_documents(
    result: &GenerationResult,
    out_dir: &Path,
    format: OutputFormat,
    policy: WritePolicy,
) -> anyhow::Result<WriteReport> {
    let mut report = WriteReport::default();
    let selected: Vec<&Document> = match policy {
        WritePolicy::Strict if result.has_errors() => Vec::new(),
        WritePolicy::Strict => result.documents.values().collect(),
        WritePolicy::PerDocument => result.valid_documents().collect(),
    };
    for document in result.documents.values() {
        if !selected.iter().any(|d| d.key == document.key) {
            report.withheld.push(document.key.clone());
        }
    }
    if selected.is_empty() {
        tracing::warn!(policy = %policy, withheld = report.withheld.len(), "no document written");
        return Ok(report);
    }

    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;
    let mut taken = HashSet::new();
    for document in selected {
        let text = OpenApi::from_document(document)
            .to_format(format)
            .with_context(|| format!("failed to serialize document '{}'", document.key))?;
        let path = out_dir.join(unique_file_name(&document.title, format, &mut taken));
        fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(document = %document.key, path = %path.display(), "document written");
        report.written.push(path);
    }
    Ok(report)
}
