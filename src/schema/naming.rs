//! Component and property naming.

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::ids::TypeRef;
use std::collections::{BTreeMap, HashMap};

/// How object field names become schema property names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropertyNaming {
    /// Keep declared field names
    #[default]
    Preserve,
    /// Json.NET style camel case (`URLValue` -> `urlValue`)
    CamelCase,
}

impl PropertyNaming {
    pub fn apply(&self, name: &str) -> String {
        match self {
            PropertyNaming::Preserve => name.to_string(),
            PropertyNaming::CamelCase => to_camel_case(name),
        }
    }
}

/// Lower the leading run of capitals, keeping the last one before a lowercase
/// letter (`IPAddress` -> `ipAddress`, `ID` -> `id`, `Name` -> `name`).
pub fn to_camel_case(name: &str) -> String {
    let mut chars: Vec<char> = name.chars().collect();
    match chars.first() {
        Some(first) if first.is_uppercase() => {}
        _ => return name.to_string(),
    }
    for i in 0..chars.len() {
        if i == 1 && !chars[i].is_uppercase() {
            break;
        }
        let has_next = i + 1 < chars.len();
        if i > 0 && has_next && !chars[i + 1].is_uppercase() {
            if chars[i + 1].is_whitespace() {
                chars[i] = chars[i].to_lowercase().next().unwrap_or(chars[i]);
            }
            break;
        }
        chars[i] = chars[i].to_lowercase().next().unwrap_or(chars[i]);
    }
    chars.into_iter().collect()
}

/// One component: every qualified type sharing a candidate name and fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NamedClass {
    pub name: String,
    pub fingerprint: String,
    /// Qualified type names, sorted; the first one provides the component body
    pub members: Vec<String>,
}

/// Assign deterministic component names.
///
/// `entries` are (qualified name, parsed type, fingerprint). Types sharing a
/// candidate name but not a fingerprint are renamed with the shortest
/// namespace suffix that separates them, or with a fingerprint prefix when
/// namespaces cannot.
pub(crate) fn assign_component_names(
    entries: &[(String, TypeRef, String)],
    diagnostics: &Diagnostics,
) -> Vec<NamedClass> {
    // candidate -> fingerprint -> members
    let mut groups: BTreeMap<String, BTreeMap<&str, Vec<(&str, &TypeRef)>>> = BTreeMap::new();
    for (qualified, ty, fingerprint) in entries {
        groups
            .entry(ty.candidate_name())
            .or_default()
            .entry(fingerprint.as_str())
            .or_default()
            .push((qualified.as_str(), ty));
    }

    let mut classes = Vec::new();
    for (candidate, by_fingerprint) in groups {
        let mut group: Vec<(String, &TypeRef, Vec<String>)> = by_fingerprint
            .into_iter()
            .map(|(fingerprint, mut members)| {
                members.sort_by(|a, b| a.0.cmp(b.0));
                let representative = members[0].1;
                let names = members.iter().map(|(q, _)| q.to_string()).collect();
                (fingerprint.to_string(), representative, names)
            })
            .collect();

        if group.len() == 1 {
            if let Some((fingerprint, _, members)) = group.pop() {
                classes.push(NamedClass {
                    name: candidate,
                    fingerprint,
                    members,
                });
            }
            continue;
        }

        let labels = disambiguate(&candidate, &group);
        let types: Vec<String> = group.iter().flat_map(|(_, _, m)| m.clone()).collect();
        diagnostics.warning(
            DiagnosticKind::NamingCollision,
            format!(
                "structurally different types share the schema name '{candidate}' ({}); renamed to {}",
                types.join(", "),
                labels.join(", ")
            ),
            None,
        );
        for ((fingerprint, _, members), name) in group.into_iter().zip(labels) {
            classes.push(NamedClass {
                name,
                fingerprint,
                members,
            });
        }
    }

    // A renamed class may still clash with an unrelated candidate name.
    let mut taken: HashMap<String, String> = HashMap::new();
    for class in &mut classes {
        if let Some(owner) = taken.get(&class.name) {
            if *owner != class.fingerprint {
                class.name = format!("{}_{}", class.name, short(&class.fingerprint));
            }
        }
        taken.insert(class.name.clone(), class.fingerprint.clone());
    }
    classes
}

fn disambiguate(candidate: &str, group: &[(String, &TypeRef, Vec<String>)]) -> Vec<String> {
    let namespaces: Vec<Vec<&str>> = group.iter().map(|(_, ty, _)| ty.namespace_segments()).collect();
    let deepest = namespaces.iter().map(Vec::len).max().unwrap_or(0);

    for k in 1..=deepest {
        let labels: Vec<String> = namespaces
            .iter()
            .map(|segments| {
                let start = segments.len().saturating_sub(k);
                let mut parts: Vec<&str> = segments[start..].to_vec();
                parts.push(candidate);
                parts.join("_")
            })
            .collect();
        let mut unique = labels.clone();
        unique.sort();
        unique.dedup();
        if unique.len() == labels.len() {
            return labels;
        }
    }

    group
        .iter()
        .map(|(fingerprint, _, _)| format!("{candidate}_{}", short(fingerprint)))
        .collect()
}

fn short(fingerprint: &str) -> &str {
    fingerprint.get(..8).unwrap_or(fingerprint)
}
