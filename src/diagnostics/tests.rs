#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use std::sync::Arc;

fn member(raw: &str) -> MemberIdentifier {
    raw.parse().unwrap()
}

#[test]
fn test_warning_only_log_has_no_errors() {
    let diagnostics = Diagnostics::new();
    diagnostics.warning(DiagnosticKind::DuplicateMember, "documented twice", None);
    diagnostics.warning(DiagnosticKind::MissingResponse, "no responses", None);

    assert_eq!(diagnostics.len(), 2);
    assert!(!diagnostics.has_errors());

    diagnostics.error(
        DiagnosticKind::UnresolvedType,
        "type not found",
        Some(&member("M:Contoso.Api.Get")),
    );
    assert!(diagnostics.has_errors());
    assert_eq!(errors(&diagnostics.snapshot()).len(), 1);
}

#[test]
fn test_extend_keeps_batch_contiguous() {
    let diagnostics = Arc::new(Diagnostics::new());

    std::thread::scope(|scope| {
        for worker in 0..4 {
            let diagnostics = Arc::clone(&diagnostics);
            scope.spawn(move || {
                let batch = (0..25).map(|i| {
                    Diagnostic::warning(
                        DiagnosticKind::MalformedInput,
                        format!("worker {worker} entry {i}"),
                        None,
                    )
                });
                diagnostics.extend(batch);
            });
        }
    });

    let all = diagnostics.snapshot();
    assert_eq!(all.len(), 100);
    for chunk in all.chunks(25) {
        let prefix = chunk[0].message.split(" entry").next().unwrap().to_string();
        assert!(chunk.iter().all(|d| d.message.starts_with(&prefix)));
    }
}

#[test]
fn test_display_includes_kind_member_and_document() {
    let diagnostic = Diagnostic::error(
        DiagnosticKind::DanglingReference,
        "component 'Pet' is not defined",
        Some(&member("M:Contoso.Api.Get")),
    )
    .for_document("v2");

    assert_eq!(
        diagnostic.to_string(),
        "error [dangling_reference] M:Contoso.Api.Get (document v2): component 'Pet' is not defined"
    );
    assert!(diagnostic.is_error());
}

#[test]
fn test_into_vec_preserves_order() {
    let diagnostics = Diagnostics::new();
    diagnostics.warning(DiagnosticKind::NamingCollision, "first", None);
    diagnostics.error(DiagnosticKind::NoOperations, "second", None);
    diagnostics.extend(Vec::new());

    let all = diagnostics.into_vec();
    let messages: Vec<_> = all.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(messages, vec!["first", "second"]);
    assert_eq!(all[1].kind.as_str(), "no_operations");
}

#[test]
fn test_concurrent_appends_are_not_lost() {
    use rayon::prelude::*;

    let diagnostics = Diagnostics::new();
    (0..64).into_par_iter().for_each(|worker| {
        diagnostics.warning(
            DiagnosticKind::DuplicateMember,
            format!("single {worker}"),
            None,
        );
        let batch = (0..5).map(|i| {
            Diagnostic::warning(
                DiagnosticKind::MalformedInput,
                format!("batch {worker} item {i}"),
                None,
            )
        });
        diagnostics.extend(batch);
    });

    let all = diagnostics.into_vec();
    assert_eq!(all.len(), 64 * 6);
    for worker in 0..64 {
        let start = all
            .iter()
            .position(|d| d.message == format!("batch {worker} item 0"))
            .unwrap();
        for i in 0..5 {
            assert_eq!(all[start + i].message, format!("batch {worker} item {i}"));
        }
    }
    let singles = all
        .iter()
        .filter(|d| d.kind == DiagnosticKind::DuplicateMember)
        .count();
    assert_eq!(singles, 64);
}
