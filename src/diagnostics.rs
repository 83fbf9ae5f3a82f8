//! Diagnostics post-processing over a finished index.
//!
//! Rules:
//! - `SDK001` (info): public type lacks documentation.
//! - `SDK002` (warning): entry-point type has no operations.
//! - `SDK003` (warning): an operation parameter type resolves to a
//!   deprecated type, by bare name or qualified form.
//!
//! Upstream diagnostics carried on the index are merged before rule
//! evaluation; the returned set contains only the new entries, already
//! de-duplicated by `(id, target, message)` against upstream and itself.

use std::collections::HashSet;

use crate::model::{Diagnostic, DiagnosticLevel, IndexBase};
use crate::tokenizer;

fn parameter_blob(signature: &str) -> &str {
    match (signature.find('('), signature.rfind(')')) {
        (Some(open), Some(close)) if close > open => &signature[open + 1..close],
        _ => signature,
    }
}

/// Deprecated-type reference check: the bare name, or the last segment of a
/// dot- or slash-qualified head.
fn references_deprecated(blob: &str, deprecated: &HashSet<String>) -> Option<String> {
    let mut tokens = HashSet::new();
    tokenizer::tokenize_into(blob, &mut tokens);
    for token in tokens {
        if deprecated.contains(&token) {
            return Some(token);
        }
    }
    for piece in blob.split([',', ' ']) {
        let tail = piece.rsplit(['.', '/']).next().unwrap_or(piece);
        let head = crate::model::generic_head(tail);
        if deprecated.contains(head) {
            return Some(head.to_string());
        }
    }
    None
}

/// Evaluate the diagnostic rules, returning only new entries.
pub fn evaluate(index: &dyn IndexBase) -> Vec<Diagnostic> {
    let mut seen: HashSet<(String, Option<String>, String)> = index
        .diagnostics()
        .iter()
        .map(|d| (d.id.clone(), d.target.clone(), d.message.clone()))
        .collect();
    let mut out: Vec<Diagnostic> = Vec::new();
    let mut push = |diag: Diagnostic, out: &mut Vec<Diagnostic>| {
        let key = (diag.id.clone(), diag.target.clone(), diag.message.clone());
        if seen.insert(key) {
            out.push(diag);
        }
    };

    let deprecated: HashSet<String> = index
        .types()
        .iter()
        .filter(|t| t.is_deprecated())
        .map(|t| t.name().to_string())
        .collect();

    for ty in index.types() {
        if ty.doc().map_or(true, |d| d.trim().is_empty()) {
            push(
                Diagnostic::new(
                    "SDK001",
                    DiagnosticLevel::Info,
                    Some(ty.name()),
                    &format!("public type '{}' has no documentation", ty.name()),
                ),
                &mut out,
            );
        }

        let operations = ty.operations();
        if ty.is_entry_point() && operations.is_empty() {
            push(
                Diagnostic::new(
                    "SDK002",
                    DiagnosticLevel::Warning,
                    Some(ty.name()),
                    &format!("entry point '{}' has no operations", ty.name()),
                ),
                &mut out,
            );
        }

        for op in &operations {
            if let Some(dep) =
                references_deprecated(parameter_blob(&op.signature), &deprecated)
            {
                push(
                    Diagnostic::new(
                        "SDK003",
                        DiagnosticLevel::Warning,
                        Some(ty.name()),
                        &format!(
                            "operation '{}' takes deprecated parameter type '{}'",
                            op.name, dep
                        ),
                    ),
                    &mut out,
                );
            }
        }
    }

    for (_, func) in index.free_functions() {
        if let Some(dep) = references_deprecated(parameter_blob(&func.signature), &deprecated) {
            push(
                Diagnostic::new(
                    "SDK003",
                    DiagnosticLevel::Warning,
                    Some(func.name.as_str()),
                    &format!(
                        "function '{}' takes deprecated parameter type '{}'",
                        func.name, dep
                    ),
                ),
                &mut out,
            );
        }
    }

    out
}
