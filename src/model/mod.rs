//! Shared API-model surface.
//!
//! Five per-language record trees ([`dotnet`], [`python`], [`typescript`],
//! [`golang`], [`java`]) share the capability set defined here: naming,
//! documentation, flags, reference extraction, and truncation priority.
//! Indexes are built once by an extractor and never mutated afterwards; any
//! augmentation produces a fresh value.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

pub mod dotnet;
pub mod golang;
pub mod java;
pub mod python;
pub mod typescript;

/// Languages the engine understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Language {
    DotNet,
    Python,
    TypeScript,
    Go,
    Java,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::DotNet => "dotnet",
            Language::Python => "python",
            Language::TypeScript => "typescript",
            Language::Go => "go",
            Language::Java => "java",
        }
    }

    /// Source file extensions scanned for this language.
    pub fn source_extensions(&self) -> &'static [&'static str] {
        match self {
            Language::DotNet => &[".cs"],
            Language::Python => &[".py"],
            Language::TypeScript => &[".ts", ".tsx", ".js", ".mjs"],
            Language::Go => &[".go"],
            Language::Java => &[".java"],
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Truncation priority tiers. Lower keeps first; derived from capability,
/// never from the type's name.
pub const PRIORITY_CLIENT: u8 = 0;
pub const PRIORITY_ERROR: u8 = 1;
pub const PRIORITY_MODEL: u8 = 2;
pub const PRIORITY_OTHER: u8 = 3;

/// Flags computed during extraction post-processing. Not part of the wire
/// format; they exist so formatting and usage analysis never re-derive them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Derived {
    pub is_client: bool,
    pub is_model: bool,
    pub priority: u8,
}

/// Severity of a diagnostic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    #[default]
    Info,
    Warning,
    Error,
}

/// A diagnostic attached to an index, either carried from the analyzer's
/// JSON or produced by post-processing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Diagnostic {
    pub id: String,
    pub level: DiagnosticLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(id: &str, level: DiagnosticLevel, target: Option<&str>, message: &str) -> Self {
        Self {
            id: id.to_string(),
            level,
            target: target.map(str::to_string),
            message: message.to_string(),
        }
    }
}

/// An external package plus the subset of its types seen in signatures.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DependencyInfo {
    pub package: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
}

/// Record `type_name` under `package` in a dependency list, keeping both the
/// package order and the per-package type order stable and duplicate-free.
pub fn record_dependency(deps: &mut Vec<DependencyInfo>, package: &str, type_name: &str) {
    if let Some(dep) = deps.iter_mut().find(|d| d.package == package) {
        if !dep.types.iter().any(|t| t == type_name) {
            dep.types.push(type_name.to_string());
        }
        return;
    }
    deps.push(DependencyInfo {
        package: package.to_string(),
        types: vec![type_name.to_string()],
    });
}

/// A behavior-bearing operation, viewed uniformly across languages.
/// `signature` is the parameter-list flavored form used for prompts and for
/// deprecated-parameter diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationView {
    pub name: String,
    pub signature: String,
}

/// The capability set every named type exposes, regardless of language.
pub trait NamedType {
    fn name(&self) -> &str;
    fn qualified_id(&self) -> Option<&str> {
        None
    }
    fn kind(&self) -> &str;
    fn doc(&self) -> Option<&str>;
    fn is_entry_point(&self) -> bool;
    fn is_deprecated(&self) -> bool;
    fn is_error_type(&self) -> bool;

    /// Behavior-bearing members (methods, constructors), in declaration order.
    fn operations(&self) -> Vec<OperationView>;

    /// Append the names from `universe` that this type syntactically
    /// references. Implementations tokenize the head of base/implements
    /// clauses and every member signature; substring matches never count.
    fn append_referenced_types(&self, universe: &HashSet<String>, out: &mut HashSet<String>);

    /// Collect-into form: clears `out`, appends, and drops the self-reference
    /// so reuse across many types needs no fresh allocation.
    fn collect_referenced_types(&self, universe: &HashSet<String>, out: &mut HashSet<String>) {
        out.clear();
        self.append_referenced_types(universe, out);
        out.remove(self.name());
    }

    /// Allocating form of [`Self::collect_referenced_types`].
    fn referenced_types(&self, universe: &HashSet<String>) -> HashSet<String> {
        let mut out = HashSet::new();
        self.collect_referenced_types(universe, &mut out);
        out
    }

    fn derived(&self) -> Derived;

    fn is_client_type(&self) -> bool {
        self.derived().is_client
    }
    fn is_model_type(&self) -> bool {
        self.derived().is_model
    }
    fn truncation_priority(&self) -> u8 {
        self.derived().priority
    }
}

/// Language-erased view of an API index, for the resolver, the diagnostics
/// post-processor, and result publication.
pub trait IndexBase: Send + Sync {
    fn language(&self) -> Language;
    fn package(&self) -> &str;
    fn version(&self) -> Option<&str>;
    fn diagnostics(&self) -> &[Diagnostic];
    fn dependencies(&self) -> &[DependencyInfo];

    /// Every named type, in index order.
    fn types(&self) -> Vec<&dyn NamedType>;

    /// Module/package-level functions, in index order, paired with their
    /// container name.
    fn free_functions(&self) -> Vec<(String, OperationView)> {
        Vec::new()
    }

    /// Serialize to JSON. Each call owns its buffer, so concurrent
    /// serializations of one shared index produce identical bytes.
    fn to_json(&self, pretty: bool) -> String;
}

/// Names of every type in an index, in index order.
pub fn type_names(index: &dyn IndexBase) -> Vec<String> {
    index.types().iter().map(|t| t.name().to_string()).collect()
}

/// The universe set used by the cross-reference resolver.
pub fn type_name_set(index: &dyn IndexBase) -> HashSet<String> {
    index.types().iter().map(|t| t.name().to_string()).collect()
}

pub(crate) fn is_false(flag: &bool) -> bool {
    !*flag
}

/// Record a base/implements clause reference: only the head before generic
/// glyphs counts.
pub(crate) fn collect_head_ref(clause: &str, universe: &HashSet<String>, out: &mut HashSet<String>) {
    let head = generic_head(clause);
    if universe.contains(head) {
        out.insert(head.to_string());
    }
}

/// Record every universe token appearing in a member signature.
pub(crate) fn collect_signature_refs(
    signature: &str,
    universe: &HashSet<String>,
    out: &mut HashSet<String>,
) {
    let mut scratch = HashSet::new();
    crate::tokenizer::tokenize_into(signature, &mut scratch);
    for token in scratch {
        if universe.contains(&token) {
            out.insert(token);
        }
    }
}

pub(crate) fn collect_opt_signature_refs(
    signature: Option<&str>,
    universe: &HashSet<String>,
    out: &mut HashSet<String>,
) {
    if let Some(sig) = signature {
        collect_signature_refs(sig, universe, out);
    }
}

/// Head of a base/implements clause: the prefix before any generic or index
/// glyph. `Iterable<Item>` references `Iterable`; `Item` deliberately does
/// not count as a base reference.
pub(crate) fn generic_head(clause: &str) -> &str {
    let end = clause
        .find(|c| c == '<' || c == '[' || c == '(')
        .unwrap_or(clause.len());
    clause[..end].trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_dependency_dedupes_and_keeps_order() {
        let mut deps = Vec::new();
        record_dependency(&mut deps, "azure-core", "Pipeline");
        record_dependency(&mut deps, "azure-core", "Pipeline");
        record_dependency(&mut deps, "azure-core", "Policy");
        record_dependency(&mut deps, "requests", "Session");
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].types, vec!["Pipeline", "Policy"]);
        assert_eq!(deps[1].package, "requests");
    }

    #[test]
    fn generic_head_strips_arguments() {
        assert_eq!(generic_head("Iterable<Item>"), "Iterable");
        assert_eq!(generic_head("Repository[T]"), "Repository");
        assert_eq!(generic_head("Plain"), "Plain");
        assert_eq!(generic_head("Func(int)"), "Func");
    }

    #[test]
    fn diagnostic_serializes_camel_case() {
        let d = Diagnostic::new("SDK002", DiagnosticLevel::Warning, Some("ChatClient"), "no ops");
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains("\"level\":\"warning\""));
        assert!(json.contains("\"target\":\"ChatClient\""));
    }
}
