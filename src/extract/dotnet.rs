//! .NET extractor: the one language parsed in the host process.

use std::collections::HashSet;
use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::debug;
use walkdir::WalkDir;

use super::csharp_parser::{parse_cs_file, CsFile};
use super::{propagate_error_bases, Extractor, ExtractorResult};
use crate::error::ExtractError;
use crate::fingerprint::is_excluded_dir;
use crate::model::dotnet::{ApiIndex, MemberInfo, NamespaceInfo, TypeInfo};
use crate::model::{
    record_dependency, Diagnostic, DiagnosticLevel, Language, PRIORITY_OTHER,
};
use crate::stdlib;
use crate::version::detect_package_meta;
use crate::xref;

/// BCL exception types whose presence in a base clause is structural
/// evidence of an error type.
const ERROR_ROOTS: &[&str] = &[
    "Exception",
    "SystemException",
    "ApplicationException",
    "AggregateException",
    "ArgumentException",
    "ArgumentNullException",
    "InvalidOperationException",
    "NotSupportedException",
    "IOException",
    "HttpRequestException",
    "TimeoutException",
];

pub struct DotNetExtractor;

impl DotNetExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DotNetExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for DotNetExtractor {
    type Index = ApiIndex;

    fn language(&self) -> Language {
        Language::DotNet
    }

    async fn extract(
        &self,
        source: &Path,
        cancel: &CancellationToken,
    ) -> Result<ExtractorResult<ApiIndex>, ExtractError> {
        if cancel.is_cancelled() {
            return Err(ExtractError::Cancelled);
        }
        let mut warnings = Vec::new();
        let mut diagnostics = Vec::new();
        let mut files: Vec<(String, CsFile)> = Vec::new();

        let walker = WalkDir::new(source)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                !(e.file_type().is_dir()
                    && e.file_name().to_str().is_some_and(is_excluded_dir))
            });
        for entry in walker.flatten() {
            if cancel.is_cancelled() {
                return Err(ExtractError::Cancelled);
            }
            if !entry.file_type().is_file()
                || entry.path().extension().and_then(|e| e.to_str()) != Some("cs")
            {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(source)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");
            match std::fs::read_to_string(entry.path()) {
                Ok(content) => files.push((relative, parse_cs_file(&content))),
                Err(err) => {
                    diagnostics.push(Diagnostic::new(
                        "EXT002",
                        DiagnosticLevel::Warning,
                        Some(relative.as_str()),
                        &format!("failed to read source file: {}", err),
                    ));
                }
            }
        }

        let meta = detect_package_meta(source, Language::DotNet);
        let package = meta
            .name
            .clone()
            .or_else(|| {
                source
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "unknown".to_string());
        debug!(package, files = files.len(), "dotnet extraction parsed sources");

        let index = build_index(&package, meta.version, &files, diagnostics);
        if index.namespaces.is_empty() {
            warnings.push("no public C# types found under the source tree".to_string());
        }
        Ok(ExtractorResult::success_with_warnings(index, warnings))
    }
}

fn build_index(
    package: &str,
    version: Option<String>,
    files: &[(String, CsFile)],
    diagnostics: Vec<Diagnostic>,
) -> ApiIndex {
    let mut namespaces: Vec<NamespaceInfo> = Vec::new();
    let known: HashSet<String> = files
        .iter()
        .flat_map(|(_, f)| f.types.iter().map(|t| t.name.clone()))
        .collect();
    let own_namespaces: HashSet<String> = files
        .iter()
        .filter_map(|(_, f)| f.namespace.clone())
        .collect();
    let mut dependencies = Vec::new();

    for (_, file) in files {
        let ns_name = file
            .namespace
            .clone()
            .unwrap_or_else(|| package.to_string());
        // External usings of this file are the dependency home candidates
        // for bare tokens; attribution needs the single unambiguous one.
        let external_usings: Vec<&String> = file
            .usings
            .iter()
            .filter(|u| {
                !stdlib::is_dotnet_builtin_namespace(u)
                    && !own_namespaces.contains(*u)
                    && *u != &ns_name
            })
            .collect();

        let ns_pos = match namespaces.iter().position(|n| n.name == ns_name) {
            Some(pos) => pos,
            None => {
                namespaces.push(NamespaceInfo {
                    name: ns_name.clone(),
                    types: Vec::new(),
                });
                namespaces.len() - 1
            }
        };
        let ns = &mut namespaces[ns_pos];

        for cs_type in &file.types {
            let members: Vec<MemberInfo> = cs_type
                .members
                .iter()
                .map(|m| MemberInfo {
                    name: m.name.clone(),
                    kind: m.kind.clone(),
                    signature: m.signature.clone(),
                    is_static: m.is_static,
                    is_async: m.is_async,
                    is_deprecated: m.deprecated,
                    doc: m.doc.clone(),
                })
                .collect();

            for member in &members {
                attribute_signature(
                    &member.signature,
                    &member.name,
                    &known,
                    &external_usings,
                    &mut dependencies,
                );
            }
            if let Some(base) = &cs_type.base {
                attribute_signature(base, &cs_type.name, &known, &external_usings, &mut dependencies);
            }
            for iface in &cs_type.interfaces {
                attribute_signature(iface, &cs_type.name, &known, &external_usings, &mut dependencies);
            }

            ns.types.push(TypeInfo {
                name: cs_type.name.clone(),
                kind: cs_type.kind.clone(),
                base: cs_type.base.clone(),
                interfaces: cs_type.interfaces.clone(),
                members,
                values: cs_type.values.clone(),
                is_deprecated: cs_type.deprecated,
                doc: cs_type.doc.clone(),
                ..TypeInfo::default()
            });
        }
    }

    let mut index = ApiIndex {
        package: package.to_string(),
        version,
        namespaces,
        dependencies,
        diagnostics,
    };
    post_process(&mut index);
    index
}

fn attribute_signature(
    signature: &str,
    member_name: &str,
    known: &HashSet<String>,
    external_usings: &[&String],
    deps: &mut Vec<crate::model::DependencyInfo>,
) {
    // Only a single unambiguous external using can claim a bare token; a
    // compiled-metadata backend is the planned refinement here.
    if external_usings.len() != 1 {
        return;
    }
    let home = external_usings[0];
    let mut tokens = HashSet::new();
    crate::tokenizer::tokenize_into(signature, &mut tokens);
    for token in tokens {
        if token == member_name || known.contains(&token) || stdlib::is_dotnet_builtin(&token) {
            continue;
        }
        if !token.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
            continue;
        }
        record_dependency(deps, home, &token);
    }
}

fn post_process(index: &mut ApiIndex) {
    // Error flags from base chains.
    let bases: Vec<(String, Option<String>)> = index
        .all_types()
        .map(|t| (t.name.clone(), t.base.clone()))
        .collect();
    let errors = propagate_error_bases(&bases, |head| ERROR_ROOTS.contains(&head));

    // Entry points: public behavior-bearing types in the root namespace.
    let root_ns = index
        .namespaces
        .iter()
        .map(|n| n.name.clone())
        .min_by_key(|n| n.len());

    for ns in &mut index.namespaces {
        let is_root = Some(&ns.name) == root_ns.as_ref();
        for ty in &mut ns.types {
            ty.is_error = errors.contains(&ty.name);
            ty.entry_point =
                is_root && !ty.is_error && ty.behavior_members().any(|m| m.kind != "ctor");
            let has_behavior = ty.behavior_members().next().is_some();
            let has_methods = ty
                .members
                .iter()
                .any(|m| matches!(m.kind.as_str(), "method" | "operator"));
            ty.derived.is_client = ty.entry_point && has_behavior;
            ty.derived.is_model = ty.data_members().next().is_some() && !has_methods;
            ty.derived.priority = PRIORITY_OTHER;
        }
    }

    let priorities = xref::compute_priorities(index);
    for ns in &mut index.namespaces {
        for ty in &mut ns.types {
            if let Some(priority) = priorities.get(&ty.name) {
                ty.derived.priority = *priority;
            }
        }
    }
}
