//! Go extractor. The runtime tier compiles the embedded `go/ast` analyzer
//! to a per-source-hash binary cached in the OS temp directory; stale
//! binaries are evicted whenever a new hash is compiled.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{
    evict_stale_go_binaries, extractor_timeout, finish_raw_document, go_binary_cache_dir,
    parse_raw, produce_raw_document, DependencyCollector, Extractor, ExtractorResult, RawDocument,
};
use crate::availability::{self, Availability, ExtractorConfig};
use crate::error::ExtractError;
use crate::model::golang::{
    ApiIndex, ConstApi, FieldApi, FuncApi, IfaceApi, PackageApi, StructApi, TypeApi, VarApi,
};
use crate::model::{Diagnostic, DiagnosticLevel, Language, PRIORITY_OTHER};
use crate::sandbox;
use crate::version::detect_package_meta;
use crate::xref;

const ANALYZER_SOURCE: &str = include_str!("scripts/api_extractor.go");

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawIndex {
    module: Option<String>,
    version: Option<String>,
    packages: Vec<RawPackage>,
    diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawPackage {
    name: String,
    imports: Vec<RawImport>,
    structs: Vec<StructApi>,
    interfaces: Vec<IfaceApi>,
    types: Vec<TypeApi>,
    functions: Vec<FuncApi>,
    constants: Vec<ConstApi>,
    variables: Vec<VarApi>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawImport {
    path: String,
    alias: Option<String>,
}

pub struct GoExtractor {
    config: ExtractorConfig,
}

impl GoExtractor {
    pub fn new() -> Self {
        let mut config = ExtractorConfig::new(Language::Go, "api-extractor-go", "go", &["go"]);
        // `go --version` is not a thing; the toolchain answers `go version`.
        config.runtime_validation_args = vec!["version".to_string()];
        Self { config }
    }

    pub fn with_config(config: ExtractorConfig) -> Self {
        Self { config }
    }

    fn analyzer_hash() -> String {
        let mut hasher = Sha256::new();
        hasher.update(ANALYZER_SOURCE.as_bytes());
        format!("{:x}", hasher.finalize())[..12].to_string()
    }

    fn binary_path(cache_dir: &Path, hash: &str) -> PathBuf {
        let name = if cfg!(windows) {
            format!("extractor_{}.exe", hash)
        } else {
            format!("extractor_{}", hash)
        };
        cache_dir.join(name)
    }

    /// Compile the embedded analyzer with the local Go toolchain, reusing
    /// the cached binary when its hash is current.
    async fn ensure_binary(
        &self,
        go_tool: &str,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, ExtractError> {
        let cache_dir = go_binary_cache_dir();
        let hash = Self::analyzer_hash();
        let binary = Self::binary_path(&cache_dir, &hash);
        if binary.is_file() {
            return Ok(binary);
        }
        std::fs::create_dir_all(&cache_dir)?;

        let build_dir = tempfile::TempDir::new()?;
        std::fs::write(build_dir.path().join("main.go"), ANALYZER_SOURCE)?;
        let out_arg = binary.to_string_lossy().into_owned();
        let output = sandbox::execute(
            go_tool,
            &["build", "-o", out_arg.as_str(), "main.go"],
            Some(build_dir.path()),
            &[("GO111MODULE", "off")],
            extractor_timeout(),
            cancel,
        )
        .await?;
        if output.timed_out {
            return Err(ExtractError::Timeout {
                language: Language::Go,
                seconds: extractor_timeout().as_secs(),
            });
        }
        if output.exit_code != 0 {
            return Err(ExtractError::AnalyzerFailed {
                language: Language::Go,
                message: format!("go build failed: {}", output.stderr.trim()),
            });
        }
        debug!(hash, "compiled go analyzer binary");
        evict_stale_go_binaries(&cache_dir, &hash)?;
        Ok(binary)
    }

    async fn raw_document(
        &self,
        source: &Path,
        cancel: &CancellationToken,
    ) -> Result<RawDocument, ExtractError> {
        match availability::check(&self.config) {
            Availability::RuntimeInterpreter {
                executable,
                warning,
            } => {
                let binary = self.ensure_binary(&executable, cancel).await?;
                let binary_arg = binary.to_string_lossy().into_owned();
                let output = sandbox::execute(
                    &binary_arg,
                    &[],
                    Some(source),
                    &[],
                    extractor_timeout(),
                    cancel,
                )
                .await?;
                finish_raw_document(Language::Go, output, warning.into_iter().collect())
            }
            // Native binary and container tiers share the generic path.
            _ => produce_raw_document(&self.config, None, source, cancel).await,
        }
    }
}

impl Default for GoExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for GoExtractor {
    type Index = ApiIndex;

    fn language(&self) -> Language {
        Language::Go
    }

    async fn extract(
        &self,
        source: &Path,
        cancel: &CancellationToken,
    ) -> Result<ExtractorResult<ApiIndex>, ExtractError> {
        let raw_doc = self.raw_document(source, cancel).await?;
        let raw: RawIndex = parse_raw(Language::Go, &raw_doc.json)?;

        let mut index = convert(raw, source);
        if raw_doc.output_truncated {
            index.diagnostics.push(Diagnostic::new(
                "EXT001",
                DiagnosticLevel::Warning,
                None,
                "analyzer output was truncated at the capture cap",
            ));
        }
        Ok(ExtractorResult::success_with_warnings(index, raw_doc.warnings))
    }
}

/// Build an index straight from analyzer JSON; `source` is only consulted
/// for manifest metadata.
pub fn index_from_raw(json: &str, source: &Path) -> Result<ApiIndex, ExtractError> {
    let raw: RawIndex = parse_raw(Language::Go, json)?;
    Ok(convert(raw, source))
}

fn convert(raw: RawIndex, source: &Path) -> ApiIndex {
    let meta = detect_package_meta(source, Language::Go);
    let package = raw
        .module
        .or(meta.name)
        .or_else(|| {
            source
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "unknown".to_string());
    let version = raw.version.or(meta.version);

    let known: HashSet<String> = raw
        .packages
        .iter()
        .flat_map(|p| {
            p.structs
                .iter()
                .map(|s| s.name.clone())
                .chain(p.interfaces.iter().map(|i| i.name.clone()))
                .chain(p.types.iter().map(|t| t.name.clone()))
        })
        .collect();
    let mut collector = DependencyCollector::new(Language::Go, &package, known);
    for pkg in &raw.packages {
        for import in &pkg.imports {
            let qualifier = import
                .alias
                .clone()
                .filter(|a| !a.is_empty() && a != "_" && a != ".")
                .unwrap_or_else(|| {
                    import
                        .path
                        .rsplit('/')
                        .next()
                        .unwrap_or(&import.path)
                        .to_string()
                });
            collector.add_package_import(&qualifier, &import.path);
        }
    }

    let mut packages = Vec::new();
    for raw_pkg in raw.packages {
        for st in &raw_pkg.structs {
            for embed in &st.embeds {
                collector.offer_signature(embed);
            }
            for field in &st.fields {
                collector.offer_opt(field.ty.as_deref());
            }
            for method in &st.methods {
                offer_func(&mut collector, method);
            }
        }
        for iface in &raw_pkg.interfaces {
            for embed in &iface.embeds {
                collector.offer_signature(embed);
            }
            for method in &iface.methods {
                offer_func(&mut collector, method);
            }
        }
        for alias in &raw_pkg.types {
            collector.offer_opt(alias.ty.as_deref());
        }
        for func in &raw_pkg.functions {
            offer_func(&mut collector, func);
        }

        packages.push(PackageApi {
            name: raw_pkg.name,
            structs: raw_pkg
                .structs
                .into_iter()
                .map(|mut s| {
                    s.id = Some(format!("{}.{}", package, s.name));
                    s
                })
                .collect(),
            interfaces: raw_pkg.interfaces,
            types: raw_pkg.types,
            functions: raw_pkg.functions,
            constants: raw_pkg.constants,
            variables: raw_pkg.variables,
        });
    }

    let mut index = ApiIndex {
        package,
        version,
        packages,
        dependencies: collector.finish(),
        diagnostics: raw.diagnostics,
    };
    post_process(&mut index);
    index
}

fn offer_func(collector: &mut DependencyCollector, func: &FuncApi) {
    collector.offer_opt(func.sig.as_deref());
    collector.offer_opt(func.ret.as_deref());
    for param in &func.params {
        collector.offer_signature(param);
    }
}

fn post_process(index: &mut ApiIndex) {
    for pkg in &mut index.packages {
        for st in &mut pkg.structs {
            // Structural: an Error() string method, never the type's name.
            st.is_error = st.methods.iter().any(FuncApi::is_error_method);
            st.derived.is_client = st.entry_point && !st.methods.is_empty() && !st.is_error;
            st.derived.is_model = !st.fields.is_empty() && st.methods.is_empty();
            st.derived.priority = PRIORITY_OTHER;
        }
        for iface in &mut pkg.interfaces {
            iface.derived.is_client = iface.entry_point && !iface.methods.is_empty();
            iface.derived.priority = PRIORITY_OTHER;
        }
        for alias in &mut pkg.types {
            alias.derived.priority = PRIORITY_OTHER;
        }
    }

    let priorities = xref::compute_priorities(index);
    for pkg in &mut index.packages {
        for st in &mut pkg.structs {
            if let Some(p) = priorities.get(&st.name) {
                st.derived.priority = *p;
            }
        }
        for iface in &mut pkg.interfaces {
            if let Some(p) = priorities.get(&iface.name) {
                iface.derived.priority = *p;
            }
        }
        for alias in &mut pkg.types {
            if let Some(p) = priorities.get(&alias.name) {
                alias.derived.priority = *p;
            }
        }
    }
}
