//! Per-language extraction pipeline.
//!
//! Each extractor resolves its tooling through [`crate::availability`],
//! produces a raw JSON document (external analyzer under the sandbox, an
//! embedded script under the language runtime, or - for C# only - the
//! in-process parser), and converts it into the public model while
//! classifying referenced symbols into dependencies.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::availability::{self, Availability, ExtractorConfig};
use crate::error::ExtractError;
use crate::model::{DependencyInfo, IndexBase, Language};
use crate::sandbox::{self, SandboxOutput};
use crate::stdlib;

pub mod dotnet;
pub mod golang;
pub mod java;
pub mod python;
pub mod typescript;

mod csharp_parser;

pub use dotnet::DotNetExtractor;
pub use golang::GoExtractor;
pub use java::JavaExtractor;
pub use python::PythonExtractor;
pub use typescript::TypeScriptExtractor;

/// Default extraction deadline when `SDK_CHAT_EXTRACTOR_TIMEOUT` is unset
/// or unparseable.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

static TIMEOUT_CACHE: Lazy<Mutex<Option<u64>>> = Lazy::new(|| Mutex::new(None));

/// Extraction deadline. The environment variable is read once per process
/// (or per [`reset_timeout`]); invalid values fall back to the default.
pub fn extractor_timeout() -> Duration {
    let mut cache = TIMEOUT_CACHE.lock().expect("timeout cache poisoned");
    let secs = *cache.get_or_insert_with(|| {
        std::env::var("SDK_CHAT_EXTRACTOR_TIMEOUT")
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
    });
    Duration::from_secs(secs)
}

/// Test hook: forget the cached timeout so the next call re-reads the
/// environment.
pub fn reset_timeout() {
    *TIMEOUT_CACHE.lock().expect("timeout cache poisoned") = None;
}

/// Success-or-failure wrapper around an extracted index, with analyzer
/// warnings either way on success.
#[derive(Clone, Debug)]
pub struct ExtractorResult<I> {
    pub index: Option<I>,
    pub warnings: Vec<String>,
    pub error: Option<String>,
}

impl<I> ExtractorResult<I> {
    pub fn success(index: I) -> Self {
        Self {
            index: Some(index),
            warnings: Vec::new(),
            error: None,
        }
    }

    pub fn success_with_warnings(index: I, warnings: Vec<String>) -> Self {
        Self {
            index: Some(index),
            warnings,
            error: None,
        }
    }

    pub fn failure(message: &str) -> Self {
        Self {
            index: None,
            warnings: Vec::new(),
            error: Some(message.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.index.is_some()
    }
}

impl<I: IndexBase + 'static> ExtractorResult<I> {
    /// Erase the concrete index type while preserving warnings.
    pub fn to_base(self) -> ExtractorResult<Box<dyn IndexBase>> {
        ExtractorResult {
            index: self.index.map(|i| Box::new(i) as Box<dyn IndexBase>),
            warnings: self.warnings,
            error: self.error,
        }
    }
}

/// One per-language extractor. All five expose the same shape.
pub trait Extractor: Send + Sync {
    type Index: IndexBase + Clone + Send + Sync + 'static;

    fn language(&self) -> Language;

    /// Extensions covered by this language's fingerprint.
    fn extensions(&self) -> &'static [&'static str] {
        self.language().source_extensions()
    }

    /// Extract the public API of the package rooted at `source`.
    fn extract(
        &self,
        source: &Path,
        cancel: &CancellationToken,
    ) -> impl std::future::Future<Output = Result<ExtractorResult<Self::Index>, ExtractError>> + Send;
}

/// Split analyzer stderr into trimmed, non-empty warning lines.
pub(crate) fn stderr_warnings(stderr: &str) -> Vec<String> {
    stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Raw JSON document plus the warnings gathered while producing it.
pub(crate) struct RawDocument {
    pub json: String,
    pub warnings: Vec<String>,
    pub output_truncated: bool,
}

/// Run the analyzer for `config` against `source` and return its stdout.
///
/// `script` is the embedded analyzer used under the runtime-interpreter
/// tier; the native and container tiers carry their own analyzer.
pub(crate) async fn produce_raw_document(
    config: &ExtractorConfig,
    script: Option<(&str, &str)>, // (file name, source text)
    source: &Path,
    cancel: &CancellationToken,
) -> Result<RawDocument, ExtractError> {
    let language = config.language;
    let timeout = extractor_timeout();
    let tier = availability::check(config);

    let mut warnings = Vec::new();
    let output = match tier {
        Availability::Unavailable { reason } => {
            return Err(ExtractError::Unavailable { language, reason });
        }
        Availability::NativeBinary {
            executable,
            warning,
        } => {
            warnings.extend(warning);
            sandbox::execute(&executable, &[], Some(source), &[], timeout, cancel).await?
        }
        Availability::RuntimeInterpreter {
            executable,
            warning,
        } => {
            warnings.extend(warning);
            let (file_name, text) = script.ok_or_else(|| ExtractError::Unavailable {
                language,
                reason: format!("no embedded analyzer for the {} runtime tier", language),
            })?;
            run_embedded_script(&executable, file_name, text, source, timeout, cancel).await?
        }
        Availability::Docker { image } => run_docker(&image, source, timeout, cancel).await?,
    };

    finish_raw_document(language, output, warnings)
}

pub(crate) fn finish_raw_document(
    language: Language,
    output: SandboxOutput,
    mut warnings: Vec<String>,
) -> Result<RawDocument, ExtractError> {
    if output.timed_out {
        return Err(ExtractError::Timeout {
            language,
            seconds: extractor_timeout().as_secs(),
        });
    }
    warnings.extend(stderr_warnings(&output.stderr));
    if output.exit_code != 0 {
        let tail: String = output
            .stderr
            .lines()
            .rev()
            .take(5)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ExtractError::AnalyzerFailed {
            language,
            message: format!("exit code {}: {}", output.exit_code, tail),
        });
    }
    let truncated = output.output_truncated();
    if truncated {
        warn!(%language, "analyzer output hit the capture cap");
    }
    Ok(RawDocument {
        json: output.stdout,
        warnings,
        output_truncated: truncated,
    })
}

async fn run_embedded_script(
    runtime: &str,
    file_name: &str,
    text: &str,
    source: &Path,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<SandboxOutput, ExtractError> {
    let dir = tempfile::TempDir::new()?;
    let script_path = dir.path().join(file_name);
    std::fs::write(&script_path, text)?;
    let script_arg = script_path.to_string_lossy().into_owned();
    sandbox::execute(runtime, &[script_arg.as_str()], Some(source), &[], timeout, cancel).await
}

async fn run_docker(
    image: &str,
    source: &Path,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<SandboxOutput, ExtractError> {
    let mount = format!("{}:/src", source.display());
    sandbox::execute(
        "docker",
        &["run", "--rm", "-v", mount.as_str(), "-w", "/src", image],
        None,
        &[],
        timeout,
        cancel,
    )
    .await
}

/// Deserialize an analyzer's stdout into a raw shape, mapping failures to
/// the malformed-output error.
pub(crate) fn parse_raw<T: serde::de::DeserializeOwned>(
    language: Language,
    json: &str,
) -> Result<T, ExtractError> {
    serde_json::from_str(json.trim()).map_err(|err| ExtractError::Malformed {
        language,
        message: err.to_string(),
    })
}

static QUALIFIED_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z_][A-Za-z0-9_]*)\.([A-Z][A-Za-z0-9_]*)").unwrap());

/// Accumulates external dependencies while signatures stream through
/// conversion. Bare tokens resolve through named imports; `pkg.Type`
/// selectors resolve through package imports. Symbols belonging to the
/// package under analysis, a standard library, or the builtin set never
/// surface.
pub(crate) struct DependencyCollector {
    language: Language,
    package_name: String,
    known: HashSet<String>,
    named_imports: HashMap<String, String>,
    package_imports: HashMap<String, String>,
    deps: Vec<DependencyInfo>,
}

impl DependencyCollector {
    pub fn new(language: Language, package_name: &str, known: HashSet<String>) -> Self {
        Self {
            language,
            package_name: package_name.to_string(),
            known,
            named_imports: HashMap::new(),
            package_imports: HashMap::new(),
            deps: Vec::new(),
        }
    }

    /// `from pkg import Symbol` / `import {Symbol} from "pkg"` / Java FQN.
    pub fn add_named_import(&mut self, symbol: &str, package: &str) {
        self.named_imports
            .insert(symbol.to_string(), package.to_string());
    }

    /// `import alias "path"` / `import pkg` - qualifier to home package.
    pub fn add_package_import(&mut self, qualifier: &str, package: &str) {
        self.package_imports
            .insert(qualifier.to_string(), package.to_string());
    }

    fn is_external_package(&self, package: &str) -> bool {
        package != self.package_name
            && !self.package_name.ends_with(package)
            && !stdlib::is_stdlib_package(self.language, package)
    }

    /// Offer every referenced symbol of `signature` for classification.
    pub fn offer_signature(&mut self, signature: &str) {
        for captures in QUALIFIED_REF_RE.captures_iter(signature) {
            let qualifier = &captures[1];
            let type_name = &captures[2];
            if let Some(package) = self.package_imports.get(qualifier).cloned() {
                if self.is_external_package(&package) {
                    crate::model::record_dependency(&mut self.deps, &package, type_name);
                }
            }
        }

        let mut tokens = HashSet::new();
        crate::tokenizer::tokenize_into(signature, &mut tokens);
        for token in tokens {
            if self.known.contains(&token) || stdlib::is_builtin(self.language, &token) {
                continue;
            }
            if let Some(package) = self.named_imports.get(&token).cloned() {
                if self.is_external_package(&package) {
                    crate::model::record_dependency(&mut self.deps, &package, &token);
                }
            }
        }
    }

    pub fn offer_opt(&mut self, signature: Option<&str>) {
        if let Some(sig) = signature {
            self.offer_signature(sig);
        }
    }

    pub fn finish(mut self) -> Vec<DependencyInfo> {
        self.deps.sort_by(|a, b| a.package.cmp(&b.package));
        for dep in &mut self.deps {
            dep.types.sort();
        }
        self.deps
    }
}

/// Fixpoint error propagation along base chains: a type is an error type
/// when its base head is a language-level error root or another error type
/// in the same index. Names alone never decide.
pub(crate) fn propagate_error_bases(
    types: &[(String, Option<String>)],
    is_error_root: impl Fn(&str) -> bool,
) -> HashSet<String> {
    let mut errors: HashSet<String> = HashSet::new();
    loop {
        let mut changed = false;
        for (name, base) in types {
            if errors.contains(name) {
                continue;
            }
            let Some(base) = base else { continue };
            let head = crate::model::generic_head(base);
            if is_error_root(head) || errors.contains(head) {
                errors.insert(name.clone());
                changed = true;
            }
        }
        if !changed {
            return errors;
        }
    }
}

/// Cache directory for compiled Go analyzer binaries.
pub(crate) fn go_binary_cache_dir() -> PathBuf {
    std::env::temp_dir().join("apidex-go-extractors")
}

/// Keep only `extractor_{current_hash}[.exe]` among the compiled analyzer
/// binaries in `dir`. Files not matching the `extractor_*` pattern are
/// preserved; a missing directory is not an error.
pub fn evict_stale_go_binaries(dir: &Path, current_hash: &str) -> std::io::Result<()> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };
    let keep = format!("extractor_{}", current_hash);
    let keep_exe = format!("extractor_{}.exe", current_hash);
    for entry in entries.flatten() {
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.starts_with("extractor_") {
            continue;
        }
        if name == keep || name == keep_exe {
            continue;
        }
        debug!(stale = name, "evicting stale analyzer binary");
        let _ = std::fs::remove_file(entry.path());
    }
    Ok(())
}
